//! tls-shim demo host.
//!
//! A minimal stand-in for the host server: it accepts TCP connections,
//! hands each descriptor to one of N worker threads, and serves an echo
//! application purely through the plugin hooks.
//!
//! ```text
//!   client ──TLS──▶ accept loop (tokio) ──fd──▶ worker thread k
//!                                               │ on_read_event (handshake)
//!                                               │ read → write (plaintext echo)
//!                                               └ close
//! ```

use std::os::fd::{OwnedFd, RawFd};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tokio::net::TcpListener;

use tls_shim::hooks::{NetworkIo, Worker};
use tls_shim::lifecycle::{signals, startup, Shutdown, WorkerPool};
use tls_shim::observability::metrics;

#[derive(Debug, Parser)]
#[command(name = "tls-shim", version, about = "TLS termination for descriptor I/O hooks")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "tls-shim.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let ready = match startup::bootstrap(&cli.config) {
        Ok(ready) => ready,
        Err(e) => {
            tracing::error!(error = %e, "Startup failed");
            eprintln!("tls-shim: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let config = ready.config;
    let shim = ready.shim;

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = match TcpListener::bind(&config.listener.bind_address).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(address = %config.listener.bind_address, error = %e, "Failed to bind listener");
            return ExitCode::FAILURE;
        }
    };
    if let Ok(addr) = listener.local_addr() {
        tracing::info!(address = %addr, "Listening for connections");
    }

    let shutdown = Shutdown::new();
    let mut pool = match WorkerPool::spawn(&shim, config.worker.threads, shutdown.clone(), echo) {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!(error = %e, "Failed to spawn worker threads");
            return ExitCode::FAILURE;
        }
    };

    signals::install(shutdown.clone());
    let mut stop = shutdown.subscribe();

    loop {
        tokio::select! {
            _ = stop.recv() => {
                tracing::info!("Shutdown signal received, stopping accept loop");
                break;
            }
            accepted = listener.accept() => {
                let (stream, peer) = match accepted {
                    Ok(pair) => pair,
                    Err(e) => {
                        tracing::warn!(error = %e, "Accept failed");
                        continue;
                    }
                };
                // Worker threads use blocking descriptor I/O.
                let fd = match stream.into_std().and_then(|s| s.set_nonblocking(false).map(|_| s)) {
                    Ok(std_stream) => OwnedFd::from(std_stream),
                    Err(e) => {
                        tracing::warn!(%peer, error = %e, "Failed to detach accepted stream");
                        continue;
                    }
                };
                tracing::debug!(%peer, "Dispatching connection");
                pool.dispatch(fd);
            }
        }
    }

    pool.stop();

    tracing::info!("Shutdown complete");
    ExitCode::SUCCESS
}

/// The bundled application: write back whatever arrives.
fn echo(worker: &mut Worker, fd: RawFd) -> Result<(), tls_shim::TlsError> {
    let mut buf = [0u8; 16 * 1024];
    loop {
        let n = worker.read(fd, &mut buf)?;
        if n == 0 {
            return Ok(());
        }
        let mut pos = 0;
        while pos < n {
            pos += worker.write(fd, &buf[pos..n])?;
        }
    }
}
