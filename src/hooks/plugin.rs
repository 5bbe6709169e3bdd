//! Process-wide plugin state.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::config::{ShimConfig, WorkerConfig};
use crate::hooks::Worker;
use crate::net::tls::{KeyError, ServerKeys};

/// Loaded once at host startup, then shared read-only by all workers.
#[derive(Debug)]
pub struct TlsShim {
    keys: Arc<ServerKeys>,
    worker: WorkerConfig,
    next_worker: AtomicUsize,
}

impl TlsShim {
    /// Startup hook: load the configured certificate and key.
    ///
    /// Any failure here is fatal for the host.
    pub fn start(config: &ShimConfig) -> Result<Self, KeyError> {
        let keys = ServerKeys::load(Path::new(&config.tls.cert_file), Path::new(&config.tls.key_file))?;
        tracing::info!(
            threads = config.worker.threads,
            write_buffer_limit = config.worker.write_buffer_limit,
            "TLS shim started"
        );
        Ok(Self::with_keys(keys, config.worker.clone()))
    }

    /// Build from key material that is already in memory.
    pub fn with_keys(keys: ServerKeys, worker: WorkerConfig) -> Self {
        Self {
            keys: Arc::new(keys),
            worker,
            next_worker: AtomicUsize::new(0),
        }
    }

    /// Per-worker init hook. Each call yields a worker with its own empty
    /// registry.
    pub fn worker(&self) -> Worker {
        let id = self.next_worker.fetch_add(1, Ordering::Relaxed);
        Worker::new(id, Arc::clone(&self.keys), &self.worker)
    }
}
