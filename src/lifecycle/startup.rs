//! Startup orchestration.
//!
//! # Responsibilities
//! - Load and validate configuration
//! - Initialize logging at the configured level
//! - Load key material through the plugin's startup hook
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Steps run in order, not concurrently

use std::fmt;
use std::path::Path;

use thiserror::Error;

use crate::config::{load_config, ConfigError, ShimConfig};
use crate::hooks::TlsShim;
use crate::net::tls::KeyError;
use crate::observability::logging;

/// Fatal startup failure.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("key material: {0}")]
    Keys(#[from] KeyError),
}

/// Everything the host needs once startup has succeeded.
pub struct Ready {
    pub config: ShimConfig,
    pub shim: TlsShim,
}

impl fmt::Debug for Ready {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ready")
            .field("bind_address", &self.config.listener.bind_address)
            .field("threads", &self.config.worker.threads)
            .finish()
    }
}

/// Load config, initialize logging, then start the plugin.
pub fn bootstrap(config_path: &Path) -> Result<Ready, StartupError> {
    let config = load_config(config_path)?;
    logging::init_logging(&config.observability.log_level);

    tracing::info!(
        config = ?config_path,
        bind_address = %config.listener.bind_address,
        threads = config.worker.threads,
        "Configuration loaded"
    );

    let shim = TlsShim::start(&config)?;
    Ok(Ready { config, shim })
}
