//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (thread count, chunk sizes)
//! - Check that the TLS section names both files
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ShimConfig → Result<(), Vec<ValidationError>>
//! - File existence is checked by the key loader, not here

use std::net::SocketAddr;

use crate::config::schema::{ShimConfig, TLS_SECTION};

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required string value is empty.
    MissingValue { section: &'static str, key: &'static str },
    /// A numeric value must be greater than zero.
    Zero { section: &'static str, key: &'static str },
    /// The bind address does not parse as a socket address.
    BadAddress(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::MissingValue { section, key } => {
                write!(f, "[{}] {} must be set", section, key)
            }
            ValidationError::Zero { section, key } => {
                write!(f, "[{}] {} must be greater than zero", section, key)
            }
            ValidationError::BadAddress(addr) => write!(f, "invalid bind address: {}", addr),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Validate a parsed configuration.
pub fn validate_config(config: &ShimConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.tls.cert_file.trim().is_empty() {
        errors.push(ValidationError::MissingValue { section: TLS_SECTION, key: "cert_file" });
    }
    if config.tls.key_file.trim().is_empty() {
        errors.push(ValidationError::MissingValue { section: TLS_SECTION, key: "key_file" });
    }

    if config.worker.threads == 0 {
        errors.push(ValidationError::Zero { section: "worker", key: "threads" });
    }
    if config.worker.write_buffer_limit == 0 {
        errors.push(ValidationError::Zero { section: "worker", key: "write_buffer_limit" });
    }
    if config.worker.send_file_chunk == 0 {
        errors.push(ValidationError::Zero { section: "worker", key: "send_file_chunk" });
    }

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BadAddress(config.listener.bind_address.clone()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
