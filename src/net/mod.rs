//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! host descriptor (already accepted)
//!     → wire.rs (raw read/write/pread/poll on the borrowed fd)
//!     → session engine (ciphertext in, ciphertext out)
//!
//! startup
//!     → tls.rs (PEM certificate + key → shared engine configuration)
//! ```
//!
//! # Design Decisions
//! - Descriptors are borrowed, never owned, except by an explicit close
//! - Only EINTR is retried; every other error surfaces to the caller
//! - Key material is loaded once and shared behind an `Arc`

pub mod tls;
pub mod wire;
