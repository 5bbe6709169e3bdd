//! Transparent TLS termination for a host server's descriptor I/O hooks.
//!
//! The host keeps accepting sockets and calling read/write/close on raw
//! descriptors; this crate sits in between and makes those calls speak TLS.

pub mod config;
pub mod hooks;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod session;

#[cfg(test)]
pub(crate) mod test_support;

pub use config::ShimConfig;
pub use hooks::{EventAction, NetworkIo, TlsShim, Worker};
pub use lifecycle::Shutdown;
pub use session::{Session, TlsError};
