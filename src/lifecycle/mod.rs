//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config → Init logging → Load key material → Ready for workers
//!
//! Workers (workers.rs):
//!     Accepted fd → round-robin queue → worker thread → hooks
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Stop accepting → Close queued fds → Unblock
//!     in-flight sockets → Join workers → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Fail fast: config and key errors are fatal
//! - Ordered startup: config first, then logging, then key material

pub mod shutdown;
pub mod signals;
pub mod startup;
pub mod workers;

pub use shutdown::Shutdown;
pub use workers::WorkerPool;
