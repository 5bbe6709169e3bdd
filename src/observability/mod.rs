//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Sessions and workers produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, gauges)
//!
//! Consumers:
//!     → stdout via tracing-subscriber
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```
//!
//! # Design Decisions
//! - Per-record I/O logs at trace, session lifecycle at debug
//! - Metrics are cheap (atomic increments) and off unless an exporter runs

pub mod logging;
pub mod metrics;
