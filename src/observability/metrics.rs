//! Metrics collection and exposition.
//!
//! # Metrics
//! - `tls_handshakes_total` (counter): handshakes by outcome (complete, failed)
//! - `tls_sessions_active` (gauge): registered sessions per worker
//! - `tls_plaintext_bytes_total` (counter): plaintext by direction (read, write)
//! - `tls_alerts_received_total` (counter): fatal alerts sent by peers
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade; without an installed
//!   recorder every call is a no-op
//! - The Prometheus exporter is only installed when enabled in config

use std::net::SocketAddr;

use metrics::{counter, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter listening on `addr`.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_handshake(outcome: &'static str) {
    counter!("tls_handshakes_total", "outcome" => outcome).increment(1);
}

pub fn record_plaintext(direction: &'static str, bytes: usize) {
    counter!("tls_plaintext_bytes_total", "direction" => direction).increment(bytes as u64);
}

pub fn record_alert() {
    counter!("tls_alerts_received_total").increment(1);
}

pub fn set_active_sessions(worker: usize, count: usize) {
    gauge!("tls_sessions_active", "worker" => worker.to_string()).set(count as f64);
}
