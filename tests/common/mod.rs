//! Shared fixtures for the hook integration tests.

#[path = "../../src/test_support/peer.rs"]
mod peer;

pub use peer::spawn_client;

use tls_shim::config::WorkerConfig;
use tls_shim::net::tls::ServerKeys;
use tls_shim::TlsShim;

/// A plugin instance backed by the generated self-signed certificate.
pub fn shim(worker: WorkerConfig) -> TlsShim {
    let (certs, key) = peer::key_material();
    let keys = ServerKeys::from_der(certs, key).unwrap();
    TlsShim::with_keys(keys, worker)
}
