//! Fixtures for unit tests.

mod peer;

pub use peer::spawn_client;

use crate::net::tls::ServerKeys;

pub fn server_keys() -> ServerKeys {
    let (certs, key) = peer::key_material();
    ServerKeys::from_der(certs, key).unwrap()
}
