//! Generated key material and a rustls client peer.
//!
//! Also compiled into the integration tests, so nothing here refers to this
//! crate's own types.

use std::io::{self, Read};
use std::os::unix::net::UnixStream;
use std::sync::{Arc, OnceLock};
use std::thread::{self, JoinHandle};

use rustls::pki_types::{CertificateDer, PrivateKeyDer, PrivatePkcs8KeyDer, ServerName};
use rustls::{ClientConfig, ClientConnection, RootCertStore, StreamOwned};

pub type ClientStream = StreamOwned<ClientConnection, UnixStream>;

fn generated() -> &'static (CertificateDer<'static>, Vec<u8>) {
    static PAIR: OnceLock<(CertificateDer<'static>, Vec<u8>)> = OnceLock::new();
    PAIR.get_or_init(|| {
        let generated = rcgen::generate_simple_self_signed(vec!["localhost".into()]).unwrap();
        (generated.cert.der().clone(), generated.key_pair.serialize_der())
    })
}

/// Self-signed certificate chain and key for "localhost", shared per process.
pub fn key_material() -> (Vec<CertificateDer<'static>>, PrivateKeyDer<'static>) {
    let (cert, key) = generated();
    (vec![cert.clone()], PrivateKeyDer::Pkcs8(PrivatePkcs8KeyDer::from(key.clone())))
}

fn client_config() -> Arc<ClientConfig> {
    let mut roots = RootCertStore::empty();
    roots.add(generated().0.clone()).unwrap();
    let config = ClientConfig::builder_with_provider(Arc::new(rustls::crypto::ring::default_provider()))
        .with_protocol_versions(&[&rustls::version::TLS13])
        .unwrap()
        .with_root_certificates(roots)
        .with_no_client_auth();
    Arc::new(config)
}

/// Run a TLS client on `sock` in a thread: handshake, then `script`, then
/// hold the socket open until the server side hangs up.
pub fn spawn_client<F>(sock: UnixStream, script: F) -> JoinHandle<io::Result<Vec<u8>>>
where
    F: FnOnce(&mut ClientStream) -> io::Result<Vec<u8>> + Send + 'static,
{
    thread::spawn(move || {
        let server_name = ServerName::try_from("localhost").map_err(io::Error::other)?;
        let conn = ClientConnection::new(client_config(), server_name).map_err(io::Error::other)?;
        let mut stream = StreamOwned::new(conn, sock);
        while stream.conn.is_handshaking() {
            stream.conn.complete_io(&mut stream.sock)?;
        }

        let result = script(&mut stream);

        let mut sink = Vec::new();
        let _ = stream.sock.read_to_end(&mut sink);
        result
    })
}
