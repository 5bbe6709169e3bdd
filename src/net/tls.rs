//! TLS key material loading.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use rustls::ServerConfig;
use thiserror::Error;

/// Errors raised while loading the server certificate and key.
#[derive(Debug, Error)]
pub enum KeyError {
    /// A configured file does not exist.
    #[error("{kind} file not found: {path:?}")]
    NotFound { kind: &'static str, path: PathBuf },

    /// A configured file exists but could not be read or decoded.
    #[error("failed to read {kind} file {path:?}: {source}")]
    Unreadable {
        kind: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The certificate file holds no PEM certificates.
    #[error("no certificates in {0:?}")]
    NoCertificates(PathBuf),

    /// The key file holds no PEM private key.
    #[error("no private key in {0:?}")]
    NoPrivateKey(PathBuf),

    /// The engine rejected the certificate/key pair.
    #[error("TLS engine rejected key material: {0}")]
    Rejected(#[from] rustls::Error),
}

/// Shared, read-only server certificate and private key.
///
/// Built once at startup and handed to every worker behind an `Arc`. Each new
/// session references the same engine configuration.
#[derive(Debug, Clone)]
pub struct ServerKeys {
    config: Arc<ServerConfig>,
}

impl ServerKeys {
    /// Load certificate chain and key from PEM files.
    pub fn load(cert_path: &Path, key_path: &Path) -> Result<Self, KeyError> {
        // Basic validation
        if !cert_path.exists() {
            return Err(KeyError::NotFound { kind: "certificate", path: cert_path.to_path_buf() });
        }
        if !key_path.exists() {
            return Err(KeyError::NotFound { kind: "private key", path: key_path.to_path_buf() });
        }

        let certs = read_certs(cert_path)?;
        let key = read_key(key_path)?;

        let keys = Self::from_der(certs, key)?;
        tracing::info!(cert = ?cert_path, key = ?key_path, "Key material loaded");
        Ok(keys)
    }

    /// Build from already-decoded DER material.
    pub fn from_der(
        certs: Vec<CertificateDer<'static>>,
        key: PrivateKeyDer<'static>,
    ) -> Result<Self, KeyError> {
        let provider = Arc::new(rustls::crypto::ring::default_provider());
        let config = ServerConfig::builder_with_provider(provider)
            .with_protocol_versions(&[&rustls::version::TLS13])?
            .with_no_client_auth()
            .with_single_cert(certs, key)?;

        Ok(Self { config: Arc::new(config) })
    }

    /// Engine configuration shared by every session.
    pub fn server_config(&self) -> Arc<ServerConfig> {
        Arc::clone(&self.config)
    }
}

fn open(kind: &'static str, path: &Path) -> Result<BufReader<File>, KeyError> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|source| KeyError::Unreadable { kind, path: path.to_path_buf(), source })
}

fn read_certs(path: &Path) -> Result<Vec<CertificateDer<'static>>, KeyError> {
    let mut reader = open("certificate", path)?;
    let certs = rustls_pemfile::certs(&mut reader)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|source| KeyError::Unreadable { kind: "certificate", path: path.to_path_buf(), source })?;

    if certs.is_empty() {
        return Err(KeyError::NoCertificates(path.to_path_buf()));
    }
    Ok(certs)
}

fn read_key(path: &Path) -> Result<PrivateKeyDer<'static>, KeyError> {
    let mut reader = open("private key", path)?;
    rustls_pemfile::private_key(&mut reader)
        .map_err(|source| KeyError::Unreadable { kind: "private key", path: path.to_path_buf(), source })?
        .ok_or_else(|| KeyError::NoPrivateKey(path.to_path_buf()))
}
