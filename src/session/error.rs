//! Error type shared by the session registry, handshake and record paths.

use std::io;
use std::os::unix::io::RawFd;

use rustls::AlertDescription;
use thiserror::Error;

/// Errors surfaced at the plugin boundary.
///
/// Every engine failure maps to one of these; none are swallowed.
#[derive(Debug, Error)]
pub enum TlsError {
    /// Read or write attempted on a descriptor with no session.
    #[error("no TLS session for descriptor {0}")]
    UnknownDescriptor(RawFd),

    /// A session is already registered for this descriptor.
    #[error("descriptor {0} already has a TLS session")]
    DuplicateSession(RawFd),

    /// Application data requested before the handshake completed.
    #[error("handshake not complete on descriptor {0}")]
    HandshakeIncomplete(RawFd),

    /// The handshake already failed; the session is unusable.
    #[error("handshake failed on descriptor {0}")]
    HandshakeFailed(RawFd),

    /// The peer closed the socket before the handshake completed.
    #[error("peer closed the connection during the handshake")]
    PeerClosed,

    /// The peer sent a fatal alert.
    #[error("fatal alert received: {0:?}")]
    FatalAlert(AlertDescription),

    /// The engine rejected inbound records or could not encode outbound ones.
    #[error("TLS engine error: {0}")]
    Engine(rustls::Error),

    /// The underlying descriptor failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl TlsError {
    /// True when the descriptor is non-blocking and not ready.
    pub fn is_would_block(&self) -> bool {
        matches!(self, TlsError::Io(e) if e.kind() == io::ErrorKind::WouldBlock)
    }
}

impl From<rustls::Error> for TlsError {
    fn from(err: rustls::Error) -> Self {
        match err {
            rustls::Error::AlertReceived(alert) => TlsError::FatalAlert(alert),
            other => TlsError::Engine(other),
        }
    }
}
