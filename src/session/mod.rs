//! Per-connection TLS sessions.
//!
//! # Data Flow
//! ```text
//! first read event on fd
//!     → Session::new (engine bound to shared key material)
//!     → registry.rs (fd → Session, one registry per worker)
//!     → handshake.rs (NotStarted → Negotiating → Complete | Failed)
//!     → record.rs (read: ciphertext → plaintext, write: plaintext → ciphertext)
//!     → registry.remove on close (engine dropped)
//! ```
//!
//! # Design Decisions
//! - A session never leaves the worker that created it
//! - The engine is owned by the session; dropping the session releases it
//! - Application reads and writes are refused until the handshake completes

mod engine;
pub mod error;
pub mod handshake;
mod record;
pub mod registry;

use std::os::unix::io::RawFd;

pub use error::TlsError;
pub use handshake::{negotiate_async, Progress};
pub use registry::SessionRegistry;

use crate::net::tls::ServerKeys;
use crate::net::wire::Wire;
use engine::Engine;

/// Handshake state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakePhase {
    /// Session allocated, no bytes exchanged yet.
    NotStarted,
    /// Handshake records are being exchanged.
    Negotiating,
    /// Keys are established; application data may flow.
    Complete,
    /// The handshake failed. Terminal.
    Failed,
}

/// One TLS-terminated connection, keyed by its socket descriptor.
#[derive(Debug)]
pub struct Session {
    fd: RawFd,
    engine: Engine,
    phase: HandshakePhase,
}

impl Session {
    /// Allocate a session for `fd` against the shared key material.
    pub fn new(fd: RawFd, keys: &ServerKeys, write_limit: usize) -> Result<Self, TlsError> {
        let engine = Engine::new(keys, write_limit)?;
        tracing::trace!(fd, "TLS session allocated");
        Ok(Self {
            fd,
            engine,
            phase: HandshakePhase::NotStarted,
        })
    }

    pub fn fd(&self) -> RawFd {
        self.fd
    }

    pub fn phase(&self) -> HandshakePhase {
        self.phase
    }

    /// True once application data may flow.
    pub fn is_established(&self) -> bool {
        self.phase == HandshakePhase::Complete
    }

    fn ensure_established(&self) -> Result<(), TlsError> {
        match self.phase {
            HandshakePhase::Complete => Ok(()),
            HandshakePhase::Failed => Err(TlsError::HandshakeFailed(self.fd)),
            _ => Err(TlsError::HandshakeIncomplete(self.fd)),
        }
    }

    /// Send `close_notify` and flush it, best-effort.
    ///
    /// Called right before the session is dropped on close.
    pub fn shutdown(&mut self) {
        if !self.is_established() {
            return;
        }
        self.engine.close_notify();
        if let Err(e) = self.engine.flush(&mut Wire::new(self.fd)) {
            tracing::debug!(fd = self.fd, error = %e, "close_notify not delivered");
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        tracing::trace!(fd = self.fd, phase = ?self.phase, "TLS session released");
    }
}
