//! TLS handshake state machine.
//!
//! # Responsibilities
//! - Drive `NotStarted → Negotiating → Complete | Failed`
//! - Pump ciphertext between the descriptor and the engine
//! - Flush the engine's alert to the peer when negotiation fails
//!
//! # Design Decisions
//! - `advance` is resumable: every point where the descriptor is not ready
//!   returns `Progress::WantRead` / `Progress::WantWrite` instead of blocking
//! - The blocking driver waits with poll(2); the async driver awaits
//!   readiness on an `AsyncFd`
//! - `Failed` is terminal; the owner must drop the session

use std::io;
use std::os::unix::io::AsRawFd;

use tokio::io::unix::AsyncFd;

use crate::net::wire::{self, Readiness, Wire};
use crate::observability::metrics;
use crate::session::{HandshakePhase, Session, TlsError};

/// Where a handshake stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    /// Waiting for the peer's next flight.
    WantRead,
    /// Outbound handshake records are queued but the socket is full.
    WantWrite,
    /// Keys are established.
    Complete,
}

impl Session {
    /// Run the handshake as far as the descriptor allows.
    pub fn advance_handshake(&mut self) -> Result<Progress, TlsError> {
        match self.phase {
            HandshakePhase::Complete => return Ok(Progress::Complete),
            HandshakePhase::Failed => return Err(TlsError::HandshakeFailed(self.fd)),
            HandshakePhase::NotStarted => {
                tracing::debug!(fd = self.fd, "Starting TLS handshake");
                self.phase = HandshakePhase::Negotiating;
            }
            HandshakePhase::Negotiating => {}
        }

        match self.negotiate() {
            Ok(Progress::Complete) => {
                self.phase = HandshakePhase::Complete;
                metrics::record_handshake("complete");
                tracing::debug!(fd = self.fd, "TLS handshake complete");
                Ok(Progress::Complete)
            }
            Ok(progress) => Ok(progress),
            Err(err) => {
                self.phase = HandshakePhase::Failed;
                metrics::record_handshake("failed");
                tracing::debug!(fd = self.fd, error = %err, "TLS handshake failed");
                Err(err)
            }
        }
    }

    /// Blocking driver. Returns once the handshake completes or fails.
    pub fn handshake(&mut self) -> Result<(), TlsError> {
        loop {
            match self.advance_handshake()? {
                Progress::Complete => return Ok(()),
                Progress::WantRead => wire::wait(self.fd, Readiness::Readable)?,
                Progress::WantWrite => wire::wait(self.fd, Readiness::Writable)?,
            }
        }
    }

    fn negotiate(&mut self) -> Result<Progress, TlsError> {
        let mut wire = Wire::new(self.fd);
        loop {
            if self.engine.wants_write() {
                match self.engine.flush(&mut wire) {
                    Ok(sent) => tracing::trace!(fd = self.fd, sent, "Handshake records sent"),
                    Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(Progress::WantWrite),
                    Err(e) => return Err(e.into()),
                }
            }

            // Post-handshake records (session tickets) were flushed above.
            if !self.engine.is_handshaking() {
                return Ok(Progress::Complete);
            }

            match self.engine.fill(&mut wire) {
                Ok(0) => return Err(TlsError::PeerClosed),
                Ok(read) => tracing::trace!(fd = self.fd, read, "Handshake records received"),
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(Progress::WantRead),
                Err(e) => return Err(e.into()),
            }

            if let Err(err) = self.engine.process() {
                if matches!(err, TlsError::FatalAlert(_)) {
                    metrics::record_alert();
                }
                // The engine queued an alert describing the failure.
                let _ = self.engine.flush(&mut wire);
                return Err(err);
            }
        }
    }
}

/// Async driver over a non-blocking descriptor registered with tokio.
///
/// The session stays mutably borrowed until the handshake finishes, so no
/// read or write can run on it concurrently.
pub async fn negotiate_async<T: AsRawFd>(session: &mut Session, io: &AsyncFd<T>) -> Result<(), TlsError> {
    debug_assert_eq!(io.as_raw_fd(), session.fd());
    loop {
        match session.advance_handshake()? {
            Progress::Complete => return Ok(()),
            Progress::WantRead => io.readable().await?.clear_ready(),
            Progress::WantWrite => io.writable().await?.clear_ready(),
        }
    }
}
