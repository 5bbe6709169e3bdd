//! Record translation for established sessions.
//!
//! Read path: ciphertext from the descriptor → engine → plaintext for the
//! caller. Write path: caller plaintext → engine → ciphertext to the
//! descriptor.
//!
//! Plaintext decoded beyond what the caller's buffer holds stays queued in the
//! engine and is handed out by the next read; nothing is truncated.

use std::io;

use crate::net::wire::Wire;
use crate::observability::metrics;
use crate::session::{Session, TlsError};

impl Session {
    /// Deliver decrypted application data into `dst`.
    ///
    /// Returns `Ok(0)` when the peer has closed: either a `close_notify` alert
    /// or a socket EOF. A fatal alert from the peer is `TlsError::FatalAlert`.
    /// An empty `dst` also yields `Ok(0)` without touching the connection.
    pub fn read_plaintext(&mut self, dst: &mut [u8]) -> Result<usize, TlsError> {
        self.ensure_established()?;
        if dst.is_empty() {
            return Ok(0);
        }

        let mut wire = Wire::new(self.fd);
        let mut eof = false;
        loop {
            match self.engine.read_plaintext(dst) {
                Ok(0) => {
                    tracing::debug!(fd = self.fd, "close_notify received");
                    return Ok(0);
                }
                Ok(n) => {
                    tracing::trace!(fd = self.fd, bytes = n, "Plaintext delivered");
                    metrics::record_plaintext("read", n);
                    return Ok(n);
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock && !eof => {}
                Err(e) if e.kind() == io::ErrorKind::WouldBlock || e.kind() == io::ErrorKind::UnexpectedEof => {
                    tracing::debug!(fd = self.fd, "Peer closed without close_notify");
                    return Ok(0);
                }
                Err(e) => return Err(e.into()),
            }

            match self.engine.fill(&mut wire) {
                Ok(0) => eof = true,
                Ok(read) => tracing::trace!(fd = self.fd, read, "Records received"),
                Err(e) => return Err(e.into()),
            }

            if let Err(err) = self.engine.process() {
                if matches!(err, TlsError::FatalAlert(_)) {
                    metrics::record_alert();
                }
                let _ = self.engine.flush(&mut wire);
                return Err(err);
            }

            // Key updates and similar produce records of their own.
            self.flush_pending(&mut wire)?;
        }
    }

    /// Encrypt as much of `src` as the engine accepts and put it on the wire.
    ///
    /// Returns the number of plaintext bytes accepted; the caller retries the
    /// rest. The returned count never includes record overhead.
    pub fn write_plaintext(&mut self, src: &[u8]) -> Result<usize, TlsError> {
        self.ensure_established()?;
        if src.is_empty() {
            return Ok(0);
        }

        let mut wire = Wire::new(self.fd);
        // Ciphertext left over from an earlier WouldBlock goes out first.
        self.flush_pending(&mut wire)?;

        let accepted = self.engine.stage_plaintext(src)?;
        if accepted == 0 {
            return Err(io::Error::from(io::ErrorKind::WouldBlock).into());
        }
        tracing::trace!(fd = self.fd, offered = src.len(), accepted, "Plaintext staged");
        metrics::record_plaintext("write", accepted);

        self.flush_pending(&mut wire)?;
        Ok(accepted)
    }

    fn flush_pending(&mut self, wire: &mut Wire) -> Result<(), TlsError> {
        match self.engine.flush(wire) {
            Ok(0) => Ok(()),
            Ok(sent) => {
                tracing::trace!(fd = self.fd, sent, "Records sent");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                tracing::debug!(fd = self.fd, "Descriptor full, ciphertext stays queued");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}
