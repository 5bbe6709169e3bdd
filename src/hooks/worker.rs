//! Per-worker hook implementation.
//!
//! A `Worker` belongs to exactly one host worker thread. It owns that thread's
//! session registry and resolves every hook call to a session by descriptor.

use std::io;
use std::os::unix::io::RawFd;
use std::sync::Arc;

use crate::config::WorkerConfig;
use crate::hooks::{EventAction, NetworkIo};
use crate::net::tls::ServerKeys;
use crate::net::wire;
use crate::observability::metrics;
use crate::session::{Session, SessionRegistry, TlsError};

#[derive(Debug)]
pub struct Worker {
    id: usize,
    keys: Arc<ServerKeys>,
    registry: SessionRegistry,
    write_buffer_limit: usize,
    send_file_chunk: usize,
}

impl Worker {
    pub fn new(id: usize, keys: Arc<ServerKeys>, config: &WorkerConfig) -> Self {
        tracing::debug!(worker = id, "Worker registry initialised");
        Self {
            id,
            keys,
            registry: SessionRegistry::new(),
            write_buffer_limit: config.write_buffer_limit,
            send_file_chunk: config.send_file_chunk.max(1),
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    /// First-read hook.
    ///
    /// A descriptor without a session gets one, and the handshake runs to
    /// completion before this returns. A failed handshake leaves nothing
    /// registered and asks the host to close.
    pub fn on_read_event(&mut self, fd: RawFd) -> EventAction {
        if self.registry.find(fd).is_some() {
            return EventAction::Next;
        }

        let session = match self.new_session(fd) {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!(worker = self.id, fd, error = %e, "Failed to allocate TLS session");
                return EventAction::Close;
            }
        };
        let session = match self.registry.insert(session) {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!(worker = self.id, fd, error = %e, "Session registration refused");
                return EventAction::Close;
            }
        };

        if let Err(e) = session.handshake() {
            tracing::debug!(worker = self.id, fd, error = %e, "Closing connection after handshake failure");
            self.registry.remove(fd);
            return EventAction::Close;
        }

        self.publish_active();
        EventAction::Next
    }

    /// Allocate an unregistered session for `fd` with this worker's limits.
    ///
    /// Used with [`crate::session::negotiate_async`] followed by
    /// [`Worker::adopt`].
    pub fn new_session(&self, fd: RawFd) -> Result<Session, TlsError> {
        Session::new(fd, &self.keys, self.write_buffer_limit)
    }

    /// Register a session whose handshake already completed elsewhere.
    pub fn adopt(&mut self, session: Session) -> Result<(), TlsError> {
        if !session.is_established() {
            return Err(TlsError::HandshakeIncomplete(session.fd()));
        }
        self.registry.insert(session)?;
        self.publish_active();
        Ok(())
    }

    fn session(&mut self, fd: RawFd) -> Result<&mut Session, TlsError> {
        self.registry.find_mut(fd).ok_or(TlsError::UnknownDescriptor(fd))
    }

    fn publish_active(&self) {
        metrics::set_active_sessions(self.id, self.registry.len());
    }
}

impl NetworkIo for Worker {
    fn accept(&mut self, listener: RawFd) -> Result<RawFd, TlsError> {
        let fd = wire::accept(listener)?;
        tracing::trace!(worker = self.id, fd, "Connection accepted");
        Ok(fd)
    }

    fn read(&mut self, fd: RawFd, buf: &mut [u8]) -> Result<usize, TlsError> {
        self.session(fd)?.read_plaintext(buf)
    }

    fn write(&mut self, fd: RawFd, buf: &[u8]) -> Result<usize, TlsError> {
        self.session(fd)?.write_plaintext(buf)
    }

    fn send_file(&mut self, fd: RawFd, file: RawFd, offset: &mut u64, count: usize) -> Result<usize, TlsError> {
        let mut chunk = vec![0u8; self.send_file_chunk.min(count)];
        let mut sent = 0;

        while sent < count {
            let want = chunk.len().min(count - sent);
            let filled = wire::raw_pread(file, &mut chunk[..want], *offset)?;
            if filled == 0 {
                tracing::debug!(fd, sent, count, "File ended before requested count");
                break;
            }

            let mut pos = 0;
            while pos < filled {
                let accepted = match self.write(fd, &chunk[pos..filled]) {
                    Ok(n) => n,
                    Err(e) if e.is_would_block() && sent > 0 => return Ok(sent),
                    Err(e) => return Err(e),
                };
                pos += accepted;
                sent += accepted;
                *offset += accepted as u64;
            }
        }

        Ok(sent)
    }

    fn close(&mut self, fd: RawFd) -> Result<(), TlsError> {
        if let Some(mut session) = self.registry.remove(fd) {
            session.shutdown();
            self.publish_active();
        }
        wire::close(fd).map_err(|e: io::Error| {
            tracing::debug!(worker = self.id, fd, error = %e, "close failed");
            TlsError::from(e)
        })
    }
}
