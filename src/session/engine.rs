//! Owned TLS engine handle.
//!
//! Wraps a `rustls::ServerConnection` and exposes the handful of operations
//! the handshake and record paths need: pull ciphertext in, decode it, push
//! ciphertext out, drain plaintext, stage plaintext. The connection state is
//! dropped with the `Engine`, exactly once.

use std::io::{self, Read, Write};

use rustls::ServerConnection;

use crate::net::tls::ServerKeys;
use crate::session::error::TlsError;

pub struct Engine {
    conn: ServerConnection,
}

impl Engine {
    /// Start a server-side engine against the shared key material.
    ///
    /// `write_limit` bounds the ciphertext the engine queues; plaintext offered
    /// beyond it is only partially accepted.
    pub fn new(keys: &ServerKeys, write_limit: usize) -> Result<Self, TlsError> {
        let mut conn = ServerConnection::new(keys.server_config())?;
        conn.set_buffer_limit(Some(write_limit));
        Ok(Self { conn })
    }

    pub fn is_handshaking(&self) -> bool {
        self.conn.is_handshaking()
    }

    pub fn wants_write(&self) -> bool {
        self.conn.wants_write()
    }

    /// Read one chunk of ciphertext from `wire` into the engine's receive
    /// buffer. Returns 0 at end of stream.
    pub fn fill(&mut self, wire: &mut dyn Read) -> io::Result<usize> {
        self.conn.read_tls(wire)
    }

    /// Decode whatever records have been received. Plaintext lands in the
    /// engine's reader; a `close_notify` shows up there as end of stream.
    pub fn process(&mut self) -> Result<(), TlsError> {
        self.conn.process_new_packets()?;
        Ok(())
    }

    /// Write all queued ciphertext to `wire`, looping over short writes.
    ///
    /// Stops with `WouldBlock` if the descriptor is not ready; anything not yet
    /// written stays queued in the engine.
    pub fn flush(&mut self, wire: &mut dyn Write) -> io::Result<usize> {
        let mut total = 0;
        while self.conn.wants_write() {
            match self.conn.write_tls(wire)? {
                0 => return Err(io::ErrorKind::WriteZero.into()),
                n => total += n,
            }
        }
        Ok(total)
    }

    /// Drain decoded plaintext into `buf`.
    ///
    /// `Ok(0)` means the peer closed cleanly; `WouldBlock` means nothing is
    /// buffered yet.
    pub fn read_plaintext(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.conn.reader().read(buf)
    }

    /// Offer plaintext for encryption. Returns how much the engine accepted.
    pub fn stage_plaintext(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.conn.writer().write(buf)
    }

    /// Queue a `close_notify` alert.
    pub fn close_notify(&mut self) {
        self.conn.send_close_notify();
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("handshaking", &self.conn.is_handshaking())
            .field("wants_write", &self.conn.wants_write())
            .finish()
    }
}
