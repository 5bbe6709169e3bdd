//! Plugin surface exposed to the host server.
//!
//! # Data Flow
//! ```text
//! host startup
//!     → plugin.rs (TlsShim::start: load key material once)
//!
//! host worker thread init
//!     → TlsShim::worker() (fresh Worker, empty registry)
//!
//! read event on fd
//!     → worker.rs (on_read_event: lazy session + handshake)
//!     → NetworkIo::read / write / writev / send_file (plaintext in and out)
//!     → NetworkIo::close (session dropped, descriptor closed)
//! ```
//!
//! # Design Decisions
//! - The host only ever sees plaintext; the descriptor is its only handle
//! - Every hook takes `&mut self`: a worker's sessions are never shared
//! - `writev` stages into one buffer sized to the exact total before writing

pub mod plugin;
pub mod worker;

use std::io::IoSlice;
use std::os::unix::io::RawFd;

pub use plugin::TlsShim;
pub use worker::Worker;

use crate::session::TlsError;

/// What the host should do after a read-event hook returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventAction {
    /// Continue with the next handler for this event.
    Next,
    /// Close the connection.
    Close,
}

/// Descriptor I/O as the host's application logic sees it.
pub trait NetworkIo {
    /// Accept a connection on a listening descriptor.
    fn accept(&mut self, listener: RawFd) -> Result<RawFd, TlsError>;

    /// Read plaintext. For a non-empty `buf`, `Ok(0)` means the peer closed.
    /// An empty `buf` always yields `Ok(0)` and says nothing about the peer.
    fn read(&mut self, fd: RawFd, buf: &mut [u8]) -> Result<usize, TlsError>;

    /// Write plaintext. Returns how much was accepted; the caller retries the
    /// remainder.
    fn write(&mut self, fd: RawFd, buf: &[u8]) -> Result<usize, TlsError>;

    /// Gather `bufs` into one buffer and hand it to [`NetworkIo::write`].
    fn writev(&mut self, fd: RawFd, bufs: &[IoSlice<'_>]) -> Result<usize, TlsError> {
        let total: usize = bufs.iter().map(|b| b.len()).sum();
        let mut staged = Vec::with_capacity(total);
        for buf in bufs {
            staged.extend_from_slice(buf);
        }
        self.write(fd, &staged)
    }

    /// Push up to `count` bytes of `file`, starting at `*offset`, through the
    /// write path. `*offset` advances by exactly the bytes accepted.
    fn send_file(&mut self, fd: RawFd, file: RawFd, offset: &mut u64, count: usize) -> Result<usize, TlsError>;

    /// Tear down the session (if any) and close the descriptor.
    fn close(&mut self, fd: RawFd) -> Result<(), TlsError>;
}
