//! Raw descriptor I/O.
//!
//! Thin wrappers over the BSD socket calls the host already exposes. Every
//! descriptor here is borrowed: nothing in this module takes ownership of an
//! fd except [`close`].

use std::io;
use std::os::unix::io::RawFd;
use std::ptr;

/// Retry a raw call while it fails with `EINTR`.
fn retry_eintr(mut call: impl FnMut() -> isize) -> io::Result<usize> {
    loop {
        let result = call();
        if result >= 0 {
            return Ok(result as usize);
        }
        let err = io::Error::last_os_error();
        if err.kind() != io::ErrorKind::Interrupted {
            return Err(err);
        }
    }
}

/// `read(2)` into `buf`.
pub fn raw_read(fd: RawFd, buf: &mut [u8]) -> io::Result<usize> {
    retry_eintr(|| unsafe { libc::read(fd, buf.as_mut_ptr() as *mut libc::c_void, buf.len()) })
}

/// `write(2)` from `buf`. Short writes are returned as-is.
pub fn raw_write(fd: RawFd, buf: &[u8]) -> io::Result<usize> {
    retry_eintr(|| unsafe { libc::write(fd, buf.as_ptr() as *const libc::c_void, buf.len()) })
}

/// `pread(2)` at `offset` without moving the file position.
pub fn raw_pread(fd: RawFd, buf: &mut [u8], offset: u64) -> io::Result<usize> {
    let offset = libc::off_t::try_from(offset)
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "file offset out of range"))?;
    retry_eintr(|| unsafe {
        libc::pread(fd, buf.as_mut_ptr() as *mut libc::c_void, buf.len(), offset)
    })
}

/// Accept one connection from a listening descriptor.
pub fn accept(listen_fd: RawFd) -> io::Result<RawFd> {
    let fd = retry_eintr(|| unsafe {
        libc::accept(listen_fd, ptr::null_mut(), ptr::null_mut()) as isize
    })?;
    Ok(fd as RawFd)
}

/// Shut down both directions of a connected socket without closing it.
///
/// A thread blocked reading the socket wakes up with end of stream.
pub fn shutdown(fd: RawFd) -> io::Result<()> {
    if unsafe { libc::shutdown(fd, libc::SHUT_RDWR) } < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

/// Close a descriptor. The caller gives up ownership.
pub fn close(fd: RawFd) -> io::Result<()> {
    // EINTR from close(2) must not be retried on Linux: the fd is already gone.
    if unsafe { libc::close(fd) } < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

/// What [`wait`] blocks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    Readable,
    Writable,
}

/// Block until `fd` is readable or writable. Hang-ups and errors count as
/// ready so the following read or write reports them.
pub fn wait(fd: RawFd, readiness: Readiness) -> io::Result<()> {
    let events = match readiness {
        Readiness::Readable => libc::POLLIN,
        Readiness::Writable => libc::POLLOUT,
    };
    let mut pollfd = libc::pollfd { fd, events, revents: 0 };
    retry_eintr(|| unsafe { libc::poll(&mut pollfd, 1, -1) as isize })?;
    Ok(())
}

/// A borrowed descriptor presented as `Read + Write` so the TLS engine can
/// pull ciphertext from and push ciphertext to it.
#[derive(Debug, Clone, Copy)]
pub struct Wire {
    fd: RawFd,
}

impl Wire {
    pub fn new(fd: RawFd) -> Self {
        Self { fd }
    }
}

impl io::Read for Wire {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        raw_read(self.fd, buf)
    }
}

impl io::Write for Wire {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        raw_write(self.fd, buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
