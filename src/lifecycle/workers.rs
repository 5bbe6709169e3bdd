//! Worker thread pool for the bundled host.
//!
//! # Responsibilities
//! - One OS thread per `Worker`, fed accepted descriptors over a queue
//! - Round-robin dispatch from the accept loop
//! - Ordered stop: refuse queued connections, unblock in-flight ones, join
//!
//! # Design Decisions
//! - Hook I/O blocks, so a stuck peer is unblocked with `shutdown(2)` on its
//!   socket rather than by waiting for it to leave
//! - The in-flight descriptor is published under a mutex; the stopping side
//!   shuts it down while holding that mutex, so the worker cannot close it
//!   (and the number cannot be reused) in between

use std::io;
use std::os::fd::{IntoRawFd, OwnedFd, RawFd};
use std::sync::{mpsc, Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};

use crate::hooks::{EventAction, NetworkIo, TlsShim, Worker};
use crate::lifecycle::Shutdown;
use crate::net::wire;
use crate::session::TlsError;

/// Descriptor a worker is currently serving, if any.
#[derive(Debug, Default)]
struct InFlight(Mutex<Option<RawFd>>);

impl InFlight {
    fn lock(&self) -> MutexGuard<'_, Option<RawFd>> {
        self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

struct Slot {
    queue: mpsc::Sender<OwnedFd>,
    in_flight: Arc<InFlight>,
    handle: JoinHandle<()>,
}

/// Fixed set of worker threads serving connections through the hooks.
pub struct WorkerPool {
    slots: Vec<Slot>,
    next: usize,
    shutdown: Shutdown,
}

impl WorkerPool {
    /// Start `threads` workers, each running `app` on every connection whose
    /// handshake succeeds.
    pub fn spawn<F>(shim: &TlsShim, threads: usize, shutdown: Shutdown, app: F) -> io::Result<Self>
    where
        F: Fn(&mut Worker, RawFd) -> Result<(), TlsError> + Send + Clone + 'static,
    {
        let mut slots = Vec::with_capacity(threads);
        for _ in 0..threads {
            let (queue, rx) = mpsc::channel();
            let worker = shim.worker();
            let in_flight = Arc::new(InFlight::default());

            let handle = {
                let in_flight = Arc::clone(&in_flight);
                let shutdown = shutdown.clone();
                let app = app.clone();
                thread::Builder::new()
                    .name(format!("tls-worker-{}", worker.id()))
                    .spawn(move || serve(worker, rx, &in_flight, &shutdown, app))?
            };
            slots.push(Slot { queue, in_flight, handle });
        }

        Ok(Self { slots, next: 0, shutdown })
    }

    /// Hand a connection to the next worker in turn.
    pub fn dispatch(&mut self, fd: OwnedFd) {
        if self.slots.is_empty() {
            return;
        }
        let index = self.next;
        self.next = (self.next + 1) % self.slots.len();
        if self.slots[index].queue.send(fd).is_err() {
            tracing::error!(worker = index, "Worker queue closed");
        }
    }

    /// Stop every worker and wait for the threads to exit.
    ///
    /// Queued connections are closed unserved; in-flight ones see end of
    /// stream on their next read.
    pub fn stop(self) {
        self.shutdown.trigger();

        let mut handles = Vec::with_capacity(self.slots.len());
        for slot in self.slots {
            drop(slot.queue);
            if let Some(fd) = *slot.in_flight.lock() {
                if let Err(e) = wire::shutdown(fd) {
                    tracing::debug!(fd, error = %e, "Socket shutdown failed");
                }
            }
            handles.push(slot.handle);
        }

        for handle in handles {
            if handle.join().is_err() {
                tracing::error!("Worker thread panicked");
            }
        }
    }
}

fn serve<F>(mut worker: Worker, queue: mpsc::Receiver<OwnedFd>, in_flight: &InFlight, shutdown: &Shutdown, app: F)
where
    F: Fn(&mut Worker, RawFd) -> Result<(), TlsError>,
{
    while let Ok(fd) = queue.recv() {
        let fd = fd.into_raw_fd();
        *in_flight.lock() = Some(fd);

        if shutdown.is_triggered() {
            tracing::debug!(worker = worker.id(), fd, "Dropping queued connection during shutdown");
        } else if worker.on_read_event(fd) == EventAction::Next {
            if let Err(e) = app(&mut worker, fd) {
                tracing::debug!(fd, error = %e, "Connection ended with error");
            }
        }

        *in_flight.lock() = None;
        if let Err(e) = worker.close(fd) {
            tracing::debug!(fd, error = %e, "Close failed");
        }
    }
    tracing::debug!(worker = worker.id(), "Worker stopped");
}
