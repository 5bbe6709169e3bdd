//! Per-worker session registry.
//!
//! Maps socket descriptors to sessions for exactly one worker. The worker owns
//! the registry outright, so lookups take `&self`/`&mut self` and never lock.

use std::collections::BTreeMap;
use std::os::unix::io::RawFd;

use crate::session::{Session, TlsError};

/// Ordered fd → session map owned by one worker.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: BTreeMap<RawFd, Session>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn find(&self, fd: RawFd) -> Option<&Session> {
        self.sessions.get(&fd)
    }

    pub fn find_mut(&mut self, fd: RawFd) -> Option<&mut Session> {
        self.sessions.get_mut(&fd)
    }

    /// Register a session. Fails if its descriptor is already registered;
    /// the existing session is left untouched.
    pub fn insert(&mut self, session: Session) -> Result<&mut Session, TlsError> {
        use std::collections::btree_map::Entry;

        match self.sessions.entry(session.fd()) {
            Entry::Occupied(_) => Err(TlsError::DuplicateSession(session.fd())),
            Entry::Vacant(slot) => Ok(slot.insert(session)),
        }
    }

    /// Detach a session. Dropping the returned value releases its engine.
    pub fn remove(&mut self, fd: RawFd) -> Option<Session> {
        self.sessions.remove(&fd)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Registered descriptors, ascending.
    pub fn descriptors(&self) -> impl Iterator<Item = RawFd> + '_ {
        self.sessions.keys().copied()
    }
}
