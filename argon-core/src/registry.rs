//! Process-wide session registry
//!
//! Maps session handles to sessions. The map lock is synchronous and never
//! held across an await; each session carries its own async lock so that
//! requests against one session are serialized while different sessions
//! proceed fully in parallel.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::Mutex as AsyncMutex;
use tracing::debug;

use crate::error::{ArgonError, Result};
use crate::session::Session;
use crate::types::{OwnerId, SessionHandle, SessionKind};

/// A session behind its per-session request lock
pub type SharedSession = Arc<AsyncMutex<Session>>;

struct Entry {
    owner: OwnerId,
    session: SharedSession,
}

/// Registry of all live sessions
///
/// Constructed at service start and injected wherever sessions are
/// resolved; mutation is create/remove only, and is visible to all
/// concurrent lookups as soon as the call returns.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: Mutex<HashMap<SessionHandle, Entry>>,
}

impl SessionRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new session in the Initial state
    ///
    /// Fails with `DuplicateSession` if the handle is already live; the
    /// existing session is left untouched.
    pub fn create(
        &self,
        handle: SessionHandle,
        kind: SessionKind,
        app_id: impl Into<String>,
        owner: OwnerId,
    ) -> Result<SharedSession> {
        let mut sessions = self.sessions.lock();
        if sessions.contains_key(&handle) {
            return Err(ArgonError::DuplicateSession(handle.to_string()));
        }
        let session = Arc::new(AsyncMutex::new(Session::new(
            handle.clone(),
            kind,
            app_id.into(),
            owner,
        )));
        debug!(session = %handle, %kind, %owner, "session registered");
        sessions.insert(
            handle,
            Entry {
                owner,
                session: session.clone(),
            },
        );
        Ok(session)
    }

    /// Look up a live session; never creates one
    pub fn lookup(&self, handle: &SessionHandle) -> Option<SharedSession> {
        self.sessions
            .lock()
            .get(handle)
            .map(|entry| entry.session.clone())
    }

    /// Remove a session entry, returning it if it was present
    pub fn remove(&self, handle: &SessionHandle) -> Option<SharedSession> {
        let removed = self.sessions.lock().remove(handle);
        if removed.is_some() {
            debug!(session = %handle, "session removed from registry");
        }
        removed.map(|entry| entry.session)
    }

    /// Handles of every live session
    pub fn handles(&self) -> Vec<SessionHandle> {
        self.sessions.lock().keys().cloned().collect()
    }

    /// Handles of every session owned by the given connection
    pub fn handles_owned_by(&self, owner: OwnerId) -> Vec<SessionHandle> {
        self.sessions
            .lock()
            .iter()
            .filter(|(_, entry)| entry.owner == owner)
            .map(|(handle, _)| handle.clone())
            .collect()
    }

    /// Number of live sessions
    pub fn len(&self) -> usize {
        self.sessions.lock().len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.sessions.lock().is_empty()
    }
}
