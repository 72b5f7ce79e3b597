//! Live sessions keyed by user.
//!
//! Uses `DashMap` so sessions for different users can start, end and take
//! input concurrently. A session's own lock serialises its input.

use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::info;

use crate::errors::SessionError;
use crate::session::{Reply, ReplSession};

pub struct SessionRegistry<K: Eq + Hash> {
    sessions: DashMap<K, Arc<ReplSession>>,
}

impl<K: Eq + Hash> Default for SessionRegistry<K> {
    fn default() -> Self {
        SessionRegistry {
            sessions: DashMap::new(),
        }
    }
}

impl<K: Eq + Hash + Clone + fmt::Debug> SessionRegistry<K> {
    pub fn new() -> Self {
        SessionRegistry::default()
    }

    /// Start a session for `key` built by `factory`.
    ///
    /// Racing starts for one key run `factory` at most once; the losers get
    /// [`SessionError::AlreadyActive`].
    ///
    /// `factory` runs while the shard holding `key` is locked. It must not
    /// call back into this registry, and other keys in that shard wait
    /// until it returns.
    pub fn start<F>(&self, key: K, factory: F) -> Result<Arc<ReplSession>, SessionError>
    where
        F: FnOnce() -> Result<ReplSession, SessionError>,
    {
        match self.sessions.entry(key) {
            Entry::Occupied(_) => Err(SessionError::AlreadyActive),
            Entry::Vacant(slot) => {
                let session = Arc::new(factory()?);
                info!(user = ?slot.key(), "started REPL session");
                slot.insert(Arc::clone(&session));
                Ok(session)
            }
        }
    }

    pub fn get(&self, key: &K) -> Option<Arc<ReplSession>> {
        self.sessions.get(key).map(|entry| Arc::clone(entry.value()))
    }

    pub fn is_active(&self, key: &K) -> bool {
        self.sessions.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Pass one line of input to `key`'s session.
    ///
    /// A reply of [`Reply::End`] also removes the session.
    pub fn accept_input(&self, key: &K, input: &str) -> Result<Reply, SessionError> {
        let session = self.get(key).ok_or(SessionError::NotActive)?;
        let reply = session.accept_input(input)?;
        if matches!(reply, Reply::End(_))
            && self
                .sessions
                .remove_if(key, |_, live| Arc::ptr_eq(live, &session))
                .is_some()
        {
            info!(user = ?key, "ended REPL session");
        }
        Ok(reply)
    }

    /// Remove and tear down `key`'s session. Returns `false` when none was
    /// active.
    pub fn end(&self, key: &K) -> bool {
        let Some((_, session)) = self.sessions.remove(key) else {
            return false;
        };
        session.end();
        info!(user = ?key, "ended REPL session");
        true
    }

    /// End every session, e.g. on shutdown.
    pub fn end_all(&self) {
        let keys: Vec<K> = self.sessions.iter().map(|entry| entry.key().clone()).collect();
        for key in keys {
            self.end(&key);
        }
    }
}
