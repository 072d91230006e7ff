//! In-memory session store for testing.

use std::collections::BTreeMap;
use async_trait::async_trait;
use parking_lot::RwLock;

use crate::types::{ComparisonElement, ComparisonPair, Judgment, Outcome, Session, SessionError, SessionId};
use super::SessionStore;

/// Error type for in-memory store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InMemoryError {
    /// Session not found.
    #[error("Session not found: {0}")]
    SessionNotFound(SessionId),

    /// Another append already took this index.
    #[error("Comparison index conflict: expected {expected}, next is {next}")]
    IndexConflict {
        /// Index the caller computed.
        expected: usize,
        /// Index the store would assign.
        next: usize,
    },

    /// The session rejected the change.
    #[error(transparent)]
    Session(#[from] SessionError),
}

/// In-memory session store for testing.
///
/// Sessions live in a BTreeMap behind a lock; appends check and push under
/// the same write guard.
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<BTreeMap<SessionId, Session>>,
}

impl InMemorySessionStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a session.
    pub fn add_session(&self, session: Session) {
        self.sessions.write().insert(session.id(), session);
    }

    /// Get number of sessions.
    pub fn num_sessions(&self) -> usize {
        self.sessions.read().len()
    }

    /// All session IDs in order.
    pub fn session_ids(&self) -> Vec<SessionId> {
        self.sessions.read().keys().copied().collect()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    type Error = InMemoryError;

    async fn get_session(&self, id: SessionId) -> Result<Option<Session>, Self::Error> {
        Ok(self.sessions.read().get(&id).cloned())
    }

    async fn get_session_elements(&self, id: SessionId) -> Result<Vec<ComparisonElement>, Self::Error> {
        let sessions = self.sessions.read();
        let session = sessions.get(&id).ok_or(InMemoryError::SessionNotFound(id))?;
        Ok(session.comparisons()?.to_vec())
    }

    async fn append_comparison(
        &self,
        id: SessionId,
        expected_index: usize,
        pair: ComparisonPair,
    ) -> Result<ComparisonElement, Self::Error> {
        let mut sessions = self.sessions.write();
        let session = sessions.get_mut(&id).ok_or(InMemoryError::SessionNotFound(id))?;

        let next = session.comparisons()?.len();
        if expected_index != next {
            return Err(InMemoryError::IndexConflict {
                expected: expected_index,
                next,
            });
        }
        Ok(session.push_comparison(pair)?.clone())
    }

    async fn record_judgment(
        &self,
        id: SessionId,
        index: usize,
        judgment: Judgment<Outcome>,
    ) -> Result<(), Self::Error> {
        let mut sessions = self.sessions.write();
        let session = sessions.get_mut(&id).ok_or(InMemoryError::SessionNotFound(id))?;
        session.label_comparison(index, judgment)?;
        Ok(())
    }
}
