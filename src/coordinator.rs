//! Store-backed sort coordination.
//!
//! The coordinator is the request-level entry point: load a session, run the
//! pure driver, persist the comparison it asks for. It keeps nothing between
//! calls, so any number of coordinators may serve the same store.

use std::sync::Arc;
use tracing::{debug, info};

use crate::ranking::{rank_session, RankedSlice};
use crate::sort::{advance, SortDecision};
use crate::store::SessionStore;
use crate::types::{Judgment, Outcome, SessionError, SessionId};

/// Error type for coordinator operations.
#[derive(Debug, thiserror::Error)]
pub enum CoordinatorError {
    /// Session not found.
    #[error("Session not found: {0}")]
    SessionNotFound(SessionId),

    /// Store operation failed.
    #[error("Store error: {0}")]
    StoreError(String),

    /// Session rejected the operation.
    #[error("Session error: {0}")]
    SessionError(#[from] SessionError),
}

impl CoordinatorError {
    /// Create from a store error.
    pub fn from_store<E: std::error::Error>(e: E) -> Self {
        Self::StoreError(e.to_string())
    }
}

/// Drives adaptive sorting for sessions held in a [`SessionStore`].
pub struct SortCoordinator<S: SessionStore> {
    store: Arc<S>,
}

impl<S: SessionStore> SortCoordinator<S> {
    /// Create a coordinator over a shared store.
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Compute the next step for a sort session.
    ///
    /// On [`SortDecision::NeedsNext`] the comparison is appended before it is
    /// returned; the returned element is the stored one. If another request
    /// appended first the store's conflict error is returned and nothing is
    /// written. Calling again then yields the pending element.
    pub async fn advance(&self, session_id: SessionId) -> Result<SortDecision, CoordinatorError> {
        let session = self
            .store
            .get_session(session_id)
            .await
            .map_err(CoordinatorError::from_store)?
            .ok_or(CoordinatorError::SessionNotFound(session_id))?;

        match advance(&session)? {
            SortDecision::NeedsNext(element) => {
                let stored = self
                    .store
                    .append_comparison(session_id, element.index, element.subject)
                    .await
                    .map_err(CoordinatorError::from_store)?;
                debug!(
                    session_id = %session_id,
                    index = stored.index,
                    pair = %stored.subject,
                    "Appended next comparison"
                );
                Ok(SortDecision::NeedsNext(stored))
            }
            decision @ SortDecision::Complete { .. } => {
                info!(session_id = %session_id, "Sort session complete");
                Ok(decision)
            }
            pending => Ok(pending),
        }
    }

    /// Record a rater's answer to a comparison.
    pub async fn record(
        &self,
        session_id: SessionId,
        index: usize,
        judgment: Judgment<Outcome>,
    ) -> Result<(), CoordinatorError> {
        self.store
            .record_judgment(session_id, index, judgment)
            .await
            .map_err(CoordinatorError::from_store)
    }

    /// Rank the slices of a comparison or sort session.
    pub async fn rank(&self, session_id: SessionId) -> Result<Vec<RankedSlice>, CoordinatorError> {
        let session = self
            .store
            .get_session(session_id)
            .await
            .map_err(CoordinatorError::from_store)?
            .ok_or(CoordinatorError::SessionNotFound(session_id))?;
        Ok(rank_session(&session)?)
    }

    /// Get the store.
    pub fn store(&self) -> &S {
        &self.store
    }
}
