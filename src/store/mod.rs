//! Session storage backends.

pub mod memory;

use async_trait::async_trait;
use crate::types::{ComparisonElement, ComparisonPair, Judgment, Outcome, Session, SessionId};

/// Trait for session storage backends.
///
/// The comparison log of a session is append-only. Implementations must
/// reject an append whose `expected_index` is not the current comparison
/// count, so two concurrent requests that computed the same next comparison
/// cannot both append it.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Error type for store operations.
    type Error: std::error::Error + Send + Sync;

    /// Fetch a session with all of its elements.
    async fn get_session(&self, id: SessionId) -> Result<Option<Session>, Self::Error>;

    /// Fetch the comparison elements of a session, in index order.
    async fn get_session_elements(&self, id: SessionId) -> Result<Vec<ComparisonElement>, Self::Error>;

    /// Append a comparison at `expected_index` and return the stored element.
    async fn append_comparison(
        &self,
        id: SessionId,
        expected_index: usize,
        pair: ComparisonPair,
    ) -> Result<ComparisonElement, Self::Error>;

    /// Record a judgment on the comparison at `index`.
    async fn record_judgment(
        &self,
        id: SessionId,
        index: usize,
        judgment: Judgment<Outcome>,
    ) -> Result<(), Self::Error>;
}

pub use memory::{InMemoryError, InMemorySessionStore};
