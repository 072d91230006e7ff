//! Adaptive comparison-sort driver.
//!
//! The driver holds no state of its own. Every call re-derives progress from
//! the comparison elements already recorded for the session and answers one
//! of three ways:
//!
//! 1. the last comparison is still unanswered: ask it again ([`SortDecision::Pending`])
//! 2. the recorded judgments fully order the pool ([`SortDecision::Complete`])
//! 3. one more judgment is needed ([`SortDecision::NeedsNext`]); the caller
//!    appends the returned element and shows it to a rater
//!
//! ## Resumability
//!
//! The pool is put in structural order and sorted with a stable merge sort
//! whose comparator only knows recorded judgments. For a fixed pool and a
//! fixed set of answers the comparator calls happen in the same order on
//! every run, so each run stops at the first pair that has no answer yet.
//! Merge sort keeps the number of judgments near `n log n`.
//!
//! ## Ties and cycles
//!
//! Draw-like outcomes compare equal and keep structural order. Intransitive
//! judgments are not rejected: the result is an order, possibly one that
//! contradicts some judgments. [`SortDecision::Complete`] reports how many.

use tracing::{debug, warn};

use super::consistency::order_violations;
use super::oracle::{try_merge_sort, JudgmentIndex};
use crate::types::{ComparisonElement, Element, Session, SessionContent, SessionError, Slice};

/// Outcome of one [`advance`] call.
#[derive(Debug, Clone, PartialEq)]
pub enum SortDecision {
    /// Every comparison needed is judged.
    Complete {
        /// Pool in ascending order: a slice chosen over another comes after it.
        order: Vec<Slice>,
        /// Strict judgments the order contradicts (non-zero only for cyclic input).
        order_violations: usize,
    },
    /// An existing comparison is waiting for a judgment.
    Pending(ComparisonElement),
    /// A new comparison to append; its index is the current comparison count.
    NeedsNext(ComparisonElement),
}

impl SortDecision {
    /// The element a rater should judge next, if any.
    pub fn element(&self) -> Option<&ComparisonElement> {
        match self {
            Self::Pending(e) | Self::NeedsNext(e) => Some(e),
            Self::Complete { .. } => None,
        }
    }

    /// Whether sorting is finished.
    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Complete { .. })
    }

    /// Short name for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Complete { .. } => "complete",
            Self::Pending(_) => "pending",
            Self::NeedsNext(_) => "needs_next",
        }
    }
}

/// Advance the adaptive sort of a sort session.
///
/// Fails with [`SessionError::InconsistentSessionType`] for any other kind
/// of session. Never mutates the session.
pub fn advance(session: &Session) -> Result<SortDecision, SessionError> {
    let SessionContent::SortSlice { pool, comparisons } = session.content() else {
        return Err(SessionError::InconsistentSessionType {
            operation: "advance",
            found: session.kind(),
        });
    };

    let decision = advance_pool(pool, comparisons);
    debug!(
        session_id = %session.id(),
        pool_size = pool.len(),
        comparisons = comparisons.len(),
        decision = decision.kind(),
        "Advanced adaptive sort"
    );
    Ok(decision)
}

/// Advance over an explicit pool and comparison list.
///
/// Same contract as [`advance`] without the session wrapper.
pub fn advance_pool(pool: &[Slice], comparisons: &[ComparisonElement]) -> SortDecision {
    if let Some(last) = comparisons.last() {
        if !last.is_labeled() {
            return SortDecision::Pending(last.clone());
        }
    }

    let mut ordered = pool.to_vec();
    ordered.sort();
    ordered.dedup();

    let index = JudgmentIndex::from_elements(comparisons);
    match try_merge_sort(&ordered, |a, b| index.compare(a, b).into_result()) {
        Ok(order) => {
            let order_violations = order_violations(&order, &index);
            if order_violations > 0 {
                warn!(
                    order_violations,
                    judged = index.len(),
                    "Sort finished on intransitive judgments"
                );
            }
            SortDecision::Complete { order, order_violations }
        }
        Err(pair) => {
            // An unanswered element for this pair may already exist
            let key = pair.key();
            if let Some(open) = comparisons.iter().find(|e| !e.is_labeled() && e.subject.key() == key) {
                return SortDecision::Pending(open.clone());
            }
            SortDecision::NeedsNext(Element::new(comparisons.len(), pair))
        }
    }
}
