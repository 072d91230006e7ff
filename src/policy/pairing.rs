//! Pairing policy: how comparison tasks are built from a slice pool.

use serde::{Deserialize, Serialize};

use crate::canonical::canonical_hash_hex;
use crate::types::SessionId;

/// Strategy for building comparison pairs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum PairingPolicy {
    /// Every unordered combination once, shuffled.
    Exhaustive,
    /// A fixed number of random pairs, optionally capping uses per slice.
    Budgeted {
        /// Number of pairs to produce.
        comparison_count: usize,
        /// Maximum number of pairs any one slice may appear in.
        max_per_slice: Option<usize>,
    },
    /// Reuse the material of an existing session.
    Reuse {
        /// Session to copy slices or pairs from.
        source: SessionId,
    },
}

impl PairingPolicy {
    /// Number of pairs this policy yields for a pool of `n` slices, when
    /// that is known up front.
    pub fn expected_len(&self, n: usize) -> Option<usize> {
        match self {
            Self::Exhaustive => Some(n * n.saturating_sub(1) / 2),
            Self::Budgeted { comparison_count, .. } => Some(*comparison_count),
            Self::Reuse { .. } => None,
        }
    }

    /// Upper bound on the number of distinct pairs a pool of `n` slices can
    /// yield under this policy's per-slice cap.
    pub fn capacity(&self, n: usize) -> usize {
        let all = n * n.saturating_sub(1) / 2;
        match self {
            Self::Budgeted {
                max_per_slice: Some(cap), ..
            } => all.min(n * cap / 2),
            _ => all,
        }
    }

    /// Compute a hash of the policy parameters.
    pub fn params_hash(&self) -> String {
        canonical_hash_hex(self)
    }
}

impl Default for PairingPolicy {
    fn default() -> Self {
        Self::Exhaustive
    }
}
