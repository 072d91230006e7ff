//! Comparison pair types.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::slice::Slice;

/// An ordered pair of slices shown side by side.
///
/// Left/right order decides what "First" and "Second" mean in a judgment.
/// For "already asked?" checks a pair and its reverse are the same
/// comparison; use [`ComparisonPair::key`] for that.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ComparisonPair {
    /// Slice shown first (left).
    pub left: Slice,
    /// Slice shown second (right).
    pub right: Slice,
}

impl ComparisonPair {
    /// Create a new pair.
    pub fn new(left: Slice, right: Slice) -> Self {
        Self { left, right }
    }

    /// Orientation-independent key.
    pub fn key(&self) -> PairKey {
        PairKey::new(&self.left, &self.right)
    }

    /// Whether both sides are the same slice.
    pub fn is_self_comparison(&self) -> bool {
        self.left == self.right
    }

    /// Whether the pair compares `a` with `b`, in either orientation.
    pub fn matches(&self, a: &Slice, b: &Slice) -> bool {
        (&self.left == a && &self.right == b) || (&self.left == b && &self.right == a)
    }

    /// The pair with sides swapped.
    pub fn reversed(&self) -> Self {
        Self::new(self.right.clone(), self.left.clone())
    }
}

impl fmt::Display for ComparisonPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({} vs {})", self.left, self.right)
    }
}

/// Unordered identity of a comparison.
///
/// The smaller slice (structural order) is always stored first, so
/// `(a, b)` and `(b, a)` produce equal keys.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PairKey(Slice, Slice);

impl PairKey {
    /// Build the canonical key for two slices.
    pub fn new(a: &Slice, b: &Slice) -> Self {
        if a <= b {
            Self(a.clone(), b.clone())
        } else {
            Self(b.clone(), a.clone())
        }
    }

    /// The structurally smaller slice.
    pub fn low(&self) -> &Slice {
        &self.0
    }

    /// The structurally larger slice.
    pub fn high(&self) -> &Slice {
        &self.1
    }
}
