//! Sampling policy: which slices to draw from a dataset.

use serde::{Deserialize, Serialize};

use crate::canonical::canonical_hash_hex;
use crate::sampler::SamplingError;
use crate::types::Orientation;
use crate::DEFAULT_SAMPLING_POLICY;

/// Parameters for drawing a slice pool.
///
/// ## Parameters
///
/// - `pool_size_limit`: distinct items eligible for drawing (sampled without replacement)
/// - `draw_count`: slice draws to attempt (items drawn with replacement)
/// - `orientation`: axis every slice is cut along
/// - `min_pct` / `max_pct`: candidate index window as a percentage of the item's extent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SamplingPolicy {
    /// Policy version identifier.
    pub version: String,
    /// Number of distinct items slices may come from.
    pub pool_size_limit: usize,
    /// Number of draws; an upper bound on the number of distinct slices.
    pub draw_count: usize,
    /// Orientation of every drawn slice.
    pub orientation: Orientation,
    /// Lower bound of the index window, percent in `[0, 100)`.
    pub min_pct: u8,
    /// Upper bound of the index window, percent in `(0, 100]`.
    pub max_pct: u8,
}

impl SamplingPolicy {
    /// Create a new sampling policy.
    pub fn new(
        pool_size_limit: usize,
        draw_count: usize,
        orientation: Orientation,
        min_pct: u8,
        max_pct: u8,
    ) -> Self {
        Self {
            version: DEFAULT_SAMPLING_POLICY.to_string(),
            pool_size_limit,
            draw_count,
            orientation,
            min_pct,
            max_pct,
        }
    }

    /// Get the policy ID.
    pub fn policy_id(&self) -> &str {
        &self.version
    }

    /// Check the percentage window.
    pub fn validate(&self) -> Result<(), SamplingError> {
        if self.min_pct >= 100 || self.max_pct == 0 || self.max_pct > 100 || self.min_pct >= self.max_pct {
            return Err(SamplingError::InvalidRange {
                min_pct: self.min_pct,
                max_pct: self.max_pct,
            });
        }
        Ok(())
    }

    /// Index window `[lo, hi)` for an item with the given extent.
    ///
    /// Bounds are floored. When they collapse to one point the caller uses
    /// that point as the only candidate.
    pub fn index_window(&self, extent: u32) -> (u32, u32) {
        let extent = u64::from(extent);
        let lo = extent * u64::from(self.min_pct) / 100;
        let hi = extent * u64::from(self.max_pct) / 100;
        (lo as u32, hi as u32)
    }

    /// Compute a hash of the policy parameters.
    pub fn params_hash(&self) -> String {
        canonical_hash_hex(self)
    }
}

impl Default for SamplingPolicy {
    fn default() -> Self {
        Self {
            version: DEFAULT_SAMPLING_POLICY.to_string(),
            pool_size_limit: 10,
            draw_count: 20,
            orientation: Orientation::Axial,
            min_pct: 10,
            max_pct: 90,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_accepts_full_range() {
        let policy = SamplingPolicy::new(1, 1, Orientation::Axial, 0, 100);
        assert!(policy.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_inverted_range() {
        let policy = SamplingPolicy::new(1, 1, Orientation::Axial, 60, 40);
        assert!(matches!(policy.validate(), Err(SamplingError::InvalidRange { .. })));

        let policy = SamplingPolicy::new(1, 1, Orientation::Axial, 50, 50);
        assert!(policy.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_out_of_bounds() {
        assert!(SamplingPolicy::new(1, 1, Orientation::Axial, 100, 100).validate().is_err());
        assert!(SamplingPolicy::new(1, 1, Orientation::Axial, 0, 101).validate().is_err());
        assert!(SamplingPolicy::new(1, 1, Orientation::Axial, 0, 0).validate().is_err());
    }

    #[test]
    fn test_index_window_floors() {
        let policy = SamplingPolicy::new(1, 1, Orientation::Axial, 10, 90);
        assert_eq!(policy.index_window(256), (25, 230));
        // Tiny extents collapse
        assert_eq!(policy.index_window(1), (0, 0));
    }

    #[test]
    fn test_params_hash_changes() {
        let policy1 = SamplingPolicy::default();
        let mut policy2 = SamplingPolicy::default();
        assert_eq!(policy1.params_hash(), policy2.params_hash());

        policy2.orientation = Orientation::Coronal;
        assert_ne!(policy1.params_hash(), policy2.params_hash());
    }
}
