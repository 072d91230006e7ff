//! Constrained random slice sampling.
//!
//! The sampler draws a bounded, duplicate-free slice pool from a dataset,
//! restricted to one orientation and to a percentage window of each item's
//! extent.

use rand::seq::{index, SliceRandom};
use rand::Rng;
use std::collections::BTreeSet;
use tracing::debug;

use crate::policy::SamplingPolicy;
use crate::types::{ItemId, Orientation, Slice};
use crate::volume::ExtentProvider;

/// Error type for sampling and pair generation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SamplingError {
    /// Percentage window is empty or out of bounds.
    #[error("Invalid slice range: min {min_pct}% must be below max {max_pct}% within 0..=100")]
    InvalidRange {
        /// Requested lower bound.
        min_pct: u8,
        /// Requested upper bound.
        max_pct: u8,
    },
    /// More items requested than the dataset offers.
    #[error("Insufficient pool: requested {requested} items, {available} available")]
    InsufficientPool {
        /// Items requested.
        requested: usize,
        /// Eligible items available.
        available: usize,
    },
    /// Pair generation ran out of eligible slices.
    #[error("Capacity exhausted after {produced} of {requested} comparisons")]
    CapacityExhausted {
        /// Pairs produced before running out.
        produced: usize,
        /// Pairs requested.
        requested: usize,
    },
    /// Extent provider failed.
    #[error("Extent provider error: {0}")]
    Extent(String),
}

impl SamplingError {
    /// Create a provider error from any error type.
    pub fn from_provider<E: std::error::Error>(e: E) -> Self {
        Self::Extent(e.to_string())
    }
}

/// Slice sampler over an extent provider.
///
/// ## Algorithm
///
/// 1. Validate the percentage window
/// 2. Choose `pool_size_limit` distinct items (without replacement)
/// 3. For each of `draw_count` draws:
///    - pick one of those items (with replacement)
///    - compute the floored window `[extent*min/100, extent*max/100)`
///    - use the single point if the window collapsed, else draw uniformly
/// 4. Deduplicate and return in structural order
pub struct SliceSampler<P: ExtentProvider> {
    provider: P,
    policy: SamplingPolicy,
}

impl<P: ExtentProvider> SliceSampler<P> {
    /// Create a new sampler.
    pub fn new(provider: P, policy: SamplingPolicy) -> Self {
        Self { provider, policy }
    }

    /// Get the policy.
    pub fn policy(&self) -> &SamplingPolicy {
        &self.policy
    }

    /// Get a reference to the provider.
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Draw a slice pool.
    ///
    /// The result holds at most `draw_count` slices, sorted structurally.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Vec<Slice>, SamplingError> {
        self.policy.validate()?;

        let eligible = self.provider.eligible_items().map_err(SamplingError::from_provider)?;
        let requested = self.policy.pool_size_limit;
        if requested > eligible.len() || (requested == 0 && self.policy.draw_count > 0) {
            return Err(SamplingError::InsufficientPool {
                requested,
                available: eligible.len(),
            });
        }

        let items: Vec<&ItemId> = index::sample(rng, eligible.len(), requested)
            .into_iter()
            .map(|i| &eligible[i])
            .collect();

        let mut slices = BTreeSet::new();
        for _ in 0..self.policy.draw_count {
            let Some(&item) = items.choose(rng) else { break };
            let slice = self.draw(item, rng)?;
            slices.insert(slice);
        }

        debug!(
            items = items.len(),
            draws = self.policy.draw_count,
            distinct = slices.len(),
            orientation = %self.policy.orientation,
            "Sampled slice pool"
        );

        Ok(slices.into_iter().collect())
    }

    fn draw<R: Rng + ?Sized>(&self, item: &ItemId, rng: &mut R) -> Result<Slice, SamplingError> {
        let orientation: Orientation = self.policy.orientation;
        let extent = self
            .provider
            .extent(item, orientation)
            .map_err(SamplingError::from_provider)?;

        let (lo, hi) = self.policy.index_window(extent);
        let axis_index = if lo >= hi { hi } else { rng.gen_range(lo..hi) };

        Ok(Slice::new(item.clone(), axis_index, orientation))
    }
}

/// Draw a slice pool in one call.
///
/// See [`SliceSampler`] for the algorithm and [`SamplingPolicy`] for the
/// parameters.
pub fn sample_slices<P, R>(provider: P, policy: SamplingPolicy, rng: &mut R) -> Result<Vec<Slice>, SamplingError>
where
    P: ExtentProvider,
    R: Rng + ?Sized,
{
    SliceSampler::new(provider, policy).sample(rng)
}
