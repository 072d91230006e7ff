//! Comparison task generation.
//!
//! Three ways to turn a slice pool into comparison pairs:
//!
//! - [`all_pairs`]: every unordered combination once, shuffled
//! - [`sample_pairs`]: a budget of random pairs with an optional per-slice cap
//! - [`reuse`]: the material of an existing session
//!
//! Generated pairs never compare a slice with itself and never repeat an
//! unordered pair, so they can always found a valid session.

use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

use crate::policy::PairingPolicy;
use crate::sampler::SamplingError;
use crate::types::{ComparisonPair, PairKey, Session, SessionContent, SessionError, SessionId, Slice};

/// Error type for policy-driven pair generation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PairingError {
    /// Random generation failed.
    #[error(transparent)]
    Sampling(#[from] SamplingError),
    /// Source session is of the wrong kind.
    #[error(transparent)]
    Session(#[from] SessionError),
    /// Reuse requested without the source session.
    #[error("Source session not supplied: {0}")]
    MissingSource(SessionId),
}

fn distinct(slices: &[Slice]) -> Vec<&Slice> {
    let mut seen = BTreeSet::new();
    slices.iter().filter(|s| seen.insert(*s)).collect()
}

/// Every unordered pair of distinct slices exactly once, in random order.
///
/// Within a pair the slice that comes first in `slices` is on the left.
/// Duplicate input slices are ignored.
pub fn all_pairs<R: Rng + ?Sized>(slices: &[Slice], rng: &mut R) -> Vec<ComparisonPair> {
    let pool = distinct(slices);
    let mut pairs = Vec::with_capacity(pool.len() * pool.len().saturating_sub(1) / 2);

    for (i, left) in pool.iter().enumerate() {
        for right in &pool[i + 1..] {
            pairs.push(ComparisonPair::new((*left).clone(), (*right).clone()));
        }
    }

    pairs.shuffle(rng);
    pairs
}

/// A budget of random pairs.
///
/// Each pair takes a random left slice and a random right slice that has not
/// been paired with it yet. Every slice counts its uses; once a slice reaches
/// `max_per_slice` it leaves the eligible pool. Slices with no unused partner
/// left are dropped too.
///
/// Fails with [`SamplingError::CapacityExhausted`] when fewer than two
/// eligible slices remain before `comparison_count` pairs exist. The result
/// is never silently truncated.
pub fn sample_pairs<R: Rng + ?Sized>(
    slices: &[Slice],
    comparison_count: usize,
    max_per_slice: Option<usize>,
    rng: &mut R,
) -> Result<Vec<ComparisonPair>, SamplingError> {
    let mut eligible: Vec<Slice> = distinct(slices).into_iter().cloned().collect();
    if max_per_slice == Some(0) {
        eligible.clear();
    }

    let mut uses: BTreeMap<Slice, usize> = BTreeMap::new();
    let mut asked: BTreeSet<PairKey> = BTreeSet::new();
    let mut pairs = Vec::with_capacity(comparison_count);

    while pairs.len() < comparison_count {
        if eligible.len() < 2 {
            debug!(
                produced = pairs.len(),
                requested = comparison_count,
                "Pair sampling ran out of eligible slices"
            );
            return Err(SamplingError::CapacityExhausted {
                produced: pairs.len(),
                requested: comparison_count,
            });
        }

        let Some(left) = eligible.choose(rng).cloned() else { break };
        let partners: Vec<&Slice> = eligible
            .iter()
            .filter(|s| **s != left && !asked.contains(&PairKey::new(&left, s)))
            .collect();

        let Some(right) = partners.choose(rng).map(|s| (*s).clone()) else {
            // Saturated: partners only shrink, so it can never be used again
            eligible.retain(|s| *s != left);
            continue;
        };

        asked.insert(PairKey::new(&left, &right));
        for side in [&left, &right] {
            let count = uses.entry(side.clone()).or_insert(0);
            *count += 1;
            if max_per_slice.is_some_and(|cap| *count >= cap) {
                eligible.retain(|s| s != side);
            }
        }
        pairs.push(ComparisonPair::new(left, right));
    }

    Ok(pairs)
}

/// Material copied from an existing session.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Reused {
    /// Distinct slices.
    pub slices: Vec<Slice>,
    /// Distinct pairs with orientation and order as recorded.
    pub pairs: Vec<ComparisonPair>,
}

/// Extract the slices and pairs of a session to found a new one.
///
/// - categorical slice: its slices in element order, no pairs
/// - comparison: the distinct sides (structural order) and every pair
/// - sort: the pool and the comparisons asked so far
///
/// Categorical image sessions hold no slices and are rejected.
pub fn reuse(session: &Session) -> Result<Reused, SessionError> {
    let slices = session.slices()?;
    let pairs = match session.content() {
        SessionContent::ComparisonSlice { elements } | SessionContent::SortSlice { comparisons: elements, .. } => {
            let mut seen = BTreeSet::new();
            elements
                .iter()
                .filter(|e| seen.insert(e.subject.key()))
                .map(|e| e.subject.clone())
                .collect()
        }
        _ => Vec::new(),
    };

    Ok(Reused {
        slices: distinct(&slices).into_iter().cloned().collect(),
        pairs,
    })
}

/// Build pairs according to a [`PairingPolicy`].
///
/// `source` must be the session named by a `Reuse` policy; it is ignored
/// otherwise.
pub fn generate_pairs<R: Rng + ?Sized>(
    policy: &PairingPolicy,
    slices: &[Slice],
    source: Option<&Session>,
    rng: &mut R,
) -> Result<Vec<ComparisonPair>, PairingError> {
    match policy {
        PairingPolicy::Exhaustive => Ok(all_pairs(slices, rng)),
        PairingPolicy::Budgeted {
            comparison_count,
            max_per_slice,
        } => Ok(sample_pairs(slices, *comparison_count, *max_per_slice, rng)?),
        PairingPolicy::Reuse { source: id } => {
            let session = source
                .filter(|s| s.id() == *id)
                .ok_or(PairingError::MissingSource(*id))?;
            if !session.kind().has_comparisons() {
                return Err(SessionError::InconsistentSessionType {
                    operation: "generate_pairs",
                    found: session.kind(),
                }
                .into());
            }
            Ok(reuse(session)?.pairs)
        }
    }
}
