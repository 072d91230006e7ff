//! Oracle comparisons and the fallible merge sort that consumes them.
//!
//! The comparator answers from recorded judgments only. When it meets a
//! pair nobody has judged yet it answers [`Comparison::Unknown`] and the sort
//! stops right there, handing the pair back to the caller. Re-running the
//! sort after the pair is judged replays the same comparator calls up to that
//! point, so the next unknown pair is always a new one.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::types::{ComparisonElement, ComparisonPair, Outcome, PairKey, Slice};

/// Result of asking the oracle about two slices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Comparison {
    /// The pair has a recorded judgment.
    Known(Ordering),
    /// Nobody has judged the pair yet; the pair is oriented as asked.
    Unknown(ComparisonPair),
}

impl Comparison {
    /// Convert into a `Result` for use with [`try_merge_sort`].
    pub fn into_result(self) -> Result<Ordering, ComparisonPair> {
        match self {
            Self::Known(ordering) => Ok(ordering),
            Self::Unknown(pair) => Err(pair),
        }
    }
}

/// Current outcomes of judged pairs, keyed by unordered pair.
///
/// Built from comparison elements; only the latest judgment of each element
/// counts and unlabeled elements are skipped.
#[derive(Debug, Clone, Default)]
pub struct JudgmentIndex {
    outcomes: BTreeMap<PairKey, (Slice, Outcome)>,
}

impl JudgmentIndex {
    /// Index the current outcomes of `elements`.
    pub fn from_elements(elements: &[ComparisonElement]) -> Self {
        let outcomes = elements
            .iter()
            .filter_map(|e| {
                e.current_value()
                    .map(|outcome| (e.subject.key(), (e.subject.left.clone(), outcome.clone())))
            })
            .collect();
        Self { outcomes }
    }

    /// Number of judged pairs.
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    /// Whether no pair is judged.
    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// Ordering of `a` relative to `b`, if the pair was judged.
    pub fn ordering(&self, a: &Slice, b: &Slice) -> Option<Ordering> {
        let (left, outcome) = self.outcomes.get(&PairKey::new(a, b))?;
        let ordering = outcome.ordering();
        Some(if left == a { ordering } else { ordering.reverse() })
    }

    /// Ask the oracle about `a` versus `b`.
    pub fn compare(&self, a: &Slice, b: &Slice) -> Comparison {
        match self.ordering(a, b) {
            Some(ordering) => Comparison::Known(ordering),
            None => Comparison::Unknown(ComparisonPair::new(a.clone(), b.clone())),
        }
    }

    /// Strict preferences as `(winner, loser)`, in key order.
    pub fn decisive(&self) -> impl Iterator<Item = (&Slice, &Slice)> {
        self.outcomes.iter().filter_map(|(key, (left, outcome))| {
            let right = if key.low() == left { key.high() } else { key.low() };
            match outcome {
                Outcome::First => Some((left, right)),
                Outcome::Second => Some((right, left)),
                _ => None,
            }
        })
    }
}

/// Stable top-down merge sort with a fallible comparator.
///
/// Stops at the first comparator error and returns it. The sequence of
/// comparator calls depends only on the input order and the answers given,
/// which is what makes interactive re-runs resumable. Equal elements keep
/// their input order.
pub fn try_merge_sort<T, E, F>(items: &[T], mut cmp: F) -> Result<Vec<T>, E>
where
    T: Clone,
    F: FnMut(&T, &T) -> Result<Ordering, E>,
{
    sort_range(items, &mut cmp)
}

fn sort_range<T, E, F>(items: &[T], cmp: &mut F) -> Result<Vec<T>, E>
where
    T: Clone,
    F: FnMut(&T, &T) -> Result<Ordering, E>,
{
    if items.len() <= 1 {
        return Ok(items.to_vec());
    }

    let mid = items.len() / 2;
    let left = sort_range(&items[..mid], cmp)?;
    let right = sort_range(&items[mid..], cmp)?;

    let mut merged = Vec::with_capacity(items.len());
    let (mut i, mut j) = (0, 0);
    while i < left.len() && j < right.len() {
        // Ties take from the left run to stay stable
        if cmp(&left[i], &right[j])? == Ordering::Greater {
            merged.push(right[j].clone());
            j += 1;
        } else {
            merged.push(left[i].clone());
            i += 1;
        }
    }
    merged.extend_from_slice(&left[i..]);
    merged.extend_from_slice(&right[j..]);
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Element, Judgment, Orientation};

    fn slice(name: &str) -> Slice {
        Slice::new(name, 0, Orientation::Axial)
    }

    fn judged(index: usize, left: &str, right: &str, outcome: Outcome) -> ComparisonElement {
        let mut e = Element::new(index, ComparisonPair::new(slice(left), slice(right)));
        e.record(Judgment::now(outcome, 100)).unwrap();
        e
    }

    #[test]
    fn test_merge_sort_plain() {
        let sorted: Result<Vec<i32>, ()> = try_merge_sort(&[5, 3, 9, 1, 1, 7], |a, b| Ok(a.cmp(b)));
        assert_eq!(sorted.unwrap(), vec![1, 1, 3, 5, 7, 9]);
    }

    #[test]
    fn test_merge_sort_stable_on_ties() {
        let items = [(1, 'a'), (0, 'b'), (1, 'c'), (0, 'd')];
        let sorted: Result<Vec<_>, ()> = try_merge_sort(&items, |a, b| Ok(a.0.cmp(&b.0)));
        assert_eq!(sorted.unwrap(), vec![(0, 'b'), (0, 'd'), (1, 'a'), (1, 'c')]);
    }

    #[test]
    fn test_merge_sort_stops_on_error() {
        let mut calls = 0;
        let result: Result<Vec<i32>, (i32, i32)> = try_merge_sort(&[4, 3, 2, 1], |a, b| {
            calls += 1;
            if calls == 2 {
                Err((*a, *b))
            } else {
                Ok(a.cmp(b))
            }
        });
        assert_eq!(result, Err((2, 1)));
        assert_eq!(calls, 2);
    }

    #[test]
    fn test_index_ordering_both_orientations() {
        let index = JudgmentIndex::from_elements(&[judged(0, "a", "b", Outcome::First)]);
        assert_eq!(index.ordering(&slice("a"), &slice("b")), Some(Ordering::Greater));
        assert_eq!(index.ordering(&slice("b"), &slice("a")), Some(Ordering::Less));
        assert_eq!(index.ordering(&slice("a"), &slice("c")), None);
    }

    #[test]
    fn test_index_draws_are_equal() {
        let index = JudgmentIndex::from_elements(&[judged(0, "a", "b", Outcome::NotSure)]);
        assert_eq!(index.compare(&slice("b"), &slice("a")), Comparison::Known(Ordering::Equal));
        assert_eq!(index.decisive().count(), 0);
    }

    #[test]
    fn test_index_uses_latest_judgment() {
        let mut e = judged(0, "a", "b", Outcome::First);
        e.record(Judgment::now(Outcome::Second, 100)).unwrap();
        let index = JudgmentIndex::from_elements(&[e]);

        let decisive: Vec<_> = index.decisive().collect();
        assert_eq!(decisive, vec![(&slice("b"), &slice("a"))]);
    }

    #[test]
    fn test_unknown_keeps_orientation() {
        let index = JudgmentIndex::default();
        assert_eq!(
            index.compare(&slice("b"), &slice("a")),
            Comparison::Unknown(ComparisonPair::new(slice("b"), slice("a")))
        );
    }
}
