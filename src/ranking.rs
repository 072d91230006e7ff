//! Score ranking over independent pairwise judgments.
//!
//! Unlike the adaptive sort, ranking makes no transitivity assumption. Each
//! decisive judgment moves one point from the loser to the winner and the
//! pool is ordered by the resulting score.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use crate::types::{ComparisonElement, Outcome, Session, SessionError, Slice};

/// Tally of one slice's judgments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScoreRecord {
    /// Wins minus losses.
    pub score: i64,
    /// Decisive judgments won.
    pub wins: u32,
    /// Decisive judgments lost.
    pub losses: u32,
    /// Non-decisive judgments.
    pub draws: u32,
    /// Judgments involving the slice, decisive or not.
    pub total: u32,
}

impl ScoreRecord {
    fn win(&mut self) {
        self.score += 1;
        self.wins += 1;
        self.total += 1;
    }

    fn loss(&mut self) {
        self.score -= 1;
        self.losses += 1;
        self.total += 1;
    }

    fn draw(&mut self) {
        self.draws += 1;
        self.total += 1;
    }
}

/// A slice with its tally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedSlice {
    /// The ranked slice.
    pub slice: Slice,
    /// Its tally.
    pub record: ScoreRecord,
}

/// Rank `pool` by score, highest first.
///
/// Only the current judgment of each comparison counts; unlabeled ones add
/// nothing. Every distinct slice of `pool` appears exactly once, including
/// slices that were never compared. Equal scores keep structural slice order.
/// Judgments against slices outside `pool` still count toward the pool side.
pub fn rank(pool: &[Slice], comparisons: &[ComparisonElement]) -> Vec<RankedSlice> {
    let mut records: BTreeMap<&Slice, ScoreRecord> = pool.iter().map(|s| (s, ScoreRecord::default())).collect();

    let mut tally = |slice: &Slice, apply: fn(&mut ScoreRecord)| {
        if let Some(record) = records.get_mut(slice) {
            apply(record);
        }
    };

    let mut judged = 0usize;
    for element in comparisons {
        let Some(outcome) = element.current_value() else {
            continue;
        };
        judged += 1;

        let pair = &element.subject;
        match outcome {
            Outcome::First => {
                tally(&pair.left, ScoreRecord::win);
                tally(&pair.right, ScoreRecord::loss);
            }
            Outcome::Second => {
                tally(&pair.left, ScoreRecord::loss);
                tally(&pair.right, ScoreRecord::win);
            }
            _ => {
                tally(&pair.left, ScoreRecord::draw);
                tally(&pair.right, ScoreRecord::draw);
            }
        }
    }

    // BTreeMap iteration is structural order; the stable sort keeps it for ties
    let mut ranked: Vec<RankedSlice> = records
        .into_iter()
        .map(|(slice, record)| RankedSlice {
            slice: slice.clone(),
            record,
        })
        .collect();
    ranked.sort_by(|a, b| b.record.score.cmp(&a.record.score));

    debug!(pool_size = ranked.len(), judged, "Ranked slices by score");
    ranked
}

/// Rank the slices of a session that holds comparisons.
///
/// Fails with [`SessionError::InconsistentSessionType`] for categorical
/// sessions.
pub fn rank_session(session: &Session) -> Result<Vec<RankedSlice>, SessionError> {
    if !session.kind().has_comparisons() {
        return Err(SessionError::InconsistentSessionType {
            operation: "rank",
            found: session.kind(),
        });
    }
    let pool = session.slices()?;
    let comparisons = session.comparisons()?;
    Ok(rank(&pool, comparisons))
}
