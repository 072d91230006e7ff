//! Judgments: timestamped outcomes recorded against session elements.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Outcome of a pairwise comparison.
///
/// Serialized as the label string shown to raters. Any label other than
/// "First" and "Second" is a draw for ordering and ranking purposes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Outcome {
    /// The left slice was chosen.
    First,
    /// The right slice was chosen.
    Second,
    /// Rater saw no difference.
    NoDifference,
    /// Rater could not decide.
    NotSure,
    /// Any other configured label.
    Other(String),
}

impl Outcome {
    /// Parse an outcome from its label. Never fails: unknown labels are `Other`.
    pub fn from_label(label: &str) -> Self {
        match label {
            "First" => Self::First,
            "Second" => Self::Second,
            "No Difference" => Self::NoDifference,
            "Not Sure" => Self::NotSure,
            other => Self::Other(other.to_string()),
        }
    }

    /// Label string for this outcome.
    pub fn label(&self) -> &str {
        match self {
            Self::First => "First",
            Self::Second => "Second",
            Self::NoDifference => "No Difference",
            Self::NotSure => "Not Sure",
            Self::Other(label) => label,
        }
    }

    /// Ordering of the left slice relative to the right one.
    ///
    /// `First` makes the left slice greater, `Second` makes it less,
    /// everything else is `Equal`.
    pub fn ordering(&self) -> Ordering {
        match self {
            Self::First => Ordering::Greater,
            Self::Second => Ordering::Less,
            _ => Ordering::Equal,
        }
    }

    /// Whether the outcome expresses a strict preference.
    pub fn is_decisive(&self) -> bool {
        matches!(self, Self::First | Self::Second)
    }
}

impl From<String> for Outcome {
    fn from(label: String) -> Self {
        Self::from_label(&label)
    }
}

impl From<Outcome> for String {
    fn from(outcome: Outcome) -> Self {
        outcome.label().to_string()
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A single recorded judgment.
///
/// `L` is the label type: [`Outcome`] for comparisons, `String` for
/// categorical labels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Judgment<L> {
    /// The recorded label.
    pub value: L,
    /// When the label was recorded.
    pub labeled_at: DateTime<Utc>,
    /// Time the rater spent on the element, in milliseconds.
    pub duration_ms: u32,
}

impl<L> Judgment<L> {
    /// Create a new judgment.
    pub fn new(value: L, labeled_at: DateTime<Utc>, duration_ms: u32) -> Self {
        Self {
            value,
            labeled_at,
            duration_ms,
        }
    }

    /// Create a judgment stamped with the current time.
    pub fn now(value: L, duration_ms: u32) -> Self {
        Self::new(value, Utc::now(), duration_ms)
    }
}
