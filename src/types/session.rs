//! Labeling sessions and their elements.
//!
//! A session is a tagged variant over the four labeling modes. Each variant
//! carries only the element type it needs:
//!
//! | Kind | Elements | Labels |
//! |------|----------|--------|
//! | `CategoricalImage` | whole items | free-form category |
//! | `CategoricalSlice` | slices | free-form category |
//! | `ComparisonSlice` | fixed comparison pairs | [`Outcome`] |
//! | `SortSlice` | slice pool + comparisons appended while sorting | [`Outcome`] |
//!
//! Constructors enforce the structural invariants: element indexes are dense,
//! no pair compares a slice with itself, and an unordered pair appears at most
//! once per session.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use uuid::Uuid;

use super::judgment::{Judgment, Outcome};
use super::pair::ComparisonPair;
use super::slice::{ItemId, Slice};

/// Unique identifier for a labeling session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Wrap an existing UUID.
    pub fn new(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Generate a fresh random id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Get the inner UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for SessionId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// Labeling mode of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionKind {
    /// Categorical labels on whole items.
    CategoricalImage,
    /// Categorical labels on individual slices.
    CategoricalSlice,
    /// Judgments on a fixed list of comparison pairs.
    ComparisonSlice,
    /// Adaptive sorting of a slice pool.
    SortSlice,
}

impl SessionKind {
    /// Whether sessions of this kind hold comparison elements.
    pub fn has_comparisons(&self) -> bool {
        matches!(self, Self::ComparisonSlice | Self::SortSlice)
    }
}

impl fmt::Display for SessionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CategoricalImage => write!(f, "CATEGORICAL_IMAGE"),
            Self::CategoricalSlice => write!(f, "CATEGORICAL_SLICE"),
            Self::ComparisonSlice => write!(f, "COMPARISON_SLICE"),
            Self::SortSlice => write!(f, "SORT_SLICE"),
        }
    }
}

/// Error type for session operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// Operation invoked on a session of the wrong kind.
    #[error("Operation '{operation}' is not valid for {found} sessions")]
    InconsistentSessionType {
        /// Name of the rejected operation.
        operation: &'static str,
        /// Kind of the session it was invoked on.
        found: SessionKind,
    },
    /// A comparison pair has the same slice on both sides.
    #[error("Comparison of a slice with itself: {0}")]
    SelfComparison(String),
    /// An unordered pair appears more than once.
    #[error("Duplicate comparison in session: {0}")]
    DuplicatePair(String),
    /// A slice appears more than once in a sort pool.
    #[error("Duplicate slice in pool: {0}")]
    DuplicateSlice(String),
    /// A sort comparison names a slice outside the session's pool.
    #[error("Slice not in sort pool: {0}")]
    SliceNotInPool(String),
    /// Element indexes are not a dense 0..N-1 sequence.
    #[error("Element index gap: expected {expected}, found {found}")]
    NonDenseIndex {
        /// Index the element should have had.
        expected: usize,
        /// Index it actually had.
        found: usize,
    },
    /// No element with this index.
    #[error("Element not found: {0}")]
    ElementNotFound(usize),
    /// A judgment is older than the element's current one.
    #[error("Judgment for element {index} predates its current judgment")]
    NonMonotonicJudgment {
        /// Element index.
        index: usize,
    },
}

/// One unit of labeling work with its judgment history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element<S, L> {
    /// Dense position within its element list.
    pub index: usize,
    /// What is being labeled.
    pub subject: S,
    judgments: Vec<Judgment<L>>,
}

/// Element of a categorical image session.
pub type ImageElement = Element<ItemId, String>;
/// Element of a categorical slice session.
pub type SliceElement = Element<Slice, String>;
/// Element of a comparison or sort session.
pub type ComparisonElement = Element<ComparisonPair, Outcome>;

impl<S, L> Element<S, L> {
    /// Create an unlabeled element.
    pub fn new(index: usize, subject: S) -> Self {
        Self {
            index,
            subject,
            judgments: Vec::new(),
        }
    }

    /// Rebuild an element from a stored history, checking timestamp order.
    pub fn with_judgments(
        index: usize,
        subject: S,
        judgments: Vec<Judgment<L>>,
    ) -> Result<Self, SessionError> {
        let mut element = Self::new(index, subject);
        for judgment in judgments {
            element.record(judgment)?;
        }
        Ok(element)
    }

    /// Append a judgment. History must stay ordered by timestamp.
    pub fn record(&mut self, judgment: Judgment<L>) -> Result<(), SessionError> {
        if let Some(last) = self.judgments.last() {
            if judgment.labeled_at < last.labeled_at {
                return Err(SessionError::NonMonotonicJudgment { index: self.index });
            }
        }
        self.judgments.push(judgment);
        Ok(())
    }

    /// Most recent judgment, if any.
    pub fn current(&self) -> Option<&Judgment<L>> {
        self.judgments.last()
    }

    /// Value of the most recent judgment, if any.
    pub fn current_value(&self) -> Option<&L> {
        self.current().map(|j| &j.value)
    }

    /// Full judgment history, oldest first.
    pub fn judgments(&self) -> &[Judgment<L>] {
        &self.judgments
    }

    /// Whether the element has at least one judgment.
    pub fn is_labeled(&self) -> bool {
        !self.judgments.is_empty()
    }
}

/// Descriptive fields shared by every session kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionInfo {
    /// Session identifier.
    pub id: SessionId,
    /// Human-readable name, unique per dataset.
    pub name: String,
    /// Dataset the session draws from.
    pub dataset: String,
    /// Question shown to raters.
    pub prompt: String,
    /// Label values offered to raters.
    pub label_values: Vec<String>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl SessionInfo {
    /// Create session info with a fresh id and the current time.
    pub fn new(
        name: impl Into<String>,
        dataset: impl Into<String>,
        prompt: impl Into<String>,
        label_values: Vec<String>,
    ) -> Self {
        Self {
            id: SessionId::generate(),
            name: name.into(),
            dataset: dataset.into(),
            prompt: prompt.into(),
            label_values,
            created_at: Utc::now(),
        }
    }
}

/// Kind-specific session contents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionContent {
    /// Categorical labels on whole items.
    CategoricalImage {
        /// One element per item.
        elements: Vec<ImageElement>,
    },
    /// Categorical labels on slices.
    CategoricalSlice {
        /// One element per slice.
        elements: Vec<SliceElement>,
    },
    /// Fixed comparison list.
    ComparisonSlice {
        /// One element per pair.
        elements: Vec<ComparisonElement>,
    },
    /// Adaptive sort over a pool.
    SortSlice {
        /// Slices being sorted.
        pool: Vec<Slice>,
        /// Comparisons asked so far, in the order they were requested.
        comparisons: Vec<ComparisonElement>,
    },
}

impl SessionContent {
    /// Kind tag of this content.
    pub fn kind(&self) -> SessionKind {
        match self {
            Self::CategoricalImage { .. } => SessionKind::CategoricalImage,
            Self::CategoricalSlice { .. } => SessionKind::CategoricalSlice,
            Self::ComparisonSlice { .. } => SessionKind::ComparisonSlice,
            Self::SortSlice { .. } => SessionKind::SortSlice,
        }
    }
}

/// A labeling session.
///
/// Deserialization goes through [`Session::from_parts`], so a stored session
/// that breaks an invariant is rejected on load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SessionParts")]
pub struct Session {
    /// Descriptive fields.
    pub info: SessionInfo,
    content: SessionContent,
}

/// Unvalidated wire form of a [`Session`].
#[derive(Deserialize)]
struct SessionParts {
    info: SessionInfo,
    content: SessionContent,
}

impl TryFrom<SessionParts> for Session {
    type Error = SessionError;

    fn try_from(parts: SessionParts) -> Result<Self, Self::Error> {
        Self::from_parts(parts.info, parts.content)
    }
}

impl Session {
    /// Build a session from parts, validating every structural invariant.
    ///
    /// Element indexes must be dense, judgment histories ordered by time,
    /// comparisons free of self and duplicate pairs, and a sort pool free of
    /// duplicates with every compared slice drawn from it.
    pub fn from_parts(info: SessionInfo, content: SessionContent) -> Result<Self, SessionError> {
        match &content {
            SessionContent::CategoricalImage { elements } => check_elements(elements)?,
            SessionContent::CategoricalSlice { elements } => check_elements(elements)?,
            SessionContent::ComparisonSlice { elements } => check_comparisons(elements)?,
            SessionContent::SortSlice { pool, comparisons } => {
                let mut seen = BTreeSet::new();
                for slice in pool {
                    if !seen.insert(slice) {
                        return Err(SessionError::DuplicateSlice(slice.to_string()));
                    }
                }
                check_comparisons(comparisons)?;
                for element in comparisons {
                    check_in_pool(|s| seen.contains(s), &element.subject)?;
                }
            }
        }
        Ok(Self { info, content })
    }

    /// Categorical session over whole items.
    pub fn categorical_image(info: SessionInfo, items: Vec<ItemId>) -> Self {
        let elements = items
            .into_iter()
            .enumerate()
            .map(|(i, item)| Element::new(i, item))
            .collect();
        Self {
            info,
            content: SessionContent::CategoricalImage { elements },
        }
    }

    /// Categorical session over slices.
    pub fn categorical_slice(info: SessionInfo, slices: Vec<Slice>) -> Self {
        let elements = slices
            .into_iter()
            .enumerate()
            .map(|(i, slice)| Element::new(i, slice))
            .collect();
        Self {
            info,
            content: SessionContent::CategoricalSlice { elements },
        }
    }

    /// Comparison session over a fixed pair list.
    pub fn comparison(info: SessionInfo, pairs: Vec<ComparisonPair>) -> Result<Self, SessionError> {
        let elements = pairs
            .into_iter()
            .enumerate()
            .map(|(i, pair)| Element::new(i, pair))
            .collect();
        Self::from_parts(info, SessionContent::ComparisonSlice { elements })
    }

    /// Adaptive sort session over a slice pool. Starts with no comparisons.
    pub fn sort(info: SessionInfo, pool: Vec<Slice>) -> Result<Self, SessionError> {
        Self::from_parts(
            info,
            SessionContent::SortSlice {
                pool,
                comparisons: Vec::new(),
            },
        )
    }

    /// Session identifier.
    pub fn id(&self) -> SessionId {
        self.info.id
    }

    /// Labeling mode.
    pub fn kind(&self) -> SessionKind {
        self.content.kind()
    }

    /// Kind-specific contents.
    pub fn content(&self) -> &SessionContent {
        &self.content
    }

    /// Number of elements labeled in this session.
    ///
    /// For sort sessions this counts comparison elements only.
    pub fn element_count(&self) -> usize {
        match &self.content {
            SessionContent::CategoricalImage { elements } => elements.len(),
            SessionContent::CategoricalSlice { elements } => elements.len(),
            SessionContent::ComparisonSlice { elements } => elements.len(),
            SessionContent::SortSlice { comparisons, .. } => comparisons.len(),
        }
    }

    /// The slice pool of the session.
    ///
    /// - categorical slice: element slices in element order
    /// - comparison: distinct sides of all pairs, structurally sorted
    /// - sort: the declared pool
    pub fn slices(&self) -> Result<Vec<Slice>, SessionError> {
        match &self.content {
            SessionContent::CategoricalSlice { elements } => {
                Ok(elements.iter().map(|e| e.subject.clone()).collect())
            }
            SessionContent::ComparisonSlice { elements } => {
                let distinct: BTreeSet<&Slice> = elements
                    .iter()
                    .flat_map(|e| [&e.subject.left, &e.subject.right])
                    .collect();
                Ok(distinct.into_iter().cloned().collect())
            }
            SessionContent::SortSlice { pool, .. } => Ok(pool.clone()),
            SessionContent::CategoricalImage { .. } => Err(SessionError::InconsistentSessionType {
                operation: "slices",
                found: SessionKind::CategoricalImage,
            }),
        }
    }

    /// Comparison elements of comparison and sort sessions.
    pub fn comparisons(&self) -> Result<&[ComparisonElement], SessionError> {
        match &self.content {
            SessionContent::ComparisonSlice { elements } => Ok(elements),
            SessionContent::SortSlice { comparisons, .. } => Ok(comparisons),
            other => Err(SessionError::InconsistentSessionType {
                operation: "comparisons",
                found: other.kind(),
            }),
        }
    }

    /// Image elements of a categorical image session.
    pub fn images(&self) -> Result<&[ImageElement], SessionError> {
        match &self.content {
            SessionContent::CategoricalImage { elements } => Ok(elements),
            other => Err(SessionError::InconsistentSessionType {
                operation: "images",
                found: other.kind(),
            }),
        }
    }

    /// Slice elements of a categorical slice session.
    pub fn slice_elements(&self) -> Result<&[SliceElement], SessionError> {
        match &self.content {
            SessionContent::CategoricalSlice { elements } => Ok(elements),
            other => Err(SessionError::InconsistentSessionType {
                operation: "slice_elements",
                found: other.kind(),
            }),
        }
    }

    /// Append a comparison to a sort session.
    ///
    /// The new element gets the next dense index. Fails on self comparisons,
    /// slices outside the pool, and pairs already present in either
    /// orientation.
    pub fn push_comparison(&mut self, pair: ComparisonPair) -> Result<&ComparisonElement, SessionError> {
        let (pool, comparisons) = match &mut self.content {
            SessionContent::SortSlice { pool, comparisons } => (pool, comparisons),
            other => {
                return Err(SessionError::InconsistentSessionType {
                    operation: "push_comparison",
                    found: other.kind(),
                })
            }
        };

        if pair.is_self_comparison() {
            return Err(SessionError::SelfComparison(pair.to_string()));
        }
        check_in_pool(|s| pool.contains(s), &pair)?;
        let key = pair.key();
        if comparisons.iter().any(|e| e.subject.key() == key) {
            return Err(SessionError::DuplicatePair(pair.to_string()));
        }

        let index = comparisons.len();
        comparisons.push(Element::new(index, pair));
        Ok(&comparisons[index])
    }

    /// Record a comparison judgment on element `index`.
    pub fn label_comparison(&mut self, index: usize, judgment: Judgment<Outcome>) -> Result<(), SessionError> {
        let elements = match &mut self.content {
            SessionContent::ComparisonSlice { elements } => elements,
            SessionContent::SortSlice { comparisons, .. } => comparisons,
            other => {
                return Err(SessionError::InconsistentSessionType {
                    operation: "label_comparison",
                    found: other.kind(),
                })
            }
        };
        elements
            .get_mut(index)
            .ok_or(SessionError::ElementNotFound(index))?
            .record(judgment)
    }

    /// Record a categorical judgment on element `index`.
    pub fn label_category(&mut self, index: usize, judgment: Judgment<String>) -> Result<(), SessionError> {
        match &mut self.content {
            SessionContent::CategoricalImage { elements } => elements
                .get_mut(index)
                .ok_or(SessionError::ElementNotFound(index))?
                .record(judgment),
            SessionContent::CategoricalSlice { elements } => elements
                .get_mut(index)
                .ok_or(SessionError::ElementNotFound(index))?
                .record(judgment),
            other => Err(SessionError::InconsistentSessionType {
                operation: "label_category",
                found: other.kind(),
            }),
        }
    }
}

fn check_dense<S, L>(elements: &[Element<S, L>]) -> Result<(), SessionError> {
    for (expected, element) in elements.iter().enumerate() {
        if element.index != expected {
            return Err(SessionError::NonDenseIndex {
                expected,
                found: element.index,
            });
        }
    }
    Ok(())
}

fn check_elements<S, L>(elements: &[Element<S, L>]) -> Result<(), SessionError> {
    check_dense(elements)?;
    for element in elements {
        for window in element.judgments.windows(2) {
            if window[1].labeled_at < window[0].labeled_at {
                return Err(SessionError::NonMonotonicJudgment { index: element.index });
            }
        }
    }
    Ok(())
}

fn check_in_pool(in_pool: impl Fn(&Slice) -> bool, pair: &ComparisonPair) -> Result<(), SessionError> {
    for side in [&pair.left, &pair.right] {
        if !in_pool(side) {
            return Err(SessionError::SliceNotInPool(side.to_string()));
        }
    }
    Ok(())
}

fn check_comparisons(elements: &[ComparisonElement]) -> Result<(), SessionError> {
    check_elements(elements)?;
    let mut seen = BTreeSet::new();
    for element in elements {
        let pair = &element.subject;
        if pair.is_self_comparison() {
            return Err(SessionError::SelfComparison(pair.to_string()));
        }
        if !seen.insert(pair.key()) {
            return Err(SessionError::DuplicatePair(pair.to_string()));
        }
    }
    Ok(())
}
