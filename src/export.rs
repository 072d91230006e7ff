//! Flat export formats.
//!
//! Sessions leave the kernel as JSON lines of flat rows so they can be
//! diffed, loaded into a spreadsheet, or fed back in to found a new session.
//! A row carries up to two slices; fields that do not apply to the element
//! kind are omitted rather than written as null. A sort session writes its
//! pool first, as slice rows tagged `"role":"pool"` and indexed by pool
//! position, followed by its comparison rows.
//!
//! [`ComparisonList`] is the shareable form of a pair list: the pairs plus a
//! canonical fingerprint, so two sessions can prove they compared the same
//! material.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::canonical::canonical_hash_hex;
use crate::types::{
    ComparisonPair, Element, ItemId, Judgment, Orientation, Session, SessionContent, SessionError, Slice,
};
use crate::SLICE_RANK_SCHEMA_VERSION;

/// Error type for export and import.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// A line was not valid JSON for the row type.
    #[error("Line {line}: {source}")]
    Json {
        /// 1-based line number.
        line: usize,
        /// Parser error.
        #[source]
        source: serde_json::Error,
    },

    /// Serialization failed.
    #[error("Serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    /// A comparison list document was not valid JSON.
    #[error("Invalid comparison list: {0}")]
    Parse(#[source] serde_json::Error),

    /// A row had a half-specified slice.
    #[error("Element {index}: {reason}")]
    MalformedRow {
        /// Element index of the row.
        index: usize,
        /// What is missing.
        reason: &'static str,
    },

    /// A comparison list does not match its fingerprint.
    #[error("Fingerprint mismatch: recorded {recorded}, computed {computed}")]
    FingerprintMismatch {
        /// Fingerprint stored in the list.
        recorded: String,
        /// Fingerprint of the pairs as loaded.
        computed: String,
    },

    /// The rows do not form a valid session.
    #[error(transparent)]
    Session(#[from] SessionError),
}

/// What a row stands for within its session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowRole {
    /// A labeled element.
    #[default]
    Element,
    /// A member of a sort pool.
    Pool,
}

impl RowRole {
    fn is_element(&self) -> bool {
        *self == Self::Element
    }
}

/// One element as a flat row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementRow {
    /// Element index.
    pub index: usize,
    /// First (or only) item.
    pub item_1: ItemId,
    /// Axis index of the first slice.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slice_1_index: Option<u32>,
    /// Orientation of the first slice.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slice_1_orientation: Option<Orientation>,
    /// Second item of a comparison.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_2: Option<ItemId>,
    /// Axis index of the second slice.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slice_2_index: Option<u32>,
    /// Orientation of the second slice.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slice_2_orientation: Option<Orientation>,
    /// Element or pool member; omitted for elements.
    #[serde(default, skip_serializing_if = "RowRole::is_element")]
    pub role: RowRole,
}

/// What a row describes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementSubject {
    /// A whole item.
    Image(ItemId),
    /// A single slice.
    Slice(Slice),
    /// A comparison.
    Pair(ComparisonPair),
}

impl ElementRow {
    /// Row for a whole-item element.
    pub fn image(index: usize, item: &ItemId) -> Self {
        Self {
            index,
            item_1: item.clone(),
            slice_1_index: None,
            slice_1_orientation: None,
            item_2: None,
            slice_2_index: None,
            slice_2_orientation: None,
            role: RowRole::Element,
        }
    }

    /// Row for a slice element.
    pub fn slice(index: usize, slice: &Slice) -> Self {
        Self {
            slice_1_index: Some(slice.axis_index),
            slice_1_orientation: Some(slice.orientation),
            ..Self::image(index, &slice.item_id)
        }
    }

    /// Row for a member of a sort pool.
    pub fn pool_slice(index: usize, slice: &Slice) -> Self {
        Self {
            role: RowRole::Pool,
            ..Self::slice(index, slice)
        }
    }

    /// Row for a comparison element.
    pub fn pair(index: usize, pair: &ComparisonPair) -> Self {
        Self {
            item_2: Some(pair.right.item_id.clone()),
            slice_2_index: Some(pair.right.axis_index),
            slice_2_orientation: Some(pair.right.orientation),
            ..Self::slice(index, &pair.left)
        }
    }

    /// Interpret the row.
    pub fn subject(&self) -> Result<ElementSubject, ExportError> {
        let malformed = |reason| ExportError::MalformedRow {
            index: self.index,
            reason,
        };

        let first = match (self.slice_1_index, self.slice_1_orientation) {
            (Some(index), Some(orientation)) => Some(Slice::new(self.item_1.clone(), index, orientation)),
            (None, None) => None,
            _ => return Err(malformed("first slice needs both index and orientation")),
        };
        let second = match (&self.item_2, self.slice_2_index, self.slice_2_orientation) {
            (Some(item), Some(index), Some(orientation)) => Some(Slice::new(item.clone(), index, orientation)),
            (None, None, None) => None,
            _ => return Err(malformed("second slice needs item, index and orientation")),
        };

        match (first, second) {
            (None, None) => Ok(ElementSubject::Image(self.item_1.clone())),
            (Some(slice), None) => Ok(ElementSubject::Slice(slice)),
            (Some(left), Some(right)) => Ok(ElementSubject::Pair(ComparisonPair::new(left, right))),
            (None, Some(_)) => Err(malformed("second slice without a first")),
        }
    }
}

/// One judgment as a flat row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JudgmentRow {
    /// The judged element.
    #[serde(flatten)]
    pub element: ElementRow,
    /// Label as shown to the rater.
    pub value: String,
    /// When the judgment was made.
    pub labeled_at: DateTime<Utc>,
    /// Time the rater took.
    pub duration_ms: u32,
}

impl JudgmentRow {
    fn new<L: ToString>(element: ElementRow, judgment: &Judgment<L>) -> Self {
        Self {
            element,
            value: judgment.value.to_string(),
            labeled_at: judgment.labeled_at,
            duration_ms: judgment.duration_ms,
        }
    }
}

/// Rows for every element of a session, in index order.
///
/// Sort sessions lead with their pool.
pub fn element_rows(session: &Session) -> Vec<ElementRow> {
    match session.content() {
        SessionContent::CategoricalImage { elements } => {
            elements.iter().map(|e| ElementRow::image(e.index, &e.subject)).collect()
        }
        SessionContent::CategoricalSlice { elements } => {
            elements.iter().map(|e| ElementRow::slice(e.index, &e.subject)).collect()
        }
        SessionContent::ComparisonSlice { elements } => {
            elements.iter().map(|e| ElementRow::pair(e.index, &e.subject)).collect()
        }
        SessionContent::SortSlice { pool, comparisons } => pool
            .iter()
            .enumerate()
            .map(|(i, slice)| ElementRow::pool_slice(i, slice))
            .chain(comparisons.iter().map(|e| ElementRow::pair(e.index, &e.subject)))
            .collect(),
    }
}

/// Every judgment of a session, by element then by time.
///
/// Pool members carry no judgments and produce no rows.
pub fn export_judgments(session: &Session) -> Vec<JudgmentRow> {
    fn rows<S, L: ToString>(
        elements: &[Element<S, L>],
        row: impl Fn(&Element<S, L>) -> ElementRow,
    ) -> Vec<JudgmentRow> {
        elements
            .iter()
            .flat_map(|e| {
                let element = row(e);
                e.judgments()
                    .iter()
                    .map(move |j| JudgmentRow::new(element.clone(), j))
            })
            .collect()
    }

    match session.content() {
        SessionContent::CategoricalImage { elements } => rows(elements, |e| ElementRow::image(e.index, &e.subject)),
        SessionContent::CategoricalSlice { elements } => rows(elements, |e| ElementRow::slice(e.index, &e.subject)),
        SessionContent::ComparisonSlice { elements } | SessionContent::SortSlice { comparisons: elements, .. } => {
            rows(elements, |e| ElementRow::pair(e.index, &e.subject))
        }
    }
}

/// Write rows as JSON lines.
pub fn to_json_lines<T: Serialize>(rows: &[T]) -> Result<String, ExportError> {
    let mut out = String::new();
    for row in rows {
        out.push_str(&serde_json::to_string(row)?);
        out.push('\n');
    }
    Ok(out)
}

/// Read JSON lines, skipping blank lines.
pub fn from_json_lines<T: DeserializeOwned>(text: &str) -> Result<Vec<T>, ExportError> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| serde_json::from_str(line).map_err(|source| ExportError::Json { line: i + 1, source }))
        .collect()
}

/// Export the elements of a session as JSON lines.
pub fn export_elements(session: &Session) -> Result<String, ExportError> {
    let rows = element_rows(session);
    debug!(session_id = %session.id(), rows = rows.len(), "Exported session elements");
    to_json_lines(&rows)
}

/// Import element rows from JSON lines.
pub fn import_elements(text: &str) -> Result<Vec<ElementRow>, ExportError> {
    from_json_lines(text)
}

/// Import comparison pairs from JSON lines, in row order.
///
/// Pool rows are skipped.
pub fn import_pairs(text: &str) -> Result<Vec<ComparisonPair>, ExportError> {
    Ok(import_sort(text)?.1)
}

/// Import the pool and comparison pairs of an exported sort session.
///
/// Pool rows must be single slices. A session rebuilt from the result with
/// [`Session::sort`] and `push_comparison` exports the same rows.
pub fn import_sort(text: &str) -> Result<(Vec<Slice>, Vec<ComparisonPair>), ExportError> {
    let mut pool = Vec::new();
    let mut pairs = Vec::new();
    for row in import_elements(text)? {
        match (row.role, row.subject()?) {
            (RowRole::Pool, ElementSubject::Slice(slice)) => pool.push(slice),
            (RowRole::Element, ElementSubject::Pair(pair)) => pairs.push(pair),
            (RowRole::Pool, _) => {
                return Err(ExportError::MalformedRow {
                    index: row.index,
                    reason: "pool row is not a single slice",
                })
            }
            (RowRole::Element, _) => {
                return Err(ExportError::MalformedRow {
                    index: row.index,
                    reason: "not a comparison",
                })
            }
        }
    }
    Ok((pool, pairs))
}

/// A shareable, fingerprinted list of comparison pairs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonList {
    /// Display name.
    pub name: String,
    /// Orientation shared by every slice, if there is one.
    pub orientation: Option<Orientation>,
    /// Pairs in presentation order.
    pub pairs: Vec<ComparisonPair>,
    /// Canonical fingerprint of the pairs.
    pub fingerprint: String,
}

impl ComparisonList {
    /// Build a list and fingerprint it.
    pub fn new(name: impl Into<String>, pairs: Vec<ComparisonPair>) -> Self {
        let mut orientations = pairs.iter().flat_map(|p| [p.left.orientation, p.right.orientation]);
        let orientation = orientations
            .next()
            .filter(|first| orientations.all(|o| o == *first));

        Self {
            name: name.into(),
            orientation,
            fingerprint: Self::fingerprint_of(&pairs),
            pairs,
        }
    }

    /// Build from a comparison or sort session.
    pub fn from_session(session: &Session) -> Result<Self, SessionError> {
        let pairs = session.comparisons()?.iter().map(|e| e.subject.clone()).collect();
        Ok(Self::new(session.info.name.clone(), pairs))
    }

    /// Fingerprint of a pair list. Order and orientation matter.
    pub fn fingerprint_of(pairs: &[ComparisonPair]) -> String {
        canonical_hash_hex(&(SLICE_RANK_SCHEMA_VERSION, pairs))
    }

    /// Check the recorded fingerprint.
    pub fn verify(&self) -> Result<(), ExportError> {
        let computed = Self::fingerprint_of(&self.pairs);
        if computed != self.fingerprint {
            return Err(ExportError::FingerprintMismatch {
                recorded: self.fingerprint.clone(),
                computed,
            });
        }
        Ok(())
    }

    /// Serialize to JSON.
    pub fn to_json(&self) -> Result<String, ExportError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse and verify.
    pub fn from_json(text: &str) -> Result<Self, ExportError> {
        let list: Self = serde_json::from_str(text).map_err(ExportError::Parse)?;
        list.verify()?;
        Ok(list)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Outcome, SessionInfo};

    fn info() -> SessionInfo {
        SessionInfo::new("export", "dataset1", "prompt", vec!["First".into(), "Second".into()])
    }

    fn pairs() -> Vec<ComparisonPair> {
        vec![
            ComparisonPair::new(
                Slice::new("img1.nii.gz", 0, Orientation::Sagittal),
                Slice::new("img3", 1, Orientation::Coronal),
            ),
            ComparisonPair::new(
                Slice::new("img2.nii", 255, Orientation::Coronal),
                Slice::new("img1.nii.gz", 100, Orientation::Axial),
            ),
        ]
    }

    #[test]
    fn test_element_rows_round_trip_all_kinds() {
        let sessions = vec![
            Session::categorical_image(info(), vec!["img1".into(), "img2".into()]),
            Session::categorical_slice(info(), vec![Slice::new("img1", 4, Orientation::Axial)]),
            Session::comparison(info(), pairs()).unwrap(),
        ];

        for session in sessions {
            let text = export_elements(&session).unwrap();
            assert_eq!(import_elements(&text).unwrap(), element_rows(&session));
        }
    }

    #[test]
    fn test_sort_session_round_trip_keeps_pool() {
        let pool = vec![
            Slice::new("a", 1, Orientation::Axial),
            Slice::new("b", 2, Orientation::Axial),
            Slice::new("c", 3, Orientation::Axial),
        ];
        let mut session = Session::sort(info(), pool.clone()).unwrap();
        session
            .push_comparison(ComparisonPair::new(pool[2].clone(), pool[0].clone()))
            .unwrap();

        let text = export_elements(&session).unwrap();
        let rows = import_elements(&text).unwrap();
        assert_eq!(rows, element_rows(&session));
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0], ElementRow::pool_slice(0, &pool[0]));
        assert_eq!(rows[3], ElementRow::pair(0, &ComparisonPair::new(pool[2].clone(), pool[0].clone())));

        let (imported_pool, imported_pairs) = import_sort(&text).unwrap();
        assert_eq!(imported_pool, pool);
        let mut rebuilt = Session::sort(info(), imported_pool).unwrap();
        for pair in imported_pairs {
            rebuilt.push_comparison(pair).unwrap();
        }
        assert_eq!(export_elements(&rebuilt).unwrap(), text);
    }

    #[test]
    fn test_empty_sort_session_exports_pool() {
        let pool = vec![Slice::new("a", 1, Orientation::Axial), Slice::new("b", 2, Orientation::Axial)];
        let session = Session::sort(info(), pool.clone()).unwrap();

        let text = export_elements(&session).unwrap();
        assert_eq!(text.lines().count(), 2);
        assert!(text.contains("\"role\":\"pool\""));
        assert_eq!(import_sort(&text).unwrap(), (pool, vec![]));
        assert!(import_pairs(&text).unwrap().is_empty());
    }

    #[test]
    fn test_absent_fields_are_omitted() {
        let text = to_json_lines(&[ElementRow::image(0, &"img1".into())]).unwrap();
        assert_eq!(text, "{\"index\":0,\"item_1\":\"img1\"}\n");

        let row: ElementRow = serde_json::from_str("{\"index\":3,\"item_1\":\"img9\"}").unwrap();
        assert_eq!(row.subject().unwrap(), ElementSubject::Image("img9".into()));
    }

    #[test]
    fn test_import_pairs_keeps_orientation_and_order() {
        let session = Session::comparison(info(), pairs()).unwrap();
        let text = export_elements(&session).unwrap();
        assert_eq!(import_pairs(&text).unwrap(), pairs());
    }

    #[test]
    fn test_malformed_rows() {
        let half: ElementRow = serde_json::from_str("{\"index\":1,\"item_1\":\"a\",\"slice_1_index\":3}").unwrap();
        assert!(matches!(half.subject(), Err(ExportError::MalformedRow { index: 1, .. })));

        let err = import_elements("{\"index\":0,\"item_1\":\"a\"}\nnot json\n").unwrap_err();
        assert!(matches!(err, ExportError::Json { line: 2, .. }));

        let text = to_json_lines(&[ElementRow::slice(0, &Slice::new("a", 1, Orientation::Axial))]).unwrap();
        assert!(matches!(import_pairs(&text), Err(ExportError::MalformedRow { index: 0, .. })));
    }

    #[test]
    fn test_export_judgments_order() {
        let mut session = Session::comparison(info(), pairs()).unwrap();
        session.label_comparison(1, Judgment::now(Outcome::Second, 40)).unwrap();
        session.label_comparison(0, Judgment::now(Outcome::First, 10)).unwrap();
        session.label_comparison(0, Judgment::now(Outcome::NotSure, 20)).unwrap();

        let rows = export_judgments(&session);
        let summary: Vec<(usize, &str)> = rows.iter().map(|r| (r.element.index, r.value.as_str())).collect();
        assert_eq!(summary, vec![(0, "First"), (0, "Not Sure"), (1, "Second")]);

        let text = to_json_lines(&rows).unwrap();
        let back: Vec<JudgmentRow> = from_json_lines(&text).unwrap();
        assert_eq!(back, rows);
    }

    #[test]
    fn test_comparison_list_fingerprint() {
        let list = ComparisonList::new("list1", pairs());
        assert_eq!(list.orientation, None);
        assert!(list.verify().is_ok());

        let json = list.to_json().unwrap();
        assert_eq!(ComparisonList::from_json(&json).unwrap(), list);
        assert!(matches!(ComparisonList::from_json("{\"name\":"), Err(ExportError::Parse(_))));

        let mut reversed = pairs();
        reversed.reverse();
        assert_ne!(ComparisonList::fingerprint_of(&reversed), list.fingerprint);

        let mut tampered = list.clone();
        tampered.pairs.pop();
        assert!(matches!(tampered.verify(), Err(ExportError::FingerprintMismatch { .. })));
    }

    #[test]
    fn test_comparison_list_shared_orientation() {
        let axial = vec![ComparisonPair::new(
            Slice::new("a", 1, Orientation::Axial),
            Slice::new("b", 2, Orientation::Axial),
        )];
        assert_eq!(ComparisonList::new("axial", axial).orientation, Some(Orientation::Axial));
        assert_eq!(ComparisonList::new("empty", vec![]).orientation, None);
    }
}
