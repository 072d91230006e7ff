//! Slice types: addressable 2-D cuts of volumetric items.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Identifier of a volumetric item within a dataset (usually its file name).
///
/// Ordered lexicographically by the underlying string.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    /// Create a new item identifier.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Get the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemId {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl From<String> for ItemId {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// Anatomical axis a slice is cut along.
///
/// The numeric codes match the axis codes stored in volume headers:
/// sagittal = 0, coronal = 1, axial = 2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Orientation {
    /// Left/right axis.
    Sagittal,
    /// Anterior/posterior axis.
    Coronal,
    /// Superior/inferior axis.
    Axial,
}

impl Orientation {
    /// All orientations in axis-code order.
    pub const ALL: [Orientation; 3] = [Self::Sagittal, Self::Coronal, Self::Axial];

    /// Parse an orientation from its name (case-insensitive).
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "SAGITTAL" => Some(Self::Sagittal),
            "CORONAL" => Some(Self::Coronal),
            "AXIAL" => Some(Self::Axial),
            _ => None,
        }
    }

    /// Parse an orientation from its header axis code.
    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.get(code as usize).copied()
    }

    /// Header axis code of this orientation.
    pub fn code(&self) -> u8 {
        match self {
            Self::Sagittal => 0,
            Self::Coronal => 1,
            Self::Axial => 2,
        }
    }

    /// Canonical upper-case name, as used in exports and for ordering.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Sagittal => "SAGITTAL",
            Self::Coronal => "CORONAL",
            Self::Axial => "AXIAL",
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A 2-D cut of a volumetric item.
///
/// Equality and hashing are structural. The total order used for
/// deterministic tie-breaking is `item_id`, then the orientation name,
/// then `axis_index`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Slice {
    /// Item the slice is cut from.
    pub item_id: ItemId,
    /// Position along the orientation axis.
    pub axis_index: u32,
    /// Axis the slice is cut along.
    pub orientation: Orientation,
}

impl Slice {
    /// Create a new slice.
    pub fn new(item_id: impl Into<ItemId>, axis_index: u32, orientation: Orientation) -> Self {
        Self {
            item_id: item_id.into(),
            axis_index,
            orientation,
        }
    }
}

impl fmt::Display for Slice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.item_id, self.orientation, self.axis_index)
    }
}

impl PartialOrd for Slice {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Slice {
    fn cmp(&self, other: &Self) -> Ordering {
        self.item_id
            .cmp(&other.item_id)
            .then_with(|| self.orientation.name().cmp(other.orientation.name()))
            .then_with(|| self.axis_index.cmp(&other.axis_index))
    }
}
