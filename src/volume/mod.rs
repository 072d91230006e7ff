//! Volume extents: how far each item reaches along each orientation.
//!
//! The sampler never touches voxel data. It asks an [`ExtentProvider`] for
//! the eligible items of a dataset and for each item's extent along the
//! requested orientation. Providers typically answer from file headers.

pub mod cache;

use std::collections::BTreeMap;

use crate::types::{ItemId, Orientation};

pub use cache::{CacheConfig, CacheStats, ExtentCache};

/// Source of eligible items and their extents.
///
/// Implementations must return items in a deterministic order so that
/// seeded sampling is reproducible.
pub trait ExtentProvider {
    /// Error type for provider operations.
    type Error: std::error::Error + Send + Sync;

    /// Items slices may be drawn from.
    fn eligible_items(&self) -> Result<Vec<ItemId>, Self::Error>;

    /// Number of slices the item has along `orientation`.
    fn extent(&self, item: &ItemId, orientation: Orientation) -> Result<u32, Self::Error>;
}

impl<P: ExtentProvider + ?Sized> ExtentProvider for &P {
    type Error = P::Error;

    fn eligible_items(&self) -> Result<Vec<ItemId>, Self::Error> {
        (**self).eligible_items()
    }

    fn extent(&self, item: &ItemId, orientation: Orientation) -> Result<u32, Self::Error> {
        (**self).extent(item, orientation)
    }
}

/// Error type for volume header and dataset operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VolumeError {
    /// Item is not part of the dataset.
    #[error("Item not found: {0}")]
    ItemNotFound(ItemId),
    /// Header axes are not a permutation of the three orientations.
    #[error("Invalid axis codes in header: {0:?}")]
    InvalidAxes([u8; 3]),
}

/// Shape and axis layout of a stored volume.
///
/// `axes[d]` is the orientation stored along dimension `d`, so the extent
/// along an orientation does not depend on how the file was written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VolumeHeader {
    shape: [u32; 3],
    axes: [Orientation; 3],
}

impl VolumeHeader {
    /// Header for a volume stored in canonical (sagittal, coronal, axial) order.
    pub fn canonical(shape: [u32; 3]) -> Self {
        Self {
            shape,
            axes: Orientation::ALL,
        }
    }

    /// Header from a shape and per-dimension axis codes.
    pub fn from_axis_codes(shape: [u32; 3], codes: [u8; 3]) -> Result<Self, VolumeError> {
        let mut axes = Orientation::ALL;
        for (d, code) in codes.iter().enumerate() {
            axes[d] = Orientation::from_code(*code).ok_or(VolumeError::InvalidAxes(codes))?;
        }
        if Orientation::ALL.iter().any(|o| !axes.contains(o)) {
            return Err(VolumeError::InvalidAxes(codes));
        }
        Ok(Self { shape, axes })
    }

    /// Extent along `orientation`.
    pub fn extent(&self, orientation: Orientation) -> u32 {
        // Axes are a permutation, so the orientation is always found
        let dim = self.axes.iter().position(|a| *a == orientation).unwrap_or(0);
        self.shape[dim]
    }

    /// Stored shape.
    pub fn shape(&self) -> [u32; 3] {
        self.shape
    }
}

/// In-memory dataset for testing and for callers that pre-load headers.
///
/// Uses BTreeMap for deterministic item order.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDataset {
    headers: BTreeMap<ItemId, VolumeHeader>,
}

impl InMemoryDataset {
    /// Create an empty dataset.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an item.
    pub fn add_item(&mut self, item: impl Into<ItemId>, header: VolumeHeader) {
        self.headers.insert(item.into(), header);
    }

    /// Number of items.
    pub fn num_items(&self) -> usize {
        self.headers.len()
    }
}

impl ExtentProvider for InMemoryDataset {
    type Error = VolumeError;

    fn eligible_items(&self) -> Result<Vec<ItemId>, Self::Error> {
        Ok(self.headers.keys().cloned().collect())
    }

    fn extent(&self, item: &ItemId, orientation: Orientation) -> Result<u32, Self::Error> {
        self.headers
            .get(item)
            .map(|h| h.extent(orientation))
            .ok_or_else(|| VolumeError::ItemNotFound(item.clone()))
    }
}
