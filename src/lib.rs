//! # slice-rank-kernel
//!
//! Comparison sampling, adaptive sorting and ranking for image slices.
//!
//! The kernel answers one question per request:
//!
//! > Given everything raters have judged so far, is the pool **ordered**, and
//! > if not, which **single comparison** should be asked next?
//!
//! ## Core Contract
//!
//! 1. Draw a bounded, duplicate-free pool of slices from a dataset
//! 2. Build comparison tasks from the pool (exhaustive, budgeted or reused)
//! 3. Drive an adaptive sort that never re-asks a judged pair and resumes
//!    from the judgment log alone
//! 4. Rank independent judgments by score without assuming transitivity
//!
//! ## Architecture
//!
//! ```text
//! ExtentProvider → SliceSampler → pool → generate_pairs → ComparisonSlice session
//!                                   ↓
//!                       SortSlice session ⇄ advance ⇄ SessionStore
//!                                   ↓
//!                          rank / export / ComparisonList
//! ```
//!
//! ## Determinism Guarantees
//!
//! - Same policy + same seed + same dataset → identical slice pool
//! - Same pool + same judgments → identical next comparison or order
//! - Ties and draws resolve by structural slice order

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod types;
pub mod policy;
pub mod volume;
pub mod sampler;
pub mod pairs;
pub mod sort;
pub mod ranking;
pub mod store;
pub mod coordinator;
pub mod export;
pub mod canonical;

// Re-exports
pub use types::{
    ComparisonElement, ComparisonPair, Element, ImageElement, ItemId, Judgment, Orientation, Outcome, PairKey,
    Session, SessionContent, SessionError, SessionId, SessionInfo, SessionKind, Slice, SliceElement,
};
pub use policy::{PairingPolicy, SamplingPolicy};
pub use volume::{CacheConfig, CacheStats, ExtentCache, ExtentProvider, InMemoryDataset, VolumeError, VolumeHeader};
pub use sampler::{sample_slices, SamplingError, SliceSampler};
pub use pairs::{all_pairs, generate_pairs, reuse, sample_pairs, PairingError, Reused};
pub use sort::{advance, advance_pool, find_cycles, order_violations, JudgmentIndex, PreferenceCycle, SortDecision};
pub use ranking::{rank, rank_session, RankedSlice, ScoreRecord};
pub use store::{InMemoryError, InMemorySessionStore, SessionStore};
pub use coordinator::{CoordinatorError, SortCoordinator};
pub use export::{
    export_elements, export_judgments, import_elements, import_pairs, import_sort, ComparisonList, ElementRow,
    ElementSubject, ExportError, JudgmentRow, RowRole,
};
pub use canonical::{to_canonical_bytes, canonical_hash, canonical_hash_hex};

/// Schema version for exported rows and fingerprints.
/// Increment on breaking changes to any serialized type.
pub const SLICE_RANK_SCHEMA_VERSION: &str = "1.0.0";

/// Default sampling policy version identifier.
pub const DEFAULT_SAMPLING_POLICY: &str = "sampling_policy_v1";
