//! Core types for the slice rank kernel.

pub mod slice;
pub mod pair;
pub mod judgment;
pub mod session;

pub use slice::{ItemId, Orientation, Slice};
pub use pair::{ComparisonPair, PairKey};
pub use judgment::{Judgment, Outcome};
pub use session::{
    ComparisonElement, Element, ImageElement, Session, SessionContent, SessionError, SessionId, SessionInfo,
    SessionKind, SliceElement,
};
