//! Canonical serialization for deterministic fingerprints.
//!
//! Comparison lists and policies are fingerprinted so that a shared list can
//! be recognised later and a session can record exactly which parameters
//! produced it.
//!
//! ## Determinism Guarantees
//!
//! - Stable field order: struct fields serialize in declaration order
//! - Stable Vec order: vectors serialize in index order
//! - No HashMap allowed: use BTreeMap/BTreeSet for anything hashed

use serde::Serialize;
use xxhash_rust::xxh64::xxh64;

/// Serialize a value to canonical JSON bytes for hashing.
///
/// Only used with plain data types whose serialization cannot fail.
pub fn to_canonical_bytes<T: Serialize>(value: &T) -> Vec<u8> {
    serde_json::to_vec(value).expect("Canonical serialization failed")
}

/// Compute canonical hash of a serializable value.
pub fn canonical_hash<T: Serialize>(value: &T) -> u64 {
    let bytes = to_canonical_bytes(value);
    xxh64(&bytes, 0)
}

/// Compute canonical hash and return as hex string.
pub fn canonical_hash_hex<T: Serialize>(value: &T) -> String {
    format!("{:016x}", canonical_hash(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ComparisonPair, Orientation, Slice};

    #[test]
    fn test_determinism() {
        let pairs = vec![ComparisonPair::new(
            Slice::new("img1", 10, Orientation::Axial),
            Slice::new("img2", 20, Orientation::Axial),
        )];

        assert_eq!(canonical_hash(&pairs), canonical_hash(&pairs.clone()));
    }

    #[test]
    fn test_pair_orientation_changes_hash() {
        let pair = ComparisonPair::new(
            Slice::new("img1", 10, Orientation::Axial),
            Slice::new("img2", 20, Orientation::Axial),
        );

        assert_ne!(canonical_hash_hex(&pair), canonical_hash_hex(&pair.reversed()));
        assert_eq!(canonical_hash_hex(&pair).len(), 16);
    }
}
