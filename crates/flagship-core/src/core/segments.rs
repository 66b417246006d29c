// crates/flagship-core/src/core/segments.rs
// ============================================================================
// Module: Segment Model
// Description: Segment definition with its membership key set.
// Purpose: Represent a named set of member keys plus its change number.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! A [`Segment`] is a named membership set. Keys are held in a [`BTreeSet`]
//! so membership checks and replacements are deterministic regardless of
//! insertion order.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Segment
// ============================================================================

/// Segment definition with full membership image.
///
/// # Invariants
/// - `name` uniquely identifies the segment within a storage instance.
/// - `keys` holds each member at most once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    /// Segment name (unique key).
    pub name: String,
    /// Member keys belonging to the segment.
    pub keys: BTreeSet<String>,
    /// Change number of the membership image.
    pub change_number: i64,
}

impl Segment {
    /// Creates a segment from an iterator of member keys.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        keys: impl IntoIterator<Item = String>,
        change_number: i64,
    ) -> Self {
        Self {
            name: name.into(),
            keys: keys.into_iter().collect(),
            change_number,
        }
    }

    /// Returns true when `key` is a member of this segment.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.keys.contains(key)
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
