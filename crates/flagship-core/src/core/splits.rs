// crates/flagship-core/src/core/splits.rs
// ============================================================================
// Module: Split Model
// Description: Feature (split) definition model with opaque condition payload.
// Purpose: Round-trip split definitions without interpreting matcher logic.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! A [`Split`] carries the handful of fields the storage subsystem and local
//! kill path need (name, traffic type, kill state, change number) and keeps
//! every other definition field in a flattened, opaque JSON remainder.
//! Evaluation logic lives elsewhere; this type only guarantees that unknown
//! fields survive a store/load round trip untouched.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

// ============================================================================
// SECTION: Split
// ============================================================================

/// Feature (split) definition.
///
/// # Invariants
/// - `name` uniquely identifies the split within a storage instance.
/// - `definition` preserves all fields not modeled explicitly; the storage
///   layer never interprets them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Split {
    /// Split name (unique key).
    pub name: String,
    /// Traffic type this split applies to.
    #[serde(default)]
    pub traffic_type_name: String,
    /// Whether the split has been killed.
    #[serde(default)]
    pub killed: bool,
    /// Treatment returned when the split is killed.
    #[serde(default)]
    pub default_treatment: String,
    /// Change number of the definition.
    #[serde(default)]
    pub change_number: i64,
    /// Opaque remainder of the serialized definition.
    #[serde(flatten)]
    pub definition: Map<String, Value>,
}

impl Split {
    /// Creates a split with an empty opaque definition.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        traffic_type_name: impl Into<String>,
        change_number: i64,
    ) -> Self {
        Self {
            name: name.into(),
            traffic_type_name: traffic_type_name.into(),
            killed: false,
            default_treatment: String::new(),
            change_number,
            definition: Map::new(),
        }
    }

    /// Applies a local kill: marks the split killed with the supplied default
    /// treatment and change number.
    pub fn local_kill(&mut self, default_treatment: impl Into<String>, change_number: i64) {
        self.killed = true;
        self.default_treatment = default_treatment.into();
        self.change_number = change_number;
    }

    /// Returns the names of all segments referenced by this split's
    /// conditions.
    ///
    /// The condition payload is opaque to the store, so references are
    /// discovered by walking the `conditions` array for `IN_SEGMENT`
    /// matchers. Definitions without conditions yield an empty set.
    #[must_use]
    pub fn segment_names(&self) -> BTreeSet<String> {
        let mut names = BTreeSet::new();
        let Some(conditions) = self.definition.get("conditions").and_then(Value::as_array) else {
            return names;
        };
        for condition in conditions {
            let matchers = condition
                .get("matcherGroup")
                .and_then(|group| group.get("matchers"))
                .and_then(Value::as_array);
            let Some(matchers) = matchers else {
                continue;
            };
            for matcher in matchers {
                if matcher.get("matcherType").and_then(Value::as_str) != Some("IN_SEGMENT") {
                    continue;
                }
                let segment = matcher
                    .get("userDefinedSegmentMatcherData")
                    .and_then(|data| data.get("segmentName"))
                    .and_then(Value::as_str);
                if let Some(segment) = segment {
                    names.insert(segment.to_string());
                }
            }
        }
        names
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
