// crates/flagship-core/src/core/impressions.rs
// ============================================================================
// Module: Impression Model
// Description: Evaluation impression queued for asynchronous delivery.
// Purpose: Represent one flag evaluation result as an opaque queue payload.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! An [`Impression`] records a single flag evaluation. The storage layer
//! serializes impressions to opaque JSON payloads; no field is used for
//! querying beyond insertion order.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Impression
// ============================================================================

/// One flag evaluation result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Impression {
    /// Key the flag was evaluated for.
    pub matched_key: String,
    /// Name of the evaluated feature.
    pub feature_name: String,
    /// Treatment returned by the evaluation.
    pub treatment: String,
    /// Label describing how the treatment was selected.
    pub label: String,
    /// Change number of the definition used.
    pub change_number: i64,
    /// Optional bucketing key used instead of the matched key.
    pub bucketing_key: Option<String>,
    /// Evaluation timestamp in unix milliseconds.
    pub time: i64,
}

impl Impression {
    /// Creates an impression.
    #[must_use]
    pub fn new(
        matched_key: impl Into<String>,
        feature_name: impl Into<String>,
        treatment: impl Into<String>,
        label: impl Into<String>,
        change_number: i64,
        bucketing_key: Option<String>,
        time: i64,
    ) -> Self {
        Self {
            matched_key: matched_key.into(),
            feature_name: feature_name.into(),
            treatment: treatment.into(),
            label: label.into(),
            change_number,
            bucketing_key,
            time,
        }
    }
}
