// crates/flagship-core/src/core/events.rs
// ============================================================================
// Module: Event Model
// Description: Tracked event plus its queue envelope with precomputed size.
// Purpose: Represent client events as opaque queue payloads with byte sizes.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! An [`Event`] is a tracked client event. Events are queued inside an
//! [`EventEnvelope`] that also carries the payload's precomputed byte size;
//! the event queue uses that size for its cumulative byte-budget overflow
//! check and for nothing else.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

// ============================================================================
// SECTION: Event
// ============================================================================

/// One tracked client event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    /// Key the event was tracked for.
    pub key: String,
    /// Traffic type of the key.
    pub traffic_type_name: String,
    /// Event type identifier.
    pub event_type_id: String,
    /// Optional numeric value attached to the event.
    pub value: Option<f64>,
    /// Event timestamp in unix milliseconds.
    pub timestamp: i64,
    /// Optional free-form event properties.
    pub properties: Option<Map<String, Value>>,
}

/// Queue envelope pairing an event with its serialized byte size.
#[derive(Debug, Clone, PartialEq)]
pub struct EventEnvelope {
    /// The tracked event.
    pub event: Event,
    /// Precomputed serialized size in bytes.
    pub size: i64,
}

impl EventEnvelope {
    /// Creates an envelope from an event and its byte size.
    #[must_use]
    pub const fn new(event: Event, size: i64) -> Self {
        Self { event, size }
    }
}
