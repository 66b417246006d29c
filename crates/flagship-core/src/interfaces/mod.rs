// crates/flagship-core/src/interfaces/mod.rs
// ============================================================================
// Module: Flagship Storage Interfaces
// Description: Backend-agnostic storage contracts for flag client data.
// Purpose: Define the operation set a persistence backend must implement.
// Dependencies: crate::core, thiserror
// ============================================================================

//! ## Overview
//! These traits are the full contract between the storage subsystem and its
//! callers (evaluation code, telemetry producers, and the synchronization
//! scheduler). The operation set is deliberately fixed: keyed upserts for
//! configuration, bounded FIFO queues with overflow notification for
//! telemetry payloads, and snapshot-then-clear aggregation drains.
//!
//! Absent lookups return `Ok(None)` (or an empty collection), never an
//! error. Queue and aggregation writes never fail for capacity reasons;
//! overflow is a best-effort signal through a registered hook.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::collections::HashMap;

use thiserror::Error;

use crate::core::events::Event;
use crate::core::events::EventEnvelope;
use crate::core::impressions::Impression;
use crate::core::segments::Segment;
use crate::core::splits::Split;
use crate::core::telemetry::LatencyBuckets;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Storage contract errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
/// - Absent records are represented as `Ok(None)`, not as an error variant.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Backing engine reported an error.
    #[error("storage engine error: {0}")]
    Engine(String),
    /// A unique lookup matched more than one row (caller contract violation).
    #[error("storage uniqueness violation: {0}")]
    MultipleRecords(String),
    /// Payload serialization or deserialization failed.
    #[error("storage serialization error: {0}")]
    Serialization(String),
    /// Stored data is invalid.
    #[error("storage invalid data: {0}")]
    Invalid(String),
    /// Stored schema version is incompatible.
    #[error("storage version mismatch: {0}")]
    VersionMismatch(String),
}

// ============================================================================
// SECTION: Overflow Hook
// ============================================================================

/// Zero-argument callback invoked synchronously when a bounded queue crosses
/// its capacity or byte-budget threshold.
///
/// The hook must not call back into the same queue's `put` from the same
/// execution context.
pub type TableFullHook = Box<dyn Fn() + Send + Sync>;

// ============================================================================
// SECTION: Split Storage
// ============================================================================

/// Keyed upsert store for split (feature) definitions.
pub trait SplitStorage {
    /// Retrieves a split by name.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when the backing engine fails.
    fn get(&self, split_name: &str) -> Result<Option<Split>, StorageError>;

    /// Retrieves several splits by name. Every requested name is present in
    /// the result, absent splits as `None`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when the backing engine fails.
    fn fetch_many(&self, split_names: &[String])
    -> Result<HashMap<String, Option<Split>>, StorageError>;

    /// Stores a split, overwriting any existing definition with the same
    /// name.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when the backing engine fails.
    fn put(&self, split: &Split) -> Result<(), StorageError>;

    /// Removes a split. Returns true iff a definition existed.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when the backing engine fails.
    fn remove(&self, split_name: &str) -> Result<bool, StorageError>;

    /// Returns the latest split change number, or 0 when none is stored.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when the backing engine fails.
    fn get_change_number(&self) -> Result<i64, StorageError>;

    /// Sets the latest split change number.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when the backing engine fails.
    fn set_change_number(&self, change_number: i64) -> Result<(), StorageError>;

    /// Returns the names of all stored splits.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when the backing engine fails.
    fn get_split_names(&self) -> Result<Vec<String>, StorageError>;

    /// Returns all stored splits.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when the backing engine fails.
    fn get_all_splits(&self) -> Result<Vec<Split>, StorageError>;

    /// Returns true iff at least one stored split uses the traffic type.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when the backing engine fails.
    fn is_valid_traffic_type(&self, traffic_type_name: &str) -> Result<bool, StorageError>;

    /// Returns the union of segment names referenced by stored splits.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when the backing engine fails.
    fn get_segment_names(&self) -> Result<BTreeSet<String>, StorageError>;

    /// Applies a guarded local kill. A silent no-op when the stored global
    /// change number already supersedes `change_number`, or when the split
    /// is absent.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when the backing engine fails.
    fn kill_locally(
        &self,
        split_name: &str,
        default_treatment: &str,
        change_number: i64,
    ) -> Result<(), StorageError>;
}

// ============================================================================
// SECTION: Segment Storage
// ============================================================================

/// Keyed upsert store for segment membership images.
pub trait SegmentStorage {
    /// Retrieves a segment with its full membership.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when the backing engine fails.
    fn get(&self, segment_name: &str) -> Result<Option<Segment>, StorageError>;

    /// Stores a segment, replacing the entire membership image.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when the backing engine fails.
    fn put(&self, segment: &Segment) -> Result<(), StorageError>;

    /// Applies a membership delta: removes `to_remove`, adds `to_add`, and
    /// bumps the change number iff one is supplied. Creates the segment when
    /// absent.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when the backing engine fails.
    fn update(
        &self,
        segment_name: &str,
        to_add: &[String],
        to_remove: &[String],
        change_number: Option<i64>,
    ) -> Result<(), StorageError>;

    /// Returns the segment's change number, or `None` when the segment is
    /// absent or has never been assigned one.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when the backing engine fails.
    fn get_change_number(&self, segment_name: &str) -> Result<Option<i64>, StorageError>;

    /// Sets the segment's change number. A no-op when the segment is absent.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when the backing engine fails.
    fn set_change_number(&self, segment_name: &str, change_number: i64)
    -> Result<(), StorageError>;

    /// Returns true iff `key` belongs to the segment.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when the backing engine fails.
    fn segment_contains(&self, segment_name: &str, key: &str) -> Result<bool, StorageError>;
}

// ============================================================================
// SECTION: Membership Storage
// ============================================================================

/// Per-subject segment membership store (flat subject/segment pairs).
pub trait MembershipStorage {
    /// Returns the segment names the subject belongs to.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when the backing engine fails.
    fn get(&self, subject_key: &str) -> Result<Vec<String>, StorageError>;

    /// Replaces the subject's membership set.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when the backing engine fails.
    fn put(&self, subject_key: &str, segment_names: &[String]) -> Result<(), StorageError>;

    /// Returns true iff the subject belongs to the segment.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when the backing engine fails.
    fn segment_contains(&self, segment_name: &str, subject_key: &str)
    -> Result<bool, StorageError>;

    /// Deletes all membership rows.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when the backing engine fails.
    fn clear(&self) -> Result<(), StorageError>;
}

// ============================================================================
// SECTION: Impression Storage
// ============================================================================

/// Bounded FIFO queue for impressions.
pub trait ImpressionStorage {
    /// Inserts impressions and fires the overflow hook when the post-insert
    /// row count exceeds the configured capacity. Always returns true on
    /// success; producers are never rejected.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when the backing engine fails.
    fn put(&self, impressions: &[Impression]) -> Result<bool, StorageError>;

    /// Pops the oldest `count` impressions in insertion order, removing them.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when the backing engine fails.
    fn pop_many(&self, count: usize) -> Result<Vec<Impression>, StorageError>;

    /// Deletes all queued impressions.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when the backing engine fails.
    fn clear(&self) -> Result<(), StorageError>;

    /// Registers the overflow hook invoked synchronously from `put`.
    fn set_table_full_hook(&self, hook: TableFullHook);
}

// ============================================================================
// SECTION: Event Storage
// ============================================================================

/// Bounded FIFO queue for events with an additional byte budget.
pub trait EventStorage {
    /// Inserts events and fires the overflow hook when the post-insert row
    /// count exceeds the configured capacity or the cumulative byte size
    /// reaches the fixed ceiling. Always returns true on success.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when the backing engine fails.
    fn put(&self, events: &[EventEnvelope]) -> Result<bool, StorageError>;

    /// Pops the oldest `count` events in insertion order, removing them.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when the backing engine fails.
    fn pop_many(&self, count: usize) -> Result<Vec<Event>, StorageError>;

    /// Deletes all queued events.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when the backing engine fails.
    fn clear(&self) -> Result<(), StorageError>;

    /// Registers the overflow hook invoked synchronously from `put`.
    fn set_table_full_hook(&self, hook: TableFullHook);
}

// ============================================================================
// SECTION: Telemetry Storage
// ============================================================================

/// Atomic aggregation store for counters, gauges, and latency histograms.
pub trait TelemetryStorage {
    /// Increments one bucket of the named latency histogram, creating the
    /// histogram when absent. A no-op when `bucket` is out of range.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when the backing engine fails.
    fn inc_latency(&self, name: &str, bucket: usize) -> Result<(), StorageError>;

    /// Increments the named counter, creating it at zero when absent.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when the backing engine fails.
    fn inc_counter(&self, name: &str) -> Result<(), StorageError>;

    /// Sets the named gauge (last write wins), creating it when absent.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when the backing engine fails.
    fn put_gauge(&self, name: &str, value: i64) -> Result<(), StorageError>;

    /// Drains all counters: returns the current values and deletes the rows.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when the backing engine fails.
    fn pop_counters(&self) -> Result<HashMap<String, i64>, StorageError>;

    /// Drains all gauges: returns the current values and deletes the rows.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when the backing engine fails.
    fn pop_gauges(&self) -> Result<HashMap<String, i64>, StorageError>;

    /// Drains all latency histograms: returns the full bucket arrays and
    /// deletes the rows.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when the backing engine fails.
    fn pop_latencies(&self) -> Result<HashMap<String, LatencyBuckets>, StorageError>;

    /// Deletes all counters, gauges, and latency histograms.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when the backing engine fails.
    fn clear(&self) -> Result<(), StorageError>;
}
