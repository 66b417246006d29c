// crates/flagship-store-sqlite/src/records.rs
// ============================================================================
// Module: Record Kinds
// Description: Table-backed record models for every stored kind.
// Purpose: Map domain payloads onto the fixed relational schema.
// Dependencies: flagship-core, rusqlite, crate::record
// ============================================================================

//! ## Overview
//! One record struct per table, each implementing [`RecordModel`]. Records
//! are storage-shaped rather than domain-shaped: split and queue payloads are
//! carried as serialized JSON text, and latency distributions are flattened
//! into one fixed column per bucket. Conversion to and from domain types
//! happens in the specialized stores.

// ============================================================================
// SECTION: Imports
// ============================================================================

use flagship_core::LATENCY_BUCKET_COUNT;
use flagship_core::LatencyBuckets;
use rusqlite::Row;
use rusqlite::types::Value;

use crate::record::RecordModel;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Latency bucket column names, indexed by bucket number.
pub const LATENCY_BUCKET_COLUMNS: [&str; LATENCY_BUCKET_COUNT] = [
    "bucket_0",
    "bucket_1",
    "bucket_2",
    "bucket_3",
    "bucket_4",
    "bucket_5",
    "bucket_6",
    "bucket_7",
    "bucket_8",
    "bucket_9",
    "bucket_10",
    "bucket_11",
    "bucket_12",
    "bucket_13",
    "bucket_14",
    "bucket_15",
    "bucket_16",
    "bucket_17",
    "bucket_18",
    "bucket_19",
    "bucket_20",
    "bucket_21",
];

// ============================================================================
// SECTION: Configuration Records
// ============================================================================

/// Stored split definition, keyed by name.
#[derive(Debug, Clone)]
pub struct SplitRecord {
    /// Persistence identity, `None` until inserted.
    pub rowid: Option<i64>,
    /// Unique split name.
    pub name: String,
    /// Traffic type the split belongs to.
    pub traffic_type_name: String,
    /// Serialized split definition (JSON text).
    pub definition: String,
}

impl RecordModel for SplitRecord {
    const TABLE: &'static str = "flag_splits";
    const COLUMNS: &'static [&'static str] = &["name", "traffic_type_name", "definition"];

    fn rowid(&self) -> Option<i64> {
        self.rowid
    }

    fn set_rowid(&mut self, rowid: i64) {
        self.rowid = Some(rowid);
    }

    fn values(&self) -> Vec<Value> {
        vec![
            Value::from(self.name.clone()),
            Value::from(self.traffic_type_name.clone()),
            Value::from(self.definition.clone()),
        ]
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            rowid: Some(row.get(0)?),
            name: row.get(1)?,
            traffic_type_name: row.get(2)?,
            definition: row.get(3)?,
        })
    }
}

/// Named change-number watermark (e.g. the split list watermark).
#[derive(Debug, Clone)]
pub struct MetadataRecord {
    /// Persistence identity, `None` until inserted.
    pub rowid: Option<i64>,
    /// Watermark name.
    pub name: String,
    /// Watermark value.
    pub number: i64,
}

impl RecordModel for MetadataRecord {
    const TABLE: &'static str = "flag_metadata";
    const COLUMNS: &'static [&'static str] = &["name", "number"];

    fn rowid(&self) -> Option<i64> {
        self.rowid
    }

    fn set_rowid(&mut self, rowid: i64) {
        self.rowid = Some(rowid);
    }

    fn values(&self) -> Vec<Value> {
        vec![Value::from(self.name.clone()), Value::from(self.number)]
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            rowid: Some(row.get(0)?),
            name: row.get(1)?,
            number: row.get(2)?,
        })
    }
}

// ============================================================================
// SECTION: Segment Records
// ============================================================================

/// Stored segment header, keyed by name.
#[derive(Debug, Clone)]
pub struct SegmentRecord {
    /// Persistence identity, `None` until inserted.
    pub rowid: Option<i64>,
    /// Unique segment name.
    pub name: String,
    /// Segment change number; `None` until a synchronizer supplies one.
    pub change_number: Option<i64>,
}

impl RecordModel for SegmentRecord {
    const TABLE: &'static str = "flag_segments";
    const COLUMNS: &'static [&'static str] = &["name", "change_number"];

    fn rowid(&self) -> Option<i64> {
        self.rowid
    }

    fn set_rowid(&mut self, rowid: i64) {
        self.rowid = Some(rowid);
    }

    fn values(&self) -> Vec<Value> {
        vec![Value::from(self.name.clone()), Value::from(self.change_number)]
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            rowid: Some(row.get(0)?),
            name: row.get(1)?,
            change_number: row.get(2)?,
        })
    }
}

/// One member key of a stored segment.
///
/// # Invariants
/// - `segment_id` references an existing segment header row; deleting the
///   header cascades to its keys.
#[derive(Debug, Clone)]
pub struct SegmentKeyRecord {
    /// Persistence identity, `None` until inserted.
    pub rowid: Option<i64>,
    /// Owning segment header rowid.
    pub segment_id: i64,
    /// Member key.
    pub member_key: String,
}

impl RecordModel for SegmentKeyRecord {
    const TABLE: &'static str = "flag_segment_keys";
    const COLUMNS: &'static [&'static str] = &["segment_id", "member_key"];

    fn rowid(&self) -> Option<i64> {
        self.rowid
    }

    fn set_rowid(&mut self, rowid: i64) {
        self.rowid = Some(rowid);
    }

    fn values(&self) -> Vec<Value> {
        vec![Value::from(self.segment_id), Value::from(self.member_key.clone())]
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            rowid: Some(row.get(0)?),
            segment_id: row.get(1)?,
            member_key: row.get(2)?,
        })
    }
}

/// One segment membership of the local subject key.
#[derive(Debug, Clone)]
pub struct MembershipRecord {
    /// Persistence identity, `None` until inserted.
    pub rowid: Option<i64>,
    /// Subject key the membership belongs to.
    pub subject_key: String,
    /// Segment the subject belongs to.
    pub segment_name: String,
}

impl RecordModel for MembershipRecord {
    const TABLE: &'static str = "flag_memberships";
    const COLUMNS: &'static [&'static str] = &["subject_key", "segment_name"];

    fn rowid(&self) -> Option<i64> {
        self.rowid
    }

    fn set_rowid(&mut self, rowid: i64) {
        self.rowid = Some(rowid);
    }

    fn values(&self) -> Vec<Value> {
        vec![
            Value::from(self.subject_key.clone()),
            Value::from(self.segment_name.clone()),
        ]
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            rowid: Some(row.get(0)?),
            subject_key: row.get(1)?,
            segment_name: row.get(2)?,
        })
    }
}

// ============================================================================
// SECTION: Queue Records
// ============================================================================

/// One queued impression, payload serialized as JSON text.
#[derive(Debug, Clone)]
pub struct ImpressionRecord {
    /// Persistence identity, `None` until inserted.
    pub rowid: Option<i64>,
    /// Enqueue time (unix epoch ms).
    pub created_at: i64,
    /// Serialized impression payload.
    pub payload: String,
}

impl RecordModel for ImpressionRecord {
    const TABLE: &'static str = "flag_impressions";
    const COLUMNS: &'static [&'static str] = &["created_at", "payload"];

    fn rowid(&self) -> Option<i64> {
        self.rowid
    }

    fn set_rowid(&mut self, rowid: i64) {
        self.rowid = Some(rowid);
    }

    fn values(&self) -> Vec<Value> {
        vec![Value::from(self.created_at), Value::from(self.payload.clone())]
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            rowid: Some(row.get(0)?),
            created_at: row.get(1)?,
            payload: row.get(2)?,
        })
    }
}

/// One queued event with its caller-declared byte size.
#[derive(Debug, Clone)]
pub struct EventRecord {
    /// Persistence identity, `None` until inserted.
    pub rowid: Option<i64>,
    /// Enqueue time (unix epoch ms).
    pub created_at: i64,
    /// Serialized event payload.
    pub payload: String,
    /// Caller-declared payload size in bytes.
    pub size: i64,
}

impl RecordModel for EventRecord {
    const TABLE: &'static str = "flag_events";
    const COLUMNS: &'static [&'static str] = &["created_at", "payload", "size"];

    fn rowid(&self) -> Option<i64> {
        self.rowid
    }

    fn set_rowid(&mut self, rowid: i64) {
        self.rowid = Some(rowid);
    }

    fn values(&self) -> Vec<Value> {
        vec![
            Value::from(self.created_at),
            Value::from(self.payload.clone()),
            Value::from(self.size),
        ]
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            rowid: Some(row.get(0)?),
            created_at: row.get(1)?,
            payload: row.get(2)?,
            size: row.get(3)?,
        })
    }
}

// ============================================================================
// SECTION: Telemetry Records
// ============================================================================

/// Named monotonically incremented counter.
#[derive(Debug, Clone)]
pub struct CounterRecord {
    /// Persistence identity, `None` until inserted.
    pub rowid: Option<i64>,
    /// Unique counter name.
    pub name: String,
    /// Accumulated count.
    pub value: i64,
}

impl RecordModel for CounterRecord {
    const TABLE: &'static str = "flag_counters";
    const COLUMNS: &'static [&'static str] = &["name", "value"];

    fn rowid(&self) -> Option<i64> {
        self.rowid
    }

    fn set_rowid(&mut self, rowid: i64) {
        self.rowid = Some(rowid);
    }

    fn values(&self) -> Vec<Value> {
        vec![Value::from(self.name.clone()), Value::from(self.value)]
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            rowid: Some(row.get(0)?),
            name: row.get(1)?,
            value: row.get(2)?,
        })
    }
}

/// Named last-write-wins gauge.
#[derive(Debug, Clone)]
pub struct GaugeRecord {
    /// Persistence identity, `None` until inserted.
    pub rowid: Option<i64>,
    /// Unique gauge name.
    pub name: String,
    /// Last observed value.
    pub value: i64,
}

impl RecordModel for GaugeRecord {
    const TABLE: &'static str = "flag_gauges";
    const COLUMNS: &'static [&'static str] = &["name", "value"];

    fn rowid(&self) -> Option<i64> {
        self.rowid
    }

    fn set_rowid(&mut self, rowid: i64) {
        self.rowid = Some(rowid);
    }

    fn values(&self) -> Vec<Value> {
        vec![Value::from(self.name.clone()), Value::from(self.value)]
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            rowid: Some(row.get(0)?),
            name: row.get(1)?,
            value: row.get(2)?,
        })
    }
}

/// Named latency distribution, one column per bucket.
#[derive(Debug, Clone)]
pub struct LatencyRecord {
    /// Persistence identity, `None` until inserted.
    pub rowid: Option<i64>,
    /// Unique distribution name.
    pub name: String,
    /// Occurrence counts per bucket, indexed by bucket number.
    pub buckets: LatencyBuckets,
}

impl RecordModel for LatencyRecord {
    const TABLE: &'static str = "flag_latencies";
    const COLUMNS: &'static [&'static str] = &[
        "name",
        "bucket_0",
        "bucket_1",
        "bucket_2",
        "bucket_3",
        "bucket_4",
        "bucket_5",
        "bucket_6",
        "bucket_7",
        "bucket_8",
        "bucket_9",
        "bucket_10",
        "bucket_11",
        "bucket_12",
        "bucket_13",
        "bucket_14",
        "bucket_15",
        "bucket_16",
        "bucket_17",
        "bucket_18",
        "bucket_19",
        "bucket_20",
        "bucket_21",
    ];

    fn rowid(&self) -> Option<i64> {
        self.rowid
    }

    fn set_rowid(&mut self, rowid: i64) {
        self.rowid = Some(rowid);
    }

    fn values(&self) -> Vec<Value> {
        let mut values = Vec::with_capacity(LATENCY_BUCKET_COUNT + 1);
        values.push(Value::from(self.name.clone()));
        for bucket in self.buckets {
            values.push(Value::from(bucket));
        }
        values
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let mut buckets: LatencyBuckets = [0; LATENCY_BUCKET_COUNT];
        for (index, bucket) in buckets.iter_mut().enumerate() {
            *bucket = row.get(index + 2)?;
        }
        Ok(Self {
            rowid: Some(row.get(0)?),
            name: row.get(1)?,
            buckets,
        })
    }
}
