// crates/flagship-store-sqlite/src/telemetry.rs
// ============================================================================
// Module: SQLite Telemetry Storage
// Description: Atomic aggregation store for counters, gauges, and latencies.
// Purpose: Accumulate telemetry aggregates race-safely and drain them as
//          snapshot-then-clear batches.
// Dependencies: flagship-core, crate::record, crate::records
// ============================================================================

//! ## Overview
//! Counters and latency buckets accumulate through race-safe
//! increment-or-create writes; gauges are last-write-wins upserts. Each kind
//! keeps at most one row per name, enforced by unique indexes. Drains pop
//! the whole table in one transaction: the returned snapshot is exactly the
//! set of rows deleted, so no concurrent increment is lost between read and
//! delete.
//!
//! Out-of-range latency bucket indexes are ignored rather than rejected;
//! recording telemetry must never fail the instrumented call path.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashMap;
use std::sync::Arc;

use flagship_core::LatencyBuckets;
use flagship_core::StorageError;
use flagship_core::TelemetryStorage;
use rusqlite::types::Value;

use crate::record::DbClient;
use crate::record::Filter;
use crate::record::delete_all_tx;
use crate::record::pop_tx;
use crate::records::CounterRecord;
use crate::records::GaugeRecord;
use crate::records::LATENCY_BUCKET_COLUMNS;
use crate::records::LatencyRecord;

// ============================================================================
// SECTION: Telemetry Storage
// ============================================================================

/// `SQLite`-backed telemetry storage.
///
/// # Invariants
/// - At most one row exists per counter, gauge, or latency name.
/// - Drains never lose increments to concurrent writers.
pub struct SqlTelemetryStorage {
    /// Shared generic record client.
    client: Arc<DbClient>,
}

impl SqlTelemetryStorage {
    /// Creates a telemetry storage over the shared client.
    #[must_use]
    pub fn new(client: Arc<DbClient>) -> Self {
        Self { client }
    }
}

impl TelemetryStorage for SqlTelemetryStorage {
    fn inc_latency(&self, name: &str, bucket: usize) -> Result<(), StorageError> {
        let Some(column) = LATENCY_BUCKET_COLUMNS.get(bucket).copied() else {
            return Ok(());
        };
        self.client.increment_or_create::<LatencyRecord>(
            column,
            &[Filter::eq("name", name.to_string())],
            &[("name", Value::from(name.to_string()))],
        )?;
        Ok(())
    }

    fn inc_counter(&self, name: &str) -> Result<(), StorageError> {
        self.client.increment_or_create::<CounterRecord>(
            "value",
            &[Filter::eq("name", name.to_string())],
            &[
                ("name", Value::from(name.to_string())),
                ("value", Value::from(0_i64)),
            ],
        )?;
        Ok(())
    }

    fn put_gauge(&self, name: &str, value: i64) -> Result<(), StorageError> {
        self.client.update_or_insert::<GaugeRecord>(
            &[("name", Value::from(name.to_string()))],
            &[("value", Value::from(value))],
        )?;
        Ok(())
    }

    fn pop_counters(&self) -> Result<HashMap<String, i64>, StorageError> {
        let records = self
            .client
            .run_in_transaction(|tx| pop_tx::<CounterRecord>(tx, None, &[], None))?;
        Ok(records
            .into_iter()
            .map(|record| (record.name, record.value))
            .collect())
    }

    fn pop_gauges(&self) -> Result<HashMap<String, i64>, StorageError> {
        let records = self
            .client
            .run_in_transaction(|tx| pop_tx::<GaugeRecord>(tx, None, &[], None))?;
        Ok(records
            .into_iter()
            .map(|record| (record.name, record.value))
            .collect())
    }

    fn pop_latencies(&self) -> Result<HashMap<String, LatencyBuckets>, StorageError> {
        let records = self
            .client
            .run_in_transaction(|tx| pop_tx::<LatencyRecord>(tx, None, &[], None))?;
        Ok(records
            .into_iter()
            .map(|record| (record.name, record.buckets))
            .collect())
    }

    fn clear(&self) -> Result<(), StorageError> {
        self.client.run_in_transaction(|tx| {
            delete_all_tx::<CounterRecord>(tx, &[])?;
            delete_all_tx::<GaugeRecord>(tx, &[])?;
            delete_all_tx::<LatencyRecord>(tx, &[])?;
            Ok(())
        })?;
        Ok(())
    }
}
