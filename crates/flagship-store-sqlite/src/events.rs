// crates/flagship-store-sqlite/src/events.rs
// ============================================================================
// Module: SQLite Event Storage
// Description: Bounded FIFO queue for events with a cumulative byte budget.
// Purpose: Queue serialized events in insertion order with capacity and
//          byte-budget overflow hooks.
// Dependencies: flagship-core, rusqlite, crate::record, crate::records
// ============================================================================

//! ## Overview
//! Events are appended as opaque JSON payloads together with their
//! caller-declared byte size and drained oldest-first by rowid. A put fires
//! the registered overflow hook when the post-insert row count exceeds the
//! configured capacity, or when the cumulative declared size reaches the
//! fixed byte ceiling. The hook fires at most once per put, after the insert
//! transaction commits, and is cloned out of the registry before it runs: a
//! panicking hook propagates out of `put` but leaves registration usable,
//! and a hook may replace itself.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::PoisonError;

use flagship_core::Event;
use flagship_core::EventEnvelope;
use flagship_core::EventStorage;
use flagship_core::StorageError;
use flagship_core::TableFullHook;
use rusqlite::Transaction;
use rusqlite::params;

use crate::error::SqliteStorageError;
use crate::record::DbClient;
use crate::record::OrderBy;
use crate::record::delete_all_tx;
use crate::record::get_count_tx;
use crate::record::insert_tx;
use crate::record::unix_millis;
use crate::records::EventRecord;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Cumulative declared-size ceiling for queued events (5 MiB).
const MAX_EVENT_BYTES: i64 = 5 * 1024 * 1024;

// ============================================================================
// SECTION: Event Storage
// ============================================================================

/// `SQLite`-backed event queue.
///
/// # Invariants
/// - Pops return events in insertion order.
/// - Producers are never rejected; capacity or byte-budget overflow only
///   signals the hook.
pub struct SqlEventStorage {
    /// Shared generic record client.
    client: Arc<DbClient>,
    /// Row-count capacity threshold.
    queue_size: i64,
    /// Registered overflow hook, if any; shared so firing never holds the
    /// registry lock.
    table_full_hook: Mutex<Option<Arc<dyn Fn() + Send + Sync>>>,
}

impl SqlEventStorage {
    /// Creates an event queue with the given row-count capacity.
    #[must_use]
    pub fn new(client: Arc<DbClient>, queue_size: usize) -> Self {
        Self {
            client,
            queue_size: i64::try_from(queue_size).unwrap_or(i64::MAX),
            table_full_hook: Mutex::new(None),
        }
    }

    /// Fires the registered overflow hook, if any.
    ///
    /// The hook runs with the registry lock released, so it may replace
    /// itself, and a panic inside it cannot poison registration.
    fn fire_table_full_hook(&self) {
        let hook = self
            .table_full_hook
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(hook) = hook {
            hook();
        }
    }
}

impl EventStorage for SqlEventStorage {
    fn put(&self, events: &[EventEnvelope]) -> Result<bool, StorageError> {
        let created_at = unix_millis();
        let overflowed = self.client.run_in_transaction(|tx| {
            for envelope in events {
                let mut record = EventRecord {
                    rowid: None,
                    created_at,
                    payload: serde_json::to_string(&envelope.event)?,
                    size: envelope.size,
                };
                insert_tx(tx, &mut record)?;
            }
            let count = get_count_tx::<EventRecord>(tx, &[])?;
            if count > self.queue_size {
                return Ok(true);
            }
            Ok(total_event_bytes_tx(tx)? >= MAX_EVENT_BYTES)
        })?;
        if overflowed {
            self.fire_table_full_hook();
        }
        Ok(true)
    }

    fn pop_many(&self, count: usize) -> Result<Vec<Event>, StorageError> {
        let records: Vec<EventRecord> =
            self.client
                .pop(Some(count), &[], Some(OrderBy::asc("rowid")))?;
        let mut events = Vec::with_capacity(records.len());
        for record in &records {
            events.push(serde_json::from_str(&record.payload).map_err(SqliteStorageError::from)?);
        }
        Ok(events)
    }

    fn clear(&self) -> Result<(), StorageError> {
        self.client
            .run_in_transaction(|tx| delete_all_tx::<EventRecord>(tx, &[]))?;
        Ok(())
    }

    fn set_table_full_hook(&self, hook: TableFullHook) {
        *self
            .table_full_hook
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(Arc::from(hook));
    }
}

// ============================================================================
// SECTION: Transaction Helpers
// ============================================================================

/// Sums the declared sizes of all queued events.
fn total_event_bytes_tx(tx: &Transaction<'_>) -> Result<i64, SqliteStorageError> {
    Ok(tx.query_row(
        "SELECT COALESCE(SUM(size), 0) FROM flag_events",
        params![],
        |row| row.get(0),
    )?)
}
