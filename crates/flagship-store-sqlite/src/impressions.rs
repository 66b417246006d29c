// crates/flagship-store-sqlite/src/impressions.rs
// ============================================================================
// Module: SQLite Impression Storage
// Description: Bounded FIFO queue for impressions.
// Purpose: Queue serialized impressions in insertion order with a capacity
//          overflow hook.
// Dependencies: flagship-core, crate::record, crate::records
// ============================================================================

//! ## Overview
//! Impressions are appended as opaque JSON payloads and drained oldest-first
//! by rowid. A put whose post-insert row count exceeds the configured
//! capacity fires the registered overflow hook exactly once, after the
//! insert transaction commits, so the hook may drain or clear the queue
//! without re-entering a held session. The hook is cloned out of the
//! registry before it runs: a panicking hook propagates out of `put` but
//! leaves registration usable, and a hook may replace itself.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::PoisonError;

use flagship_core::Impression;
use flagship_core::ImpressionStorage;
use flagship_core::StorageError;
use flagship_core::TableFullHook;

use crate::error::SqliteStorageError;
use crate::record::DbClient;
use crate::record::OrderBy;
use crate::record::delete_all_tx;
use crate::record::get_count_tx;
use crate::record::insert_tx;
use crate::record::unix_millis;
use crate::records::ImpressionRecord;

// ============================================================================
// SECTION: Impression Storage
// ============================================================================

/// `SQLite`-backed impression queue.
///
/// # Invariants
/// - Pops return impressions in insertion order.
/// - Producers are never rejected; capacity overflow only signals the hook.
pub struct SqlImpressionStorage {
    /// Shared generic record client.
    client: Arc<DbClient>,
    /// Row-count capacity threshold.
    queue_size: i64,
    /// Registered overflow hook, if any; shared so firing never holds the
    /// registry lock.
    table_full_hook: Mutex<Option<Arc<dyn Fn() + Send + Sync>>>,
}

impl SqlImpressionStorage {
    /// Creates an impression queue with the given row-count capacity.
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

impl ImpressionStorage for SqlImpressionStorage {
    fn put(&self, impressions: &[Impression]) -> Result<bool, StorageError> {
        let created_at = unix_millis();
        let overflowed = self.client.run_in_transaction(|tx| {
            for impression in impressions {
                let mut record = ImpressionRecord {
                    rowid: None,
                    created_at,
                    payload: serde_json::to_string(impression)?,
                };
                insert_tx(tx, &mut record)?;
            }
            let count = get_count_tx::<ImpressionRecord>(tx, &[])?;
            Ok(count > self.queue_size)
        })?;
        if overflowed {
            self.fire_table_full_hook();
        }
        Ok(true)
    }

    fn pop_many(&self, count: usize) -> Result<Vec<Impression>, StorageError> {
        let records: Vec<ImpressionRecord> =
            self.client
                .pop(Some(count), &[], Some(OrderBy::asc("rowid")))?;
        let mut impressions = Vec::with_capacity(records.len());
        for record in &records {
            impressions.push(
                serde_json::from_str(&record.payload).map_err(SqliteStorageError::from)?,
            );
        }
        Ok(impressions)
    }

    fn clear(&self) -> Result<(), StorageError> {
        self.client
            .run_in_transaction(|tx| delete_all_tx::<ImpressionRecord>(tx, &[]))?;
        Ok(())
    }

    fn set_table_full_hook(&self, hook: TableFullHook) {
        *self
            .table_full_hook
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(Arc::from(hook));
    }
}
