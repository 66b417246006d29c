// crates/flagship-store-sqlite/src/segments.rs
// ============================================================================
// Module: SQLite Segment Storage
// Description: Keyed upsert store for segment membership images.
// Purpose: Persist segment headers and member keys with atomic full-image
//          replacement and delta updates.
// Dependencies: flagship-core, rusqlite, crate::record, crate::records
// ============================================================================

//! ## Overview
//! A segment is stored as one header row (name, change number) plus one key
//! row per member, linked by the header rowid. Full-image replacement and
//! delta updates each run inside a single transaction so readers never see a
//! half-replaced membership. Deleting the header cascades to its key rows.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use flagship_core::Segment;
use flagship_core::SegmentStorage;
use flagship_core::StorageError;
use rusqlite::Transaction;

use crate::error::SqliteStorageError;
use crate::record::DbClient;
use crate::record::Filter;
use crate::record::delete_all_tx;
use crate::record::get_all_tx;
use crate::record::get_count_tx;
use crate::record::get_one_or_none_tx;
use crate::record::insert_tx;
use crate::record::update_tx;
use crate::records::SegmentKeyRecord;
use crate::records::SegmentRecord;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Change number reported in a materialized [`Segment`] whose header has
/// never been assigned one. `get_change_number` reports `None` instead.
const UNSET_CHANGE_NUMBER: i64 = -1;

// ============================================================================
// SECTION: Segment Storage
// ============================================================================

/// `SQLite`-backed segment storage.
///
/// # Invariants
/// - At most one header row exists per segment name.
/// - Key rows always reference a live header row.
pub struct SqlSegmentStorage {
    /// Shared generic record client.
    client: Arc<DbClient>,
}

impl SqlSegmentStorage {
    /// Creates a segment storage over the shared client.
    #[must_use]
    pub fn new(client: Arc<DbClient>) -> Self {
        Self { client }
    }
}

impl SegmentStorage for SqlSegmentStorage {
    fn get(&self, segment_name: &str) -> Result<Option<Segment>, StorageError> {
        let segment = self.client.run_in_transaction(|tx| {
            let Some(header) = load_header_tx(tx, segment_name)? else {
                return Ok(None);
            };
            let segment_id = header.rowid.unwrap_or_default();
            let keys: Vec<SegmentKeyRecord> =
                get_all_tx(tx, &[Filter::eq("segment_id", segment_id)], None)?;
            Ok(Some(Segment::new(
                header.name,
                keys.into_iter().map(|key| key.member_key),
                header.change_number.unwrap_or(UNSET_CHANGE_NUMBER),
            )))
        })?;
        Ok(segment)
    }

    fn put(&self, segment: &Segment) -> Result<(), StorageError> {
        self.client.run_in_transaction(|tx| {
            let segment_id = upsert_header_tx(tx, &segment.name, Some(segment.change_number))?;
            delete_all_tx::<SegmentKeyRecord>(tx, &[Filter::eq("segment_id", segment_id)])?;
            for member_key in &segment.keys {
                let mut record = SegmentKeyRecord {
                    rowid: None,
                    segment_id,
                    member_key: member_key.clone(),
                };
                insert_tx(tx, &mut record)?;
            }
            Ok(())
        })?;
        Ok(())
    }

    fn update(
        &self,
        segment_name: &str,
        to_add: &[String],
        to_remove: &[String],
        change_number: Option<i64>,
    ) -> Result<(), StorageError> {
        self.client.run_in_transaction(|tx| {
            let segment_id = upsert_header_tx(tx, segment_name, change_number)?;
            // Delete both sets so re-adding an existing member cannot
            // duplicate its key row.
            let affected: Vec<String> =
                to_remove.iter().chain(to_add.iter()).cloned().collect();
            delete_all_tx::<SegmentKeyRecord>(
                tx,
                &[
                    Filter::eq("segment_id", segment_id),
                    Filter::is_in("member_key", affected),
                ],
            )?;
            for member_key in to_add {
                let mut record = SegmentKeyRecord {
                    rowid: None,
                    segment_id,
                    member_key: member_key.clone(),
                };
                insert_tx(tx, &mut record)?;
            }
            Ok(())
        })?;
        Ok(())
    }

    fn get_change_number(&self, segment_name: &str) -> Result<Option<i64>, StorageError> {
        let record: Option<SegmentRecord> = self
            .client
            .get_one_or_none(&[Filter::eq("name", segment_name.to_string())])?;
        Ok(record.and_then(|record| record.change_number))
    }

    fn set_change_number(
        &self,
        segment_name: &str,
        change_number: i64,
    ) -> Result<(), StorageError> {
        self.client.run_in_transaction(|tx| {
            let Some(mut header) = load_header_tx(tx, segment_name)? else {
                return Ok(());
            };
            header.change_number = Some(change_number);
            update_tx(tx, &header)
        })?;
        Ok(())
    }

    fn segment_contains(&self, segment_name: &str, key: &str) -> Result<bool, StorageError> {
        let contains = self.client.run_in_transaction(|tx| {
            let Some(header) = load_header_tx(tx, segment_name)? else {
                return Ok(false);
            };
            let count = get_count_tx::<SegmentKeyRecord>(
                tx,
                &[
                    Filter::eq("segment_id", header.rowid.unwrap_or_default()),
                    Filter::eq("member_key", key.to_string()),
                ],
            )?;
            Ok(count > 0)
        })?;
        Ok(contains)
    }
}

// ============================================================================
// SECTION: Transaction Helpers
// ============================================================================

/// Reads a segment header row inside an open transaction.
fn load_header_tx(
    tx: &Transaction<'_>,
    segment_name: &str,
) -> Result<Option<SegmentRecord>, SqliteStorageError> {
    get_one_or_none_tx(tx, &[Filter::eq("name", segment_name.to_string())])
}

/// Upserts a segment header row, returning its rowid.
///
/// An existing header keeps its change number unless one is supplied; a new
/// header without one stores no change number.
fn upsert_header_tx(
    tx: &Transaction<'_>,
    segment_name: &str,
    change_number: Option<i64>,
) -> Result<i64, SqliteStorageError> {
    match load_header_tx(tx, segment_name)? {
        Some(mut header) => {
            if change_number.is_some() {
                header.change_number = change_number;
                update_tx(tx, &header)?;
            }
            Ok(header.rowid.unwrap_or_default())
        }
        None => {
            let mut header = SegmentRecord {
                rowid: None,
                name: segment_name.to_string(),
                change_number,
            };
            insert_tx(tx, &mut header)?;
            Ok(header.rowid.unwrap_or_default())
        }
    }
}
