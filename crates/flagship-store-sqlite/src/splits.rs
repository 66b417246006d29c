// crates/flagship-store-sqlite/src/splits.rs
// ============================================================================
// Module: SQLite Split Storage
// Description: Keyed upsert store for split definitions.
// Purpose: Persist split definitions, the global change-number watermark, and
//          the guarded local-kill path.
// Dependencies: flagship-core, rusqlite, serde_json, crate::record,
//               crate::records
// ============================================================================

//! ## Overview
//! Splits are stored one row per name with the full definition serialized as
//! JSON text; the name and traffic type are lifted into columns for keyed
//! lookups and traffic-type liveness checks. The global change-number
//! watermark lives in the metadata table under a fixed key.
//!
//! `kill_locally` composes its supersession check, read, and rewrite inside
//! one transaction, so a concurrent synchronizer update cannot interleave
//! between the guard and the write.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::collections::HashMap;
use std::sync::Arc;

use flagship_core::Split;
use flagship_core::SplitStorage;
use flagship_core::StorageError;
use rusqlite::Transaction;
use rusqlite::types::Value;

use crate::error::SqliteStorageError;
use crate::record::DbClient;
use crate::record::Filter;
use crate::record::get_one_or_none_tx;
use crate::record::merge_tx;
use crate::records::MetadataRecord;
use crate::records::SplitRecord;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Metadata key holding the global split change-number watermark.
const SPLIT_CHANGE_NUMBER_KEY: &str = "split_change_number";

// ============================================================================
// SECTION: Split Storage
// ============================================================================

/// `SQLite`-backed split storage.
///
/// # Invariants
/// - At most one row exists per split name.
/// - `kill_locally` never regresses the stored definition past a newer
///   global change number.
pub struct SqlSplitStorage {
    /// Shared generic record client.
    client: Arc<DbClient>,
}

impl SqlSplitStorage {
    /// Creates a split storage over the shared client.
    #[must_use]
    pub fn new(client: Arc<DbClient>) -> Self {
        Self { client }
    }
}

impl SplitStorage for SqlSplitStorage {
    fn get(&self, split_name: &str) -> Result<Option<Split>, StorageError> {
        let record: Option<SplitRecord> = self
            .client
            .get_one_or_none(&[Filter::eq("name", split_name.to_string())])?;
        match record {
            Some(record) => Ok(Some(decode_split(&record)?)),
            None => Ok(None),
        }
    }

    fn fetch_many(
        &self,
        split_names: &[String],
    ) -> Result<HashMap<String, Option<Split>>, StorageError> {
        let records: Vec<SplitRecord> = self
            .client
            .get_all(&[Filter::is_in("name", split_names.iter().cloned())], None)?;
        let mut splits: HashMap<String, Option<Split>> = split_names
            .iter()
            .map(|name| (name.clone(), None))
            .collect();
        for record in records {
            let split = decode_split(&record)?;
            splits.insert(record.name, Some(split));
        }
        Ok(splits)
    }

    fn put(&self, split: &Split) -> Result<(), StorageError> {
        self.client
            .run_in_transaction(|tx| store_split_tx(tx, split))?;
        Ok(())
    }

    fn remove(&self, split_name: &str) -> Result<bool, StorageError> {
        let deleted = self
            .client
            .delete_all::<SplitRecord>(&[Filter::eq("name", split_name.to_string())])?;
        Ok(deleted > 0)
    }

    fn get_change_number(&self) -> Result<i64, StorageError> {
        let number = self.client.run_in_transaction(load_change_number_tx)?;
        Ok(number)
    }

    fn set_change_number(&self, change_number: i64) -> Result<(), StorageError> {
        self.client.update_or_insert::<MetadataRecord>(
            &[("name", Value::from(SPLIT_CHANGE_NUMBER_KEY.to_string()))],
            &[("number", Value::from(change_number))],
        )?;
        Ok(())
    }

    fn get_split_names(&self) -> Result<Vec<String>, StorageError> {
        let records: Vec<SplitRecord> = self.client.get_all(&[], None)?;
        Ok(records.into_iter().map(|record| record.name).collect())
    }

    fn get_all_splits(&self) -> Result<Vec<Split>, StorageError> {
        let records: Vec<SplitRecord> = self.client.get_all(&[], None)?;
        let mut splits = Vec::with_capacity(records.len());
        for record in &records {
            splits.push(decode_split(record)?);
        }
        Ok(splits)
    }

    fn is_valid_traffic_type(&self, traffic_type_name: &str) -> Result<bool, StorageError> {
        let count = self.client.get_count::<SplitRecord>(&[Filter::eq(
            "traffic_type_name",
            traffic_type_name.to_string(),
        )])?;
        Ok(count > 0)
    }

    fn get_segment_names(&self) -> Result<BTreeSet<String>, StorageError> {
        let mut names = BTreeSet::new();
        for split in self.get_all_splits()? {
            names.extend(split.segment_names());
        }
        Ok(names)
    }

    fn kill_locally(
        &self,
        split_name: &str,
        default_treatment: &str,
        change_number: i64,
    ) -> Result<(), StorageError> {
        self.client.run_in_transaction(|tx| {
            if load_change_number_tx(tx)? > change_number {
                return Ok(());
            }
            let record: Option<SplitRecord> =
                get_one_or_none_tx(tx, &[Filter::eq("name", split_name.to_string())])?;
            let Some(record) = record else {
                return Ok(());
            };
            let mut split = decode_split(&record)?;
            split.local_kill(default_treatment, change_number);
            store_split_tx(tx, &split)
        })?;
        Ok(())
    }
}

// ============================================================================
// SECTION: Transaction Helpers
// ============================================================================

/// Reads the global split change number inside an open transaction.
fn load_change_number_tx(tx: &Transaction<'_>) -> Result<i64, SqliteStorageError> {
    let record: Option<MetadataRecord> = get_one_or_none_tx(
        tx,
        &[Filter::eq("name", SPLIT_CHANGE_NUMBER_KEY.to_string())],
    )?;
    Ok(record.map_or(0, |record| record.number))
}

/// Upserts one split row inside an open transaction.
fn store_split_tx(tx: &Transaction<'_>, split: &Split) -> Result<(), SqliteStorageError> {
    let definition = serde_json::to_string(split)?;
    let existing: Option<SplitRecord> =
        get_one_or_none_tx(tx, &[Filter::eq("name", split.name.clone())])?;
    let mut record = match existing {
        Some(mut record) => {
            record.traffic_type_name = split.traffic_type_name.clone();
            record.definition = definition;
            record
        }
        None => SplitRecord {
            rowid: None,
            name: split.name.clone(),
            traffic_type_name: split.traffic_type_name.clone(),
            definition,
        },
    };
    merge_tx(tx, &mut record)
}

/// Decodes a stored split row back into its domain type.
fn decode_split(record: &SplitRecord) -> Result<Split, SqliteStorageError> {
    Ok(serde_json::from_str(&record.definition)?)
}
