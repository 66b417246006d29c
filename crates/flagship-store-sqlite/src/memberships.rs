// crates/flagship-store-sqlite/src/memberships.rs
// ============================================================================
// Module: SQLite Membership Storage
// Description: Per-subject segment membership store.
// Purpose: Persist the local subject's segment memberships as flat pairs
//          with atomic full replacement.
// Dependencies: flagship-core, crate::record, crate::records
// ============================================================================

//! ## Overview
//! Memberships are flat (subject key, segment name) pairs with no header
//! rows; a subject's membership set is replaced wholesale by deleting its
//! pairs and inserting the new image inside one transaction.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use flagship_core::MembershipStorage;
use flagship_core::StorageError;

use crate::record::DbClient;
use crate::record::Filter;
use crate::record::delete_all_tx;
use crate::record::insert_tx;
use crate::records::MembershipRecord;

// ============================================================================
// SECTION: Membership Storage
// ============================================================================

/// `SQLite`-backed membership storage.
///
/// # Invariants
/// - A (subject, segment) pair appears at most once.
pub struct SqlMembershipStorage {
    /// Shared generic record client.
    client: Arc<DbClient>,
}

impl SqlMembershipStorage {
    /// Creates a membership storage over the shared client.
    #[must_use]
    pub fn new(client: Arc<DbClient>) -> Self {
        Self { client }
    }
}

impl MembershipStorage for SqlMembershipStorage {
    fn get(&self, subject_key: &str) -> Result<Vec<String>, StorageError> {
        let records: Vec<MembershipRecord> = self
            .client
            .get_all(&[Filter::eq("subject_key", subject_key.to_string())], None)?;
        Ok(records.into_iter().map(|record| record.segment_name).collect())
    }

    fn put(&self, subject_key: &str, segment_names: &[String]) -> Result<(), StorageError> {
        self.client.run_in_transaction(|tx| {
            delete_all_tx::<MembershipRecord>(
                tx,
                &[Filter::eq("subject_key", subject_key.to_string())],
            )?;
            for segment_name in segment_names {
                let mut record = MembershipRecord {
                    rowid: None,
                    subject_key: subject_key.to_string(),
                    segment_name: segment_name.clone(),
                };
                insert_tx(tx, &mut record)?;
            }
            Ok(())
        })?;
        Ok(())
    }

    fn segment_contains(
        &self,
        segment_name: &str,
        subject_key: &str,
    ) -> Result<bool, StorageError> {
        let count = self.client.get_count::<MembershipRecord>(&[
            Filter::eq("segment_name", segment_name.to_string()),
            Filter::eq("subject_key", subject_key.to_string()),
        ])?;
        Ok(count > 0)
    }

    fn clear(&self) -> Result<(), StorageError> {
        self.client.delete_all::<MembershipRecord>(&[])?;
        Ok(())
    }
}
