// crates/flagship-store-sqlite/src/schema.rs
// ============================================================================
// Module: SQLite Schema
// Description: Table definitions and schema version guard.
// Purpose: Create the fixed relational schema on store construction.
// Dependencies: rusqlite, crate::error
// ============================================================================

//! ## Overview
//! The schema is fixed: one table per record kind, created on construction
//! if absent. `store_meta` records the schema version; an unknown stored
//! version is rejected rather than migrated. Name-keyed kinds carry UNIQUE
//! indexes so the at-most-one-row-per-name invariant is engine-enforced.

// ============================================================================
// SECTION: Imports
// ============================================================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use rusqlite::params;

use crate::error::SqliteStorageError;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// `SQLite` schema version for the store.
const SCHEMA_VERSION: i64 = 1;

// ============================================================================
// SECTION: Schema
// ============================================================================

/// Initializes the `SQLite` schema or validates the existing version.
///
/// # Errors
///
/// Returns [`SqliteStorageError`] when schema statements fail or the stored
/// version is unsupported.
pub fn initialize_schema(connection: &mut Connection) -> Result<(), SqliteStorageError> {
    let tx = connection.transaction()?;
    tx.execute_batch("CREATE TABLE IF NOT EXISTS store_meta (version INTEGER NOT NULL);")?;
    let version: Option<i64> = tx
        .query_row("SELECT version FROM store_meta LIMIT 1", params![], |row| row.get(0))
        .optional()?;
    match version {
        None => {
            tx.execute("INSERT INTO store_meta (version) VALUES (?1)", params![SCHEMA_VERSION])?;
            tx.execute_batch(
                "CREATE TABLE IF NOT EXISTS flag_splits (
                    id INTEGER PRIMARY KEY,
                    name TEXT NOT NULL UNIQUE,
                    traffic_type_name TEXT NOT NULL,
                    definition TEXT NOT NULL
                );
                CREATE INDEX IF NOT EXISTS idx_flag_splits_traffic_type
                    ON flag_splits (traffic_type_name);
                CREATE TABLE IF NOT EXISTS flag_metadata (
                    name TEXT PRIMARY KEY,
                    number INTEGER NOT NULL
                );
                CREATE TABLE IF NOT EXISTS flag_segments (
                    id INTEGER PRIMARY KEY,
                    name TEXT NOT NULL UNIQUE,
                    change_number INTEGER
                );
                CREATE TABLE IF NOT EXISTS flag_segment_keys (
                    id INTEGER PRIMARY KEY,
                    segment_id INTEGER NOT NULL
                        REFERENCES flag_segments(id) ON DELETE CASCADE,
                    member_key TEXT NOT NULL
                );
                CREATE INDEX IF NOT EXISTS idx_flag_segment_keys_segment
                    ON flag_segment_keys (segment_id, member_key);
                CREATE TABLE IF NOT EXISTS flag_memberships (
                    id INTEGER PRIMARY KEY,
                    subject_key TEXT NOT NULL,
                    segment_name TEXT NOT NULL
                );
                CREATE INDEX IF NOT EXISTS idx_flag_memberships_subject
                    ON flag_memberships (subject_key);
                CREATE INDEX IF NOT EXISTS idx_flag_memberships_segment
                    ON flag_memberships (segment_name, subject_key);
                CREATE TABLE IF NOT EXISTS flag_impressions (
                    id INTEGER PRIMARY KEY,
                    created_at INTEGER NOT NULL,
                    payload TEXT NOT NULL
                );
                CREATE TABLE IF NOT EXISTS flag_events (
                    id INTEGER PRIMARY KEY,
                    created_at INTEGER NOT NULL,
                    payload TEXT NOT NULL,
                    size INTEGER NOT NULL
                );
                CREATE TABLE IF NOT EXISTS flag_counters (
                    id INTEGER PRIMARY KEY,
                    name TEXT NOT NULL UNIQUE,
                    value INTEGER NOT NULL DEFAULT 0
                );
                CREATE TABLE IF NOT EXISTS flag_gauges (
                    id INTEGER PRIMARY KEY,
                    name TEXT NOT NULL UNIQUE,
                    value INTEGER NOT NULL
                );
                CREATE TABLE IF NOT EXISTS flag_latencies (
                    id INTEGER PRIMARY KEY,
                    name TEXT NOT NULL UNIQUE,
                    bucket_0 INTEGER NOT NULL DEFAULT 0,
                    bucket_1 INTEGER NOT NULL DEFAULT 0,
                    bucket_2 INTEGER NOT NULL DEFAULT 0,
                    bucket_3 INTEGER NOT NULL DEFAULT 0,
                    bucket_4 INTEGER NOT NULL DEFAULT 0,
                    bucket_5 INTEGER NOT NULL DEFAULT 0,
                    bucket_6 INTEGER NOT NULL DEFAULT 0,
                    bucket_7 INTEGER NOT NULL DEFAULT 0,
                    bucket_8 INTEGER NOT NULL DEFAULT 0,
                    bucket_9 INTEGER NOT NULL DEFAULT 0,
                    bucket_10 INTEGER NOT NULL DEFAULT 0,
                    bucket_11 INTEGER NOT NULL DEFAULT 0,
                    bucket_12 INTEGER NOT NULL DEFAULT 0,
                    bucket_13 INTEGER NOT NULL DEFAULT 0,
                    bucket_14 INTEGER NOT NULL DEFAULT 0,
                    bucket_15 INTEGER NOT NULL DEFAULT 0,
                    bucket_16 INTEGER NOT NULL DEFAULT 0,
                    bucket_17 INTEGER NOT NULL DEFAULT 0,
                    bucket_18 INTEGER NOT NULL DEFAULT 0,
                    bucket_19 INTEGER NOT NULL DEFAULT 0,
                    bucket_20 INTEGER NOT NULL DEFAULT 0,
                    bucket_21 INTEGER NOT NULL DEFAULT 0
                );",
            )?;
        }
        Some(value) if value == SCHEMA_VERSION => {}
        Some(value) => {
            return Err(SqliteStorageError::VersionMismatch(format!(
                "unsupported schema version: {value}"
            )));
        }
    }
    tx.commit()?;
    Ok(())
}
