// crates/flagship-store-sqlite/src/error.rs
// ============================================================================
// Module: SQLite Storage Errors
// Description: Error taxonomy for the SQLite storage backend.
// Purpose: Classify engine, contract, and data failures with stable variants.
// Dependencies: flagship-core, rusqlite, serde_json, thiserror
// ============================================================================

//! ## Overview
//! Backend-specific errors carry `String` payloads so they stay `Clone` and
//! avoid embedding raw row data. Every variant maps into the backend-agnostic
//! [`StorageError`] at the trait boundary.

// ============================================================================
// SECTION: Imports
// ============================================================================

use flagship_core::StorageError;
use thiserror::Error;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// `SQLite` storage errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
/// - Messages avoid embedding stored payloads.
#[derive(Debug, Error, Clone)]
pub enum SqliteStorageError {
    /// `SQLite` engine error.
    #[error("sqlite storage db error: {0}")]
    Db(String),
    /// A unique lookup matched more than one row.
    #[error("sqlite storage uniqueness violation: {0}")]
    MultipleRecords(String),
    /// Payload serialization or deserialization failed.
    #[error("sqlite storage serialization error: {0}")]
    Serialization(String),
    /// Invalid stored data.
    #[error("sqlite storage invalid data: {0}")]
    Invalid(String),
    /// Stored schema version is incompatible.
    #[error("sqlite storage version mismatch: {0}")]
    VersionMismatch(String),
}

impl From<rusqlite::Error> for SqliteStorageError {
    fn from(error: rusqlite::Error) -> Self {
        Self::Db(error.to_string())
    }
}

impl From<serde_json::Error> for SqliteStorageError {
    fn from(error: serde_json::Error) -> Self {
        Self::Serialization(error.to_string())
    }
}

impl From<SqliteStorageError> for StorageError {
    fn from(error: SqliteStorageError) -> Self {
        match error {
            SqliteStorageError::Db(message) => Self::Engine(message),
            SqliteStorageError::MultipleRecords(message) => Self::MultipleRecords(message),
            SqliteStorageError::Serialization(message) => Self::Serialization(message),
            SqliteStorageError::Invalid(message) => Self::Invalid(message),
            SqliteStorageError::VersionMismatch(message) => Self::VersionMismatch(message),
        }
    }
}
