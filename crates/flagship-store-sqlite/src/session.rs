// crates/flagship-store-sqlite/src/session.rs
// ============================================================================
// Module: Session Manager
// Description: Scoped, exclusive access to the shared SQLite connection.
// Purpose: Guarantee one live session per execution context with release on
//          every exit path.
// Dependencies: rusqlite, crate::config, crate::error, crate::schema
// ============================================================================

//! ## Overview
//! The session manager owns the single shared connection behind a mutex.
//! [`SessionManager::with_session`] runs a closure with a scoped [`Session`]
//! handle; the underlying guard is released when the closure returns on any
//! path, including errors. Reentrancy is structural rather than ambient:
//! composite operations run entirely inside one `with_session` call and
//! thread the session (or a transaction borrowed from it) through
//! transaction-level helpers, so no operation ever acquires a second session
//! from the same context.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Mutex;
use std::sync::MutexGuard;
use std::time::Duration;

use rusqlite::Connection;
use rusqlite::OpenFlags;
use rusqlite::Transaction;

use crate::config::SqliteStorageConfig;
use crate::error::SqliteStorageError;
use crate::schema::initialize_schema;

// ============================================================================
// SECTION: Session Manager
// ============================================================================

/// Owner of the shared `SQLite` connection.
///
/// # Invariants
/// - Exactly one session is live at a time; acquisition is the process-wide
///   serialization point for storage operations.
/// - The connection's schema has been initialized before the manager is
///   handed out.
pub struct SessionManager {
    /// Shared connection guarded by a mutex.
    connection: Mutex<Connection>,
}

impl SessionManager {
    /// Opens the backing database and initializes its schema.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStorageError`] when the database cannot be opened or
    /// its schema version is incompatible.
    pub fn open(config: &SqliteStorageConfig) -> Result<Self, SqliteStorageError> {
        let mut connection = open_connection(config)?;
        initialize_schema(&mut connection)?;
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    /// Runs `operation` with exclusive access to a scoped session.
    ///
    /// The session is released when `operation` returns, on success and
    /// failure alike.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStorageError`] when the session mutex is poisoned or
    /// `operation` fails.
    pub fn with_session<T>(
        &self,
        operation: impl FnOnce(&mut Session<'_>) -> Result<T, SqliteStorageError>,
    ) -> Result<T, SqliteStorageError> {
        let guard = self
            .connection
            .lock()
            .map_err(|_| SqliteStorageError::Db("session mutex poisoned".to_string()))?;
        let mut session = Session { connection: guard };
        operation(&mut session)
    }
}

/// Scoped handle to the shared connection for one execution context.
pub struct Session<'manager> {
    /// Exclusive connection guard held for the session's lifetime.
    connection: MutexGuard<'manager, Connection>,
}

impl Session<'_> {
    /// Begins a transaction on the session's connection.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStorageError`] when the engine cannot begin a
    /// transaction.
    pub fn transaction(&mut self) -> Result<Transaction<'_>, SqliteStorageError> {
        Ok(self.connection.transaction()?)
    }
}

// ============================================================================
// SECTION: Connection Setup
// ============================================================================

/// Opens the configured `SQLite` connection and applies pragmas.
fn open_connection(config: &SqliteStorageConfig) -> Result<Connection, SqliteStorageError> {
    let connection = match &config.path {
        Some(path) => {
            let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_FULL_MUTEX;
            let connection = Connection::open_with_flags(path, flags)?;
            connection
                .execute_batch(&format!("PRAGMA journal_mode = {};", config.journal_mode.pragma_value()))?;
            connection
                .execute_batch(&format!("PRAGMA synchronous = {};", config.sync_mode.pragma_value()))?;
            connection
        }
        None => Connection::open_in_memory()?,
    };
    connection.execute_batch("PRAGMA foreign_keys = ON;")?;
    connection.busy_timeout(Duration::from_millis(config.busy_timeout_ms))?;
    Ok(connection)
}
