// crates/flagship-store-sqlite/src/lib.rs
// ============================================================================
// Module: Flagship SQLite Store
// Description: SQLite-backed storage for the Flagship client.
// Purpose: Implement the flagship-core storage contracts over a single
//          shared SQLite connection.
// Dependencies: flagship-core, rusqlite, serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! `flagship-store-sqlite` implements every `flagship-core` storage contract
//! over one shared `SQLite` connection. The crate is layered: a session
//! manager serializes access to the connection, a generic record client
//! provides the fixed primitive set (filtered reads, merges,
//! update-or-insert, deletes, destructive pops, increment-or-create), and
//! six specialized stores apply domain policy on top of those primitives.
//!
//! Construction opens (or creates) the database and initializes its schema;
//! an incompatible stored schema version is rejected. All stores share one
//! [`DbClient`], so cross-store operations serialize on the same session.
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use flagship_core::SplitStorage;
//! use flagship_store_sqlite::DbClient;
//! use flagship_store_sqlite::SqliteStorageConfig;
//! use flagship_store_sqlite::SqlSplitStorage;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Arc::new(DbClient::new(&SqliteStorageConfig::default())?);
//! let splits = SqlSplitStorage::new(client);
//! assert_eq!(splits.get_change_number()?, 0);
//! # Ok(())
//! # }
//! ```

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;
pub mod error;
pub mod events;
pub mod impressions;
pub mod memberships;
pub mod record;
pub mod records;
pub mod schema;
pub mod segments;
pub mod session;
pub mod splits;
pub mod telemetry;

// ============================================================================
// SECTION: Re-exports
// ============================================================================

pub use crate::config::SqliteJournalMode;
pub use crate::config::SqliteStorageConfig;
pub use crate::config::SqliteSyncMode;
pub use crate::error::SqliteStorageError;
pub use crate::events::SqlEventStorage;
pub use crate::impressions::SqlImpressionStorage;
pub use crate::memberships::SqlMembershipStorage;
pub use crate::record::DbClient;
pub use crate::record::Filter;
pub use crate::record::OrderBy;
pub use crate::record::RecordModel;
pub use crate::records::LATENCY_BUCKET_COLUMNS;
pub use crate::segments::SqlSegmentStorage;
pub use crate::session::Session;
pub use crate::session::SessionManager;
pub use crate::splits::SqlSplitStorage;
pub use crate::telemetry::SqlTelemetryStorage;
