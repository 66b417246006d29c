// crates/flagship-store-sqlite/src/record.rs
// ============================================================================
// Module: Generic Record Client
// Description: Fixed primitive set over an abstract record model.
// Purpose: Let every specialized store be a thin policy layer over shared
//          read/upsert/delete/pop/increment primitives.
// Dependencies: rusqlite, crate::config, crate::error, crate::session
// ============================================================================

//! ## Overview
//! [`DbClient`] exposes the fixed primitive set of the storage subsystem:
//! filtered reads, upsert-by-identity merges, field-based update-or-insert,
//! filtered deletes, destructive ordered pops, and race-safe
//! increment-or-create. Each [`DbClient`] primitive acquires a session and
//! runs inside a single committed transaction.
//!
//! The `*_tx` functions are the same primitives scoped to an existing
//! transaction. Specialized stores use them through
//! [`DbClient::run_in_transaction`] to compose several steps into one atomic
//! unit (e.g. replacing a segment's membership image together with its
//! change-number row).
//!
//! Record kinds implement [`RecordModel`]: a table name, an insertable
//! column list, value encoding, and row decoding, with rowid as the
//! persistence identity.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use rusqlite::ErrorCode;
use rusqlite::Row;
use rusqlite::Transaction;
use rusqlite::params;
use rusqlite::params_from_iter;
use rusqlite::types::Value;

use crate::config::SqliteStorageConfig;
use crate::error::SqliteStorageError;
use crate::session::SessionManager;

// ============================================================================
// SECTION: Record Model
// ============================================================================

/// Descriptor for one record kind stored in a single table.
///
/// # Invariants
/// - `COLUMNS` and `values()` agree in length and order; rowid is excluded.
/// - `from_row` decodes a row selected as `rowid, COLUMNS...` and sets the
///   rowid.
pub trait RecordModel: Sized {
    /// Backing table name.
    const TABLE: &'static str;
    /// Insertable column names, in `values()` order.
    const COLUMNS: &'static [&'static str];

    /// Returns the rowid when the record is already persisted.
    fn rowid(&self) -> Option<i64>;

    /// Records the rowid assigned by an insert.
    fn set_rowid(&mut self, rowid: i64);

    /// Returns column values in `COLUMNS` order.
    fn values(&self) -> Vec<Value>;

    /// Decodes a row selected as `rowid, COLUMNS...`.
    ///
    /// # Errors
    ///
    /// Returns [`rusqlite::Error`] when a column cannot be decoded.
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self>;
}

// ============================================================================
// SECTION: Filters and Ordering
// ============================================================================

/// Field-based filter applied to a record lookup.
#[derive(Debug, Clone)]
pub struct Filter {
    /// Column the filter applies to.
    column: &'static str,
    /// Match condition for the column.
    condition: FilterCondition,
}

/// Match condition variants for [`Filter`].
#[derive(Debug, Clone)]
enum FilterCondition {
    /// Column equals the value.
    Eq(Value),
    /// Column is one of the values; empty lists match nothing.
    In(Vec<Value>),
}

impl Filter {
    /// Matches rows where `column` equals `value`.
    #[must_use]
    pub fn eq(column: &'static str, value: impl Into<Value>) -> Self {
        Self {
            column,
            condition: FilterCondition::Eq(value.into()),
        }
    }

    /// Matches rows where `column` is one of `values`.
    #[must_use]
    pub fn is_in<V: Into<Value>>(
        column: &'static str,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        Self {
            column,
            condition: FilterCondition::In(values.into_iter().map(Into::into).collect()),
        }
    }
}

/// Ordering applied to reads and pops.
#[derive(Debug, Clone, Copy)]
pub struct OrderBy {
    /// Column to order by.
    column: &'static str,
    /// Order direction.
    ascending: bool,
}

impl OrderBy {
    /// Ascending order on `column`.
    #[must_use]
    pub const fn asc(column: &'static str) -> Self {
        Self {
            column,
            ascending: true,
        }
    }

    /// Descending order on `column`.
    #[must_use]
    pub const fn desc(column: &'static str) -> Self {
        Self {
            column,
            ascending: false,
        }
    }

    /// Returns the SQL direction keyword.
    const fn direction_sql(self) -> &'static str {
        if self.ascending { "ASC" } else { "DESC" }
    }
}

// ============================================================================
// SECTION: SQL Assembly
// ============================================================================

/// Appends a WHERE clause for `filters`, pushing bound values onto `params`.
fn filter_clause(filters: &[Filter], params: &mut Vec<Value>) -> String {
    if filters.is_empty() {
        return String::new();
    }
    let mut clauses = Vec::with_capacity(filters.len());
    for filter in filters {
        match &filter.condition {
            FilterCondition::Eq(value) => {
                params.push(value.clone());
                clauses.push(format!("{} = ?", filter.column));
            }
            FilterCondition::In(values) if values.is_empty() => {
                clauses.push("1 = 0".to_string());
            }
            FilterCondition::In(values) => {
                let marks = vec!["?"; values.len()].join(", ");
                clauses.push(format!("{} IN ({marks})", filter.column));
                params.extend(values.iter().cloned());
            }
        }
    }
    format!(" WHERE {}", clauses.join(" AND "))
}

/// Returns the select list `rowid, COLUMNS...` for a record kind.
fn select_list<R: RecordModel>() -> String {
    let mut columns = Vec::with_capacity(R::COLUMNS.len() + 1);
    columns.push("rowid");
    columns.extend_from_slice(R::COLUMNS);
    columns.join(", ")
}

/// Runs a filtered, optionally ordered and limited select.
fn query_tx<R: RecordModel>(
    tx: &Transaction<'_>,
    filters: &[Filter],
    order_by: Option<OrderBy>,
    limit: Option<usize>,
) -> Result<Vec<R>, SqliteStorageError> {
    let mut params = Vec::new();
    let mut sql = format!("SELECT {} FROM {}", select_list::<R>(), R::TABLE);
    sql.push_str(&filter_clause(filters, &mut params));
    if let Some(order) = order_by {
        sql.push_str(&format!(" ORDER BY {} {}", order.column, order.direction_sql()));
    }
    if let Some(limit) = limit {
        sql.push_str(&format!(" LIMIT {limit}"));
    }
    let mut statement = tx.prepare(&sql)?;
    let rows = statement.query_map(params_from_iter(params), |row| R::from_row(row))?;
    let mut records = Vec::new();
    for row in rows {
        records.push(row?);
    }
    Ok(records)
}

/// Looks up the rowid matched by `filters`, requiring at most one match.
fn lookup_rowid<R: RecordModel>(
    tx: &Transaction<'_>,
    filters: &[Filter],
) -> Result<Option<i64>, SqliteStorageError> {
    let mut params = Vec::new();
    let mut sql = format!("SELECT rowid FROM {}", R::TABLE);
    sql.push_str(&filter_clause(filters, &mut params));
    sql.push_str(" LIMIT 2");
    let mut statement = tx.prepare(&sql)?;
    let rows = statement.query_map(params_from_iter(params), |row| row.get::<_, i64>(0))?;
    let mut rowids = Vec::new();
    for row in rows {
        rowids.push(row?);
    }
    match rowids.as_slice() {
        [] => Ok(None),
        [rowid] => Ok(Some(*rowid)),
        _ => Err(SqliteStorageError::MultipleRecords(format!(
            "{}: filter matched more than one row",
            R::TABLE
        ))),
    }
}

/// Returns the rowid of a decoded record, which `from_row` always sets.
fn require_rowid<R: RecordModel>(record: &R) -> Result<i64, SqliteStorageError> {
    record.rowid().ok_or_else(|| {
        SqliteStorageError::Invalid(format!("{}: record has no rowid", R::TABLE))
    })
}

/// Builds an insert statement from explicit field/value pairs.
fn insert_fields_sql(
    table: &str,
    fields: &[(&'static str, Value)],
) -> (String, Vec<Value>) {
    let columns = fields.iter().map(|(column, _)| *column).collect::<Vec<_>>().join(", ");
    let marks = vec!["?"; fields.len()].join(", ");
    let values = fields.iter().map(|(_, value)| value.clone()).collect();
    (format!("INSERT INTO {table} ({columns}) VALUES ({marks})"), values)
}

// ============================================================================
// SECTION: Transaction-Scope Primitives
// ============================================================================

/// Reads all records matching `filters`, optionally ordered.
///
/// # Errors
///
/// Returns [`SqliteStorageError`] when the query fails.
pub fn get_all_tx<R: RecordModel>(
    tx: &Transaction<'_>,
    filters: &[Filter],
    order_by: Option<OrderBy>,
) -> Result<Vec<R>, SqliteStorageError> {
    query_tx(tx, filters, order_by, None)
}

/// Counts records matching `filters`.
///
/// # Errors
///
/// Returns [`SqliteStorageError`] when the query fails.
pub fn get_count_tx<R: RecordModel>(
    tx: &Transaction<'_>,
    filters: &[Filter],
) -> Result<i64, SqliteStorageError> {
    let mut params = Vec::new();
    let mut sql = format!("SELECT COUNT(*) FROM {}", R::TABLE);
    sql.push_str(&filter_clause(filters, &mut params));
    Ok(tx.query_row(&sql, params_from_iter(params), |row| row.get(0))?)
}

/// Reads the single record matching `filters`, or `None`.
///
/// More than one match is a caller contract violation for name-keyed kinds
/// and fails with [`SqliteStorageError::MultipleRecords`].
///
/// # Errors
///
/// Returns [`SqliteStorageError`] when the query fails or matches more than
/// one row.
pub fn get_one_or_none_tx<R: RecordModel>(
    tx: &Transaction<'_>,
    filters: &[Filter],
) -> Result<Option<R>, SqliteStorageError> {
    let mut records: Vec<R> = query_tx(tx, filters, None, Some(2))?;
    if records.len() > 1 {
        return Err(SqliteStorageError::MultipleRecords(format!(
            "{}: filter matched more than one row",
            R::TABLE
        )));
    }
    Ok(records.pop())
}

/// Reads the first record matching `filters`, or `None`.
///
/// # Errors
///
/// Returns [`SqliteStorageError`] when the query fails.
pub fn get_first_tx<R: RecordModel>(
    tx: &Transaction<'_>,
    filters: &[Filter],
) -> Result<Option<R>, SqliteStorageError> {
    let mut records: Vec<R> = query_tx(tx, filters, None, Some(1))?;
    Ok(records.pop())
}

/// Inserts a record and assigns its rowid.
///
/// # Errors
///
/// Returns [`SqliteStorageError`] when the insert fails.
pub fn insert_tx<R: RecordModel>(
    tx: &Transaction<'_>,
    record: &mut R,
) -> Result<(), SqliteStorageError> {
    let columns = R::COLUMNS.join(", ");
    let marks = vec!["?"; R::COLUMNS.len()].join(", ");
    let sql = format!("INSERT INTO {} ({columns}) VALUES ({marks})", R::TABLE);
    tx.execute(&sql, params_from_iter(record.values()))?;
    record.set_rowid(tx.last_insert_rowid());
    Ok(())
}

/// Updates all columns of a persisted record by rowid.
///
/// # Errors
///
/// Returns [`SqliteStorageError`] when the record has no rowid or the update
/// fails.
pub fn update_tx<R: RecordModel>(
    tx: &Transaction<'_>,
    record: &R,
) -> Result<(), SqliteStorageError> {
    let rowid = require_rowid(record)?;
    let assignments = R::COLUMNS
        .iter()
        .map(|column| format!("{column} = ?"))
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!("UPDATE {} SET {assignments} WHERE rowid = ?", R::TABLE);
    let mut values = record.values();
    values.push(Value::from(rowid));
    tx.execute(&sql, params_from_iter(values))?;
    Ok(())
}

/// Upserts a record by identity: update when it carries a rowid, insert
/// otherwise.
///
/// # Errors
///
/// Returns [`SqliteStorageError`] when the write fails.
pub fn merge_tx<R: RecordModel>(
    tx: &Transaction<'_>,
    record: &mut R,
) -> Result<(), SqliteStorageError> {
    if record.rowid().is_some() {
        update_tx(tx, record)
    } else {
        insert_tx(tx, record)
    }
}

/// Deletes all records matching `filters`, returning the deleted count.
///
/// # Errors
///
/// Returns [`SqliteStorageError`] when the delete fails.
pub fn delete_all_tx<R: RecordModel>(
    tx: &Transaction<'_>,
    filters: &[Filter],
) -> Result<usize, SqliteStorageError> {
    let mut params = Vec::new();
    let mut sql = format!("DELETE FROM {}", R::TABLE);
    sql.push_str(&filter_clause(filters, &mut params));
    Ok(tx.execute(&sql, params_from_iter(params))?)
}

/// Reads matching records (ordered, limited) and deletes exactly those rows,
/// returning the pre-deletion snapshot.
///
/// # Errors
///
/// Returns [`SqliteStorageError`] when the read or delete fails.
pub fn pop_tx<R: RecordModel>(
    tx: &Transaction<'_>,
    limit: Option<usize>,
    filters: &[Filter],
    order_by: Option<OrderBy>,
) -> Result<Vec<R>, SqliteStorageError> {
    let records: Vec<R> = query_tx(tx, filters, order_by, limit)?;
    if records.is_empty() {
        return Ok(records);
    }
    let mut rowids = Vec::with_capacity(records.len());
    for record in &records {
        rowids.push(Value::from(require_rowid(record)?));
    }
    let marks = vec!["?"; rowids.len()].join(", ");
    let sql = format!("DELETE FROM {} WHERE rowid IN ({marks})", R::TABLE);
    tx.execute(&sql, params_from_iter(rowids))?;
    Ok(records)
}

/// Applies `update_fields` to the row matching `filter_fields`, inserting a
/// row built from filter and update fields when absent.
///
/// # Errors
///
/// Returns [`SqliteStorageError`] when the lookup matches more than one row
/// or the write fails.
pub fn update_or_insert_tx<R: RecordModel>(
    tx: &Transaction<'_>,
    filter_fields: &[(&'static str, Value)],
    update_fields: &[(&'static str, Value)],
) -> Result<(), SqliteStorageError> {
    let filters: Vec<Filter> = filter_fields
        .iter()
        .map(|(column, value)| Filter::eq(*column, value.clone()))
        .collect();
    match lookup_rowid::<R>(tx, &filters)? {
        None => {
            let mut fields = filter_fields.to_vec();
            fields.extend(update_fields.iter().cloned());
            let (sql, values) = insert_fields_sql(R::TABLE, &fields);
            tx.execute(&sql, params_from_iter(values))?;
        }
        Some(rowid) => {
            let assignments = update_fields
                .iter()
                .map(|(column, _)| format!("{column} = ?"))
                .collect::<Vec<_>>()
                .join(", ");
            let sql = format!("UPDATE {} SET {assignments} WHERE rowid = ?", R::TABLE);
            let mut values: Vec<Value> =
                update_fields.iter().map(|(_, value)| value.clone()).collect();
            values.push(Value::from(rowid));
            tx.execute(&sql, params_from_iter(values))?;
        }
    }
    Ok(())
}

/// Increments `target_column` on the row matching `filters`, creating the
/// row from `create_fields` when absent.
///
/// A race-lost insert (unique constraint violation) is recovered by
/// re-reading the row the competing writer created; `create_fields` must
/// therefore be a pure function of `filters`, otherwise the surviving row is
/// whichever writer won the insert.
///
/// # Errors
///
/// Returns [`SqliteStorageError`] when the lookup, insert, or increment
/// fails for reasons other than a recoverable insert race.
pub fn increment_or_create_tx<R: RecordModel>(
    tx: &Transaction<'_>,
    target_column: &'static str,
    filters: &[Filter],
    create_fields: &[(&'static str, Value)],
) -> Result<(), SqliteStorageError> {
    let rowid = match lookup_rowid::<R>(tx, filters)? {
        Some(rowid) => rowid,
        None => {
            let (sql, values) = insert_fields_sql(R::TABLE, create_fields);
            match tx.execute(&sql, params_from_iter(values)) {
                Ok(_) => tx.last_insert_rowid(),
                Err(rusqlite::Error::SqliteFailure(failure, _))
                    if failure.code == ErrorCode::ConstraintViolation =>
                {
                    lookup_rowid::<R>(tx, filters)?.ok_or_else(|| {
                        SqliteStorageError::Db(format!(
                            "{}: lost insert race but row is absent",
                            R::TABLE
                        ))
                    })?
                }
                Err(error) => return Err(error.into()),
            }
        }
    };
    let sql = format!(
        "UPDATE {} SET {target_column} = COALESCE({target_column}, 0) + 1 WHERE rowid = ?1",
        R::TABLE
    );
    tx.execute(&sql, params![rowid])?;
    Ok(())
}

// ============================================================================
// SECTION: Client
// ============================================================================

/// Generic record client over the shared session.
///
/// # Invariants
/// - Every primitive runs inside a single committed transaction.
/// - Absent lookups return `Ok(None)`/empty collections, never errors.
pub struct DbClient {
    /// Session manager owning the shared connection.
    sessions: SessionManager,
}

impl DbClient {
    /// Opens the backing database and initializes its schema.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStorageError`] when the database cannot be opened or
    /// initialized.
    pub fn new(config: &SqliteStorageConfig) -> Result<Self, SqliteStorageError> {
        Ok(Self {
            sessions: SessionManager::open(config)?,
        })
    }

    /// Runs `operation` inside one session-scoped transaction and commits.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStorageError`] when the session cannot be acquired,
    /// `operation` fails, or the commit fails.
    pub fn run_in_transaction<T>(
        &self,
        operation: impl FnOnce(&Transaction<'_>) -> Result<T, SqliteStorageError>,
    ) -> Result<T, SqliteStorageError> {
        self.sessions.with_session(|session| {
            let tx = session.transaction()?;
            let value = operation(&tx)?;
            tx.commit()?;
            Ok(value)
        })
    }

    /// Reads all records matching `filters`, optionally ordered.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStorageError`] when the query fails.
    pub fn get_all<R: RecordModel>(
        &self,
        filters: &[Filter],
        order_by: Option<OrderBy>,
    ) -> Result<Vec<R>, SqliteStorageError> {
        self.run_in_transaction(|tx| get_all_tx(tx, filters, order_by))
    }

    /// Counts records matching `filters`.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStorageError`] when the query fails.
    pub fn get_count<R: RecordModel>(
        &self,
        filters: &[Filter],
    ) -> Result<i64, SqliteStorageError> {
        self.run_in_transaction(|tx| get_count_tx::<R>(tx, filters))
    }

    /// Reads the single record matching `filters`, or `None`.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStorageError`] when the query fails or matches more
    /// than one row.
    pub fn get_one_or_none<R: RecordModel>(
        &self,
        filters: &[Filter],
    ) -> Result<Option<R>, SqliteStorageError> {
        self.run_in_transaction(|tx| get_one_or_none_tx(tx, filters))
    }

    /// Reads the first record matching `filters`, or `None`.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStorageError`] when the query fails.
    pub fn get_first<R: RecordModel>(
        &self,
        filters: &[Filter],
    ) -> Result<Option<R>, SqliteStorageError> {
        self.run_in_transaction(|tx| get_first_tx(tx, filters))
    }

    /// Upserts records by identity and commits.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStorageError`] when a write fails.
    pub fn merge_and_commit<R: RecordModel>(
        &self,
        records: &mut [R],
    ) -> Result<(), SqliteStorageError> {
        self.run_in_transaction(|tx| {
            for record in records.iter_mut() {
                merge_tx(tx, record)?;
            }
            Ok(())
        })
    }

    /// Applies `update_fields` to the row matching `filter_fields`,
    /// inserting when absent. Always commits.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStorageError`] when the write fails.
    pub fn update_or_insert<R: RecordModel>(
        &self,
        filter_fields: &[(&'static str, Value)],
        update_fields: &[(&'static str, Value)],
    ) -> Result<(), SqliteStorageError> {
        self.run_in_transaction(|tx| update_or_insert_tx::<R>(tx, filter_fields, update_fields))
    }

    /// Deletes all records matching `filters` and commits.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStorageError`] when the delete fails.
    pub fn delete_all<R: RecordModel>(
        &self,
        filters: &[Filter],
    ) -> Result<usize, SqliteStorageError> {
        self.run_in_transaction(|tx| delete_all_tx::<R>(tx, filters))
    }

    /// Reads matching records (ordered, limited), deletes exactly those
    /// rows, commits, and returns the pre-deletion snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStorageError`] when the read or delete fails.
    pub fn pop<R: RecordModel>(
        &self,
        limit: Option<usize>,
        filters: &[Filter],
        order_by: Option<OrderBy>,
    ) -> Result<Vec<R>, SqliteStorageError> {
        self.run_in_transaction(|tx| pop_tx(tx, limit, filters, order_by))
    }

    /// Increments `target_column` on the row matching `filters`, creating
    /// the row from `create_fields` when absent. Runs as one transaction so
    /// concurrent callers never lose an increment or leave duplicate rows.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStorageError`] when the write fails for reasons other
    /// than a recoverable insert race.
    pub fn increment_or_create<R: RecordModel>(
        &self,
        target_column: &'static str,
        filters: &[Filter],
        create_fields: &[(&'static str, Value)],
    ) -> Result<(), SqliteStorageError> {
        self.run_in_transaction(|tx| {
            increment_or_create_tx::<R>(tx, target_column, filters, create_fields)
        })
    }
}

// ============================================================================
// SECTION: Time
// ============================================================================

/// Returns the current unix epoch in milliseconds.
pub(crate) fn unix_millis() -> i64 {
    let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default();
    i64::try_from(now.as_millis()).unwrap_or(i64::MAX)
}
