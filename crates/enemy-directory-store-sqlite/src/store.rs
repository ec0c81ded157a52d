// crates/enemy-directory-store-sqlite/src/store.rs
// ============================================================================
// Module: SQLite Record Store
// Description: Durable RecordStore backed by SQLite.
// Purpose: Map record store operations onto single relational statements.
// Dependencies: enemy-directory-core, rusqlite, serde, thiserror
// ============================================================================

//! ## Overview
//! [`SqliteRecordStore`] implements [`RecordStore`] over one shared `SQLite`
//! connection. Every data operation is a single statement held as a constant;
//! there are no explicit transactions around data operations, so concurrent
//! updates to the same record resolve last-writer-wins.
//!
//! Each statement runs with a progress handler bound to the caller's
//! [`CallContext`]. When the context is cancelled or its deadline passes the
//! handler interrupts the statement and the call reports
//! [`StoreError::Cancelled`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::ffi::c_int;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;

use enemy_directory_core::CallContext;
use enemy_directory_core::Clock;
use enemy_directory_core::IdGenerator;
use enemy_directory_core::NewRecord;
use enemy_directory_core::RandomIdGenerator;
use enemy_directory_core::Record;
use enemy_directory_core::RecordId;
use enemy_directory_core::RecordStore;
use enemy_directory_core::RecordUpdate;
use enemy_directory_core::StoreError;
use enemy_directory_core::SystemClock;
use enemy_directory_core::Timestamp;
use rusqlite::Connection;
use rusqlite::ErrorCode;
use rusqlite::OpenFlags;
use rusqlite::Row;
use rusqlite::params;
use serde::Deserialize;
use thiserror::Error;

use crate::migrations::MIGRATIONS;
use crate::migrations::MigrationReport;
use crate::migrations::apply_migrations;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default busy timeout (ms).
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
/// Maximum length of a single path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// VM instructions between cancellation checks.
const PROGRESS_HANDLER_OPS: c_int = 1_000;

/// Inserts a record and returns the stored row.
const INSERT_ENEMY: &str = "INSERT INTO enemies (enemy_id, full_name, email, rating, \
                            last_updated) VALUES (?1, ?2, ?3, ?4, ?5) RETURNING enemy_id, \
                            full_name, email, rating, last_updated";
/// Loads one record by id.
const SELECT_ENEMY: &str = "SELECT enemy_id, full_name, email, rating, last_updated FROM enemies \
                            WHERE enemy_id = ?1";
/// Replaces a record's fields and returns the stored row.
const UPDATE_ENEMY: &str = "UPDATE enemies SET full_name = ?1, email = ?2, rating = ?3, \
                            last_updated = ?4 WHERE enemy_id = ?5 RETURNING enemy_id, \
                            full_name, email, rating, last_updated";
/// Lists every record in creation order.
const LIST_ENEMIES: &str = "SELECT enemy_id, full_name, email, rating, last_updated FROM enemies \
                            ORDER BY seq ASC";

// ============================================================================
// SECTION: Config
// ============================================================================

/// `SQLite` journal mode configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteStoreMode {
    /// WAL journal mode (recommended).
    #[default]
    Wal,
    /// Delete journal mode (legacy).
    Delete,
}

impl SqliteStoreMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Wal => "wal",
            Self::Delete => "delete",
        }
    }
}

/// `SQLite` sync mode configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteSyncMode {
    /// Full synchronous mode (safest).
    #[default]
    Full,
    /// Normal synchronous mode (balanced).
    Normal,
}

impl SqliteSyncMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Normal => "normal",
        }
    }
}

/// Configuration for the `SQLite` record store.
#[derive(Debug, Clone, Deserialize)]
pub struct SqliteStoreConfig {
    /// Path to the `SQLite` database file.
    pub path: PathBuf,
    /// Busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    #[serde(default)]
    pub journal_mode: SqliteStoreMode,
    /// `SQLite` sync mode.
    #[serde(default)]
    pub sync_mode: SqliteSyncMode,
}

impl SqliteStoreConfig {
    /// Returns a config for `path` with default pragmas.
    #[must_use]
    pub fn for_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            journal_mode: SqliteStoreMode::default(),
            sync_mode: SqliteSyncMode::default(),
        }
    }
}

/// Returns the default busy timeout for `SQLite` connections.
const fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// `SQLite` store errors.
#[derive(Debug, Error)]
pub enum SqliteStoreError {
    /// Store I/O error.
    #[error("sqlite store io error: {0}")]
    Io(String),
    /// `SQLite` engine error.
    #[error("sqlite store db error: {0}")]
    Db(String),
    /// A migration step failed.
    #[error("sqlite store migration {version} ({name}) failed: {message}")]
    Migration {
        /// Version of the failing step.
        version: u32,
        /// Name of the failing step.
        name: String,
        /// Underlying engine message.
        message: String,
    },
    /// Store schema version mismatch.
    #[error("sqlite store version mismatch: {0}")]
    VersionMismatch(String),
    /// Invalid store data or configuration.
    #[error("sqlite store invalid data: {0}")]
    Invalid(String),
}

impl From<SqliteStoreError> for StoreError {
    fn from(error: SqliteStoreError) -> Self {
        match error {
            SqliteStoreError::Io(message) => Self::Io(message),
            SqliteStoreError::Db(message) => Self::Store(message),
            error @ SqliteStoreError::Migration {
                ..
            } => Self::Store(error.to_string()),
            SqliteStoreError::VersionMismatch(message) => Self::VersionMismatch(message),
            SqliteStoreError::Invalid(message) => Self::Invalid(message),
        }
    }
}

// ============================================================================
// SECTION: Store
// ============================================================================

/// `SQLite`-backed record store.
#[derive(Clone)]
pub struct SqliteRecordStore {
    /// Shared `SQLite` connection guarded by a mutex.
    connection: Arc<Mutex<Connection>>,
    /// Clock stamping `last_updated`.
    clock: Arc<dyn Clock>,
    /// Identifier source for new records.
    ids: Arc<dyn IdGenerator>,
    /// Migration outcome observed when the store was opened.
    migration_report: MigrationReport,
}

impl SqliteRecordStore {
    /// Opens the store with the system clock and random identifiers.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the database cannot be opened or
    /// migrated.
    pub fn open(config: &SqliteStoreConfig) -> Result<Self, SqliteStoreError> {
        Self::new(config, Arc::new(SystemClock), Arc::new(RandomIdGenerator))
    }

    /// Opens the store and applies pending migrations.
    ///
    /// `clock` stamps records only; the migration ledger records wall-clock
    /// time, so an injected clock sees its first read on the first write.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the database cannot be opened or
    /// migrated.
    pub fn new(
        config: &SqliteStoreConfig,
        clock: Arc<dyn Clock>,
        ids: Arc<dyn IdGenerator>,
    ) -> Result<Self, SqliteStoreError> {
        validate_store_path(&config.path)?;
        ensure_parent_dir(&config.path)?;
        let mut connection = open_connection(config)?;
        let migration_report = apply_migrations(&mut connection, MIGRATIONS, &SystemClock.now())?;
        Ok(Self {
            connection: Arc::new(Mutex::new(connection)),
            clock,
            ids,
            migration_report,
        })
    }

    /// Returns the migration outcome observed at open time.
    #[must_use]
    pub const fn migration_report(&self) -> MigrationReport {
        self.migration_report
    }

    /// Runs `op` on the connection with cancellation bound to `context`.
    fn with_connection<T>(
        &self,
        context: &CallContext,
        op: impl FnOnce(&Connection) -> rusqlite::Result<T>,
    ) -> Result<T, StoreError> {
        context.check()?;
        let guard = self
            .connection
            .lock()
            .map_err(|_| StoreError::Store("sqlite connection mutex poisoned".to_string()))?;
        context.check()?;
        let watched = context.clone();
        guard
            .progress_handler(PROGRESS_HANDLER_OPS, Some(move || watched.is_done()))
            .map_err(|err| StoreError::Store(format!("progress handler install failed: {err}")))?;
        let result = op(&guard);
        let cleared = guard.progress_handler(PROGRESS_HANDLER_OPS, None::<fn() -> bool>);
        drop(guard);
        let value = result.map_err(|err| map_statement_error(context, err))?;
        cleared
            .map_err(|err| StoreError::Store(format!("progress handler removal failed: {err}")))?;
        Ok(value)
    }
}

impl RecordStore for SqliteRecordStore {
    fn create(&self, context: &CallContext, record: NewRecord) -> Result<Record, StoreError> {
        let id = self.ids.next_id();
        let last_updated = format_timestamp(&self.clock.now())?;
        let row = self.with_connection(context, |conn| {
            conn.query_row(
                INSERT_ENEMY,
                params![id.as_str(), record.name, record.email, record.rating, last_updated],
                EnemyRow::from_row,
            )
        })?;
        row.into_record()
    }

    fn get(&self, context: &CallContext, id: &RecordId) -> Result<Record, StoreError> {
        let row = self
            .with_connection(context, |conn| {
                conn.query_row(SELECT_ENEMY, params![id.as_str()], EnemyRow::from_row)
            })
            .map_err(|err| not_found_for(err, id))?;
        row.into_record()
    }

    fn update(&self, context: &CallContext, update: RecordUpdate) -> Result<Record, StoreError> {
        let last_updated = format_timestamp(&self.clock.now())?;
        let row = self
            .with_connection(context, |conn| {
                conn.query_row(
                    UPDATE_ENEMY,
                    params![
                        update.name,
                        update.email,
                        update.rating,
                        last_updated,
                        update.id.as_str()
                    ],
                    EnemyRow::from_row,
                )
            })
            .map_err(|err| not_found_for(err, &update.id))?;
        row.into_record()
    }

    fn list(&self, context: &CallContext) -> Result<Vec<Record>, StoreError> {
        let rows = self.with_connection(context, |conn| {
            let mut stmt = conn.prepare(LIST_ENEMIES)?;
            let rows = stmt.query_map(params![], EnemyRow::from_row)?;
            rows.collect::<rusqlite::Result<Vec<_>>>()
        })?;
        rows.into_iter().map(EnemyRow::into_record).collect()
    }
}

// ============================================================================
// SECTION: Rows
// ============================================================================

/// Raw `enemies` row before timestamp decoding.
struct EnemyRow {
    /// `enemy_id` column.
    enemy_id: String,
    /// `full_name` column.
    full_name: String,
    /// `email` column.
    email: String,
    /// `rating` column.
    rating: f64,
    /// `last_updated` column (RFC 3339 text).
    last_updated: String,
}

impl EnemyRow {
    /// Reads the five selected columns in statement order.
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            enemy_id: row.get(0)?,
            full_name: row.get(1)?,
            email: row.get(2)?,
            rating: row.get(3)?,
            last_updated: row.get(4)?,
        })
    }

    /// Reconstructs the domain record.
    fn into_record(self) -> Result<Record, StoreError> {
        let last_updated = Timestamp::parse_rfc3339(&self.last_updated).map_err(|err| {
            StoreError::Corrupt(format!("enemy {} has unreadable last_updated: {err}", self.enemy_id))
        })?;
        Ok(Record {
            id: RecordId::new(self.enemy_id),
            name: self.full_name,
            email: self.email,
            rating: self.rating,
            last_updated,
        })
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Formats a timestamp for the `last_updated` column.
fn format_timestamp(timestamp: &Timestamp) -> Result<String, StoreError> {
    timestamp.to_rfc3339().map_err(|err| StoreError::Invalid(err.to_string()))
}

/// Maps a statement error, preferring the context's cancellation reason.
fn map_statement_error(context: &CallContext, err: rusqlite::Error) -> StoreError {
    match err {
        rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound(RecordId::new("")),
        err if err.sqlite_error_code() == Some(ErrorCode::OperationInterrupted) => context
            .check()
            .err()
            .unwrap_or_else(|| StoreError::Cancelled("statement interrupted".to_string())),
        err => StoreError::Store(err.to_string()),
    }
}

/// Attaches the requested id to a zero-row result.
fn not_found_for(err: StoreError, id: &RecordId) -> StoreError {
    match err {
        StoreError::NotFound(_) => StoreError::NotFound(id.clone()),
        other => other,
    }
}

/// Ensures the parent directory for the store exists.
fn ensure_parent_dir(path: &Path) -> Result<(), SqliteStoreError> {
    let Some(parent) = path.parent() else {
        return Err(SqliteStoreError::Io("store path missing parent directory".to_string()));
    };
    if parent.as_os_str().is_empty() {
        return Ok(());
    }
    std::fs::create_dir_all(parent).map_err(|err| SqliteStoreError::Io(err.to_string()))
}

/// Validates store paths for safety limits.
fn validate_store_path(path: &Path) -> Result<(), SqliteStoreError> {
    let path_string = path.display().to_string();
    if path_string.is_empty() {
        return Err(SqliteStoreError::Invalid("store path is empty".to_string()));
    }
    if path_string.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(SqliteStoreError::Invalid("store path exceeds length limit".to_string()));
    }
    for component in path.components() {
        let name = component.as_os_str().to_string_lossy();
        if name.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(SqliteStoreError::Invalid(
                "store path contains an overlong component".to_string(),
            ));
        }
    }
    if path.exists() && path.is_dir() {
        return Err(SqliteStoreError::Invalid(
            "store path must be a file, not a directory".to_string(),
        ));
    }
    Ok(())
}

/// Opens an `SQLite` connection with secure defaults.
fn open_connection(config: &SqliteStoreConfig) -> Result<Connection, SqliteStoreError> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_FULL_MUTEX;
    let connection = Connection::open_with_flags(&config.path, flags)
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    apply_pragmas(&connection, config)?;
    Ok(connection)
}

/// Applies `SQLite` pragmas required for durability.
fn apply_pragmas(
    connection: &Connection,
    config: &SqliteStoreConfig,
) -> Result<(), SqliteStoreError> {
    connection
        .execute_batch(&format!("PRAGMA journal_mode = {};", config.journal_mode.pragma_value()))
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    connection
        .execute_batch(&format!("PRAGMA synchronous = {};", config.sync_mode.pragma_value()))
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    connection
        .busy_timeout(std::time::Duration::from_millis(config.busy_timeout_ms))
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    Ok(())
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests;
