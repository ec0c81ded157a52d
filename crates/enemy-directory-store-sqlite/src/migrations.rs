// crates/enemy-directory-store-sqlite/src/migrations.rs
// ============================================================================
// Module: Schema Migrations
// Description: Embedded forward-only migration catalog and ledger.
// Purpose: Bring a database file up to the schema the record store expects.
// Dependencies: enemy-directory-core, rusqlite
// ============================================================================

//! ## Overview
//! Migrations are ordered, forward-only SQL steps compiled into the binary.
//! Each applied step is recorded in the `schema_migrations` ledger, so a step
//! runs at most once per database. All pending steps apply inside a single
//! `BEGIN IMMEDIATE` transaction: concurrent initializers serialize on the
//! write lock and the loser observes the winner's ledger rows. A ledger row
//! whose version the catalog does not know means the file was written by a
//! newer build; initialization fails closed rather than guessing.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;

use enemy_directory_core::Timestamp;
use rusqlite::Connection;
use rusqlite::TransactionBehavior;
use rusqlite::params;

use crate::store::SqliteStoreError;

// ============================================================================
// SECTION: Catalog
// ============================================================================

/// One forward-only schema step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Migration {
    /// Ledger version; strictly ascending within a catalog.
    pub version: u32,
    /// Human-readable step name.
    pub name: &'static str,
    /// SQL executed as a batch.
    pub sql: &'static str,
}

/// Embedded migration catalog, in application order.
pub static MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "create_enemies",
    sql: include_str!("../migrations/0001_create_enemies.sql"),
}];

/// Ledger table tracking applied steps.
const CREATE_LEDGER: &str = "CREATE TABLE IF NOT EXISTS schema_migrations (
    version    INTEGER PRIMARY KEY,
    name       TEXT NOT NULL,
    applied_at TEXT NOT NULL
);";
/// Reads applied versions.
const SELECT_APPLIED: &str = "SELECT version FROM schema_migrations ORDER BY version";
/// Records an applied step.
const INSERT_APPLIED: &str =
    "INSERT INTO schema_migrations (version, name, applied_at) VALUES (?1, ?2, ?3)";

// ============================================================================
// SECTION: Report
// ============================================================================

/// Outcome of a migration run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MigrationReport {
    /// Number of steps applied by this run.
    pub applied: usize,
    /// Highest version recorded in the ledger afterwards (0 when empty).
    pub schema_version: u32,
}

// ============================================================================
// SECTION: Apply
// ============================================================================

/// Applies every catalog step missing from the ledger.
///
/// # Errors
///
/// Returns [`SqliteStoreError::Invalid`] for a malformed catalog,
/// [`SqliteStoreError::VersionMismatch`] when the ledger holds an unknown
/// version, [`SqliteStoreError::Migration`] when a step fails, and
/// [`SqliteStoreError::Db`] for ledger access failures. Nothing is committed
/// on error.
pub fn apply_migrations(
    connection: &mut Connection,
    catalog: &[Migration],
    applied_at: &Timestamp,
) -> Result<MigrationReport, SqliteStoreError> {
    validate_catalog(catalog)?;
    let applied_at =
        applied_at.to_rfc3339().map_err(|err| SqliteStoreError::Invalid(err.to_string()))?;
    let tx = connection
        .transaction_with_behavior(TransactionBehavior::Immediate)
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    tx.execute_batch(CREATE_LEDGER).map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    let recorded = {
        let mut stmt =
            tx.prepare(SELECT_APPLIED).map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        let rows = stmt
            .query_map(params![], |row| row.get::<_, i64>(0))
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        let mut recorded = BTreeSet::new();
        for row in rows {
            recorded.insert(row.map_err(|err| SqliteStoreError::Db(err.to_string()))?);
        }
        recorded
    };
    for version in &recorded {
        if !catalog.iter().any(|step| i64::from(step.version) == *version) {
            return Err(SqliteStoreError::VersionMismatch(format!(
                "database schema version {version} is not in the migration catalog"
            )));
        }
    }
    let mut applied = 0_usize;
    for step in catalog {
        if recorded.contains(&i64::from(step.version)) {
            continue;
        }
        tx.execute_batch(step.sql).map_err(|err| SqliteStoreError::Migration {
            version: step.version,
            name: step.name.to_string(),
            message: err.to_string(),
        })?;
        tx.execute(INSERT_APPLIED, params![i64::from(step.version), step.name, applied_at])
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        applied += 1;
    }
    tx.commit().map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    Ok(MigrationReport {
        applied,
        schema_version: catalog.last().map_or(0, |step| step.version),
    })
}

/// Rejects catalogs that are not strictly ascending from version 1 upward.
fn validate_catalog(catalog: &[Migration]) -> Result<(), SqliteStoreError> {
    let mut previous = 0_u32;
    for step in catalog {
        if step.version <= previous {
            return Err(SqliteStoreError::Invalid(format!(
                "migration catalog out of order at version {} ({})",
                step.version, step.name
            )));
        }
        previous = step.version;
    }
    Ok(())
}
