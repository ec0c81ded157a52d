// crates/enemy-directory-store-sqlite/tests/migrations.rs
// ============================================================================
// Module: Migration Tests
// Description: Validate the forward-only migration ledger.
// Purpose: Ensure steps apply once, in order, and fail closed on unknown versions.
// Dependencies: enemy-directory-store-sqlite, enemy-directory-core, rusqlite, tempfile
// ============================================================================

//! ## Overview
//! Exercises [`apply_migrations`] directly against raw connections and through
//! [`SqliteRecordStore`] initialization.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions and helpers are permitted."
)]

use std::sync::Arc;
use std::sync::Barrier;
use std::thread;

use enemy_directory_core::Timestamp;
use enemy_directory_store_sqlite::MIGRATIONS;
use enemy_directory_store_sqlite::Migration;
use enemy_directory_store_sqlite::SqliteRecordStore;
use enemy_directory_store_sqlite::SqliteStoreConfig;
use enemy_directory_store_sqlite::SqliteStoreError;
use enemy_directory_store_sqlite::apply_migrations;
use rusqlite::Connection;
use rusqlite::params;
use tempfile::TempDir;

fn applied_at() -> Timestamp {
    Timestamp::parse_rfc3339("2021-12-31T14:59:05Z").unwrap()
}

fn ledger(conn: &Connection) -> Vec<(i64, String, String)> {
    let mut stmt =
        conn.prepare("SELECT version, name, applied_at FROM schema_migrations ORDER BY version").unwrap();
    stmt.query_map(params![], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))
        .unwrap()
        .collect::<Result<Vec<_>, _>>()
        .unwrap()
}

#[test]
fn first_run_applies_catalog_then_nothing() {
    let mut conn = Connection::open_in_memory().unwrap();
    let first = apply_migrations(&mut conn, MIGRATIONS, &applied_at()).unwrap();
    assert_eq!(first.applied, MIGRATIONS.len());
    assert_eq!(first.schema_version, 1);
    let second = apply_migrations(&mut conn, MIGRATIONS, &applied_at()).unwrap();
    assert_eq!(second.applied, 0);
    assert_eq!(second.schema_version, 1);
    assert_eq!(
        ledger(&conn),
        vec![(1, "create_enemies".to_string(), "2021-12-31T14:59:05Z".to_string())]
    );
}

#[test]
fn store_initialization_reports_applied_steps() {
    let temp = TempDir::new().unwrap();
    let config = SqliteStoreConfig::for_path(temp.path().join("store.sqlite"));
    let first = SqliteRecordStore::open(&config).unwrap();
    assert_eq!(first.migration_report().applied, 1);
    drop(first);
    let second = SqliteRecordStore::open(&config).unwrap();
    assert_eq!(second.migration_report().applied, 0);
}

#[test]
fn concurrent_initialization_applies_catalog_once() {
    const OPENERS: usize = 8;
    let temp = TempDir::new().unwrap();
    let config = SqliteStoreConfig::for_path(temp.path().join("store.sqlite"));
    let barrier = Arc::new(Barrier::new(OPENERS));
    let handles: Vec<_> = (0 .. OPENERS)
        .map(|_| {
            let config = config.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                SqliteRecordStore::open(&config).map(|store| store.migration_report().applied)
            })
        })
        .collect();
    let mut applied: Vec<usize> = handles
        .into_iter()
        .map(|handle| handle.join().unwrap().expect("concurrent open"))
        .collect();
    applied.sort_unstable();
    let mut wanted = vec![0; OPENERS - 1];
    wanted.push(1);
    assert_eq!(applied, wanted);
    let conn = Connection::open(temp.path().join("store.sqlite")).unwrap();
    assert_eq!(ledger(&conn).len(), MIGRATIONS.len());
}

#[test]
fn pending_steps_apply_in_ascending_order() {
    static CATALOG: &[Migration] = &[
        Migration {
            version: 1,
            name: "create_a",
            sql: "CREATE TABLE a (id INTEGER);",
        },
        Migration {
            version: 2,
            name: "alter_a",
            sql: "ALTER TABLE a ADD COLUMN label TEXT;",
        },
    ];
    let mut conn = Connection::open_in_memory().unwrap();
    apply_migrations(&mut conn, &CATALOG[.. 1], &applied_at()).unwrap();
    let report = apply_migrations(&mut conn, CATALOG, &applied_at()).unwrap();
    assert_eq!(report.applied, 1);
    assert_eq!(report.schema_version, 2);
    conn.execute("INSERT INTO a (id, label) VALUES (1, 'x')", params![]).unwrap();
}

#[test]
fn unknown_ledger_version_fails_closed() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("store.sqlite");
    {
        let mut conn = Connection::open(&path).unwrap();
        apply_migrations(&mut conn, MIGRATIONS, &applied_at()).unwrap();
        conn.execute(
            "INSERT INTO schema_migrations (version, name, applied_at) VALUES (99, 'future', ?1)",
            params!["2030-01-01T00:00:00Z"],
        )
        .unwrap();
    }
    let result = SqliteRecordStore::open(&SqliteStoreConfig::for_path(&path));
    assert!(matches!(result, Err(SqliteStoreError::VersionMismatch(_))));
}

#[test]
fn failing_step_rolls_back_everything() {
    static CATALOG: &[Migration] = &[
        Migration {
            version: 1,
            name: "create_b",
            sql: "CREATE TABLE b (id INTEGER);",
        },
        Migration {
            version: 2,
            name: "broken",
            sql: "THIS IS NOT SQL;",
        },
    ];
    let mut conn = Connection::open_in_memory().unwrap();
    let err = apply_migrations(&mut conn, CATALOG, &applied_at()).unwrap_err();
    assert!(matches!(err, SqliteStoreError::Migration { version: 2, .. }));
    let tables: i64 = conn
        .query_row(
            "SELECT count(*) FROM sqlite_master WHERE type = 'table' AND name IN ('b', \
             'schema_migrations')",
            params![],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(tables, 0);
}

#[test]
fn out_of_order_catalog_is_rejected() {
    static CATALOG: &[Migration] = &[
        Migration {
            version: 2,
            name: "second",
            sql: "SELECT 1;",
        },
        Migration {
            version: 1,
            name: "first",
            sql: "SELECT 1;",
        },
    ];
    let mut conn = Connection::open_in_memory().unwrap();
    let err = apply_migrations(&mut conn, CATALOG, &applied_at()).unwrap_err();
    assert!(matches!(err, SqliteStoreError::Invalid(_)));
}
