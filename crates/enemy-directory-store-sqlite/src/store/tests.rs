// crates/enemy-directory-store-sqlite/src/store/tests.rs
// ============================================================================
// Module: SQLite Store Unit Tests
// Description: Cancellation and error-mapping tests for the SQLite store.
// Purpose: Ensure in-flight statements stop when their call context ends.
// Dependencies: super, tempfile
// ============================================================================

//! ## Overview
//! Drives an unbounded recursive query through the store's connection scope so
//! the only way it can finish is through the progress-handler interrupt.

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

use std::thread;
use std::time::Duration;

use enemy_directory_core::CallContext;
use enemy_directory_core::RecordId;
use enemy_directory_core::StoreError;
use rusqlite::params;
use tempfile::TempDir;

use super::SqliteRecordStore;
use super::SqliteStoreConfig;
use super::map_statement_error;
use super::not_found_for;

/// Never terminates on its own.
const ENDLESS_QUERY: &str = "WITH RECURSIVE counter(x) AS (SELECT 1 UNION ALL SELECT x + 1 FROM \
                             counter) SELECT count(*) FROM counter";

/// Long enough to trigger the progress handler many times.
const BOUNDED_QUERY: &str = "WITH RECURSIVE counter(x) AS (SELECT 1 UNION ALL SELECT x + 1 FROM \
                             counter WHERE x < 100000) SELECT count(*) FROM counter";

fn open_store(temp: &TempDir) -> SqliteRecordStore {
    SqliteRecordStore::open(&SqliteStoreConfig::for_path(temp.path().join("store.sqlite")))
        .expect("store init")
}

fn run_endless(store: &SqliteRecordStore, context: &CallContext) -> Result<i64, StoreError> {
    store.with_connection(context, |conn| {
        conn.query_row(ENDLESS_QUERY, params![], |row| row.get::<_, i64>(0))
    })
}

#[test]
fn cancel_flag_interrupts_running_statement() {
    let temp = TempDir::new().unwrap();
    let store = open_store(&temp);
    let context = CallContext::background();
    let canceller = context.clone();
    let handle = thread::spawn(move || {
        thread::sleep(Duration::from_millis(50));
        canceller.cancel();
    });
    let err = run_endless(&store, &context).unwrap_err();
    handle.join().unwrap();
    assert_eq!(err, StoreError::Cancelled("request cancelled".to_string()));
}

#[test]
fn deadline_interrupts_running_statement() {
    let temp = TempDir::new().unwrap();
    let store = open_store(&temp);
    let context = CallContext::with_timeout(Duration::from_millis(50));
    let err = run_endless(&store, &context).unwrap_err();
    assert_eq!(err, StoreError::Cancelled("deadline exceeded".to_string()));
}

#[test]
fn connection_is_usable_after_interrupt() {
    let temp = TempDir::new().unwrap();
    let store = open_store(&temp);
    let context = CallContext::with_timeout(Duration::from_millis(20));
    assert!(run_endless(&store, &context).is_err());
    let count = store
        .with_connection(&CallContext::background(), |conn| {
            conn.query_row("SELECT count(*) FROM enemies", params![], |row| row.get::<_, i64>(0))
        })
        .unwrap();
    assert_eq!(count, 0);
}

#[test]
fn handler_does_not_outlive_its_call() {
    let temp = TempDir::new().unwrap();
    let store = open_store(&temp);
    let finished = CallContext::background();
    store
        .with_connection(&finished, |conn| {
            conn.query_row("SELECT count(*) FROM enemies", params![], |row| row.get::<_, i64>(0))
        })
        .unwrap();
    finished.cancel();
    let total = store
        .with_connection(&CallContext::background(), |conn| {
            conn.query_row(BOUNDED_QUERY, params![], |row| row.get::<_, i64>(0))
        })
        .unwrap();
    assert_eq!(total, 100_000);
}

#[test]
fn zero_rows_become_not_found_for_requested_id() {
    let mapped = map_statement_error(&CallContext::background(), rusqlite::Error::QueryReturnedNoRows);
    let err = not_found_for(mapped, &RecordId::new("enemyID"));
    assert_eq!(err, StoreError::NotFound(RecordId::new("enemyID")));
}
