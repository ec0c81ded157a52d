// crates/enemy-directory-store-sqlite/src/lib.rs
// ============================================================================
// Module: SQLite Record Store
// Description: Durable RecordStore backend using SQLite.
// Purpose: Persist enemy records and migrate the schema on first run.
// Dependencies: enemy-directory-core, rusqlite
// ============================================================================

//! ## Overview
//! This crate provides a SQLite-backed [`enemy_directory_core::RecordStore`].
//! Opening the store applies any pending steps from the embedded migration
//! catalog before the first data operation, so a fresh database file becomes
//! usable without a separate setup step.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod migrations;
pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use migrations::MIGRATIONS;
pub use migrations::Migration;
pub use migrations::MigrationReport;
pub use migrations::apply_migrations;
pub use store::SqliteRecordStore;
pub use store::SqliteStoreConfig;
pub use store::SqliteStoreError;
pub use store::SqliteStoreMode;
pub use store::SqliteSyncMode;
