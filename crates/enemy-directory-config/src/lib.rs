// crates/enemy-directory-config/src/lib.rs
// ============================================================================
// Module: Enemy Directory Config Library
// Description: Canonical config model and validation.
// Purpose: Single source of truth for enemy-directory.toml semantics.
// Dependencies: enemy-directory-store-sqlite, serde, toml
// ============================================================================

//! ## Overview
//! `enemy-directory-config` defines the configuration model for the Enemy
//! Directory server: a TOML file layered with a small set of environment
//! overrides, validated fail-closed before anything binds or opens storage.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
