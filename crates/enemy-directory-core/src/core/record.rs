// crates/enemy-directory-core/src/core/record.rs
// ============================================================================
// Module: Enemy Records
// Description: Domain record and the write shapes accepted by record stores.
// Purpose: Describe the persisted enemy entity and its create/update inputs.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! A [`Record`] describes one enemy. Records are created once, replaced in full
//! by updates addressed by id, and never deleted. The store owns `id` and
//! `last_updated`; callers only provide the descriptive fields.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::RecordId;
use crate::core::timestamp::Timestamp;

// ============================================================================
// SECTION: Records
// ============================================================================

/// Persisted enemy record.
///
/// # Invariants
/// - `id` is assigned by the store at creation and never changes.
/// - `last_updated` is set by the store on every create and update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Store-assigned identifier.
    pub id: RecordId,
    /// Display name.
    pub name: String,
    /// Contact email; format is not validated.
    pub email: String,
    /// Numeric rating.
    pub rating: f64,
    /// Instant of the most recent write.
    pub last_updated: Timestamp,
}

/// Descriptive fields for a record about to be created.
#[derive(Debug, Clone, PartialEq)]
pub struct NewRecord {
    /// Display name.
    pub name: String,
    /// Contact email.
    pub email: String,
    /// Numeric rating.
    pub rating: f64,
}

/// Full replacement of a record's descriptive fields.
///
/// Empty strings and a zero rating are written as given; there is no
/// partial-update behavior.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordUpdate {
    /// Identifier of the record to replace.
    pub id: RecordId,
    /// Replacement display name.
    pub name: String,
    /// Replacement email.
    pub email: String,
    /// Replacement rating.
    pub rating: f64,
}
