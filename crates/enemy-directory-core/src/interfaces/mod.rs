// crates/enemy-directory-core/src/interfaces/mod.rs
// ============================================================================
// Module: Enemy Directory Interfaces
// Description: Backend-agnostic seams for persistence, time, and identifiers.
// Purpose: Define the contracts record stores and their collaborators implement.
// Dependencies: crate::core, thiserror
// ============================================================================

//! ## Overview
//! The [`RecordStore`] trait is the only path between the RPC layer and
//! persistence. Backends receive their [`Clock`] and [`IdGenerator`] at
//! construction so `id` and `last_updated` can be pinned in tests.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

use crate::core::CallContext;
use crate::core::NewRecord;
use crate::core::Record;
use crate::core::RecordId;
use crate::core::RecordUpdate;
use crate::core::Timestamp;

// ============================================================================
// SECTION: Record Store
// ============================================================================

/// Record store errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// No record exists for the identifier.
    #[error("enemy not found: {0}")]
    NotFound(RecordId),
    /// Call was cancelled or ran past its deadline.
    #[error("record store call cancelled: {0}")]
    Cancelled(String),
    /// Store I/O error.
    #[error("record store io error: {0}")]
    Io(String),
    /// Stored data is corrupted or cannot be decoded.
    #[error("record store corruption: {0}")]
    Corrupt(String),
    /// Stored schema version is incompatible.
    #[error("record store version mismatch: {0}")]
    VersionMismatch(String),
    /// Store data is invalid.
    #[error("record store invalid data: {0}")]
    Invalid(String),
    /// Store reported an error.
    #[error("record store error: {0}")]
    Store(String),
}

impl StoreError {
    /// Returns a stable label for the error category.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::Cancelled(_) => "cancelled",
            Self::Io(_) => "io",
            Self::Corrupt(_) => "corrupt",
            Self::VersionMismatch(_) => "version_mismatch",
            Self::Invalid(_) => "invalid",
            Self::Store(_) => "store",
        }
    }
}

/// Repository of enemy records.
///
/// Every operation receives the caller's [`CallContext`] and must return
/// [`StoreError::Cancelled`] without touching storage when the context is
/// already done.
pub trait RecordStore {
    /// Creates a record with a store-assigned id and timestamp.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the insert fails.
    fn create(&self, context: &CallContext, record: NewRecord) -> Result<Record, StoreError>;

    /// Loads a record by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when no record matches.
    fn get(&self, context: &CallContext, id: &RecordId) -> Result<Record, StoreError>;

    /// Replaces a record's descriptive fields and refreshes its timestamp.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when no record matches.
    fn update(&self, context: &CallContext, update: RecordUpdate) -> Result<Record, StoreError>;

    /// Lists every record in creation order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the query fails.
    fn list(&self, context: &CallContext) -> Result<Vec<Record>, StoreError>;
}

// ============================================================================
// SECTION: Capabilities
// ============================================================================

/// Source of the current instant for store writes.
pub trait Clock: Send + Sync {
    /// Returns the current instant.
    fn now(&self) -> Timestamp;
}

/// Source of fresh record identifiers.
pub trait IdGenerator: Send + Sync {
    /// Returns an identifier not previously issued by this generator.
    fn next_id(&self) -> RecordId;
}
