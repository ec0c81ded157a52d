// crates/enemy-directory-core/src/core/mod.rs
// ============================================================================
// Module: Enemy Directory Core Types
// Description: Canonical record, identifier, time, and call-context types.
// Purpose: Provide stable, serializable types for enemy records.
// Dependencies: serde, time
// ============================================================================

//! ## Overview
//! Core types are the canonical source of truth for every derived surface
//! (the JSON-RPC transport, the CLI client, and the relational row layout).

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod context;
pub mod identifiers;
pub mod record;
pub mod timestamp;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use context::CallContext;
pub use identifiers::RecordId;
pub use record::NewRecord;
pub use record::Record;
pub use record::RecordUpdate;
pub use timestamp::Timestamp;
pub use timestamp::TimestampError;
