// crates/enemy-directory-core/src/lib.rs
// ============================================================================
// Module: Enemy Directory Core Library
// Description: Public API surface for the Enemy Directory core.
// Purpose: Expose record types, store interfaces, and runtime helpers.
// Dependencies: crate::{core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! Enemy Directory core defines the record model shared by every layer of the
//! service: the opaque [`RecordId`], the UTC [`Timestamp`], the [`Record`]
//! itself, and the [`RecordStore`] repository seam that persistence backends
//! implement. Time and identifier generation are explicit capabilities
//! ([`Clock`], [`IdGenerator`]) so backends stay deterministic under test.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use self::core::*;

pub use interfaces::Clock;
pub use interfaces::IdGenerator;
pub use interfaces::RecordStore;
pub use interfaces::StoreError;
pub use runtime::FixedClock;
pub use runtime::FixedIdGenerator;
pub use runtime::InMemoryRecordStore;
pub use runtime::RandomIdGenerator;
pub use runtime::SequenceClock;
pub use runtime::SharedRecordStore;
pub use runtime::SystemClock;
