// crates/enemy-directory-core/src/runtime/mod.rs
// ============================================================================
// Module: Enemy Directory Runtime
// Description: Concrete clocks, identifier generators, and in-memory storage.
// Purpose: Supply production and test implementations of the core interfaces.
// Dependencies: crate::{core, interfaces}, rand, time
// ============================================================================

//! ## Overview
//! Runtime modules provide the default [`crate::Clock`] and
//! [`crate::IdGenerator`] implementations, deterministic test doubles for both,
//! and the in-memory [`crate::RecordStore`] used for local experiments.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod clock;
pub mod ids;
pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use clock::FixedClock;
pub use clock::SequenceClock;
pub use clock::SystemClock;
pub use ids::FixedIdGenerator;
pub use ids::RandomIdGenerator;
pub use ids::RECORD_ID_ALPHABET;
pub use ids::RECORD_ID_LEN;
pub use store::InMemoryRecordStore;
pub use store::SharedRecordStore;
