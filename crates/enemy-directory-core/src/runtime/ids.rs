// crates/enemy-directory-core/src/runtime/ids.rs
// ============================================================================
// Module: Identifier Generators
// Description: Random and fixed record identifier sources.
// Purpose: Issue store-assigned record identifiers.
// Dependencies: crate::{core, interfaces}, rand
// ============================================================================

//! ## Overview
//! [`RandomIdGenerator`] issues 20-character lowercase base32hex tokens
//! (100 bits of randomness). [`FixedIdGenerator`] returns one configured id
//! and exists for tests that assert on the stored identifier.

// ============================================================================
// SECTION: Imports
// ============================================================================

use rand::Rng;

use crate::core::RecordId;
use crate::interfaces::IdGenerator;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Characters used in generated identifiers (base32hex, lowercase).
pub const RECORD_ID_ALPHABET: &[u8; 32] = b"0123456789abcdefghijklmnopqrstuv";

/// Length of generated identifiers.
pub const RECORD_ID_LEN: usize = 20;

// ============================================================================
// SECTION: Generators
// ============================================================================

/// Identifier generator backed by the thread-local random source.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomIdGenerator;

impl IdGenerator for RandomIdGenerator {
    fn next_id(&self) -> RecordId {
        let mut rng = rand::thread_rng();
        let token: String = (0 .. RECORD_ID_LEN)
            .map(|_| char::from(RECORD_ID_ALPHABET[rng.gen_range(0 .. RECORD_ID_ALPHABET.len())]))
            .collect();
        RecordId::new(token)
    }
}

/// Identifier generator that always returns the same id.
#[derive(Debug, Clone)]
pub struct FixedIdGenerator {
    /// Identifier returned by every call.
    id: RecordId,
}

impl FixedIdGenerator {
    /// Creates a generator that always returns `id`.
    #[must_use]
    pub fn new(id: impl Into<RecordId>) -> Self {
        Self {
            id: id.into(),
        }
    }
}

impl IdGenerator for FixedIdGenerator {
    fn next_id(&self) -> RecordId {
        self.id.clone()
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
