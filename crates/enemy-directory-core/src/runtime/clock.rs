// crates/enemy-directory-core/src/runtime/clock.rs
// ============================================================================
// Module: Clocks
// Description: Wall-clock and deterministic clock implementations.
// Purpose: Provide the instants stores stamp on written records.
// Dependencies: crate::{core, interfaces}, time
// ============================================================================

//! ## Overview
//! [`SystemClock`] reads UTC wall-clock time. [`FixedClock`] and
//! [`SequenceClock`] return predictable instants so stored `last_updated`
//! values can be asserted exactly.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::time::Duration;

use time::OffsetDateTime;

use crate::core::Timestamp;
use crate::interfaces::Clock;

// ============================================================================
// SECTION: Clocks
// ============================================================================

/// Clock backed by the system's UTC wall-clock time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::from_datetime(OffsetDateTime::now_utc())
    }
}

/// Clock that always returns the same instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    /// Instant returned by every call.
    instant: Timestamp,
}

impl FixedClock {
    /// Creates a clock pinned to `instant`.
    #[must_use]
    pub const fn new(instant: Timestamp) -> Self {
        Self {
            instant,
        }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> Timestamp {
        self.instant
    }
}

/// Clock that advances by a fixed step on every call.
#[derive(Debug)]
pub struct SequenceClock {
    /// Instant returned by the first call.
    start: Timestamp,
    /// Step between consecutive calls, in nanoseconds.
    step_nanos: i128,
    /// Number of calls made so far.
    calls: AtomicU64,
}

impl SequenceClock {
    /// Creates a clock starting at `start` and advancing by `step`.
    #[must_use]
    pub fn new(start: Timestamp, step: Duration) -> Self {
        Self {
            start,
            step_nanos: i128::try_from(step.as_nanos()).unwrap_or(i128::MAX),
            calls: AtomicU64::new(0),
        }
    }
}

impl Clock for SequenceClock {
    fn now(&self) -> Timestamp {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        let offset = self.step_nanos.saturating_mul(i128::from(call));
        Timestamp::from_unix_nanos(self.start.unix_nanos().saturating_add(offset))
            .unwrap_or(self.start)
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
