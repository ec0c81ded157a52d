// crates/enemy-directory-core/src/core/context.rs
// ============================================================================
// Module: Call Context
// Description: Deadline and cancellation signal carried by every store call.
// Purpose: Let callers bound and abort in-flight persistence work.
// Dependencies: std
// ============================================================================

//! ## Overview
//! A [`CallContext`] pairs an optional deadline with a shared cancellation
//! flag. Clones observe the same flag, so a transport can hand one clone to a
//! blocking store call and cancel it from another task once its own timer
//! fires.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::time::Duration;
use std::time::Instant;

use crate::interfaces::StoreError;

// ============================================================================
// SECTION: Call Context
// ============================================================================

/// Deadline and cancellation state for one store call.
#[derive(Debug, Clone, Default)]
pub struct CallContext {
    /// Instant after which the call must stop.
    deadline: Option<Instant>,
    /// Shared flag set when the caller abandons the call.
    cancelled: Arc<AtomicBool>,
}

impl CallContext {
    /// Returns a context with no deadline.
    #[must_use]
    pub fn background() -> Self {
        Self::default()
    }

    /// Returns a context that expires at `deadline`.
    #[must_use]
    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            deadline: Some(deadline),
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Returns a context that expires `timeout` from now.
    ///
    /// A timeout too large to represent yields a context with no deadline.
    #[must_use]
    pub fn with_timeout(timeout: Duration) -> Self {
        Instant::now().checked_add(timeout).map_or_else(Self::background, Self::with_deadline)
    }

    /// Returns the deadline, if any.
    #[must_use]
    pub const fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Marks the call as cancelled for every clone of this context.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Returns true when the call was cancelled or its deadline has passed.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst) || self.deadline_passed()
    }

    /// Fails with [`StoreError::Cancelled`] when the call should stop.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Cancelled`] when cancelled or past the deadline.
    pub fn check(&self) -> Result<(), StoreError> {
        if self.cancelled.load(Ordering::SeqCst) {
            return Err(StoreError::Cancelled("request cancelled".to_string()));
        }
        if self.deadline_passed() {
            return Err(StoreError::Cancelled("deadline exceeded".to_string()));
        }
        Ok(())
    }

    /// Returns true when the deadline exists and has passed.
    fn deadline_passed(&self) -> bool {
        self.deadline.is_some_and(|deadline| Instant::now() >= deadline)
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
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

    use std::time::Duration;
    use std::time::Instant;

    use super::CallContext;
    use crate::interfaces::StoreError;

    #[test]
    fn background_context_never_expires() {
        let context = CallContext::background();
        assert!(context.deadline().is_none());
        assert!(!context.is_done());
        assert!(context.check().is_ok());
    }

    #[test]
    fn expired_deadline_reports_cancelled() {
        let context = CallContext::with_deadline(Instant::now());
        assert!(context.is_done());
        assert_eq!(context.check(), Err(StoreError::Cancelled("deadline exceeded".to_string())));
    }

    #[test]
    fn cancel_is_visible_to_clones() {
        let context = CallContext::with_timeout(Duration::from_secs(60));
        let observer = context.clone();
        assert!(!observer.is_done());
        context.cancel();
        assert!(observer.is_done());
        assert_eq!(observer.check(), Err(StoreError::Cancelled("request cancelled".to_string())));
    }
}
