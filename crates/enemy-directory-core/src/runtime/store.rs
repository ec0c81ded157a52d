// crates/enemy-directory-core/src/runtime/store.rs
// ============================================================================
// Module: Enemy Directory In-Memory Store
// Description: In-memory record store and the shared store wrapper.
// Purpose: Provide a dependency-free store for local runs and dispatcher tests.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! [`InMemoryRecordStore`] keeps records in creation order behind a mutex and
//! follows the same contract as the SQLite store: store-assigned ids and
//! timestamps, `NotFound` for unknown ids, insertion-ordered listing. State is
//! lost when the process exits.
//!
//! [`SharedRecordStore`] erases the backend type so the RPC layer can hold
//! any store behind one clonable handle.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::sync::Mutex;

use crate::core::CallContext;
use crate::core::NewRecord;
use crate::core::Record;
use crate::core::RecordId;
use crate::core::RecordUpdate;
use crate::interfaces::Clock;
use crate::interfaces::IdGenerator;
use crate::interfaces::RecordStore;
use crate::interfaces::StoreError;
use crate::runtime::clock::SystemClock;
use crate::runtime::ids::RandomIdGenerator;

// ============================================================================
// SECTION: In-Memory Store
// ============================================================================

/// In-memory record store for local experiments and tests.
#[derive(Clone)]
pub struct InMemoryRecordStore {
    /// Records in creation order, protected by a mutex.
    records: Arc<Mutex<Vec<Record>>>,
    /// Clock stamping `last_updated`.
    clock: Arc<dyn Clock>,
    /// Identifier source for new records.
    ids: Arc<dyn IdGenerator>,
}

impl Default for InMemoryRecordStore {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock), Arc::new(RandomIdGenerator))
    }
}

impl InMemoryRecordStore {
    /// Creates an empty store with explicit clock and id collaborators.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>, ids: Arc<dyn IdGenerator>) -> Self {
        Self {
            records: Arc::new(Mutex::new(Vec::new())),
            clock,
            ids,
        }
    }

    /// Locks the record list.
    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Vec<Record>>, StoreError> {
        self.records
            .lock()
            .map_err(|_| StoreError::Store("record store mutex poisoned".to_string()))
    }
}

impl RecordStore for InMemoryRecordStore {
    fn create(&self, context: &CallContext, record: NewRecord) -> Result<Record, StoreError> {
        context.check()?;
        let created = Record {
            id: self.ids.next_id(),
            name: record.name,
            email: record.email,
            rating: record.rating,
            last_updated: self.clock.now(),
        };
        let mut guard = self.lock()?;
        if guard.iter().any(|existing| existing.id == created.id) {
            return Err(StoreError::Store(format!("duplicate enemy id: {}", created.id)));
        }
        guard.push(created.clone());
        drop(guard);
        Ok(created)
    }

    fn get(&self, context: &CallContext, id: &RecordId) -> Result<Record, StoreError> {
        context.check()?;
        let guard = self.lock()?;
        guard
            .iter()
            .find(|record| record.id == *id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.clone()))
    }

    fn update(&self, context: &CallContext, update: RecordUpdate) -> Result<Record, StoreError> {
        context.check()?;
        let last_updated = self.clock.now();
        let mut guard = self.lock()?;
        let Some(record) = guard.iter_mut().find(|record| record.id == update.id) else {
            return Err(StoreError::NotFound(update.id));
        };
        record.name = update.name;
        record.email = update.email;
        record.rating = update.rating;
        record.last_updated = last_updated;
        let updated = record.clone();
        drop(guard);
        Ok(updated)
    }

    fn list(&self, context: &CallContext) -> Result<Vec<Record>, StoreError> {
        context.check()?;
        Ok(self.lock()?.clone())
    }
}

// ============================================================================
// SECTION: Shared Store Wrapper
// ============================================================================

/// Shared record store backed by an `Arc` trait object.
#[derive(Clone)]
pub struct SharedRecordStore {
    /// Inner store implementation.
    inner: Arc<dyn RecordStore + Send + Sync>,
}

impl SharedRecordStore {
    /// Wraps a record store in a shared, clonable wrapper.
    #[must_use]
    pub fn from_store(store: impl RecordStore + Send + Sync + 'static) -> Self {
        Self {
            inner: Arc::new(store),
        }
    }

    /// Wraps an existing shared store.
    #[must_use]
    pub const fn new(store: Arc<dyn RecordStore + Send + Sync>) -> Self {
        Self {
            inner: store,
        }
    }
}

impl RecordStore for SharedRecordStore {
    fn create(&self, context: &CallContext, record: NewRecord) -> Result<Record, StoreError> {
        self.inner.create(context, record)
    }

    fn get(&self, context: &CallContext, id: &RecordId) -> Result<Record, StoreError> {
        self.inner.get(context, id)
    }

    fn update(&self, context: &CallContext, update: RecordUpdate) -> Result<Record, StoreError> {
        self.inner.update(context, update)
    }

    fn list(&self, context: &CallContext) -> Result<Vec<Record>, StoreError> {
        self.inner.list(context)
    }
}
