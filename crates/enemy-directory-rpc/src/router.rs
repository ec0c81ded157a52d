// crates/enemy-directory-rpc/src/router.rs
// ============================================================================
// Module: Enemy Router
// Description: Request validation and dispatch for the enemy RPC methods.
// Purpose: Reject malformed input before I/O and delegate to the record store.
// Dependencies: enemy-directory-core, serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! [`EnemyRouter`] sits between the JSON-RPC transport and the
//! [`RecordStore`]. It decodes method params into typed requests, validates
//! them, and forwards accepted calls to the store. It performs no I/O of its
//! own and holds no state beyond the shared store handle.
//!
//! ## Invariants
//! - Validation failures never reach the store.
//! - Store errors propagate unchanged, including their messages.
//! - `update` validates only the identifier; other fields pass through as
//!   given, so an update may blank `name` or `email`.
//! - Missing params fields decode to zero values (empty string, `0.0`) so
//!   that validation, not decoding, rejects them.

// ============================================================================
// SECTION: Imports
// ============================================================================

use enemy_directory_core::CallContext;
use enemy_directory_core::NewRecord;
use enemy_directory_core::Record;
use enemy_directory_core::RecordId;
use enemy_directory_core::RecordStore;
use enemy_directory_core::RecordUpdate;
use enemy_directory_core::SharedRecordStore;
use enemy_directory_core::StoreError;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

// ============================================================================
// SECTION: Methods
// ============================================================================

/// JSON-RPC methods served by the router.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnemyMethod {
    /// `enemy.add`
    Add,
    /// `enemy.get`
    Get,
    /// `enemy.update`
    Update,
    /// `enemy.list`
    List,
}

impl EnemyMethod {
    /// All methods in wire-name order.
    pub const ALL: [Self; 4] = [Self::Add, Self::Get, Self::Update, Self::List];

    /// Parses a wire method name.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "enemy.add" => Some(Self::Add),
            "enemy.get" => Some(Self::Get),
            "enemy.update" => Some(Self::Update),
            "enemy.list" => Some(Self::List),
            _ => None,
        }
    }

    /// Returns the wire method name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Add => "enemy.add",
            Self::Get => "enemy.get",
            Self::Update => "enemy.update",
            Self::List => "enemy.list",
        }
    }
}

// ============================================================================
// SECTION: Requests and Responses
// ============================================================================

/// Params for `enemy.add`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AddEnemyRequest {
    /// Display name; must be non-empty.
    pub name: String,
    /// Contact address; must be non-empty.
    pub email: String,
    /// Threat rating; must not be zero.
    pub rating: f64,
}

/// Params for `enemy.get`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GetEnemyRequest {
    /// Record identifier; must be non-empty.
    pub id: String,
}

/// Params for `enemy.update`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdateEnemyRequest {
    /// Record identifier; must be non-empty.
    pub id: String,
    /// Replacement name.
    pub name: String,
    /// Replacement email.
    pub email: String,
    /// Replacement rating.
    pub rating: f64,
}

/// Params for `enemy.list`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListEnemiesRequest {}

/// Result of add, get, and update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnemyResponse {
    /// The stored record.
    pub enemy: Record,
}

/// Result of list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListEnemiesResponse {
    /// Every stored record in creation order.
    pub enemies: Vec<Record>,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Router errors.
#[derive(Debug, Error)]
pub enum RouterError {
    /// Request failed validation.
    #[error("{0}")]
    InvalidArgument(String),
    /// Params could not be decoded into the method's request type.
    #[error("invalid parameters: {0}")]
    InvalidParams(String),
    /// Record store failure, message unchanged.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// Response serialization failed.
    #[error("serialization failure")]
    Serialization,
    /// Dispatch failed outside the store.
    #[error("internal error: {0}")]
    Internal(String),
}

impl RouterError {
    /// Returns a stable label for the error category.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::InvalidArgument(_) => "invalid_argument",
            Self::InvalidParams(_) => "invalid_params",
            Self::Store(StoreError::NotFound(_)) => "not_found",
            Self::Store(StoreError::Cancelled(_)) => "cancelled",
            Self::Store(_) | Self::Internal(_) => "internal",
            Self::Serialization => "serialization",
        }
    }
}

// ============================================================================
// SECTION: Router
// ============================================================================

/// Validator and dispatcher for enemy operations.
#[derive(Clone)]
pub struct EnemyRouter {
    /// Backing record store.
    store: SharedRecordStore,
}

impl EnemyRouter {
    /// Creates a router over the given store.
    #[must_use]
    pub const fn new(store: SharedRecordStore) -> Self {
        Self {
            store,
        }
    }

    /// Decodes params for `method`, runs it, and encodes the result.
    ///
    /// A `null` params value is treated as an empty object.
    ///
    /// # Errors
    ///
    /// Returns [`RouterError`] when decoding, validation, or the store fails.
    pub fn handle_call(
        &self,
        context: &CallContext,
        method: EnemyMethod,
        params: Value,
    ) -> Result<Value, RouterError> {
        let params = if params.is_null() { Value::Object(serde_json::Map::new()) } else { params };
        match method {
            EnemyMethod::Add => {
                let enemy = self.add_enemy(context, decode(params)?)?;
                encode(&EnemyResponse {
                    enemy,
                })
            }
            EnemyMethod::Get => {
                let enemy = self.get_enemy(context, decode(params)?)?;
                encode(&EnemyResponse {
                    enemy,
                })
            }
            EnemyMethod::Update => {
                let enemy = self.update_enemy(context, decode(params)?)?;
                encode(&EnemyResponse {
                    enemy,
                })
            }
            EnemyMethod::List => {
                let enemies = self.list_enemies(context, decode(params)?)?;
                encode(&ListEnemiesResponse {
                    enemies,
                })
            }
        }
    }

    /// Validates and creates a record.
    ///
    /// # Errors
    ///
    /// Returns [`RouterError::InvalidArgument`] for an empty name, an empty
    /// email, or a zero rating (checked in that order), and store errors
    /// unchanged.
    #[allow(clippy::float_cmp, reason = "Only an exact zero rating is rejected.")]
    pub fn add_enemy(
        &self,
        context: &CallContext,
        request: AddEnemyRequest,
    ) -> Result<Record, RouterError> {
        if request.name.is_empty() {
            return Err(RouterError::InvalidArgument("enemy name can't be empty".to_string()));
        }
        if request.email.is_empty() {
            return Err(RouterError::InvalidArgument("enemy email can't be empty".to_string()));
        }
        if request.rating == 0.0 {
            return Err(RouterError::InvalidArgument("rating must be > 0".to_string()));
        }
        let record = self.store.create(
            context,
            NewRecord {
                name: request.name,
                email: request.email,
                rating: request.rating,
            },
        )?;
        Ok(record)
    }

    /// Validates the identifier and fetches a record.
    ///
    /// # Errors
    ///
    /// Returns [`RouterError::InvalidArgument`] for an empty id, and store
    /// errors (including not found) unchanged.
    pub fn get_enemy(
        &self,
        context: &CallContext,
        request: GetEnemyRequest,
    ) -> Result<Record, RouterError> {
        let id = require_id(request.id)?;
        Ok(self.store.get(context, &id)?)
    }

    /// Validates the identifier and replaces a record's fields.
    ///
    /// # Errors
    ///
    /// Returns [`RouterError::InvalidArgument`] for an empty id, and store
    /// errors unchanged.
    pub fn update_enemy(
        &self,
        context: &CallContext,
        request: UpdateEnemyRequest,
    ) -> Result<Record, RouterError> {
        let id = require_id(request.id)?;
        let record = self.store.update(
            context,
            RecordUpdate {
                id,
                name: request.name,
                email: request.email,
                rating: request.rating,
            },
        )?;
        Ok(record)
    }

    /// Lists every record.
    ///
    /// # Errors
    ///
    /// Returns store errors unchanged.
    pub fn list_enemies(
        &self,
        context: &CallContext,
        _request: ListEnemiesRequest,
    ) -> Result<Vec<Record>, RouterError> {
        Ok(self.store.list(context)?)
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Rejects an empty identifier.
fn require_id(id: String) -> Result<RecordId, RouterError> {
    if id.is_empty() {
        return Err(RouterError::InvalidArgument("id can't be empty".to_string()));
    }
    Ok(RecordId::new(id))
}

/// Decodes method params into a typed request.
fn decode<T: for<'de> Deserialize<'de>>(params: Value) -> Result<T, RouterError> {
    serde_json::from_value(params).map_err(|err| RouterError::InvalidParams(err.to_string()))
}

/// Encodes a typed response.
fn encode<T: Serialize>(response: &T) -> Result<Value, RouterError> {
    serde_json::to_value(response).map_err(|_| RouterError::Serialization)
}
