// crates/enemy-directory-rpc/src/server.rs
// ============================================================================
// Module: Enemy Directory RPC Server
// Description: JSON-RPC 2.0 over HTTP for the enemy directory.
// Purpose: Bridge HTTP requests to the router with deadlines and audit events.
// Dependencies: enemy-directory-{config, core, store-sqlite}, axum, tokio
// ============================================================================

//! ## Overview
//! [`RpcServer`] owns the configured record store, wraps it in an
//! [`EnemyRouter`], and serves `POST /rpc`. Each request gets a
//! [`CallContext`] whose deadline comes from the
//! `x-enemy-directory-timeout-ms` header, capped by
//! `server.request_timeout_ms`. Router calls run on the blocking pool; when
//! the deadline fires first the context is cancelled so the store abandons
//! the in-flight statement, and the caller receives a cancellation error.
//!
//! Store selection and migration happen in [`RpcServer::from_config`], before
//! any listener is bound.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use std::time::Instant;

use axum::Router;
use axum::body::Bytes;
use axum::extract::ConnectInfo;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::http::StatusCode;
use axum::http::header::CONTENT_TYPE;
use axum::response::IntoResponse;
use axum::routing::post;
use enemy_directory_config::DirectoryConfig;
use enemy_directory_config::StoreType;
use enemy_directory_core::CallContext;
use enemy_directory_core::InMemoryRecordStore;
use enemy_directory_core::SharedRecordStore;
use enemy_directory_core::StoreError;
use enemy_directory_store_sqlite::SqliteRecordStore;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tokio::net::TcpListener;

use crate::audit::AuditSink;
use crate::audit::LifecycleEvent;
use crate::audit::LifecycleStage;
use crate::audit::RpcAuditEvent;
use crate::audit::RpcAuditEventParams;
use crate::audit::RpcOutcome;
use crate::audit::build_audit_sink;
use crate::router::EnemyMethod;
use crate::router::EnemyRouter;
use crate::router::RouterError;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Header carrying the caller's deadline in milliseconds.
pub const TIMEOUT_HEADER: &str = "x-enemy-directory-timeout-ms";

/// Route serving JSON-RPC requests.
pub const RPC_PATH: &str = "/rpc";

/// Body sent when a response envelope cannot be serialized.
const SERIALIZATION_FALLBACK: &str = "{\"jsonrpc\":\"2.0\",\"id\":null,\"error\":{\"code\":-32060,\
                                      \"message\":\"serialization failed\",\"data\":{\"kind\":\
                                      \"serialization\"}}}";

// ============================================================================
// SECTION: Server
// ============================================================================

/// Enemy directory RPC server.
pub struct RpcServer {
    /// Validated configuration.
    config: DirectoryConfig,
    /// Router over the opened store.
    router: EnemyRouter,
    /// Destination for request and lifecycle events.
    audit: Arc<dyn AuditSink>,
}

impl RpcServer {
    /// Validates configuration, opens the store, and applies migrations.
    ///
    /// # Errors
    ///
    /// Returns [`RpcServerError`] when configuration is invalid, the audit
    /// sink cannot be opened, or the store fails to initialize.
    pub fn from_config(config: DirectoryConfig) -> Result<Self, RpcServerError> {
        config.validate().map_err(|err| RpcServerError::Config(err.to_string()))?;
        let audit = build_audit_sink(&config.server.audit)
            .map_err(|err| RpcServerError::Init(format!("audit sink: {err}")))?;
        let (store, stage) = build_record_store(&config)?;
        audit.record_lifecycle(&LifecycleEvent::new(stage));
        Ok(Self::from_parts(config, store, audit))
    }

    /// Assembles a server from an already-opened store.
    #[must_use]
    pub fn from_parts(
        config: DirectoryConfig,
        store: SharedRecordStore,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            config,
            router: EnemyRouter::new(store),
            audit,
        }
    }

    /// Binds the configured address and serves until SIGINT or SIGTERM.
    ///
    /// # Errors
    ///
    /// Returns [`RpcServerError`] when binding or serving fails.
    pub async fn serve(self) -> Result<(), RpcServerError> {
        let addr =
            self.config.server.bind_addr().map_err(|err| RpcServerError::Config(err.to_string()))?;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|err| RpcServerError::Transport(format!("http bind failed: {err}")))?;
        self.serve_listener(listener, shutdown_signal()).await
    }

    /// Serves on an existing listener until `shutdown` resolves.
    ///
    /// # Errors
    ///
    /// Returns [`RpcServerError`] when serving fails.
    pub async fn serve_listener<F>(
        self,
        listener: TcpListener,
        shutdown: F,
    ) -> Result<(), RpcServerError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let local = listener
            .local_addr()
            .map_err(|err| RpcServerError::Transport(format!("listener address: {err}")))?;
        let audit = Arc::clone(&self.audit);
        let state = Arc::new(ServerState {
            router: self.router,
            audit: Arc::clone(&self.audit),
            max_body_bytes: self.config.server.max_body_bytes,
            request_timeout: self.config.server.request_timeout(),
        });
        let app = Router::new().route(RPC_PATH, post(handle_http)).with_state(state);
        audit.record_lifecycle(&LifecycleEvent::new(LifecycleStage::ServerListening {
            bind: local.to_string(),
        }));
        axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|err| RpcServerError::Transport(format!("http server failed: {err}")))?;
        audit.record_lifecycle(&LifecycleEvent::new(LifecycleStage::ServerStopped));
        Ok(())
    }
}

/// Opens the configured record store and describes the migration outcome.
fn build_record_store(
    config: &DirectoryConfig,
) -> Result<(SharedRecordStore, LifecycleStage), RpcServerError> {
    match config.store.store_type {
        StoreType::Memory => Ok((
            SharedRecordStore::from_store(InMemoryRecordStore::default()),
            LifecycleStage::StoreMigrated {
                backend: "memory",
                applied: 0,
                schema_version: 0,
            },
        )),
        StoreType::Sqlite => {
            let sqlite_config = config.store.sqlite().ok_or_else(|| {
                RpcServerError::Config("sqlite store config unavailable".to_string())
            })?;
            let store = SqliteRecordStore::open(&sqlite_config)
                .map_err(|err| RpcServerError::Init(err.to_string()))?;
            let report = store.migration_report();
            Ok((
                SharedRecordStore::from_store(store),
                LifecycleStage::StoreMigrated {
                    backend: "sqlite",
                    applied: report.applied,
                    schema_version: report.schema_version,
                },
            ))
        }
    }
}

/// Resolves when the process receives SIGINT or SIGTERM.
async fn shutdown_signal() {
    let interrupt = async {
        let _ = tokio::signal::ctrl_c().await;
    };
    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();
    tokio::select! {
        () = interrupt => {}
        () = terminate => {}
    }
}

// ============================================================================
// SECTION: HTTP Handling
// ============================================================================

/// Shared state for the HTTP handler.
struct ServerState {
    /// Router for request dispatch.
    router: EnemyRouter,
    /// Destination for request events.
    audit: Arc<dyn AuditSink>,
    /// Maximum allowed request body size.
    max_body_bytes: usize,
    /// Upper bound for per-request deadlines.
    request_timeout: Duration,
}

/// Handles one HTTP JSON-RPC request.
async fn handle_http(
    State(state): State<Arc<ServerState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    bytes: Bytes,
) -> impl IntoResponse {
    let started = Instant::now();
    let timeout = request_timeout(&headers, state.request_timeout);
    let reply = parse_request(&state, timeout, &bytes).await;
    let body = serde_json::to_vec(&reply.response)
        .unwrap_or_else(|_| SERIALIZATION_FALLBACK.as_bytes().to_vec());
    let error = reply.response.error.as_ref();
    state.audit.record(&RpcAuditEvent::new(RpcAuditEventParams {
        request_id: reply.request_id,
        peer_ip: Some(peer.ip().to_string()),
        method: reply.method,
        outcome: if error.is_some() { RpcOutcome::Error } else { RpcOutcome::Ok },
        error_code: error.map(|err| err.code),
        error_kind: error.map(|err| err.data.kind),
        request_bytes: bytes.len(),
        response_bytes: body.len(),
        latency_ms: started.elapsed().as_millis(),
    }));
    (reply.status, [(CONTENT_TYPE, "application/json")], body)
}

/// Derives the request deadline from the timeout header, capped by `limit`.
fn request_timeout(headers: &HeaderMap, limit: Duration) -> Duration {
    headers
        .get(TIMEOUT_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok())
        .filter(|millis| *millis > 0)
        .map_or(limit, |millis| Duration::from_millis(millis).min(limit))
}

// ============================================================================
// SECTION: JSON-RPC Handling
// ============================================================================

/// Incoming JSON-RPC request payload.
#[derive(Debug, Deserialize)]
struct JsonRpcRequest {
    /// JSON-RPC protocol version.
    jsonrpc: String,
    /// Request identifier.
    id: Value,
    /// Method name.
    method: String,
    /// Optional parameters payload.
    params: Option<Value>,
}

/// JSON-RPC response envelope.
#[derive(Debug, Serialize)]
struct JsonRpcResponse {
    /// JSON-RPC protocol version.
    jsonrpc: &'static str,
    /// Request identifier.
    id: Value,
    /// Successful result payload.
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    /// Error payload when the request fails.
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<JsonRpcError>,
}

/// JSON-RPC error payload.
#[derive(Debug, Serialize)]
struct JsonRpcError {
    /// Error code.
    code: i64,
    /// Human-readable error message.
    message: String,
    /// Machine-readable classification.
    data: JsonRpcErrorData,
}

/// Structured data attached to every error.
#[derive(Debug, Serialize)]
struct JsonRpcErrorData {
    /// Stable error kind label.
    kind: &'static str,
}

/// Handled request with the metadata the audit event needs.
struct RpcReply {
    /// HTTP status for the response.
    status: StatusCode,
    /// Method name as sent, or `invalid` when the envelope did not parse.
    method: String,
    /// JSON-RPC id rendered as text when present.
    request_id: Option<String>,
    /// Response envelope.
    response: JsonRpcResponse,
}

impl RpcReply {
    /// Builds an error reply.
    fn failure(
        status: StatusCode,
        method: String,
        id: Value,
        code: i64,
        kind: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self {
            status,
            method,
            request_id: request_id_label(&id),
            response: JsonRpcResponse {
                jsonrpc: "2.0",
                id,
                result: None,
                error: Some(JsonRpcError {
                    code,
                    message: message.into(),
                    data: JsonRpcErrorData {
                        kind,
                    },
                }),
            },
        }
    }
}

/// Parses and validates a JSON-RPC request payload, then dispatches it.
async fn parse_request(state: &ServerState, timeout: Duration, bytes: &Bytes) -> RpcReply {
    if bytes.len() > state.max_body_bytes {
        return RpcReply::failure(
            StatusCode::PAYLOAD_TOO_LARGE,
            "invalid".to_string(),
            Value::Null,
            -32070,
            "request_too_large",
            "request body too large",
        );
    }
    match serde_json::from_slice::<JsonRpcRequest>(bytes.as_ref()) {
        Ok(request) => handle_request(&state.router, timeout, request).await,
        Err(_) => RpcReply::failure(
            StatusCode::BAD_REQUEST,
            "invalid".to_string(),
            Value::Null,
            -32600,
            "invalid_request",
            "invalid json-rpc request",
        ),
    }
}

/// Dispatches a parsed JSON-RPC request to the router.
async fn handle_request(
    router: &EnemyRouter,
    timeout: Duration,
    request: JsonRpcRequest,
) -> RpcReply {
    let JsonRpcRequest {
        jsonrpc,
        id,
        method,
        params,
    } = request;
    if jsonrpc != "2.0" {
        return RpcReply::failure(
            StatusCode::BAD_REQUEST,
            method,
            id,
            -32600,
            "invalid_request",
            "invalid json-rpc version",
        );
    }
    let Some(parsed) = EnemyMethod::parse(&method) else {
        return RpcReply::failure(
            StatusCode::BAD_REQUEST,
            method,
            id,
            -32601,
            "method_not_found",
            "method not found",
        );
    };
    let context = CallContext::with_timeout(timeout);
    match dispatch(router, context, timeout, parsed, params.unwrap_or(Value::Null)).await {
        Ok(result) => RpcReply {
            status: StatusCode::OK,
            method,
            request_id: request_id_label(&id),
            response: JsonRpcResponse {
                jsonrpc: "2.0",
                id,
                result: Some(result),
                error: None,
            },
        },
        Err(err) => jsonrpc_error(method, id, &err),
    }
}

/// Runs a router call on the blocking pool, cancelling it at the deadline.
async fn dispatch(
    router: &EnemyRouter,
    context: CallContext,
    timeout: Duration,
    method: EnemyMethod,
    params: Value,
) -> Result<Value, RouterError> {
    let router = router.clone();
    let task_context = context.clone();
    let task =
        tokio::task::spawn_blocking(move || router.handle_call(&task_context, method, params));
    match tokio::time::timeout(timeout, task).await {
        Ok(Ok(result)) => result,
        Ok(Err(err)) => Err(RouterError::Internal(format!("dispatch task failed: {err}"))),
        Err(_) => {
            context.cancel();
            Err(RouterError::Store(StoreError::Cancelled("deadline exceeded".to_string())))
        }
    }
}

/// Builds a JSON-RPC error response for a router failure.
fn jsonrpc_error(method: String, id: Value, error: &RouterError) -> RpcReply {
    let (status, code) = match error {
        RouterError::InvalidArgument(_) | RouterError::InvalidParams(_) => {
            (StatusCode::BAD_REQUEST, -32602)
        }
        RouterError::Store(StoreError::NotFound(_)) => (StatusCode::OK, -32004),
        RouterError::Store(StoreError::Cancelled(_)) => (StatusCode::OK, -32008),
        RouterError::Store(_) | RouterError::Internal(_) => (StatusCode::OK, -32050),
        RouterError::Serialization => (StatusCode::OK, -32060),
    };
    RpcReply::failure(status, method, id, code, error.kind(), error.to_string())
}

/// Renders a JSON-RPC id for audit records; `null` means absent.
fn request_id_label(id: &Value) -> Option<String> {
    match id {
        Value::Null => None,
        Value::String(text) => Some(text.clone()),
        other => Some(other.to_string()),
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// RPC server errors.
#[derive(Debug, Error)]
pub enum RpcServerError {
    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),
    /// Initialization failure.
    #[error("init error: {0}")]
    Init(String),
    /// Transport failure.
    #[error("transport error: {0}")]
    Transport(String),
}

#[cfg(test)]
mod tests;
