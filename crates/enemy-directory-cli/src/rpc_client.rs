// crates/enemy-directory-cli/src/rpc_client.rs
// ============================================================================
// Module: Enemy Directory RPC Client
// Description: HTTP JSON-RPC client for the enemy directory methods.
// Purpose: Give the CLI (and tests) typed access to a running server.
// Dependencies: reqwest, serde, serde_json, enemy-directory-rpc
// ============================================================================

//! ## Overview
//! [`RpcClient`] posts JSON-RPC 2.0 envelopes to `/rpc`, forwards its own
//! timeout to the server through the deadline header, and decodes results
//! into [`Record`] values. Server errors come back as
//! [`RpcClientError::Rpc`] with the code, kind, and message the server sent.
//!
//! Response bodies are untrusted and read under a hard size limit. The limit
//! is configurable because `enemy.list` returns the whole directory in one
//! response.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

use enemy_directory_core::Record;
use enemy_directory_rpc::AddEnemyRequest;
use enemy_directory_rpc::EnemyMethod;
use enemy_directory_rpc::EnemyResponse;
use enemy_directory_rpc::GetEnemyRequest;
use enemy_directory_rpc::ListEnemiesRequest;
use enemy_directory_rpc::ListEnemiesResponse;
use enemy_directory_rpc::TIMEOUT_HEADER;
use enemy_directory_rpc::UpdateEnemyRequest;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use reqwest::redirect::Policy;
use serde::Deserialize;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default maximum response body size accepted by the client.
pub const DEFAULT_MAX_RESPONSE_BYTES: usize = 64 * 1024 * 1024;

/// Default server endpoint.
pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:8080/rpc";

// ============================================================================
// SECTION: Types
// ============================================================================

/// Client configuration.
#[derive(Debug, Clone)]
pub struct RpcClientConfig {
    /// Full URL of the `/rpc` route.
    pub endpoint: String,
    /// Per-call timeout, also sent to the server as the call deadline.
    pub timeout: Duration,
    /// Largest response body the client will read.
    pub max_response_bytes: usize,
}

/// Client errors.
#[derive(Debug, Error)]
pub enum RpcClientError {
    /// Configuration error.
    #[error("rpc client config error: {0}")]
    Config(String),
    /// Transport error.
    #[error("rpc transport error: {0}")]
    Transport(String),
    /// JSON encoding or decoding error.
    #[error("rpc json error: {0}")]
    Json(String),
    /// Response did not follow the JSON-RPC envelope.
    #[error("rpc protocol error: {0}")]
    Protocol(String),
    /// Server returned a JSON-RPC error.
    #[error("{message} (code {code}, kind {kind})")]
    Rpc {
        /// JSON-RPC error code.
        code: i64,
        /// Error kind label.
        kind: String,
        /// Server message.
        message: String,
    },
    /// Response size exceeds limits.
    #[error("rpc response exceeds size limit ({actual} > {limit})")]
    ResponseTooLarge {
        /// Actual size in bytes.
        actual: usize,
        /// Maximum size in bytes.
        limit: usize,
    },
}

/// JSON-RPC client for the enemy directory.
pub struct RpcClient {
    /// Reqwest client instance.
    client: Client,
    /// Full `/rpc` URL.
    endpoint: String,
    /// Deadline forwarded to the server, in milliseconds.
    timeout_ms: u128,
    /// Response body size limit in bytes.
    max_response_bytes: usize,
    /// Next JSON-RPC request identifier.
    next_id: u64,
}

// ============================================================================
// SECTION: JSON-RPC Structures
// ============================================================================

/// JSON-RPC request envelope.
#[derive(Debug, Serialize)]
struct JsonRpcRequest<'a> {
    /// JSON-RPC version tag.
    jsonrpc: &'static str,
    /// Request identifier.
    id: u64,
    /// Method name to invoke.
    method: &'a str,
    /// Parameters object.
    params: Value,
}

/// JSON-RPC response envelope.
#[derive(Debug, Deserialize)]
struct JsonRpcResponse {
    /// Optional result payload.
    result: Option<Value>,
    /// Optional error payload.
    error: Option<JsonRpcError>,
}

/// JSON-RPC error payload.
#[derive(Debug, Deserialize)]
struct JsonRpcError {
    /// Error code.
    code: i64,
    /// Error message provided by the server.
    message: String,
    /// Structured classification, when sent.
    #[serde(default)]
    data: Option<JsonRpcErrorData>,
}

/// Structured error data.
#[derive(Debug, Deserialize)]
struct JsonRpcErrorData {
    /// Error kind label.
    kind: String,
}

// ============================================================================
// SECTION: Client
// ============================================================================

impl RpcClient {
    /// Builds a client for the configured endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`RpcClientError`] when the endpoint is empty, the timeout or
    /// response limit is zero, or the HTTP client cannot be constructed.
    pub fn new(config: RpcClientConfig) -> Result<Self, RpcClientError> {
        if config.endpoint.trim().is_empty() {
            return Err(RpcClientError::Config("endpoint must be set".to_string()));
        }
        if config.timeout.is_zero() {
            return Err(RpcClientError::Config("timeout must be greater than zero".to_string()));
        }
        if config.max_response_bytes == 0 {
            return Err(RpcClientError::Config(
                "max_response_bytes must be greater than zero".to_string(),
            ));
        }
        let client = Client::builder()
            .timeout(config.timeout)
            .redirect(Policy::none())
            .build()
            .map_err(|err| RpcClientError::Transport(err.to_string()))?;
        Ok(Self {
            client,
            endpoint: config.endpoint,
            timeout_ms: config.timeout.as_millis(),
            max_response_bytes: config.max_response_bytes,
            next_id: 1,
        })
    }

    /// Calls `enemy.add`.
    ///
    /// # Errors
    ///
    /// Returns [`RpcClientError`] when the call fails.
    pub async fn add_enemy(&mut self, request: &AddEnemyRequest) -> Result<Record, RpcClientError> {
        let response: EnemyResponse = self.call_typed(EnemyMethod::Add, request).await?;
        Ok(response.enemy)
    }

    /// Calls `enemy.get`.
    ///
    /// # Errors
    ///
    /// Returns [`RpcClientError`] when the call fails.
    pub async fn get_enemy(&mut self, request: &GetEnemyRequest) -> Result<Record, RpcClientError> {
        let response: EnemyResponse = self.call_typed(EnemyMethod::Get, request).await?;
        Ok(response.enemy)
    }

    /// Calls `enemy.update`.
    ///
    /// # Errors
    ///
    /// Returns [`RpcClientError`] when the call fails.
    pub async fn update_enemy(
        &mut self,
        request: &UpdateEnemyRequest,
    ) -> Result<Record, RpcClientError> {
        let response: EnemyResponse = self.call_typed(EnemyMethod::Update, request).await?;
        Ok(response.enemy)
    }

    /// Calls `enemy.list`.
    ///
    /// # Errors
    ///
    /// Returns [`RpcClientError`] when the call fails.
    pub async fn list_enemies(&mut self) -> Result<Vec<Record>, RpcClientError> {
        let response: ListEnemiesResponse =
            self.call_typed(EnemyMethod::List, &ListEnemiesRequest {}).await?;
        Ok(response.enemies)
    }

    /// Sends a call with typed params and decodes a typed result.
    async fn call_typed<P: Serialize, R: DeserializeOwned>(
        &mut self,
        method: EnemyMethod,
        params: &P,
    ) -> Result<R, RpcClientError> {
        let params = serde_json::to_value(params)
            .map_err(|err| RpcClientError::Json(format!("params serialization failed: {err}")))?;
        let result = self.call(method.as_str(), params).await?;
        serde_json::from_value(result).map_err(|err| {
            RpcClientError::Json(format!("invalid {} payload: {err}", method.as_str()))
        })
    }

    /// Sends a raw JSON-RPC call and returns its `result`.
    ///
    /// # Errors
    ///
    /// Returns [`RpcClientError`] when transport, framing, or the server fails.
    pub async fn call(&mut self, method: &str, params: Value) -> Result<Value, RpcClientError> {
        let id = self.next_id;
        self.next_id = self
            .next_id
            .checked_add(1)
            .ok_or_else(|| RpcClientError::Protocol("json-rpc request id overflow".to_string()))?;
        let payload = serde_json::to_vec(&JsonRpcRequest {
            jsonrpc: "2.0",
            id,
            method,
            params,
        })
        .map_err(|err| RpcClientError::Json(format!("jsonrpc serialization failed: {err}")))?;
        let response = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "application/json")
            .header(TIMEOUT_HEADER, self.timeout_ms.to_string())
            .body(payload)
            .send()
            .await
            .map_err(|err| RpcClientError::Transport(err.to_string()))?;
        let status = response.status();
        let body = read_response_body_with_limit(response, self.max_response_bytes).await?;
        decode_response(status.as_u16(), &body)
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Interprets an HTTP response body as a JSON-RPC reply.
///
/// Error envelopes win over the HTTP status so validation failures (sent
/// with 400) surface as [`RpcClientError::Rpc`].
///
/// # Errors
///
/// Returns [`RpcClientError`] for error envelopes, malformed bodies, and
/// non-success statuses without an envelope.
pub fn decode_response(status: u16, body: &[u8]) -> Result<Value, RpcClientError> {
    let parsed = serde_json::from_slice::<JsonRpcResponse>(body);
    match parsed {
        Ok(JsonRpcResponse {
            error: Some(error),
            ..
        }) => Err(RpcClientError::Rpc {
            code: error.code,
            kind: error.data.map_or_else(|| "unknown".to_string(), |data| data.kind),
            message: error.message,
        }),
        Ok(JsonRpcResponse {
            result: Some(result),
            error: None,
        }) if (200 .. 300).contains(&status) => Ok(result),
        _ if !(200 .. 300).contains(&status) => {
            let preview = String::from_utf8_lossy(body);
            Err(RpcClientError::Transport(format!("http status {status}: {}", preview.trim())))
        }
        Ok(_) => Err(RpcClientError::Protocol("missing result in json-rpc response".to_string())),
        Err(err) => Err(RpcClientError::Protocol(format!("invalid json-rpc response: {err}"))),
    }
}

/// Reads a response body while enforcing a hard byte limit.
async fn read_response_body_with_limit(
    mut response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, RpcClientError> {
    let mut body = Vec::new();
    let mut total: usize = 0;
    while let Some(chunk) =
        response.chunk().await.map_err(|err| RpcClientError::Transport(err.to_string()))?
    {
        let next_total = total.checked_add(chunk.len()).ok_or(RpcClientError::ResponseTooLarge {
            actual: usize::MAX,
            limit,
        })?;
        if next_total > limit {
            return Err(RpcClientError::ResponseTooLarge {
                actual: next_total,
                limit,
            });
        }
        body.extend_from_slice(&chunk);
        total = next_total;
    }
    Ok(body)
}
