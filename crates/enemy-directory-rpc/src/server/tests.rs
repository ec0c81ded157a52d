// crates/enemy-directory-rpc/src/server/tests.rs
// ============================================================================
// Module: RPC Server Unit Tests
// Description: JSON-RPC framing, error mapping, deadlines, and audit.
// Purpose: Exercise request handling without binding a socket.
// Dependencies: super, enemy-directory-core, tokio
// ============================================================================

//! ## Overview
//! Drives [`parse_request`] and [`handle_http`] directly against in-memory
//! fixtures.

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
    reason = "Test-only framing assertions."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::Mutex;
use std::thread;
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::ConnectInfo;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::http::HeaderValue;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use enemy_directory_core::CallContext;
use enemy_directory_core::FixedClock;
use enemy_directory_core::FixedIdGenerator;
use enemy_directory_core::InMemoryRecordStore;
use enemy_directory_core::NewRecord;
use enemy_directory_core::Record;
use enemy_directory_core::RecordId;
use enemy_directory_core::RecordStore;
use enemy_directory_core::RecordUpdate;
use enemy_directory_core::SharedRecordStore;
use enemy_directory_core::StoreError;
use enemy_directory_core::Timestamp;
use serde_json::Value;
use serde_json::json;

use super::ServerState;
use super::TIMEOUT_HEADER;
use super::handle_http;
use super::parse_request;
use super::request_timeout;
use crate::audit::AuditSink;
use crate::audit::NoopAuditSink;
use crate::audit::RpcAuditEvent;
use crate::audit::RpcOutcome;
use crate::router::EnemyRouter;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

#[derive(Default)]
struct CapturingSink {
    events: Mutex<Vec<RpcAuditEvent>>,
}

impl AuditSink for CapturingSink {
    fn record(&self, event: &RpcAuditEvent) {
        self.events.lock().expect("events lock").push(event.clone());
    }
}

/// Store whose every call blocks until the caller's context is done.
struct StallingStore;

impl StallingStore {
    fn wait(context: &CallContext) -> StoreError {
        while !context.is_done() {
            thread::sleep(Duration::from_millis(5));
        }
        context.check().unwrap_err()
    }
}

impl RecordStore for StallingStore {
    fn create(&self, context: &CallContext, _record: NewRecord) -> Result<Record, StoreError> {
        Err(Self::wait(context))
    }

    fn get(&self, context: &CallContext, _id: &RecordId) -> Result<Record, StoreError> {
        Err(Self::wait(context))
    }

    fn update(&self, context: &CallContext, _update: RecordUpdate) -> Result<Record, StoreError> {
        Err(Self::wait(context))
    }

    fn list(&self, context: &CallContext) -> Result<Vec<Record>, StoreError> {
        Err(Self::wait(context))
    }
}

fn pinned_store() -> SharedRecordStore {
    let clock = FixedClock::new(Timestamp::parse_rfc3339("2021-12-31T14:59:05Z").unwrap());
    SharedRecordStore::from_store(InMemoryRecordStore::new(
        Arc::new(clock),
        Arc::new(FixedIdGenerator::new("someID")),
    ))
}

fn state_with(store: SharedRecordStore, audit: Arc<dyn AuditSink>) -> ServerState {
    ServerState {
        router: EnemyRouter::new(store),
        audit,
        max_body_bytes: 1024,
        request_timeout: Duration::from_secs(5),
    }
}

fn state() -> ServerState {
    state_with(pinned_store(), Arc::new(NoopAuditSink))
}

async fn call(state: &ServerState, body: &Value) -> (StatusCode, Value) {
    let bytes = Bytes::from(serde_json::to_vec(body).unwrap());
    let reply = parse_request(state, state.request_timeout, &bytes).await;
    (reply.status, serde_json::to_value(&reply.response).unwrap())
}

fn rpc(method: &str, params: &Value) -> Value {
    json!({"jsonrpc": "2.0", "id": 1, "method": method, "params": params})
}

// ============================================================================
// SECTION: Framing
// ============================================================================

#[tokio::test]
async fn oversized_body_is_rejected() {
    let state = state();
    let bytes = Bytes::from(vec![b' '; 2048]);
    let reply = parse_request(&state, state.request_timeout, &bytes).await;
    assert_eq!(reply.status, StatusCode::PAYLOAD_TOO_LARGE);
    let error = reply.response.error.unwrap();
    assert_eq!(error.code, -32070);
    assert_eq!(error.data.kind, "request_too_large");
}

#[tokio::test]
async fn malformed_json_is_invalid_request() {
    let state = state();
    let bytes = Bytes::from_static(b"{not json");
    let reply = parse_request(&state, state.request_timeout, &bytes).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.method, "invalid");
    assert_eq!(reply.response.error.unwrap().code, -32600);
}

#[tokio::test]
async fn wrong_version_is_invalid_request() {
    let (status, body) =
        call(&state(), &json!({"jsonrpc": "1.0", "id": 1, "method": "enemy.list"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["message"], "invalid json-rpc version");
}

#[tokio::test]
async fn unknown_method_is_not_found() {
    let (status, body) = call(&state(), &rpc("enemy.delete", &json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], -32601);
    assert_eq!(body["error"]["data"]["kind"], "method_not_found");
}

// ============================================================================
// SECTION: Error Mapping
// ============================================================================

#[tokio::test]
async fn validation_failure_maps_to_invalid_params_code() {
    let (status, body) =
        call(&state(), &rpc("enemy.add", &json!({"name": "", "email": "x@bar.com"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["error"],
        json!({
            "code": -32602,
            "message": "enemy name can't be empty",
            "data": {"kind": "invalid_argument"}
        })
    );
}

#[tokio::test]
async fn undecodable_params_map_to_invalid_params_kind() {
    let (status, body) = call(&state(), &rpc("enemy.get", &json!({"id": [1]}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], -32602);
    assert_eq!(body["error"]["data"]["kind"], "invalid_params");
}

#[tokio::test]
async fn missing_record_keeps_store_message() {
    let (status, body) = call(&state(), &rpc("enemy.get", &json!({"id": "ghost"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["error"],
        json!({
            "code": -32004,
            "message": "enemy not found: ghost",
            "data": {"kind": "not_found"}
        })
    );
}

#[tokio::test]
async fn successful_add_returns_result_without_error() {
    let (status, body) = call(
        &state(),
        &rpc("enemy.add", &json!({"name": "Voldemort", "email": "voldemort@bar.com", "rating": 10.0})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.get("error").is_none());
    assert_eq!(body["id"], 1);
    assert_eq!(body["result"]["enemy"]["id"], "someID");
    assert_eq!(body["result"]["enemy"]["last_updated"], "2021-12-31T14:59:05Z");
}

#[tokio::test]
async fn deadline_cancels_stalled_store_call() {
    let state = state_with(SharedRecordStore::from_store(StallingStore), Arc::new(NoopAuditSink));
    let bytes = Bytes::from(serde_json::to_vec(&rpc("enemy.list", &json!({}))).unwrap());
    let reply = parse_request(&state, Duration::from_millis(50), &bytes).await;
    assert_eq!(reply.status, StatusCode::OK);
    let error = reply.response.error.unwrap();
    assert_eq!(error.code, -32008);
    assert_eq!(error.data.kind, "cancelled");
    assert_eq!(error.message, "record store call cancelled: deadline exceeded");
}

// ============================================================================
// SECTION: Deadlines and Audit
// ============================================================================

#[test]
fn timeout_header_is_capped_by_configuration() {
    let limit = Duration::from_millis(5_000);
    let mut headers = HeaderMap::new();
    assert_eq!(request_timeout(&headers, limit), limit);
    headers.insert(TIMEOUT_HEADER, HeaderValue::from_static("250"));
    assert_eq!(request_timeout(&headers, limit), Duration::from_millis(250));
    headers.insert(TIMEOUT_HEADER, HeaderValue::from_static("60000"));
    assert_eq!(request_timeout(&headers, limit), limit);
    headers.insert(TIMEOUT_HEADER, HeaderValue::from_static("soon"));
    assert_eq!(request_timeout(&headers, limit), limit);
    headers.insert(TIMEOUT_HEADER, HeaderValue::from_static("0"));
    assert_eq!(request_timeout(&headers, limit), limit);
}

#[tokio::test]
async fn handled_request_emits_audit_event() {
    let sink = Arc::new(CapturingSink::default());
    let state = Arc::new(state_with(pinned_store(), Arc::clone(&sink) as Arc<dyn AuditSink>));
    let body = serde_json::to_vec(&rpc("enemy.get", &json!({"id": "ghost"}))).unwrap();
    let request_bytes = body.len();
    let peer: SocketAddr = "127.0.0.1:40000".parse().unwrap();
    let response =
        handle_http(State(state), ConnectInfo(peer), HeaderMap::new(), Bytes::from(body))
            .await
            .into_response();
    assert_eq!(response.status(), StatusCode::OK);
    let events = sink.events.lock().unwrap();
    assert_eq!(events.len(), 1);
    let event = &events[0];
    assert_eq!(event.event, "rpc_request");
    assert_eq!(event.method, "enemy.get");
    assert_eq!(event.request_id.as_deref(), Some("1"));
    assert_eq!(event.peer_ip.as_deref(), Some("127.0.0.1"));
    assert_eq!(event.outcome, RpcOutcome::Error);
    assert_eq!(event.error_code, Some(-32004));
    assert_eq!(event.error_kind, Some("not_found"));
    assert_eq!(event.request_bytes, request_bytes);
    assert!(event.response_bytes > 0);
}
