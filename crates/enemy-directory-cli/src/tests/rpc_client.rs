// crates/enemy-directory-cli/src/tests/rpc_client.rs
// ============================================================================
// Module: RPC Client Tests
// Description: Unit tests for JSON-RPC reply decoding and client setup.
// Purpose: Ensure server errors surface with code, kind, and message intact.
// Dependencies: enemy-directory-cli rpc_client helpers
// ============================================================================

//! ## Overview
//! Validates [`decode_response`] across success, error, and malformed bodies.

use std::time::Duration;

use serde_json::json;

use crate::rpc_client::DEFAULT_MAX_RESPONSE_BYTES;
use crate::rpc_client::RpcClient;
use crate::rpc_client::RpcClientConfig;
use crate::rpc_client::RpcClientError;
use crate::rpc_client::decode_response;

fn body(value: &serde_json::Value) -> Vec<u8> {
    serde_json::to_vec(value).unwrap()
}

#[test]
fn success_returns_result() {
    let result = decode_response(
        200,
        &body(&json!({"jsonrpc": "2.0", "id": 1, "result": {"enemies": []}})),
    )
    .unwrap();
    assert_eq!(result, json!({"enemies": []}));
}

#[test]
fn error_envelope_wins_over_bad_request_status() {
    let err = decode_response(
        400,
        &body(&json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": {"code": -32602, "message": "id can't be empty", "data": {"kind": "invalid_argument"}}
        })),
    )
    .unwrap_err();
    match err {
        RpcClientError::Rpc {
            code,
            kind,
            message,
        } => {
            assert_eq!(code, -32602);
            assert_eq!(kind, "invalid_argument");
            assert_eq!(message, "id can't be empty");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn error_without_data_reports_unknown_kind() {
    let err = decode_response(
        200,
        &body(&json!({"jsonrpc": "2.0", "id": 1, "error": {"code": -32050, "message": "boom"}})),
    )
    .unwrap_err();
    assert!(matches!(err, RpcClientError::Rpc { ref kind, .. } if kind == "unknown"));
}

#[test]
fn non_json_failure_is_transport_error() {
    let err = decode_response(502, b"bad gateway").unwrap_err();
    assert!(matches!(err, RpcClientError::Transport(ref message) if message.contains("502")));
}

#[test]
fn missing_result_is_protocol_error() {
    let err = decode_response(200, &body(&json!({"jsonrpc": "2.0", "id": 1}))).unwrap_err();
    assert!(matches!(err, RpcClientError::Protocol(_)));
    let err = decode_response(200, b"{").unwrap_err();
    assert!(matches!(err, RpcClientError::Protocol(_)));
}

#[test]
fn client_rejects_empty_endpoint_and_zero_timeout() {
    let err = RpcClient::new(RpcClientConfig {
        endpoint: " ".to_string(),
        timeout: Duration::from_secs(1),
        max_response_bytes: DEFAULT_MAX_RESPONSE_BYTES,
    })
    .err()
    .unwrap();
    assert!(matches!(err, RpcClientError::Config(_)));
    let err = RpcClient::new(RpcClientConfig {
        endpoint: "http://127.0.0.1:1/rpc".to_string(),
        timeout: Duration::ZERO,
        max_response_bytes: DEFAULT_MAX_RESPONSE_BYTES,
    })
    .err()
    .unwrap();
    assert!(matches!(err, RpcClientError::Config(_)));
    let err = RpcClient::new(RpcClientConfig {
        endpoint: "http://127.0.0.1:1/rpc".to_string(),
        timeout: Duration::from_secs(1),
        max_response_bytes: 0,
    })
    .err()
    .unwrap();
    assert!(matches!(err, RpcClientError::Config(_)));
}
