// crates/enemy-directory-rpc/src/audit.rs
// ============================================================================
// Module: Enemy Directory Audit Logging
// Description: Structured JSON-lines events for RPC handling and lifecycle.
// Purpose: Emit request and lifecycle records without a logging framework.
// Dependencies: enemy-directory-config, serde, serde_json
// ============================================================================

//! ## Overview
//! Every handled RPC produces one [`RpcAuditEvent`]; startup and shutdown
//! produce [`LifecycleEvent`] records. Sinks serialize events as one JSON
//! object per line. Sink failures are swallowed so logging never changes the
//! outcome of a request.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use enemy_directory_config::ServerAuditConfig;
use serde::Serialize;

// ============================================================================
// SECTION: Labels
// ============================================================================

/// Request outcome classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RpcOutcome {
    /// Successful request.
    Ok,
    /// Failed request.
    Error,
}

impl RpcOutcome {
    /// Returns a stable label for the outcome.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Error => "error",
        }
    }
}

// ============================================================================
// SECTION: Events
// ============================================================================

/// Per-request audit event payload.
#[derive(Debug, Clone, Serialize)]
pub struct RpcAuditEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// JSON-RPC request id rendered as text, when present.
    pub request_id: Option<String>,
    /// Peer IP address when available.
    pub peer_ip: Option<String>,
    /// Method name as sent by the caller, or `invalid`.
    pub method: String,
    /// Request outcome.
    pub outcome: RpcOutcome,
    /// JSON-RPC error code when present.
    pub error_code: Option<i64>,
    /// Error kind label when present.
    pub error_kind: Option<&'static str>,
    /// Request body size in bytes.
    pub request_bytes: usize,
    /// Response body size in bytes.
    pub response_bytes: usize,
    /// Handling latency in milliseconds.
    pub latency_ms: u128,
}

/// Inputs required to construct a request audit event.
pub struct RpcAuditEventParams {
    /// JSON-RPC request id rendered as text, when present.
    pub request_id: Option<String>,
    /// Peer IP address when available.
    pub peer_ip: Option<String>,
    /// Method name as sent by the caller, or `invalid`.
    pub method: String,
    /// Request outcome.
    pub outcome: RpcOutcome,
    /// JSON-RPC error code when present.
    pub error_code: Option<i64>,
    /// Error kind label when present.
    pub error_kind: Option<&'static str>,
    /// Request body size in bytes.
    pub request_bytes: usize,
    /// Response body size in bytes.
    pub response_bytes: usize,
    /// Handling latency in milliseconds.
    pub latency_ms: u128,
}

impl RpcAuditEvent {
    /// Creates a new request event stamped with the current time.
    #[must_use]
    pub fn new(params: RpcAuditEventParams) -> Self {
        Self {
            event: "rpc_request",
            timestamp_ms: now_ms(),
            request_id: params.request_id,
            peer_ip: params.peer_ip,
            method: params.method,
            outcome: params.outcome,
            error_code: params.error_code,
            error_kind: params.error_kind,
            request_bytes: params.request_bytes,
            response_bytes: params.response_bytes,
            latency_ms: params.latency_ms,
        }
    }
}

/// Process lifecycle stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum LifecycleStage {
    /// Store opened and migrations ran.
    StoreMigrated {
        /// Backend label (`memory` or `sqlite`).
        backend: &'static str,
        /// Migration steps applied during this startup.
        applied: usize,
        /// Schema version after startup, zero for the memory backend.
        schema_version: u32,
    },
    /// Listener bound and accepting connections.
    ServerListening {
        /// Bound socket address.
        bind: String,
    },
    /// Listener stopped after a shutdown signal.
    ServerStopped,
}

/// Lifecycle audit event payload.
#[derive(Debug, Clone, Serialize)]
pub struct LifecycleEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Lifecycle stage details.
    #[serde(flatten)]
    pub stage: LifecycleStage,
}

impl LifecycleEvent {
    /// Creates a new lifecycle event stamped with the current time.
    #[must_use]
    pub fn new(stage: LifecycleStage) -> Self {
        Self {
            event: "lifecycle",
            timestamp_ms: now_ms(),
            stage,
        }
    }
}

/// Milliseconds since the Unix epoch, zero if the clock is before it.
fn now_ms() -> u128 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis()
}

// ============================================================================
// SECTION: Sinks
// ============================================================================

/// Audit sink for RPC and lifecycle events.
pub trait AuditSink: Send + Sync {
    /// Records a request event.
    fn record(&self, event: &RpcAuditEvent);

    /// Records a lifecycle event.
    fn record_lifecycle(&self, _event: &LifecycleEvent) {}
}

/// Audit sink that logs JSON lines to stderr.
pub struct StderrAuditSink;

impl AuditSink for StderrAuditSink {
    fn record(&self, event: &RpcAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(std::io::stderr(), "{payload}");
        }
    }

    fn record_lifecycle(&self, event: &LifecycleEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(std::io::stderr(), "{payload}");
        }
    }
}

/// Audit sink that appends JSON lines to a file.
pub struct FileAuditSink {
    /// File handle used for append-only logging.
    file: Mutex<std::fs::File>,
}

impl FileAuditSink {
    /// Opens the audit log file in append mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }

    /// Appends one line and flushes, ignoring lock and write failures.
    fn write_line(&self, payload: &str) {
        if let Ok(mut file) = self.file.lock() {
            let _ = writeln!(file, "{payload}");
            let _ = file.flush();
        }
    }
}

impl AuditSink for FileAuditSink {
    fn record(&self, event: &RpcAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            self.write_line(&payload);
        }
    }

    fn record_lifecycle(&self, event: &LifecycleEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            self.write_line(&payload);
        }
    }
}

/// Audit sink that discards events.
pub struct NoopAuditSink;

impl AuditSink for NoopAuditSink {
    fn record(&self, _event: &RpcAuditEvent) {}
}

/// Builds the sink selected by the audit configuration.
///
/// # Errors
///
/// Returns an error when the configured audit file cannot be opened.
pub fn build_audit_sink(config: &ServerAuditConfig) -> io::Result<Arc<dyn AuditSink>> {
    if !config.enabled {
        return Ok(Arc::new(NoopAuditSink));
    }
    match &config.path {
        Some(path) => Ok(Arc::new(FileAuditSink::new(Path::new(path))?)),
        None => Ok(Arc::new(StderrAuditSink)),
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
