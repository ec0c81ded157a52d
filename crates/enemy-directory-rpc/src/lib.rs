// crates/enemy-directory-rpc/src/lib.rs
// ============================================================================
// Module: Enemy Directory RPC Library
// Description: JSON-RPC surface for the enemy directory.
// Purpose: Expose the router, HTTP server, and audit sinks.
// Dependencies: crate::{audit, router, server}
// ============================================================================

//! ## Overview
//! The RPC crate validates inbound enemy requests, dispatches them to a
//! [`enemy_directory_core::RecordStore`], and serves them as JSON-RPC 2.0
//! over HTTP.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod audit;
pub mod router;
pub mod server;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use audit::AuditSink;
pub use audit::FileAuditSink;
pub use audit::LifecycleEvent;
pub use audit::LifecycleStage;
pub use audit::NoopAuditSink;
pub use audit::RpcAuditEvent;
pub use audit::StderrAuditSink;
pub use router::AddEnemyRequest;
pub use router::EnemyMethod;
pub use router::EnemyResponse;
pub use router::EnemyRouter;
pub use router::GetEnemyRequest;
pub use router::ListEnemiesRequest;
pub use router::ListEnemiesResponse;
pub use router::RouterError;
pub use router::UpdateEnemyRequest;
pub use server::RPC_PATH;
pub use server::RpcServer;
pub use server::RpcServerError;
pub use server::TIMEOUT_HEADER;
