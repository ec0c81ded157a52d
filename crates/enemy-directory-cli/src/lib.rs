// crates/enemy-directory-cli/src/lib.rs
// ============================================================================
// Module: Enemy Directory CLI Library
// Description: Shared helpers for the enemy directory command-line interface.
// Purpose: Expose the JSON-RPC client to the binary and integration tests.
// Dependencies: crate::rpc_client
// ============================================================================

//! ## Overview
//! Houses the HTTP JSON-RPC client used by the `enemy` subcommands.

// ============================================================================
// SECTION: Modules
// ============================================================================

/// JSON-RPC client for a running server.
pub mod rpc_client;

#[cfg(test)]
mod tests;
