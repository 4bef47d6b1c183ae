// crates/policy-gate-cli/src/lib.rs
// ============================================================================
// Module: Policy Gate CLI Library
// Description: Shared helpers for the Policy Gate command-line interface.
// Purpose: Expose the bind-exposure policy to the binary and its tests.
// Dependencies: policy-gate-config
// ============================================================================

//! ## Overview
//! Library half of the `policy-gate` binary. The entry point in `src/main.rs`
//! uses [`serve_policy`] to decide whether a configured bind address may be
//! served.

// ============================================================================
// SECTION: Modules
// ============================================================================

/// Network exposure checks for `policy-gate serve`.
pub mod serve_policy;
