// crates/policy-gate-github/src/lib.rs
// ============================================================================
// Module: Policy Gate GitHub Library
// Description: Upstream GitHub client and tool dispatch layer.
// Purpose: Execute allowed tool calls against the GitHub REST API.
// Dependencies: crate::{client, tools}
// ============================================================================

//! ## Overview
//! This crate sits behind the policy gateway. It owns the single pooled HTTP
//! client used for upstream calls and maps each read-only tool onto one
//! GitHub REST request, reshaping the response into the typed payloads from
//! `policy-gate-core`.
//!
//! Security posture: upstream responses are untrusted and size-limited; the
//! API token never appears in errors or logs.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod client;
pub mod tools;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use client::GitHubClient;
pub use client::UpstreamError;
pub use tools::GitHubTools;
pub use tools::ToolDispatcher;
pub use tools::ToolError;
