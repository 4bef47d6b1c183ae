// crates/policy-gate-config/src/lib.rs
// ============================================================================
// Module: Policy Gate Config Library
// Description: Canonical config model, environment overrides, and validation.
// Purpose: Single source of truth for policy-gate.toml semantics.
// Dependencies: serde, toml, url
// ============================================================================

//! ## Overview
//! `policy-gate-config` defines the configuration model for the policy
//! gateway: the inbound server, the gateway header contract, the external
//! policy service, the upstream GitHub API, and the identity metadata
//! advertised to clients. Validation is strict and fail-closed.
//!
//! Security posture: config inputs are untrusted and secrets are redacted
//! from `Debug` output.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;
pub mod examples;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
pub use examples::config_toml_example;
