// crates/policy-gate-core/src/lib.rs
// ============================================================================
// Module: Policy Gate Core Library
// Description: Public API surface for the Policy Gate core.
// Purpose: Expose tool identifiers, descriptors, decisions, and tool payloads.
// Dependencies: crate::{decision, descriptor, tooling, types}
// ============================================================================

//! ## Overview
//! Policy Gate core holds the I/O-free vocabulary shared by the gateway, the
//! tool dispatch layer, and the CLI: the tool-call descriptor and its strict
//! decoder, the policy verdict, the three-way gateway outcome, and the typed
//! payloads of every tool.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod decision;
pub mod descriptor;
pub mod tooling;
pub mod types;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use decision::GatewayError;
pub use decision::GatewayOutcome;
pub use decision::GatewayStage;
pub use decision::MalformedDecision;
pub use decision::PolicyDecision;
pub use descriptor::DEFAULT_MAX_DESCRIPTOR_BYTES;
pub use descriptor::DecodeError;
pub use descriptor::ToolCallDescriptor;
pub use tooling::ToolDefinition;
pub use tooling::ToolName;
pub use tooling::tool_definitions;
