// crates/policy-gate-mcp/src/lib.rs
// ============================================================================
// Module: Policy Gate MCP
// Description: Policy gateway and MCP HTTP server for GitHub tools.
// Purpose: Gate every tool invocation on an external policy verdict.
// Dependencies: policy-gate-core, policy-gate-config, policy-gate-github, axum
// ============================================================================

//! ## Overview
//! Policy Gate MCP fronts the GitHub tool dispatch layer with a policy
//! gateway. Tool calls carry a descriptor header; the gateway asks an
//! OPA-style policy service for a verdict and forwards, denies, or fails the
//! request before any tool runs. The MCP server speaks JSON-RPC 2.0 over HTTP
//! and publishes protected-resource metadata for OAuth discovery.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod audit;
pub mod auth;
pub mod gateway;
pub mod policy;
pub mod server;
pub mod tools;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use audit::AuditSink;
pub use audit::FileAuditSink;
pub use audit::GatewayAuditEvent;
pub use audit::McpAuditEvent;
pub use audit::NoopAuditSink;
pub use audit::StderrAuditSink;
pub use auth::AuthAuditEvent;
pub use auth::DefaultToolAuthz;
pub use auth::RequestContext;
pub use auth::ToolAuthz;
pub use gateway::DENIAL_MESSAGE;
pub use gateway::GatedToolCall;
pub use gateway::PolicyGateway;
pub use gateway::enforce_policy;
pub use policy::HttpPolicyClient;
pub use policy::PolicyClient;
pub use policy::PolicyServiceError;
pub use server::McpServerError;
pub use server::PolicyGateServer;
pub use server::ServerComponents;
pub use tools::RouterError;
pub use tools::ToolCallResult;
pub use tools::ToolRouter;
