// crates/policy-gate-mcp/src/tools.rs
// ============================================================================
// Module: MCP Tool Router
// Description: Routes MCP tool calls to the tool dispatch layer.
// Purpose: Authenticate, bind gated calls to their descriptor, and dispatch.
// Dependencies: policy-gate-core, policy-gate-github, serde
// ============================================================================

//! ## Overview
//! The tool router sits behind the policy gateway. For every `tools/call` it
//! authenticates the caller, checks that the call is the one the gateway
//! approved, and hands it to a [`ToolDispatcher`]. Upstream failures become
//! tool results flagged with `isError`; protocol-level failures become
//! [`RouterError`] values the server maps onto JSON-RPC errors.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use policy_gate_core::ToolCallDescriptor;
use policy_gate_core::ToolDefinition;
use policy_gate_core::ToolName;
use policy_gate_core::tool_definitions;
use policy_gate_github::ToolDispatcher;
use policy_gate_github::ToolError;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::audit::AuditSink;
use crate::auth::AuthAction;
use crate::auth::AuthAuditEvent;
use crate::auth::AuthContext;
use crate::auth::AuthError;
use crate::auth::RequestContext;
use crate::auth::ToolAuthz;

// ============================================================================
// SECTION: Router
// ============================================================================

/// Routes MCP tool requests to the dispatch layer.
#[derive(Clone)]
pub struct ToolRouter {
    /// Tool dispatch layer.
    dispatcher: Arc<dyn ToolDispatcher>,
    /// Inbound auth policy.
    authz: Arc<dyn ToolAuthz>,
    /// Audit sink for auth decisions.
    audit: Arc<dyn AuditSink>,
    /// Reject calls that did not pass through the gateway.
    require_gated_tool_calls: bool,
}

/// Inputs used to build a [`ToolRouter`].
pub struct ToolRouterConfig {
    /// Tool dispatch layer.
    pub dispatcher: Arc<dyn ToolDispatcher>,
    /// Inbound auth policy.
    pub authz: Arc<dyn ToolAuthz>,
    /// Audit sink for auth decisions.
    pub audit: Arc<dyn AuditSink>,
    /// Reject calls that did not pass through the gateway.
    pub require_gated_tool_calls: bool,
}

impl ToolRouter {
    /// Builds a router from its parts.
    #[must_use]
    pub fn new(config: ToolRouterConfig) -> Self {
        Self {
            dispatcher: config.dispatcher,
            authz: config.authz,
            audit: config.audit,
            require_gated_tool_calls: config.require_gated_tool_calls,
        }
    }

    /// Lists the tools exposed to an authenticated caller.
    ///
    /// # Errors
    ///
    /// Returns [`RouterError::Unauthenticated`] when auth fails.
    pub fn list_tools(
        &self,
        context: &RequestContext,
    ) -> Result<Vec<ToolDefinition>, RouterError> {
        self.authorize(context, AuthAction::ListTools)?;
        Ok(tool_definitions())
    }

    /// Handles a tool call.
    ///
    /// `gated` is the descriptor the policy gateway approved for this request,
    /// when the request carried one.
    ///
    /// # Errors
    ///
    /// Returns [`RouterError`] when the call is unauthenticated, does not
    /// match the approved descriptor, names an unknown tool, or carries
    /// invalid arguments. Upstream failures are returned as an error result.
    pub async fn handle_tool_call(
        &self,
        context: &RequestContext,
        gated: Option<&ToolCallDescriptor>,
        name: &str,
        arguments: Value,
    ) -> Result<ToolCallResult, RouterError> {
        self.authorize(context, AuthAction::CallTool(name))?;
        match gated {
            Some(descriptor) if !descriptor.matches_call(name, &arguments) => {
                return Err(RouterError::Unauthorized(
                    "tool call does not match authorized descriptor".to_string(),
                ));
            }
            None if self.require_gated_tool_calls => {
                return Err(RouterError::Unauthorized("tool call header required".to_string()));
            }
            _ => {}
        }
        let tool =
            ToolName::parse(name).ok_or_else(|| RouterError::UnknownTool(name.to_string()))?;
        match self.dispatcher.dispatch(tool, arguments).await {
            Ok(value) => ToolCallResult::success(value),
            Err(ToolError::UnknownTool(name)) => Err(RouterError::UnknownTool(name)),
            Err(ToolError::InvalidParams(message)) => Err(RouterError::InvalidParams(message)),
            Err(err @ ToolError::Upstream {
                ..
            }) => Ok(ToolCallResult::failure(err.to_string())),
            Err(ToolError::Serialization(message)) => Err(RouterError::Serialization(message)),
        }
    }

    /// Authenticates an action and records the auth decision.
    fn authorize(
        &self,
        context: &RequestContext,
        action: AuthAction<'_>,
    ) -> Result<AuthContext, RouterError> {
        match self.authz.authorize(context, action) {
            Ok(auth) => {
                self.audit.record_auth(&AuthAuditEvent::allowed(context, action, &auth));
                Ok(auth)
            }
            Err(err) => {
                self.audit.record_auth(&AuthAuditEvent::denied(context, action, &err));
                Err(err.into())
            }
        }
    }
}

// ============================================================================
// SECTION: Results
// ============================================================================

/// MCP `tools/call` result payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolCallResult {
    /// Content blocks.
    pub content: Vec<ToolContent>,
    /// Structured tool output for successful calls.
    #[serde(rename = "structuredContent", skip_serializing_if = "Option::is_none")]
    pub structured_content: Option<Value>,
    /// True when the tool itself failed.
    #[serde(rename = "isError")]
    pub is_error: bool,
}

/// MCP content block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ToolContent {
    /// Plain text block.
    Text {
        /// Text payload.
        text: String,
    },
}

impl ToolCallResult {
    /// Wraps a successful tool output.
    fn success(value: Value) -> Result<Self, RouterError> {
        let text = serde_json::to_string(&value)
            .map_err(|err| RouterError::Serialization(err.to_string()))?;
        Ok(Self {
            content: vec![ToolContent::Text {
                text,
            }],
            structured_content: Some(value),
            is_error: false,
        })
    }

    /// Wraps a tool failure message.
    fn failure(message: String) -> Self {
        Self {
            content: vec![ToolContent::Text {
                text: message,
            }],
            structured_content: None,
            is_error: true,
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Protocol-level tool routing failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouterError {
    /// Missing or invalid authentication.
    #[error("unauthenticated: {0}")]
    Unauthenticated(String),
    /// The call was not approved by the gateway.
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    /// Tool name not recognized.
    #[error("unknown tool: {0}")]
    UnknownTool(String),
    /// Arguments failed validation.
    #[error("invalid params: {0}")]
    InvalidParams(String),
    /// Result could not be serialized.
    #[error("serialization failed: {0}")]
    Serialization(String),
}

impl From<AuthError> for RouterError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Unauthenticated(message) => Self::Unauthenticated(message),
        }
    }
}
