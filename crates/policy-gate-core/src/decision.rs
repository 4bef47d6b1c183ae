// crates/policy-gate-core/src/decision.rs
// ============================================================================
// Module: Policy Decisions and Gateway Outcomes
// Description: Verdict parsing and the three-way gateway outcome.
// Purpose: Keep "policy said no" distinct from "policy could not be asked".
// Dependencies: serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! A [`PolicyDecision`] is derived from a successful policy-service response.
//! Only a JSON `true` in the `result` field allows the call; anything else is
//! a denial. Failures to obtain a decision never produce a [`PolicyDecision`]
//! and instead surface as [`GatewayError`] so callers can tell a denial from
//! an outage.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Serialize;
use serde_json::Map;
use serde_json::Value;
use thiserror::Error;

use crate::descriptor::DecodeError;
use crate::descriptor::ToolCallDescriptor;

// ============================================================================
// SECTION: Policy Decision
// ============================================================================

/// Field holding the verdict in a policy-service response.
pub const RESULT_FIELD: &str = "result";
/// Field holding the decision identifier in a policy-service response.
pub const DECISION_ID_FIELD: &str = "decision_id";

/// Verdict returned by the policy service.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PolicyDecision {
    /// True only when the policy explicitly allowed the call.
    pub allowed: bool,
    /// Raw `result` value when present.
    pub result: Option<Value>,
    /// Decision identifier reported by the service, if any.
    pub decision_id: Option<String>,
    /// Remaining response fields, kept opaque.
    pub metadata: Map<String, Value>,
}

impl PolicyDecision {
    /// Parses a decision from a successful policy-service response body.
    ///
    /// # Errors
    ///
    /// Returns [`MalformedDecision`] when the body is not a JSON object.
    pub fn from_response_body(body: &[u8]) -> Result<Self, MalformedDecision> {
        let value: Value =
            serde_json::from_slice(body).map_err(|err| MalformedDecision(err.to_string()))?;
        let Value::Object(mut fields) = value else {
            return Err(MalformedDecision("response body must be a json object".to_string()));
        };
        let result = fields.remove(RESULT_FIELD);
        let decision_id = match fields.remove(DECISION_ID_FIELD) {
            Some(Value::String(id)) => Some(id),
            Some(other) => {
                fields.insert(DECISION_ID_FIELD.to_string(), other);
                None
            }
            None => None,
        };
        Ok(Self {
            allowed: matches!(result, Some(Value::Bool(true))),
            result,
            decision_id,
            metadata: fields,
        })
    }

    /// Builds an allow decision with no metadata.
    #[must_use]
    pub fn allow() -> Self {
        Self {
            allowed: true,
            result: Some(Value::Bool(true)),
            decision_id: None,
            metadata: Map::new(),
        }
    }

    /// Builds a deny decision with no metadata.
    #[must_use]
    pub fn deny() -> Self {
        Self {
            allowed: false,
            result: Some(Value::Bool(false)),
            decision_id: None,
            metadata: Map::new(),
        }
    }
}

/// Policy-service response body that could not be interpreted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed policy response: {0}")]
pub struct MalformedDecision(pub String);

// ============================================================================
// SECTION: Gateway Outcome
// ============================================================================

/// Result of gating one tool-call request. Computed once per request.
#[derive(Debug, Clone, PartialEq)]
pub enum GatewayOutcome {
    /// Policy allowed the call; forward it unchanged.
    Forward {
        /// Descriptor that was evaluated.
        descriptor: ToolCallDescriptor,
        /// Verdict returned by the policy service.
        decision: PolicyDecision,
    },
    /// Policy denied the call.
    Deny {
        /// Descriptor that was evaluated.
        descriptor: ToolCallDescriptor,
        /// Verdict returned by the policy service.
        decision: PolicyDecision,
    },
    /// No verdict could be obtained.
    Error(GatewayError),
}

impl GatewayOutcome {
    /// Builds the outcome for a successful policy evaluation.
    #[must_use]
    pub fn from_decision(descriptor: ToolCallDescriptor, decision: PolicyDecision) -> Self {
        if decision.allowed {
            Self::Forward {
                descriptor,
                decision,
            }
        } else {
            Self::Deny {
                descriptor,
                decision,
            }
        }
    }

    /// Returns a stable label for audit and CLI output.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Forward {
                ..
            } => "forward",
            Self::Deny {
                ..
            } => "deny",
            Self::Error(_) => "error",
        }
    }

    /// Returns the evaluated descriptor when decoding succeeded.
    #[must_use]
    pub const fn descriptor(&self) -> Option<&ToolCallDescriptor> {
        match self {
            Self::Forward {
                descriptor,
                ..
            }
            | Self::Deny {
                descriptor,
                ..
            } => Some(descriptor),
            Self::Error(_) => None,
        }
    }

    /// Returns the policy decision when one was obtained.
    #[must_use]
    pub const fn decision(&self) -> Option<&PolicyDecision> {
        match self {
            Self::Forward {
                decision,
                ..
            }
            | Self::Deny {
                decision,
                ..
            } => Some(decision),
            Self::Error(_) => None,
        }
    }
}

/// Stage at which gating failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GatewayStage {
    /// Decoding the tool-call header.
    Decode,
    /// Calling the policy service.
    PolicyService,
    /// Anything else inside the gateway.
    Internal,
}

impl GatewayStage {
    /// Returns the stage label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Decode => "decode",
            Self::PolicyService => "policy_service",
            Self::Internal => "internal",
        }
    }
}

/// Gateway failure carrying the stage that failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// The tool-call header could not be decoded.
    #[error("invalid tool call header: {0}")]
    Decode(#[from] DecodeError),
    /// The policy service could not produce a verdict.
    #[error("{0}")]
    PolicyService(String),
    /// Internal gateway failure.
    #[error("internal gateway error: {0}")]
    Internal(String),
}

impl GatewayError {
    /// Returns the stage that failed.
    #[must_use]
    pub const fn stage(&self) -> GatewayStage {
        match self {
            Self::Decode(_) => GatewayStage::Decode,
            Self::PolicyService(_) => GatewayStage::PolicyService,
            Self::Internal(_) => GatewayStage::Internal,
        }
    }
}
