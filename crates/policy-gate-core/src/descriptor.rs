// crates/policy-gate-core/src/descriptor.rs
// ============================================================================
// Module: Tool Call Descriptor
// Description: Strict decoding of the tool-call header payload.
// Purpose: Turn untrusted header bytes into a validated {tool, arguments} pair.
// Dependencies: serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! A [`ToolCallDescriptor`] identifies one invocation attempt. It is decoded
//! from the raw value of the tool-call header and is the exact payload the
//! policy service evaluates.
//!
//! Decoding is fail-closed: any missing, mistyped, or unexpected field is a
//! [`DecodeError`]. There is no default or partial descriptor.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;
use thiserror::Error;

use crate::tooling::ToolName;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default upper bound for an encoded descriptor in bytes.
pub const DEFAULT_MAX_DESCRIPTOR_BYTES: usize = 8 * 1024;

/// Maximum length of a tool name.
const MAX_TOOL_NAME_BYTES: usize = 128;

// ============================================================================
// SECTION: Descriptor
// ============================================================================

/// Decoded tool invocation descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ToolCallDescriptor {
    /// Tool name as supplied by the caller.
    pub tool: String,
    /// Named tool arguments.
    pub arguments: Map<String, Value>,
}

impl ToolCallDescriptor {
    /// Builds a descriptor from parts.
    #[must_use]
    pub fn new(tool: impl Into<String>, arguments: Map<String, Value>) -> Self {
        Self {
            tool: tool.into(),
            arguments,
        }
    }

    /// Decodes a descriptor from raw header bytes.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError`] when the payload is empty, oversized, not UTF-8,
    /// not a JSON object, or does not match the descriptor schema exactly.
    pub fn decode(raw: &[u8], max_bytes: usize) -> Result<Self, DecodeError> {
        if raw.len() > max_bytes {
            return Err(DecodeError::TooLarge {
                actual: raw.len(),
                limit: max_bytes,
            });
        }
        let text = std::str::from_utf8(raw).map_err(|_| DecodeError::NotUtf8)?;
        let text = text.trim();
        if text.is_empty() {
            return Err(DecodeError::Empty);
        }
        let value: Value =
            serde_json::from_str(text).map_err(|err| DecodeError::Syntax(err.to_string()))?;
        if !value.is_object() {
            return Err(DecodeError::NotAnObject);
        }
        let descriptor: Self =
            serde_json::from_value(value).map_err(|err| DecodeError::Schema(err.to_string()))?;
        descriptor.validate()?;
        Ok(descriptor)
    }

    /// Resolves the tool name to a known tool, when it is one.
    #[must_use]
    pub fn tool_name(&self) -> Option<ToolName> {
        ToolName::parse(&self.tool)
    }

    /// Returns true when a dispatched call names the same tool and arguments.
    #[must_use]
    pub fn matches_call(&self, name: &str, arguments: &Value) -> bool {
        if self.tool != name {
            return false;
        }
        match arguments {
            Value::Object(map) => map == &self.arguments,
            Value::Null => self.arguments.is_empty(),
            _ => false,
        }
    }

    /// Checks field-level constraints serde cannot express.
    fn validate(&self) -> Result<(), DecodeError> {
        let tool = self.tool.trim();
        if tool.is_empty() {
            return Err(DecodeError::Schema("tool must be a non-empty string".to_string()));
        }
        if tool.len() != self.tool.len() {
            return Err(DecodeError::Schema(
                "tool must not contain surrounding whitespace".to_string(),
            ));
        }
        if self.tool.len() > MAX_TOOL_NAME_BYTES {
            return Err(DecodeError::Schema("tool name exceeds length limit".to_string()));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Failures while decoding the tool-call header.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// The header appeared more than once.
    #[error("tool call header repeated")]
    Repeated,
    /// The header value was empty.
    #[error("tool call header is empty")]
    Empty,
    /// The header value exceeded the configured size limit.
    #[error("tool call header is {actual} bytes (limit {limit})")]
    TooLarge {
        /// Observed size in bytes.
        actual: usize,
        /// Configured limit in bytes.
        limit: usize,
    },
    /// The header value was not valid UTF-8.
    #[error("tool call header is not valid utf-8")]
    NotUtf8,
    /// The header value was not parseable JSON.
    #[error("tool call header is not valid json: {0}")]
    Syntax(String),
    /// The header value was JSON but not an object.
    #[error("tool call header must be a json object")]
    NotAnObject,
    /// The object did not match the descriptor schema.
    #[error("tool call header has invalid shape: {0}")]
    Schema(String),
}

#[cfg(test)]
mod tests;
