//! Argument payload validation.
//!
//! Tool-call arguments arrive as a raw JSON string emitted by the model.
//! Before a tool runs, the payload is parsed and checked against the tool's
//! declared parameter schema: required names present, declared kinds match,
//! undeclared names rejected. A failed check becomes a failure tool-result
//! and the tool is never invoked.

use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;

use parley_core::types::ToolDescriptor;

/// Why an argument payload was rejected.
#[derive(Debug, Error, PartialEq)]
pub enum ArgumentError {
    #[error("arguments are not valid JSON: {0}")]
    InvalidJson(String),

    #[error("arguments must be a JSON object")]
    NotAnObject,

    #[error("missing required argument: {0}")]
    MissingRequired(String),

    #[error("argument '{name}' should be of type {expected}")]
    WrongKind { name: String, expected: ArgKind },

    #[error("unknown argument: {0}")]
    UnknownArgument(String),
}

/// The JSON kinds a parameter schema can declare.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ArgKind {
    String,
    Number,
    Boolean,
    Object,
    Array,
}

impl std::fmt::Display for ArgKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ArgKind::String => "string",
            ArgKind::Number => "number",
            ArgKind::Boolean => "boolean",
            ArgKind::Object => "object",
            ArgKind::Array => "array",
        };
        f.write_str(s)
    }
}

impl ArgKind {
    /// Parse a JSON Schema `type` string. Unrecognized types get no check.
    fn from_schema(s: &str) -> Option<ArgKind> {
        match s {
            "string" => Some(ArgKind::String),
            "number" | "integer" => Some(ArgKind::Number),
            "boolean" => Some(ArgKind::Boolean),
            "object" => Some(ArgKind::Object),
            "array" => Some(ArgKind::Array),
            _ => None,
        }
    }

    /// Whether a JSON value matches this kind.
    fn matches(&self, value: &Value) -> bool {
        match self {
            ArgKind::String => value.is_string(),
            ArgKind::Number => value.is_number(),
            ArgKind::Boolean => value.is_boolean(),
            ArgKind::Object => value.is_object(),
            ArgKind::Array => value.is_array(),
        }
    }
}

/// Parse and validate a raw argument payload against a tool descriptor.
///
/// An empty or whitespace-only payload is treated as `{}` (some models omit
/// arguments entirely for zero-parameter tools).
pub fn decode_arguments(
    raw: &str,
    descriptor: &ToolDescriptor,
) -> Result<HashMap<String, Value>, ArgumentError> {
    let trimmed = raw.trim();
    let parsed: Value = if trimmed.is_empty() {
        Value::Object(Default::default())
    } else {
        serde_json::from_str(trimmed).map_err(|e| ArgumentError::InvalidJson(e.to_string()))?
    };

    let object = match parsed {
        Value::Object(map) => map,
        _ => return Err(ArgumentError::NotAnObject),
    };

    let schema = &descriptor.function.parameters;
    let properties = schema.get("properties").and_then(|p| p.as_object());

    // Required names must be present.
    if let Some(required) = schema.get("required").and_then(|r| r.as_array()) {
        for name in required.iter().filter_map(|v| v.as_str()) {
            if !object.contains_key(name) {
                return Err(ArgumentError::MissingRequired(name.to_string()));
            }
        }
    }

    for (name, value) in &object {
        let spec = match properties.and_then(|p| p.get(name)) {
            Some(s) => s,
            None => return Err(ArgumentError::UnknownArgument(name.clone())),
        };

        // Null passes; the tool decides whether to accept an absent value.
        if value.is_null() {
            continue;
        }

        if let Some(kind) = spec
            .get("type")
            .and_then(|t| t.as_str())
            .and_then(ArgKind::from_schema)
        {
            if !kind.matches(value) {
                return Err(ArgumentError::WrongKind {
                    name: name.clone(),
                    expected: kind,
                });
            }
        }
    }

    Ok(object.into_iter().collect())
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
