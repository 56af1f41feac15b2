//! Tool trait — the interface every built-in tool implements.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;

use parley_core::types::ToolDescriptor;

// ─────────────────────────────────────────────
// Tool trait
// ─────────────────────────────────────────────

/// Every tool implements this trait.
///
/// The registry discovers tools via `name()`, advertises their schemas to
/// the model via `to_descriptor()`, and dispatches calls via `execute()`.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Unique name used by the model to call this tool (e.g. `"search_news"`).
    fn name(&self) -> &str;

    /// Human-readable description shown to the model.
    fn description(&self) -> &str;

    /// JSON Schema describing the parameters (as a `serde_json::Value`).
    ///
    /// Must be `{"type": "object", "properties": {...}, "required": [...]}`.
    fn parameters(&self) -> Value;

    /// Execute the tool with the given (already validated) arguments.
    ///
    /// Returns the tool output as a string (the model reads this).
    /// On failure, return an `Err` — the caller converts it into a
    /// failure tool-result for the model.
    async fn execute(&self, params: HashMap<String, Value>) -> anyhow::Result<String>;

    /// Build the `ToolDescriptor` sent to the model.
    ///
    /// Default implementation — rarely needs overriding.
    fn to_descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::new(self.name(), self.description(), self.parameters())
    }
}

// ─────────────────────────────────────────────
// Param helpers
// ─────────────────────────────────────────────

/// Extract a required `String` param, returning a user-friendly error.
pub fn require_string(params: &HashMap<String, Value>, key: &str) -> anyhow::Result<String> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| anyhow::anyhow!("Missing required parameter: {key}"))
}

/// Extract an optional `String` param.
pub fn optional_string(params: &HashMap<String, Value>, key: &str) -> Option<String> {
    params.get(key).and_then(|v| v.as_str()).map(|s| s.to_string())
}

/// Extract an optional integer param.
pub fn optional_i64(params: &HashMap<String, Value>, key: &str) -> Option<i64> {
    params.get(key).and_then(|v| v.as_i64())
}
