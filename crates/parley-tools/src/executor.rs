//! Executor boundary — where tool calls cross from the orchestration loop
//! into whatever hosts the tools.
//!
//! `LocalExecutor` runs tools in-process over a `ToolRegistry`.
//! `ProcessExecutor` (in `process.rs`) talks to an external tool-host
//! process over stdin/stdout. The loop only sees the trait.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use parley_core::types::ToolDescriptor;

use crate::registry::ToolRegistry;

/// Substituted when a tool succeeds but produces no output text.
pub const DEFAULT_TOOL_OUTPUT: &str = "Tool completed with no output.";

/// The boundary the orchestration loop calls tools through.
///
/// `list_tools` is invoked fresh at the start of every turn, so a host
/// whose tool set changes between turns is always advertised accurately.
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    /// Descriptors for all currently available tools, sorted by name.
    async fn list_tools(&self) -> anyhow::Result<Vec<ToolDescriptor>>;

    /// Invoke a tool by name with validated arguments.
    ///
    /// Unknown tools come back as `Err`, same as tool failures.
    async fn call_tool(
        &self,
        name: &str,
        arguments: HashMap<String, Value>,
    ) -> anyhow::Result<String>;
}

// ─────────────────────────────────────────────
// LocalExecutor
// ─────────────────────────────────────────────

/// Runs tools in-process over a shared registry.
pub struct LocalExecutor {
    registry: Arc<ToolRegistry>,
}

impl LocalExecutor {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self { registry }
    }
}

#[async_trait]
impl ToolExecutor for LocalExecutor {
    async fn list_tools(&self) -> anyhow::Result<Vec<ToolDescriptor>> {
        Ok(self.registry.descriptors())
    }

    async fn call_tool(
        &self,
        name: &str,
        arguments: HashMap<String, Value>,
    ) -> anyhow::Result<String> {
        self.registry.execute(name, arguments).await
    }
}
