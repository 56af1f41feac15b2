//! Cleanup tool — prunes the artifact directories once they accumulate
//! too many files.

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::base::Tool;
use crate::tools::OutputPaths;

/// A directory with more files than this gets emptied.
const FILE_THRESHOLD: usize = 5;

/// Empties artifact directories that have grown past the threshold.
pub struct CleanupTool {
    outputs: OutputPaths,
}

impl CleanupTool {
    pub fn new(outputs: OutputPaths) -> Self {
        Self { outputs }
    }

    /// Clean one directory; returns (file count before, files removed).
    fn clean_dir(dir: &Path) -> anyhow::Result<(usize, usize)> {
        let entries = match std::fs::read_dir(dir) {
            Ok(e) => e,
            Err(_) => return Ok((0, 0)),
        };

        let files: Vec<_> = entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_file())
            .collect();

        if files.len() <= FILE_THRESHOLD {
            return Ok((files.len(), 0));
        }

        let mut removed = 0;
        for file in &files {
            std::fs::remove_file(file)?;
            removed += 1;
        }
        Ok((files.len(), removed))
    }
}

#[async_trait]
impl Tool for CleanupTool {
    fn name(&self) -> &str {
        "cleanup_outputs"
    }

    fn description(&self) -> &str {
        "Tidy the output directories: empty any that hold more than a handful of generated files."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {},
            "required": []
        })
    }

    async fn execute(&self, _params: HashMap<String, Value>) -> anyhow::Result<String> {
        let mut lines = Vec::new();

        for dir in self.outputs.all() {
            let name = dir
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("?")
                .to_string();

            let (count, removed) = Self::clean_dir(&dir)?;
            debug!(dir = %name, count, removed, "cleanup pass");

            if removed > 0 {
                info!(dir = %name, removed, "emptied output dir");
                lines.push(format!("{name}: removed {removed} file(s)"));
            } else {
                lines.push(format!("{name}: {count} file(s), nothing to do"));
            }
        }

        Ok(lines.join("\n"))
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
