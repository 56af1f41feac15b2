//! Sentiment analysis tool — asks the completion model to analyse a piece
//! of text and saves the result as a Markdown report.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{debug, warn};

use parley_core::types::Message;
use parley_core::utils::{file_stamp, safe_filename, truncate_string};
use parley_providers::CompletionClient;

use crate::base::{require_string, Tool};
use crate::tools::OutputPaths;

const ANALYSIS_PROMPT: &str = "You are a sentiment analyst. Analyse the sentiment of the \
following text. Report the overall sentiment (positive, negative, or mixed), the key \
emotional signals you relied on, and a one-paragraph summary. Format the answer as Markdown.";

/// Runs a sentiment analysis over a text via the completion model.
pub struct SentimentTool {
    completions: Arc<dyn CompletionClient>,
    outputs: OutputPaths,
}

impl SentimentTool {
    pub fn new(completions: Arc<dyn CompletionClient>, outputs: OutputPaths) -> Self {
        Self {
            completions,
            outputs,
        }
    }

    fn save_report(&self, text: &str, analysis: &str) -> Option<std::path::PathBuf> {
        let dir = self.outputs.reports();
        if let Err(e) = OutputPaths::ensure(&dir) {
            warn!(error = %e, "could not create reports dir");
            return None;
        }

        let slug = safe_filename(&truncate_string(text, 20));
        let path = dir.join(format!("sentiment_{}_{}.md", slug, file_stamp()));
        let report = format!(
            "# Sentiment analysis\n\n## Source text\n\n{}\n\n## Analysis\n\n{}\n",
            text, analysis
        );
        if let Err(e) = std::fs::write(&path, report) {
            warn!(error = %e, "could not save sentiment report");
            return None;
        }
        Some(path)
    }
}

#[async_trait]
impl Tool for SentimentTool {
    fn name(&self) -> &str {
        "analyze_sentiment"
    }

    fn description(&self) -> &str {
        "Analyze the sentiment of a piece of text and save a Markdown report."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "text": {
                    "type": "string",
                    "description": "The text to analyze"
                }
            },
            "required": ["text"]
        })
    }

    async fn execute(&self, params: HashMap<String, Value>) -> anyhow::Result<String> {
        let text = require_string(&params, "text")?;

        debug!(chars = text.len(), "analyzing sentiment");

        let messages = vec![
            Message::system(ANALYSIS_PROMPT),
            Message::user(text.clone()),
        ];

        let response = self
            .completions
            .complete(&messages, None)
            .await
            .map_err(|e| anyhow::anyhow!("Sentiment analysis failed: {e}"))?;

        let analysis = response
            .content
            .ok_or_else(|| anyhow::anyhow!("Sentiment analysis returned no content"))?;

        let mut output = analysis.clone();
        if let Some(path) = self.save_report(&text, &analysis) {
            output.push_str(&format!("\n\nReport saved to {}", path.display()));
        }

        Ok(output)
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
