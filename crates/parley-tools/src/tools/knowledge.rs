//! Knowledge lookup tool — retrieves relevant snippets from a local
//! document collection and has the completion model answer from them.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{debug, warn};

use parley_core::types::Message;
use parley_core::utils::{file_stamp, safe_filename, truncate_string};
use parley_providers::CompletionClient;

use crate::base::{require_string, Tool};
use crate::tools::OutputPaths;

/// Snippets fed as context per question.
const TOP_K: usize = 5;

const ANSWER_PROMPT: &str = "You are a knowledge assistant. Answer the user's question using \
only the reference material below. If the material does not cover the question, say so \
plainly instead of guessing.\n\nReference material:\n\n";

/// One retrieved passage.
#[derive(Clone, Debug, PartialEq)]
pub struct Snippet {
    /// Where the passage came from (e.g. a filename).
    pub source: String,
    pub content: String,
}

/// Retrieval backend: given a question, return the most relevant snippets.
pub trait Retriever: Send + Sync {
    fn retrieve(&self, question: &str, k: usize) -> anyhow::Result<Vec<Snippet>>;
}

// ─────────────────────────────────────────────
// FileRetriever
// ─────────────────────────────────────────────

/// Retrieves paragraphs from Markdown files by term overlap.
///
/// Documents are split on blank lines; each paragraph is scored by how many
/// distinct question terms it contains.
pub struct FileRetriever {
    dir: PathBuf,
}

impl FileRetriever {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn load_paragraphs(&self) -> anyhow::Result<Vec<Snippet>> {
        let mut snippets = Vec::new();

        let entries = match std::fs::read_dir(&self.dir) {
            Ok(e) => e,
            Err(_) => return Ok(snippets),
        };

        let mut paths: Vec<PathBuf> = entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("md"))
            .collect();
        paths.sort();

        for path in paths {
            let content = std::fs::read_to_string(&path)?;
            let source = path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("unknown")
                .to_string();
            for paragraph in content.split("\n\n") {
                let trimmed = paragraph.trim();
                if !trimmed.is_empty() {
                    snippets.push(Snippet {
                        source: source.clone(),
                        content: trimmed.to_string(),
                    });
                }
            }
        }

        Ok(snippets)
    }

    fn score(question_terms: &[String], paragraph: &str) -> usize {
        let lower = paragraph.to_lowercase();
        question_terms
            .iter()
            .filter(|term| lower.contains(term.as_str()))
            .count()
    }
}

impl Retriever for FileRetriever {
    fn retrieve(&self, question: &str, k: usize) -> anyhow::Result<Vec<Snippet>> {
        let terms: Vec<String> = question
            .to_lowercase()
            .split_whitespace()
            .filter(|t| t.chars().count() > 2)
            .map(String::from)
            .collect();

        let mut scored: Vec<(usize, Snippet)> = self
            .load_paragraphs()?
            .into_iter()
            .map(|s| (Self::score(&terms, &s.content), s))
            .filter(|(score, _)| *score > 0)
            .collect();

        // Highest overlap first; load order breaks ties.
        scored.sort_by(|a, b| b.0.cmp(&a.0));
        Ok(scored.into_iter().take(k).map(|(_, s)| s).collect())
    }
}

// ─────────────────────────────────────────────
// KnowledgeTool
// ─────────────────────────────────────────────

/// Answers questions from the local knowledge collection.
pub struct KnowledgeTool {
    completions: Arc<dyn CompletionClient>,
    retriever: Arc<dyn Retriever>,
    outputs: OutputPaths,
}

impl KnowledgeTool {
    pub fn new(
        completions: Arc<dyn CompletionClient>,
        retriever: Arc<dyn Retriever>,
        outputs: OutputPaths,
    ) -> Self {
        Self {
            completions,
            retriever,
            outputs,
        }
    }

    fn save_answer(&self, question: &str, answer: &str) -> Option<PathBuf> {
        let dir = self.outputs.knowledge();
        if let Err(e) = OutputPaths::ensure(&dir) {
            warn!(error = %e, "could not create knowledge output dir");
            return None;
        }

        let slug = safe_filename(&truncate_string(question, 20));
        let path = dir.join(format!("answer_{}_{}.md", slug, file_stamp()));
        let report = format!("# {}\n\n{}\n", question, answer);
        if let Err(e) = std::fs::write(&path, report) {
            warn!(error = %e, "could not save knowledge answer");
            return None;
        }
        Some(path)
    }
}

#[async_trait]
impl Tool for KnowledgeTool {
    fn name(&self) -> &str {
        "lookup_knowledge"
    }

    fn description(&self) -> &str {
        "Answer a question from the local knowledge collection (documents on disk)."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "question": {
                    "type": "string",
                    "description": "The question to answer"
                }
            },
            "required": ["question"]
        })
    }

    async fn execute(&self, params: HashMap<String, Value>) -> anyhow::Result<String> {
        let question = require_string(&params, "question")?;

        let snippets = self.retriever.retrieve(&question, TOP_K)?;
        if snippets.is_empty() {
            return Ok("No relevant material found in the knowledge collection.".to_string());
        }

        debug!(snippets = snippets.len(), "answering from knowledge");

        let context = snippets
            .iter()
            .map(|s| format!("[{}]\n{}", s.source, s.content))
            .collect::<Vec<_>>()
            .join("\n---\n");

        let messages = vec![
            Message::system(format!("{ANSWER_PROMPT}{context}")),
            Message::user(question.clone()),
        ];

        let response = self
            .completions
            .complete(&messages, None)
            .await
            .map_err(|e| anyhow::anyhow!("Knowledge lookup failed: {e}"))?;

        let answer = response
            .content
            .ok_or_else(|| anyhow::anyhow!("Knowledge lookup returned no content"))?;

        let mut output = answer.clone();
        if let Some(path) = self.save_answer(&question, &answer) {
            output.push_str(&format!("\n\nAnswer saved to {}", path.display()));
        }

        Ok(output)
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
