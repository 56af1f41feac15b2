//! The per-turn orchestration loop.
//!
//! One turn: fetch the current tool set, replay the recent history behind a
//! fresh system prompt, let the model answer or call tools, run the calls in
//! order, synthesize a final reply, and commit exactly two messages to the
//! session — the user's and the final assistant reply. Failures inside the
//! turn become an apology that is committed the same way, so the transcript
//! never ends on an unanswered user message.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Local};
use tracing::{debug, error, info, warn};

use parley_core::history::HistoryStore;
use parley_core::types::{Message, ToolCall, ToolDescriptor};
use parley_core::utils::{file_stamp, safe_filename};
use parley_providers::CompletionClient;
use parley_tools::{decode_arguments, ToolExecutor, DEFAULT_TOOL_OUTPUT};

use crate::prompt::PromptTemplate;

// ─────────────────────────────────────────────
// Orchestrator
// ─────────────────────────────────────────────

/// Drives one conversational turn at a time.
pub struct Orchestrator {
    completions: Arc<dyn CompletionClient>,
    executor: Arc<dyn ToolExecutor>,
    history: Arc<HistoryStore>,
    prompt: PromptTemplate,
    turn_log_dir: Option<PathBuf>,
}

impl Orchestrator {
    pub fn new(
        completions: Arc<dyn CompletionClient>,
        executor: Arc<dyn ToolExecutor>,
        history: Arc<HistoryStore>,
        prompt: PromptTemplate,
    ) -> Self {
        Self {
            completions,
            executor,
            history,
            prompt,
            turn_log_dir: None,
        }
    }

    /// Also write each completed turn as a plain-text transcript file
    /// under `dir` (one file per turn, named after the user text).
    pub fn with_turn_log(mut self, dir: PathBuf) -> Self {
        self.turn_log_dir = Some(dir);
        self
    }

    /// Handle one user turn. Never fails: errors inside the turn become an
    /// apology, and the user message plus the final reply are committed
    /// either way.
    pub async fn handle_turn(&self, session_id: &str, user_text: &str) -> String {
        self.handle_turn_at(session_id, user_text, Local::now()).await
    }

    /// Same as `handle_turn` with an explicit clock, so tests can pin time.
    pub async fn handle_turn_at(
        &self,
        session_id: &str,
        user_text: &str,
        now: DateTime<Local>,
    ) -> String {
        let reply = match self.run_turn(session_id, user_text, now).await {
            Ok(reply) => reply,
            Err(e) => {
                error!(session = session_id, error = %e, "turn failed");
                format!("Sorry, something went wrong while handling your request: {e}")
            }
        };

        self.history.append(session_id, Message::user(user_text));
        self.history.append(session_id, Message::assistant(&reply));

        if let Some(dir) = &self.turn_log_dir {
            if let Err(e) = write_turn_log(dir, user_text, &reply) {
                warn!(error = %e, "failed to write turn log");
            }
        }

        reply
    }

    /// The fallible body of a turn.
    async fn run_turn(
        &self,
        session_id: &str,
        user_text: &str,
        now: DateTime<Local>,
    ) -> Result<String> {
        // Tool set is fetched fresh every turn; a host whose tools change
        // between turns is always advertised accurately.
        let tools = self
            .executor
            .list_tools()
            .await
            .map_err(|e| anyhow::anyhow!("could not list tools: {e}"))?;

        debug!(session = session_id, tools = tools.len(), "starting turn");

        let mut context = self.build_context(session_id, user_text, now);

        // First completion: the model may answer directly or call tools.
        let first = self.completions.complete(&context, Some(&tools)).await?;

        if !first.has_tool_calls() {
            return Ok(first
                .content
                .unwrap_or_else(|| Self::empty_reply().to_string()));
        }

        // Echo the tool-call intents, then run each call in received order.
        let calls = first.tool_calls.clone();
        context.push(Message::assistant_tool_calls(first.content, calls.clone()));

        let mut seen_ids: HashSet<&str> = HashSet::new();
        for call in &calls {
            let outcome = if !seen_ids.insert(call.id.as_str()) {
                warn!(id = %call.id, "duplicate tool call id in one assistant turn");
                format!("Duplicate tool call id '{}' — call skipped.", call.id)
            } else {
                self.run_call(call, &tools).await
            };
            context.push(Message::tool_result(&call.id, outcome));
        }

        // Synthesis: no tools offered, so the model must produce text.
        let synthesis = self.completions.complete(&context, None).await?;
        Ok(synthesis
            .content
            .unwrap_or_else(|| Self::empty_reply().to_string()))
    }

    /// Fresh system prompt, then the replay window, then the new user text.
    /// Stale system messages from the stored history are dropped so exactly
    /// one (current) system prompt leads the context.
    fn build_context(
        &self,
        session_id: &str,
        user_text: &str,
        now: DateTime<Local>,
    ) -> Vec<Message> {
        let mut context = vec![Message::system(self.prompt.render(now))];
        context.extend(
            self.history
                .read(session_id)
                .into_iter()
                .filter(|m| !m.is_system()),
        );
        context.push(Message::user(user_text));
        context
    }

    /// Run one tool call and render its outcome as tool-result text.
    ///
    /// Argument payloads are validated against the advertised descriptor
    /// before the tool runs; a rejected payload never reaches the tool.
    /// A call naming a tool that was not advertised is passed through with
    /// unvalidated arguments so the executor rejects it by name.
    async fn run_call(&self, call: &ToolCall, tools: &[ToolDescriptor]) -> String {
        let name = &call.function.name;
        let descriptor = tools.iter().find(|t| &t.function.name == name);

        let arguments = match descriptor {
            Some(descriptor) => match decode_arguments(&call.function.arguments, descriptor) {
                Ok(args) => args,
                Err(e) => {
                    warn!(tool = %name, error = %e, "rejected tool arguments");
                    return format!("Invalid arguments for '{name}': {e}");
                }
            },
            None => serde_json::from_str(&call.function.arguments).unwrap_or_default(),
        };

        info!(tool = %name, id = %call.id, "executing tool call");

        match self.executor.call_tool(name, arguments).await {
            Ok(output) => {
                if output.trim().is_empty() {
                    DEFAULT_TOOL_OUTPUT.to_string()
                } else {
                    output
                }
            }
            Err(e) => {
                warn!(tool = %name, error = %e, "tool call failed");
                format!("Tool execution failed: {e}")
            }
        }
    }

    fn empty_reply() -> &'static str {
        "I've completed the request but have no further details to add."
    }
}

/// One transcript file per turn: the user text and the final reply,
/// named after the (sanitized, truncated) user text plus a timestamp.
fn write_turn_log(dir: &Path, user_text: &str, reply: &str) -> std::io::Result<()> {
    std::fs::create_dir_all(dir)?;
    let slug: String = user_text.trim().chars().take(50).collect();
    let name = format!("{}_{}.txt", safe_filename(&slug), file_stamp());
    std::fs::write(
        dir.join(name),
        format!("User: {user_text}\n\nAssistant:\n{reply}\n"),
    )
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
