//! Completion client trait — the seam between the orchestration loop and
//! whatever model backend serves it.
//!
//! The production implementation is `HttpCompletions` in `http_client.rs`,
//! which covers any OpenAI-compatible `/chat/completions` endpoint. Tests
//! swap in scripted mocks.

use async_trait::async_trait;
use thiserror::Error;

use parley_core::types::{CompletionResponse, Message, ToolDescriptor};

/// Errors from a completion call.
///
/// These propagate up to the orchestration loop, which turns any of them
/// into a user-facing apology rather than crashing the turn.
#[derive(Debug, Error)]
pub enum CompletionError {
    /// Network-level failure (connect, timeout, TLS).
    #[error("completion request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-2xx status from the API.
    #[error("completion API error {status}: {body}")]
    Api { status: u16, body: String },

    /// Response body could not be parsed.
    #[error("malformed completion response: {0}")]
    Malformed(String),

    /// Response carried no choices.
    #[error("completion response contained no choices")]
    Empty,
}

/// Per-request sampling options.
#[derive(Clone, Debug)]
pub struct RequestOptions {
    /// Maximum tokens to generate.
    pub max_tokens: u32,
    /// Sampling temperature (0.0 – 2.0).
    pub temperature: f64,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            max_tokens: 4096,
            temperature: 0.7,
        }
    }
}

/// Trait that all completion backends implement.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Send a chat completion request.
    ///
    /// # Arguments
    /// * `messages` — Conversation context in OpenAI format.
    /// * `tools`    — Tool descriptors the model may call. `Some(&[])` means
    ///                tools were offered but none are available; `None` means
    ///                the call must not produce tool calls (synthesis step).
    ///
    /// # Returns
    /// A `CompletionResponse` with content and/or tool calls, or an error
    /// the caller converts into a user-facing apology.
    async fn complete(
        &self,
        messages: &[Message],
        tools: Option<&[ToolDescriptor]>,
    ) -> Result<CompletionResponse, CompletionError>;

    /// The model identifier this client sends.
    fn model(&self) -> &str;
}
