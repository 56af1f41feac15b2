//! HTTP completion client for OpenAI-compatible APIs.
//!
//! Talks directly to any `/chat/completions` endpoint via `reqwest`.

use async_trait::async_trait;
use tracing::{debug, error};

use parley_core::types::{
    ChatCompletionRequest, ChatCompletionResponse, CompletionResponse, Message, ToolDescriptor,
};

use crate::traits::{CompletionClient, CompletionError, RequestOptions};

// ─────────────────────────────────────────────
// HttpCompletions
// ─────────────────────────────────────────────

/// A completion client that talks to any OpenAI-compatible HTTP API.
pub struct HttpCompletions {
    /// HTTP client (shared, connection-pooled).
    client: reqwest::Client,
    /// API base URL (e.g. `"https://api.openai.com/v1"`).
    api_base: String,
    /// API key for Bearer authentication.
    api_key: String,
    /// Model identifier sent with each request.
    model: String,
    /// Sampling options sent with each request.
    options: RequestOptions,
}

impl std::fmt::Debug for HttpCompletions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpCompletions")
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .finish()
    }
}

impl HttpCompletions {
    /// Create a new client.
    pub fn new(
        api_base: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        options: RequestOptions,
    ) -> Result<Self, CompletionError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()?;

        Ok(HttpCompletions {
            client,
            api_base: api_base.into(),
            api_key: api_key.into(),
            model: model.into(),
            options,
        })
    }

    /// Build the full chat completions URL.
    fn completions_url(&self) -> String {
        let base = self.api_base.trim_end_matches('/');
        format!("{}/chat/completions", base)
    }

    /// Interpret a raw API response body: take the first choice.
    fn interpret(raw: ChatCompletionResponse) -> Result<CompletionResponse, CompletionError> {
        let usage = raw.usage;
        let choice = raw.choices.into_iter().next().ok_or(CompletionError::Empty)?;

        Ok(CompletionResponse {
            content: choice.message.content,
            tool_calls: choice.message.tool_calls.unwrap_or_default(),
            finish_reason: choice.finish_reason,
            usage,
        })
    }
}

#[async_trait]
impl CompletionClient for HttpCompletions {
    async fn complete(
        &self,
        messages: &[Message],
        tools: Option<&[ToolDescriptor]>,
    ) -> Result<CompletionResponse, CompletionError> {
        // Only advertise tools when there is at least one; an empty list
        // still means "no tool_choice" on the wire.
        let tools = tools.filter(|t| !t.is_empty());

        debug!(
            model = %self.model,
            messages = messages.len(),
            tools = tools.map_or(0, |t| t.len()),
            "Calling completion API"
        );

        let request_body = ChatCompletionRequest {
            model: self.model.clone(),
            messages: messages.to_vec(),
            tools: tools.map(|t| t.to_vec()),
            tool_choice: tools.map(|_| "auto".to_string()),
            max_tokens: Some(self.options.max_tokens),
            temperature: Some(self.options.temperature),
        };

        let response = self
            .client
            .post(self.completions_url())
            .bearer_auth(&self.api_key)
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error body".to_string());
            error!(status = %status, body = %body, "Completion API error");
            return Err(CompletionError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let raw: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| CompletionError::Malformed(e.to_string()))?;

        let resp = Self::interpret(raw)?;
        debug!(
            has_content = resp.content.is_some(),
            tool_calls = resp.tool_calls.len(),
            finish_reason = resp.finish_reason.as_deref().unwrap_or("?"),
            "Completion response received"
        );
        Ok(resp)
    }

    fn model(&self) -> &str {
        &self.model
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn make_client(api_base: &str) -> HttpCompletions {
        HttpCompletions::new(api_base, "test-key-123", "gpt-4o", RequestOptions::default())
            .unwrap()
    }

    // ── Unit tests ──

    #[test]
    fn test_completions_url_trailing_slash() {
        let client = make_client("https://api.openai.com/v1/");
        assert_eq!(
            client.completions_url(),
            "https://api.openai.com/v1/chat/completions"
        );
    }

    #[test]
    fn test_completions_url_no_trailing_slash() {
        let client = make_client("https://api.openai.com/v1");
        assert_eq!(
            client.completions_url(),
            "https://api.openai.com/v1/chat/completions"
        );
    }

    #[test]
    fn test_model_getter() {
        let client = make_client("https://api.openai.com/v1");
        assert_eq!(client.model(), "gpt-4o");
    }

    // ── Integration tests with mock server ──

    #[tokio::test]
    async fn test_complete_success() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("Authorization", "Bearer test-key-123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "chatcmpl-test",
                "choices": [{
                    "message": {
                        "content": "Hello! How can I help?",
                        "tool_calls": null
                    },
                    "finish_reason": "stop"
                }],
                "usage": {
                    "prompt_tokens": 10,
                    "completion_tokens": 5,
                    "total_tokens": 15
                }
            })))
            .mount(&mock_server)
            .await;

        let client = make_client(&mock_server.uri());
        let messages = vec![
            Message::system("You are a helpful assistant."),
            Message::user("Hello"),
        ];

        let resp = client.complete(&messages, None).await.unwrap();

        assert_eq!(resp.content.as_deref(), Some("Hello! How can I help?"));
        assert!(!resp.has_tool_calls());
        assert_eq!(resp.finish_reason.as_deref(), Some("stop"));
        assert_eq!(resp.usage.unwrap().total_tokens, 15);
    }

    #[tokio::test]
    async fn test_complete_with_tool_calls() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "chatcmpl-tools",
                "choices": [{
                    "message": {
                        "content": null,
                        "tool_calls": [{
                            "id": "call_abc123",
                            "type": "function",
                            "function": {
                                "name": "search_news",
                                "arguments": "{\"keyword\": \"rust\"}"
                            }
                        }]
                    },
                    "finish_reason": "tool_calls"
                }],
                "usage": null
            })))
            .mount(&mock_server)
            .await;

        let client = make_client(&mock_server.uri());
        let descriptor = ToolDescriptor::new(
            "search_news",
            "Search recent news by keyword",
            serde_json::json!({"type": "object", "properties": {"keyword": {"type": "string"}}}),
        );

        let resp = client
            .complete(&[Message::user("rust news")], Some(&[descriptor]))
            .await
            .unwrap();

        assert!(resp.content.is_none());
        assert!(resp.has_tool_calls());
        assert_eq!(resp.tool_calls.len(), 1);
        assert_eq!(resp.tool_calls[0].id, "call_abc123");
        assert_eq!(resp.tool_calls[0].function.name, "search_news");
    }

    #[tokio::test]
    async fn test_complete_api_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(
                ResponseTemplate::new(429).set_body_json(serde_json::json!({
                    "error": {
                        "message": "Rate limit exceeded",
                        "type": "rate_limit_error"
                    }
                })),
            )
            .mount(&mock_server)
            .await;

        let client = make_client(&mock_server.uri());
        let err = client
            .complete(&[Message::user("Hello")], None)
            .await
            .unwrap_err();

        match err {
            CompletionError::Api { status, body } => {
                assert_eq!(status, 429);
                assert!(body.contains("Rate limit exceeded"));
            }
            other => panic!("Expected Api error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_complete_network_error() {
        // Point to a port that's not listening
        let client = make_client("http://127.0.0.1:1");
        let err = client
            .complete(&[Message::user("Hello")], None)
            .await
            .unwrap_err();

        assert!(matches!(err, CompletionError::Transport(_)));
    }

    #[tokio::test]
    async fn test_complete_empty_choices() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "chatcmpl-empty",
                "choices": [],
                "usage": null
            })))
            .mount(&mock_server)
            .await;

        let client = make_client(&mock_server.uri());
        let err = client
            .complete(&[Message::user("Hello")], None)
            .await
            .unwrap_err();

        assert!(matches!(err, CompletionError::Empty));
    }

    #[tokio::test]
    async fn test_complete_sends_correct_body() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(body_partial_json(serde_json::json!({
                "model": "gpt-4o",
                "max_tokens": 4096,
                "tool_choice": "auto"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "chatcmpl-body",
                "choices": [{
                    "message": { "content": "ok" },
                    "finish_reason": "stop"
                }],
                "usage": null
            })))
            .mount(&mock_server)
            .await;

        let client = make_client(&mock_server.uri());
        let descriptor = ToolDescriptor::new(
            "cleanup_outputs",
            "Tidy output directories",
            serde_json::json!({"type": "object", "properties": {}}),
        );

        // If the body matcher fails, wiremock returns 404 → Api error
        let resp = client
            .complete(&[Message::user("test")], Some(&[descriptor]))
            .await
            .unwrap();

        assert_eq!(resp.content.as_deref(), Some("ok"));
    }

    #[tokio::test]
    async fn test_empty_tool_list_omits_tool_choice() {
        let mock_server = MockServer::start().await;

        // Matcher asserts the body does NOT carry tools/tool_choice by
        // matching only when they are absent.
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "chatcmpl-notools",
                "choices": [{
                    "message": { "content": "no tools here" },
                    "finish_reason": "stop"
                }],
                "usage": null
            })))
            .mount(&mock_server)
            .await;

        let client = make_client(&mock_server.uri());
        let resp = client
            .complete(&[Message::user("hi")], Some(&[]))
            .await
            .unwrap();

        assert_eq!(resp.content.as_deref(), Some("no tools here"));
        assert!(!resp.has_tool_calls());
    }
}
