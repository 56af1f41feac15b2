//! News search tool — queries the Serper news API and saves the raw
//! results as a JSON artifact.

use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::{debug, warn};

use parley_core::utils::{file_stamp, safe_filename};

use crate::base::{require_string, Tool};
use crate::tools::OutputPaths;

const SERPER_NEWS_URL: &str = "https://google.serper.dev/news";

/// Max headlines included in the summary returned to the model.
const MAX_HEADLINES: usize = 5;

/// Searches recent news via the Serper API.
pub struct NewsTool {
    api_key: String,
    endpoint: String,
    outputs: OutputPaths,
    client: Client,
}

impl NewsTool {
    pub fn new(api_key: impl Into<String>, outputs: OutputPaths) -> Self {
        Self {
            api_key: api_key.into(),
            endpoint: SERPER_NEWS_URL.to_string(),
            outputs,
            client: Client::new(),
        }
    }

    /// Override the API endpoint (tests point this at a mock server).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Save the raw response body next to the other news artifacts.
    fn save_results(&self, keyword: &str, body: &Value) -> Option<std::path::PathBuf> {
        let dir = self.outputs.news();
        if let Err(e) = OutputPaths::ensure(&dir) {
            warn!(error = %e, "could not create news output dir");
            return None;
        }

        let filename = format!("news_{}_{}.json", safe_filename(keyword), file_stamp());
        let path = dir.join(filename);
        match serde_json::to_string_pretty(body) {
            Ok(content) => {
                if let Err(e) = std::fs::write(&path, content) {
                    warn!(error = %e, "could not save news results");
                    return None;
                }
                Some(path)
            }
            Err(e) => {
                warn!(error = %e, "could not serialize news results");
                None
            }
        }
    }
}

#[async_trait]
impl Tool for NewsTool {
    fn name(&self) -> &str {
        "search_news"
    }

    fn description(&self) -> &str {
        "Search recent news articles by keyword. Returns the top headlines with snippets and links."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "keyword": {
                    "type": "string",
                    "description": "The news search keyword"
                }
            },
            "required": ["keyword"]
        })
    }

    async fn execute(&self, params: HashMap<String, Value>) -> anyhow::Result<String> {
        let keyword = require_string(&params, "keyword")?;

        if self.api_key.is_empty() {
            anyhow::bail!("No Serper API key configured (set tools.serperApiKey)");
        }

        debug!(keyword = %keyword, "searching news");

        let resp = self
            .client
            .post(&self.endpoint)
            .header("X-API-KEY", &self.api_key)
            .json(&json!({ "q": keyword }))
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("News API request failed: {e}"))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("News API returned {status}: {body}");
        }

        let body: Value = resp
            .json()
            .await
            .map_err(|e| anyhow::anyhow!("Failed to parse news response: {e}"))?;

        let articles = body["news"].as_array().cloned().unwrap_or_default();
        if articles.is_empty() {
            return Ok(format!("No news found for '{keyword}'."));
        }

        let saved = self.save_results(&keyword, &body);

        let mut output = vec![format!("Top news for '{keyword}':")];
        for (i, article) in articles.iter().take(MAX_HEADLINES).enumerate() {
            let title = article["title"].as_str().unwrap_or("(no title)");
            let snippet = article["snippet"].as_str().unwrap_or("");
            let link = article["link"].as_str().unwrap_or("");
            output.push(format!("{}. {}\n   {}\n   {}", i + 1, title, snippet, link));
        }

        if let Some(path) = saved {
            output.push(format!("Full results saved to {}", path.display()));
        }

        Ok(output.join("\n\n"))
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
