//! Configuration schema.
//!
//! Hierarchy: `Config` → `AgentConfig`, `CompletionConfig`, `ToolsConfig`,
//! `GatewayConfig`.
//!
//! JSON on disk uses **camelCase** keys; Rust uses snake_case.
//! We use `#[serde(rename_all = "camelCase")]` to handle the conversion.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

// ─────────────────────────────────────────────
// Root Config
// ─────────────────────────────────────────────

/// Root configuration — loaded from `~/.parley/config.json` + env vars.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub agent: AgentConfig,
    pub completion: CompletionConfig,
    pub tools: ToolsConfig,
    pub gateway: GatewayConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            agent: AgentConfig::default(),
            completion: CompletionConfig::default(),
            tools: ToolsConfig::default(),
            gateway: GatewayConfig::default(),
        }
    }
}

impl Config {
    /// Check that required credentials are present.
    ///
    /// Called once at startup; a failure here is fatal and never retried.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.completion.api_key.is_empty() {
            return Err(ConfigError::MissingSetting("completion.apiKey"));
        }
        if self.agent.history_window == 0 {
            return Err(ConfigError::InvalidValue {
                setting: "agent.historyWindow",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────
// Agent
// ─────────────────────────────────────────────

/// Agent/orchestration settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AgentConfig {
    /// Model identifier sent to the completion API.
    pub model: String,
    /// Maximum tokens to generate per response.
    pub max_tokens: u32,
    /// Sampling temperature (0.0 – 2.0).
    pub temperature: f64,
    /// Replay window: how many recent messages are fed back to the model.
    pub history_window: usize,
    /// System prompt template. Supports `{date}`, `{time}`, `{weekday}`,
    /// `{tomorrow}` placeholders, substituted once per turn. Empty means
    /// use the built-in default.
    pub system_prompt: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            max_tokens: 4096,
            temperature: 0.7,
            history_window: 20,
            system_prompt: String::new(),
        }
    }
}

// ─────────────────────────────────────────────
// Completion
// ─────────────────────────────────────────────

/// Completion API credentials (OpenAI-compatible endpoint).
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompletionConfig {
    /// API key for Bearer authentication.
    #[serde(default)]
    pub api_key: String,
    /// API base URL (e.g. `"https://api.openai.com/v1"`).
    pub api_base: String,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_base: "https://api.openai.com/v1".to_string(),
        }
    }
}

// ─────────────────────────────────────────────
// Tools
// ─────────────────────────────────────────────

/// Built-in tool settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ToolsConfig {
    /// Serper API key for the news search tool.
    #[serde(default)]
    pub serper_api_key: String,
    /// SMTP settings for the email tool.
    #[serde(default)]
    pub smtp: SmtpConfig,
    /// Path to the appointment SQLite database.
    pub database_path: String,
    /// Directory of Markdown knowledge files for the lookup tool.
    pub knowledge_dir: String,
    /// Root directory where tools write their artifacts
    /// (`news/`, `reports/`, `knowledge/` subdirectories).
    pub outputs_dir: String,
    /// Command line for an external tool-host process (first element is the
    /// program, the rest are arguments). Empty means run tools in-process.
    #[serde(default)]
    pub host_command: Vec<String>,
    /// Per-call timeout in seconds when talking to an external tool host.
    pub host_timeout: u64,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            serper_api_key: String::new(),
            smtp: SmtpConfig::default(),
            database_path: "~/.parley/appointments.db".to_string(),
            knowledge_dir: "~/.parley/knowledge".to_string(),
            outputs_dir: "~/.parley/outputs".to_string(),
            host_command: Vec::new(),
            host_timeout: 60,
        }
    }
}

/// SMTP settings for outbound email (implicit TLS).
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SmtpConfig {
    /// SMTP server hostname.
    #[serde(default)]
    pub server: String,
    /// SMTP server port (default 465 for SMTPS).
    pub port: u16,
    /// Login username; also the sender address unless `from` is set.
    #[serde(default)]
    pub username: String,
    /// Login password.
    #[serde(default)]
    pub password: String,
    /// Sender address override.
    #[serde(default)]
    pub from: String,
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            server: String::new(),
            port: 465,
            username: String::new(),
            password: String::new(),
            from: String::new(),
        }
    }
}

impl SmtpConfig {
    /// Whether enough settings are present to attempt sending.
    pub fn is_configured(&self) -> bool {
        !self.server.is_empty() && !self.username.is_empty() && !self.password.is_empty()
    }

    /// The effective sender address.
    pub fn sender(&self) -> &str {
        if self.from.is_empty() {
            &self.username
        } else {
            &self.from
        }
    }
}

// ─────────────────────────────────────────────
// Gateway
// ─────────────────────────────────────────────

/// HTTP gateway configuration (the `/chat` endpoint).
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GatewayConfig {
    /// Listen address.
    pub host: String,
    /// Listen port.
    pub port: u16,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8081,
        }
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.agent.max_tokens, 4096);
        assert_eq!(config.agent.temperature, 0.7);
        assert_eq!(config.agent.history_window, 20);
        assert_eq!(config.gateway.port, 8081);
        assert_eq!(config.tools.smtp.port, 465);
    }

    #[test]
    fn test_config_from_json_camel_case() {
        let json = serde_json::json!({
            "agent": {
                "model": "gpt-4o",
                "maxTokens": 2048,
                "historyWindow": 10
            },
            "completion": {
                "apiKey": "sk-test",
                "apiBase": "https://proxy.example.com/v1"
            },
            "gateway": {
                "host": "0.0.0.0",
                "port": 9090
            }
        });

        let config: Config = serde_json::from_value(json).unwrap();
        assert_eq!(config.agent.model, "gpt-4o");
        assert_eq!(config.agent.max_tokens, 2048);
        assert_eq!(config.agent.history_window, 10);
        assert_eq!(config.completion.api_key, "sk-test");
        assert_eq!(config.gateway.port, 9090);
        // Defaults preserved for missing fields
        assert_eq!(config.agent.temperature, 0.7);
        assert_eq!(config.tools.host_timeout, 60);
    }

    #[test]
    fn test_config_json_uses_camel_case() {
        let config = Config::default();
        let json = serde_json::to_value(&config).unwrap();
        assert!(json["agent"].get("maxTokens").is_some());
        assert!(json["agent"].get("historyWindow").is_some());
        assert!(json["completion"].get("apiKey").is_some());
        assert!(json["tools"].get("serperApiKey").is_some());
        // Should NOT have snake_case keys
        assert!(json["agent"].get("max_tokens").is_none());
    }

    #[test]
    fn test_validate_missing_api_key() {
        let config = Config::default();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("completion.apiKey"));
    }

    #[test]
    fn test_validate_zero_window() {
        let mut config = Config::default();
        config.completion.api_key = "sk-test".to_string();
        config.agent.history_window = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("historyWindow"));
    }

    #[test]
    fn test_validate_ok() {
        let mut config = Config::default();
        config.completion.api_key = "sk-test".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_smtp_sender_fallback() {
        let mut smtp = SmtpConfig {
            username: "bot@example.com".to_string(),
            ..Default::default()
        };
        assert_eq!(smtp.sender(), "bot@example.com");

        smtp.from = "noreply@example.com".to_string();
        assert_eq!(smtp.sender(), "noreply@example.com");
    }

    #[test]
    fn test_smtp_is_configured() {
        let empty = SmtpConfig::default();
        assert!(!empty.is_configured());

        let full = SmtpConfig {
            server: "smtp.example.com".to_string(),
            username: "bot@example.com".to_string(),
            password: "secret".to_string(),
            ..Default::default()
        };
        assert!(full.is_configured());
    }

    #[test]
    fn test_empty_json_gives_defaults() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config.agent.model, "gpt-4o-mini");
        assert_eq!(config.completion.api_base, "https://api.openai.com/v1");
    }

    #[test]
    fn test_host_command_from_json() {
        let json = serde_json::json!({
            "tools": {
                "hostCommand": ["parley", "tool-host"],
                "hostTimeout": 30
            }
        });

        let config: Config = serde_json::from_value(json).unwrap();
        assert_eq!(config.tools.host_command, vec!["parley", "tool-host"]);
        assert_eq!(config.tools.host_timeout, 30);
    }
}
