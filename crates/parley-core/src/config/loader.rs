//! Config loader — reads `~/.parley/config.json` and merges env vars.
//!
//! # Loading precedence
//! 1. Defaults (from `Config::default()`)
//! 2. JSON file at `~/.parley/config.json`
//! 3. Environment variables `PARLEY_<SECTION>__<FIELD>` (override JSON)

use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::schema::Config;

/// Default config file path.
pub fn get_config_path() -> PathBuf {
    crate::utils::get_data_path().join("config.json")
}

/// Load configuration from the default path + env vars.
///
/// Falls back to `Config::default()` if the file doesn't exist or can't be parsed.
pub fn load_config(path: Option<&Path>) -> Config {
    let config_path = path
        .map(PathBuf::from)
        .unwrap_or_else(get_config_path);

    load_config_from_path(&config_path)
}

/// Load config from a specific file path.
fn load_config_from_path(path: &Path) -> Config {
    if !path.exists() {
        info!("No config file found at {}, using defaults", path.display());
        return apply_env_overrides(Config::default());
    }

    debug!("Loading config from {}", path.display());

    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            warn!("Failed to read config file {}: {}", path.display(), e);
            return apply_env_overrides(Config::default());
        }
    };

    let config: Config = match serde_json::from_str(&content) {
        Ok(c) => c,
        Err(e) => {
            warn!("Failed to parse config JSON: {}", e);
            return apply_env_overrides(Config::default());
        }
    };

    apply_env_overrides(config)
}

/// Save configuration to disk (pretty-printed JSON with camelCase keys).
pub fn save_config(config: &Config, path: Option<&Path>) -> std::io::Result<()> {
    let config_path = path
        .map(PathBuf::from)
        .unwrap_or_else(get_config_path);

    // Ensure parent directory exists
    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string_pretty(config)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;

    std::fs::write(&config_path, json)?;
    debug!("Config saved to {}", config_path.display());
    Ok(())
}

/// Apply environment variable overrides on top of a loaded config.
///
/// Env var format: `PARLEY_<SECTION>__<FIELD>` (double underscore as delimiter).
///
/// Supported overrides:
/// - `PARLEY_AGENT__MODEL` → `agent.model`
/// - `PARLEY_AGENT__MAX_TOKENS` → `agent.max_tokens`
/// - `PARLEY_AGENT__TEMPERATURE` → `agent.temperature`
/// - `PARLEY_AGENT__HISTORY_WINDOW` → `agent.history_window`
/// - `PARLEY_COMPLETION__API_KEY` → `completion.api_key`
/// - `PARLEY_COMPLETION__API_BASE` → `completion.api_base`
/// - `PARLEY_TOOLS__SERPER_API_KEY` → `tools.serper_api_key`
/// - `PARLEY_TOOLS__DATABASE_PATH` → `tools.database_path`
/// - `PARLEY_TOOLS__SMTP__SERVER` / `__PORT` / `__USERNAME` / `__PASSWORD`
/// - `PARLEY_GATEWAY__HOST` → `gateway.host`
/// - `PARLEY_GATEWAY__PORT` → `gateway.port`
fn apply_env_overrides(mut config: Config) -> Config {
    // Agent
    if let Ok(val) = std::env::var("PARLEY_AGENT__MODEL") {
        config.agent.model = val;
    }
    if let Ok(val) = std::env::var("PARLEY_AGENT__MAX_TOKENS") {
        if let Ok(n) = val.parse::<u32>() {
            config.agent.max_tokens = n;
        }
    }
    if let Ok(val) = std::env::var("PARLEY_AGENT__TEMPERATURE") {
        if let Ok(t) = val.parse::<f64>() {
            config.agent.temperature = t;
        }
    }
    if let Ok(val) = std::env::var("PARLEY_AGENT__HISTORY_WINDOW") {
        if let Ok(n) = val.parse::<usize>() {
            config.agent.history_window = n;
        }
    }

    // Completion API
    if let Ok(val) = std::env::var("PARLEY_COMPLETION__API_KEY") {
        config.completion.api_key = val;
    }
    if let Ok(val) = std::env::var("PARLEY_COMPLETION__API_BASE") {
        config.completion.api_base = val;
    }

    // Tools
    if let Ok(val) = std::env::var("PARLEY_TOOLS__SERPER_API_KEY") {
        config.tools.serper_api_key = val;
    }
    if let Ok(val) = std::env::var("PARLEY_TOOLS__DATABASE_PATH") {
        config.tools.database_path = val;
    }
    if let Ok(val) = std::env::var("PARLEY_TOOLS__SMTP__SERVER") {
        config.tools.smtp.server = val;
    }
    if let Ok(val) = std::env::var("PARLEY_TOOLS__SMTP__PORT") {
        if let Ok(p) = val.parse::<u16>() {
            config.tools.smtp.port = p;
        }
    }
    if let Ok(val) = std::env::var("PARLEY_TOOLS__SMTP__USERNAME") {
        config.tools.smtp.username = val;
    }
    if let Ok(val) = std::env::var("PARLEY_TOOLS__SMTP__PASSWORD") {
        config.tools.smtp.password = val;
    }

    // Gateway
    if let Ok(val) = std::env::var("PARLEY_GATEWAY__HOST") {
        config.gateway.host = val;
    }
    if let Ok(val) = std::env::var("PARLEY_GATEWAY__PORT") {
        if let Ok(p) = val.parse::<u16>() {
            config.gateway.port = p;
        }
    }

    config
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_temp_json(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_missing_file() {
        let config = load_config_from_path(Path::new("/nonexistent/path/config.json"));
        // Should return defaults
        assert_eq!(config.agent.max_tokens, 4096);
        assert_eq!(config.gateway.port, 8081);
    }

    #[test]
    fn test_load_valid_json() {
        let file = write_temp_json(r#"{
            "agent": {
                "model": "gpt-4o",
                "maxTokens": 2048
            }
        }"#);

        let config = load_config_from_path(file.path());
        assert_eq!(config.agent.model, "gpt-4o");
        assert_eq!(config.agent.max_tokens, 2048);
        // Default preserved
        assert_eq!(config.agent.temperature, 0.7);
    }

    #[test]
    fn test_load_invalid_json_returns_defaults() {
        let file = write_temp_json("not valid json {{{");
        let config = load_config_from_path(file.path());
        assert_eq!(config.agent.max_tokens, 4096);
    }

    #[test]
    fn test_load_empty_json() {
        let file = write_temp_json("{}");
        let config = load_config_from_path(file.path());
        assert_eq!(config.agent.model, "gpt-4o-mini");
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = Config::default();
        config.agent.model = "deepseek-chat".to_string();
        config.completion.api_key = "sk-test".to_string();

        save_config(&config, Some(&path)).unwrap();

        let reloaded = load_config_from_path(&path);
        assert_eq!(reloaded.agent.model, "deepseek-chat");
        assert_eq!(reloaded.completion.api_key, "sk-test");
    }

    #[test]
    fn test_env_override_model() {
        std::env::set_var("PARLEY_AGENT__MODEL", "test-model");
        let config = apply_env_overrides(Config::default());
        assert_eq!(config.agent.model, "test-model");
        std::env::remove_var("PARLEY_AGENT__MODEL");
    }

    #[test]
    fn test_env_override_api_key() {
        std::env::set_var("PARLEY_COMPLETION__API_KEY", "sk-env-key");
        let config = apply_env_overrides(Config::default());
        assert_eq!(config.completion.api_key, "sk-env-key");
        std::env::remove_var("PARLEY_COMPLETION__API_KEY");
    }

    #[test]
    fn test_env_override_gateway_port() {
        std::env::set_var("PARLEY_GATEWAY__PORT", "9999");
        let config = apply_env_overrides(Config::default());
        assert_eq!(config.gateway.port, 9999);
        std::env::remove_var("PARLEY_GATEWAY__PORT");
    }

    #[test]
    fn test_env_override_history_window() {
        std::env::set_var("PARLEY_AGENT__HISTORY_WINDOW", "5");
        let config = apply_env_overrides(Config::default());
        assert_eq!(config.agent.history_window, 5);
        std::env::remove_var("PARLEY_AGENT__HISTORY_WINDOW");
    }

    #[test]
    fn test_env_override_bad_number_ignored() {
        std::env::set_var("PARLEY_TOOLS__SMTP__PORT", "not-a-port");
        let config = apply_env_overrides(Config::default());
        assert_eq!(config.tools.smtp.port, 465);
        std::env::remove_var("PARLEY_TOOLS__SMTP__PORT");
    }

    #[test]
    fn test_saved_json_uses_camel_case() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        save_config(&Config::default(), Some(&path)).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let raw: serde_json::Value = serde_json::from_str(&content).unwrap();

        assert!(raw["agent"].get("maxTokens").is_some());
        assert!(raw["agent"].get("max_tokens").is_none());
    }

    #[test]
    fn test_full_config_file() {
        let file = write_temp_json(r#"{
            "completion": {
                "apiKey": "sk-abc",
                "apiBase": "https://proxy.example.com/v1"
            },
            "tools": {
                "serperApiKey": "serper-123",
                "smtp": {
                    "server": "smtp.example.com",
                    "username": "bot@example.com",
                    "password": "secret"
                }
            }
        }"#);

        let config = load_config_from_path(file.path());
        assert_eq!(config.completion.api_key, "sk-abc");
        assert_eq!(config.tools.serper_api_key, "serper-123");
        assert!(config.tools.smtp.is_configured());
        assert_eq!(config.tools.smtp.port, 465);
    }
}
