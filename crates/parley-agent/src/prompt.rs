//! System prompt template — rendered fresh at the start of every turn so
//! time-sensitive placeholders never go stale.

use chrono::{DateTime, Duration, Local};

/// Used when the config leaves `agent.systemPrompt` empty.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are Parley, a helpful assistant. \
Today is {date} ({weekday}) and the current time is {time}. Tomorrow is {tomorrow}. \
Use the available tools when they help, and answer plainly when they don't.";

/// A system prompt with `{date}`, `{time}`, `{weekday}`, and `{tomorrow}`
/// placeholders.
#[derive(Clone, Debug)]
pub struct PromptTemplate {
    template: String,
}

impl PromptTemplate {
    /// Build from a configured template; empty means the built-in default.
    pub fn new(template: &str) -> Self {
        let template = if template.trim().is_empty() {
            DEFAULT_SYSTEM_PROMPT.to_string()
        } else {
            template.to_string()
        };
        Self { template }
    }

    /// Render the template for a given moment.
    pub fn render(&self, now: DateTime<Local>) -> String {
        let tomorrow = now + Duration::days(1);
        self.template
            .replace("{date}", &now.format("%Y-%m-%d").to_string())
            .replace("{time}", &now.format("%H:%M").to_string())
            .replace("{weekday}", &now.format("%A").to_string())
            .replace("{tomorrow}", &tomorrow.format("%Y-%m-%d").to_string())
    }
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self::new("")
    }
}
