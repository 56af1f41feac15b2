//! Parley core — message types, the session history store, configuration,
//! and shared utilities.
//!
//! This crate has no opinion about where completions come from or how tools
//! are executed; those live in `parley-providers` and `parley-tools`.

pub mod config;
pub mod error;
pub mod history;
pub mod types;
pub mod utils;

pub use error::ConfigError;
pub use history::HistoryStore;
pub use types::{CompletionResponse, Message, ToolCall, ToolDescriptor};
