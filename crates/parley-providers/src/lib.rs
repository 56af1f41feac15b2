//! Completion backends: the `CompletionClient` trait and the HTTP
//! implementation for OpenAI-compatible APIs.

pub mod http_client;
pub mod traits;

pub use http_client::HttpCompletions;
pub use traits::{CompletionClient, CompletionError, RequestOptions};
