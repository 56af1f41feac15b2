//! Startup configuration errors. These are fatal: the process reports them
//! and exits, never retries.

use thiserror::Error;

/// A configuration problem detected at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required setting: {0}")]
    MissingSetting(&'static str),

    #[error("invalid value for {setting}: {reason}")]
    InvalidValue {
        setting: &'static str,
        reason: String,
    },
}
