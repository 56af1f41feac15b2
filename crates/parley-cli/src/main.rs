//! Parley CLI — entry point.
//!
//! # Commands
//!
//! - `parley chat [-m MESSAGE] [-s SESSION]` — chat (single-shot or REPL)
//! - `parley serve` — HTTP gateway (`POST /chat`)
//! - `parley tool-host` — serve the built-in tools over stdio

mod helpers;
mod http;
mod repl;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use parley_agent::{Orchestrator, PromptTemplate};
use parley_core::config::{load_config, Config};
use parley_core::history::HistoryStore;
use parley_core::utils::expand_home;
use parley_providers::{HttpCompletions, RequestOptions};
use parley_tools::{build_registry, serve_stdio, LocalExecutor, ProcessExecutor, ToolExecutor};

// ─────────────────────────────────────────────
// CLI definition
// ─────────────────────────────────────────────

/// Parley — a tool-calling conversational assistant
#[derive(Parser)]
#[command(name = "parley", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Chat with the assistant (single-shot or interactive REPL)
    Chat {
        /// Single message (non-interactive). Omit for REPL mode.
        #[arg(short, long)]
        message: Option<String>,

        /// Session identifier
        #[arg(short, long, default_value = "cli:default")]
        session: String,

        /// Enable debug logging
        #[arg(long, default_value_t = false)]
        logs: bool,
    },

    /// Start the HTTP gateway
    Serve {
        /// Enable debug logging
        #[arg(long, default_value_t = false)]
        logs: bool,
    },

    /// Serve the built-in tools over stdin/stdout (for an external host setup)
    ToolHost {
        /// Enable debug logging
        #[arg(long, default_value_t = false)]
        logs: bool,
    },
}

// ─────────────────────────────────────────────
// Entrypoint
// ─────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Chat {
            message,
            session,
            logs,
        } => {
            init_logging(logs, false);
            run_chat(message, session).await
        }
        Commands::Serve { logs } => {
            init_logging(logs, false);
            run_serve().await
        }
        Commands::ToolHost { logs } => {
            // stdout carries the tool protocol, so logs go to stderr
            init_logging(logs, true);
            run_tool_host().await
        }
    }
}

// ─────────────────────────────────────────────
// Commands
// ─────────────────────────────────────────────

async fn run_chat(message: Option<String>, session_id: String) -> Result<()> {
    let config = load_config(None);
    let orchestrator = build_orchestrator(&config)?;

    match message {
        Some(msg) => {
            // Single-shot mode
            info!(session = %session_id, "processing single message");
            let response = orchestrator.handle_turn(&session_id, &msg).await;
            helpers::print_response(&response);
        }
        None => {
            // Interactive REPL mode
            repl::run(orchestrator, &session_id).await?;
        }
    }

    Ok(())
}

async fn run_serve() -> Result<()> {
    let config = load_config(None);
    let orchestrator = Arc::new(build_orchestrator(&config)?);
    http::run(&config.gateway, orchestrator).await
}

async fn run_tool_host() -> Result<()> {
    let config = load_config(None);
    config.validate().context("invalid configuration")?;

    let completions = Arc::new(build_completions(&config)?);
    let registry = Arc::new(build_registry(&config.tools, completions));
    serve_stdio(registry).await
}

// ─────────────────────────────────────────────
// Wiring
// ─────────────────────────────────────────────

/// Build an `Orchestrator` from the loaded configuration.
///
/// Configuration problems are fatal here; nothing retries a bad API key.
fn build_orchestrator(config: &Config) -> Result<Orchestrator> {
    config.validate().context("invalid configuration")?;

    let completions = Arc::new(build_completions(config)?);

    // Tools run in-process unless an external host command is configured.
    let executor: Arc<dyn ToolExecutor> = if config.tools.host_command.is_empty() {
        let registry = Arc::new(build_registry(&config.tools, completions.clone()));
        Arc::new(LocalExecutor::new(registry))
    } else {
        Arc::new(ProcessExecutor::spawn(
            &config.tools.host_command,
            Duration::from_secs(config.tools.host_timeout),
        )?)
    };

    let history = Arc::new(
        HistoryStore::new(None, config.agent.history_window)
            .context("failed to open session store")?,
    );

    info!(
        model = %config.agent.model,
        window = config.agent.history_window,
        external_host = !config.tools.host_command.is_empty(),
        "orchestrator initialized"
    );

    // Every completed turn is also saved as a plain-text transcript.
    let turn_log = expand_home(&config.tools.outputs_dir).join("conversations");

    Ok(Orchestrator::new(
        completions,
        executor,
        history,
        PromptTemplate::new(&config.agent.system_prompt),
    )
    .with_turn_log(turn_log))
}

fn build_completions(config: &Config) -> Result<HttpCompletions> {
    HttpCompletions::new(
        &config.completion.api_base,
        &config.completion.api_key,
        &config.agent.model,
        RequestOptions {
            max_tokens: config.agent.max_tokens,
            temperature: config.agent.temperature,
        },
    )
    .context("failed to build completion client")
}

/// Initialize tracing/logging.
fn init_logging(verbose: bool, to_stderr: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("parley=debug,info")
    } else {
        EnvFilter::new("warn")
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact();

    if to_stderr {
        builder.with_writer(std::io::stderr).init();
    } else {
        builder.init();
    }
}
