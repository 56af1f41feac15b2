//! External tool host — runs tools in a separate process, with a
//! line-delimited JSON protocol over the child's stdin/stdout.
//!
//! One request per line, one response per line, correlated by `id`.
//! `ProcessExecutor` is the client side; `serve_stdio` is the host side
//! (run by the `tool-host` CLI command).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use parley_core::types::ToolDescriptor;

use crate::executor::ToolExecutor;
use crate::registry::ToolRegistry;

// ─────────────────────────────────────────────
// Wire frames
// ─────────────────────────────────────────────

/// A request line sent to the tool host.
#[derive(Debug, Serialize, Deserialize)]
pub struct HostRequest {
    pub id: u64,
    #[serde(flatten)]
    pub op: HostOp,
}

/// The operation a request carries.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum HostOp {
    ListTools,
    CallTool {
        name: String,
        arguments: HashMap<String, Value>,
    },
}

/// A response line from the tool host.
#[derive(Debug, Serialize, Deserialize)]
pub struct HostResponse {
    pub id: u64,
    #[serde(flatten)]
    pub outcome: HostOutcome,
}

/// The outcome a response carries.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum HostOutcome {
    Tools { tools: Vec<ToolDescriptor> },
    Output { output: String },
    Error { message: String },
}

// ─────────────────────────────────────────────
// ProcessExecutor (client side)
// ─────────────────────────────────────────────

/// Pipes held under one lock so request/response pairs never interleave.
#[derive(Debug)]
struct HostChannel {
    stdin: ChildStdin,
    lines: Lines<BufReader<ChildStdout>>,
}

/// Talks to an external tool-host process over its stdin/stdout.
///
/// The child is spawned once and reused across turns; it is killed when
/// the executor is dropped.
#[derive(Debug)]
pub struct ProcessExecutor {
    channel: Mutex<HostChannel>,
    next_id: AtomicU64,
    timeout: Duration,
    // Held so the child stays alive for the executor's lifetime.
    _child: Child,
}

impl ProcessExecutor {
    /// Spawn the host process from a command line (program + args).
    pub fn spawn(command: &[String], timeout: Duration) -> anyhow::Result<Self> {
        let (program, args) = command
            .split_first()
            .ok_or_else(|| anyhow::anyhow!("tool host command is empty"))?;

        info!(program = %program, "spawning tool host");

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| anyhow::anyhow!("tool host has no stdin"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| anyhow::anyhow!("tool host has no stdout"))?;

        Ok(Self {
            channel: Mutex::new(HostChannel {
                stdin,
                lines: BufReader::new(stdout).lines(),
            }),
            next_id: AtomicU64::new(1),
            timeout,
            _child: child,
        })
    }

    /// Send one request and wait for its response, under the per-call timeout.
    async fn request(&self, op: HostOp) -> anyhow::Result<HostOutcome> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = HostRequest { id, op };
        let mut line = serde_json::to_string(&request)?;
        line.push('\n');

        let mut channel = self.channel.lock().await;

        let exchange = async {
            channel.stdin.write_all(line.as_bytes()).await?;
            channel.stdin.flush().await?;

            loop {
                let reply = channel
                    .lines
                    .next_line()
                    .await?
                    .ok_or_else(|| anyhow::anyhow!("tool host closed its stdout"))?;

                let response: HostResponse = serde_json::from_str(&reply)
                    .map_err(|e| anyhow::anyhow!("malformed tool host response: {e}"))?;

                if response.id == id {
                    return Ok(response.outcome);
                }

                // A reply to an earlier request whose caller already timed
                // out. Ids are monotonic, so anything older is drained and
                // the channel stays usable for the next call.
                if response.id < id {
                    warn!(
                        stale = response.id,
                        current = id,
                        "discarding stale tool host response"
                    );
                    continue;
                }

                anyhow::bail!(
                    "tool host response id mismatch: sent {id}, got {}",
                    response.id
                );
            }
        };

        tokio::time::timeout(self.timeout, exchange)
            .await
            .map_err(|_| anyhow::anyhow!("tool host did not respond within {:?}", self.timeout))?
    }
}

#[async_trait]
impl ToolExecutor for ProcessExecutor {
    async fn list_tools(&self) -> anyhow::Result<Vec<ToolDescriptor>> {
        match self.request(HostOp::ListTools).await? {
            HostOutcome::Tools { tools } => Ok(tools),
            HostOutcome::Error { message } => anyhow::bail!("{message}"),
            HostOutcome::Output { .. } => anyhow::bail!("unexpected tool host response"),
        }
    }

    async fn call_tool(
        &self,
        name: &str,
        arguments: HashMap<String, Value>,
    ) -> anyhow::Result<String> {
        let op = HostOp::CallTool {
            name: name.to_string(),
            arguments,
        };
        match self.request(op).await? {
            HostOutcome::Output { output } => Ok(output),
            HostOutcome::Error { message } => anyhow::bail!("{message}"),
            HostOutcome::Tools { .. } => anyhow::bail!("unexpected tool host response"),
        }
    }
}

// ─────────────────────────────────────────────
// Host side
// ─────────────────────────────────────────────

/// Handle one request against a registry.
pub async fn handle_request(registry: &ToolRegistry, request: HostRequest) -> HostResponse {
    let outcome = match request.op {
        HostOp::ListTools => HostOutcome::Tools {
            tools: registry.descriptors(),
        },
        HostOp::CallTool { name, arguments } => {
            debug!(tool = %name, "tool host dispatching call");
            match registry.execute(&name, arguments).await {
                Ok(output) => HostOutcome::Output { output },
                Err(e) => HostOutcome::Error {
                    message: e.to_string(),
                },
            }
        }
    };

    HostResponse {
        id: request.id,
        outcome,
    }
}

/// Serve a registry over this process's stdin/stdout until EOF.
///
/// Unparseable request lines are skipped with a warning rather than
/// aborting the loop.
pub async fn serve_stdio(registry: Arc<ToolRegistry>) -> anyhow::Result<()> {
    let stdin = tokio::io::stdin();
    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(stdin).lines();

    info!(tools = registry.len(), "tool host serving on stdio");

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let request: HostRequest = match serde_json::from_str(&line) {
            Ok(r) => r,
            Err(e) => {
                warn!(error = %e, "skipping malformed tool host request");
                continue;
            }
        };

        let response = handle_request(&registry, request).await;
        let mut out = serde_json::to_string(&response)?;
        out.push('\n');
        stdout.write_all(out.as_bytes()).await?;
        stdout.flush().await?;
    }

    info!("tool host stdin closed, exiting");
    Ok(())
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::Tool;
    use serde_json::json;

    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str {
            "echo"
        }
        fn description(&self) -> &str {
            "Echoes back the input"
        }
        fn parameters(&self) -> Value {
            json!({
                "type": "object",
                "properties": {
                    "text": { "type": "string" }
                },
                "required": ["text"]
            })
        }
        async fn execute(&self, params: HashMap<String, Value>) -> anyhow::Result<String> {
            let text = params.get("text").and_then(|v| v.as_str()).unwrap_or("");
            Ok(format!("Echo: {text}"))
        }
    }

    fn echo_registry() -> ToolRegistry {
        let mut reg = ToolRegistry::new();
        reg.register(Arc::new(EchoTool));
        reg
    }

    // ── Frame serialization ──

    #[test]
    fn test_list_tools_request_wire_format() {
        let request = HostRequest {
            id: 7,
            op: HostOp::ListTools,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["id"], 7);
        assert_eq!(json["op"], "list_tools");
    }

    #[test]
    fn test_call_tool_request_wire_format() {
        let mut arguments = HashMap::new();
        arguments.insert("text".to_string(), json!("hi"));
        let request = HostRequest {
            id: 2,
            op: HostOp::CallTool {
                name: "echo".to_string(),
                arguments,
            },
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["op"], "call_tool");
        assert_eq!(json["name"], "echo");
        assert_eq!(json["arguments"]["text"], "hi");
    }

    #[test]
    fn test_response_round_trip() {
        let response = HostResponse {
            id: 3,
            outcome: HostOutcome::Output {
                output: "done".to_string(),
            },
        };
        let line = serde_json::to_string(&response).unwrap();
        let parsed: HostResponse = serde_json::from_str(&line).unwrap();
        assert_eq!(parsed.id, 3);
        match parsed.outcome {
            HostOutcome::Output { output } => assert_eq!(output, "done"),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    // ── handle_request ──

    #[tokio::test]
    async fn test_handle_list_tools() {
        let registry = echo_registry();
        let response = handle_request(
            &registry,
            HostRequest {
                id: 1,
                op: HostOp::ListTools,
            },
        )
        .await;

        assert_eq!(response.id, 1);
        match response.outcome {
            HostOutcome::Tools { tools } => {
                assert_eq!(tools.len(), 1);
                assert_eq!(tools[0].function.name, "echo");
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_handle_call_tool() {
        let registry = echo_registry();
        let mut arguments = HashMap::new();
        arguments.insert("text".to_string(), json!("ping"));

        let response = handle_request(
            &registry,
            HostRequest {
                id: 5,
                op: HostOp::CallTool {
                    name: "echo".to_string(),
                    arguments,
                },
            },
        )
        .await;

        assert_eq!(response.id, 5);
        match response.outcome {
            HostOutcome::Output { output } => assert_eq!(output, "Echo: ping"),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_handle_unknown_tool() {
        let registry = echo_registry();
        let response = handle_request(
            &registry,
            HostRequest {
                id: 9,
                op: HostOp::CallTool {
                    name: "ghost".to_string(),
                    arguments: HashMap::new(),
                },
            },
        )
        .await;

        match response.outcome {
            HostOutcome::Error { message } => assert!(message.contains("'ghost' not found")),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    // ── ProcessExecutor ──

    #[tokio::test]
    async fn test_spawn_empty_command_fails() {
        let err = ProcessExecutor::spawn(&[], Duration::from_secs(1)).unwrap_err();
        assert!(err.to_string().contains("empty"));
    }

    #[tokio::test]
    async fn test_call_after_timeout_recovers() {
        // A host that answers the first request late and the second one
        // promptly. The late reply must not wedge the channel: the next
        // call drains it and still gets its own response.
        let script = "read first\n\
                      sleep 2\n\
                      printf '{\"id\":1,\"status\":\"output\",\"output\":\"late\"}\\n'\n\
                      read second\n\
                      printf '{\"id\":2,\"status\":\"output\",\"output\":\"prompt\"}\\n'\n";
        let executor = ProcessExecutor::spawn(
            &["sh".to_string(), "-c".to_string(), script.to_string()],
            Duration::from_secs(1),
        )
        .unwrap();

        let err = executor.call_tool("echo", HashMap::new()).await.unwrap_err();
        assert!(err.to_string().contains("did not respond"));

        // Let the late reply arrive before the next call.
        tokio::time::sleep(Duration::from_millis(2500)).await;

        let output = executor.call_tool("echo", HashMap::new()).await.unwrap();
        assert_eq!(output, "prompt");
    }

    #[tokio::test]
    async fn test_malformed_host_response() {
        // `cat` echoes our request line back, which is not a valid response.
        let executor =
            ProcessExecutor::spawn(&["cat".to_string()], Duration::from_secs(5)).unwrap();
        let err = executor.list_tools().await.unwrap_err();
        assert!(err.to_string().contains("malformed tool host response"));
    }
}
