//! Email tool — sends mail over SMTPS, optionally attaching a previously
//! generated artifact by filename.

use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Tokio1Executor};
use serde_json::{json, Value};
use tracing::{debug, info};

use parley_core::config::SmtpConfig;
use parley_core::utils::now_stamp;

use crate::base::{optional_string, require_string, Tool};
use crate::tools::OutputPaths;

/// Sends email through the configured SMTP server.
pub struct EmailTool {
    smtp: SmtpConfig,
    outputs: OutputPaths,
}

impl EmailTool {
    pub fn new(smtp: SmtpConfig, outputs: OutputPaths) -> Self {
        Self { smtp, outputs }
    }

    /// Find an attachment by name: absolute paths first, then each artifact
    /// directory in order.
    fn resolve_attachment(&self, name: &str) -> anyhow::Result<PathBuf> {
        let direct = PathBuf::from(name);
        if direct.is_absolute() && direct.is_file() {
            return Ok(direct);
        }

        let mut searched = Vec::new();
        for dir in self.outputs.all() {
            let candidate = dir.join(name);
            if candidate.is_file() {
                return Ok(candidate);
            }
            searched.push(dir.display().to_string());
        }

        anyhow::bail!(
            "Attachment '{}' not found (searched: {})",
            name,
            searched.join(", ")
        )
    }

    /// Guess a MIME type from the file extension.
    fn content_type_for(path: &PathBuf) -> ContentType {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();
        let mime = match ext.as_str() {
            "md" | "txt" => "text/plain",
            "json" => "application/json",
            "html" => "text/html",
            "csv" => "text/csv",
            "pdf" => "application/pdf",
            _ => "application/octet-stream",
        };
        ContentType::parse(mime).unwrap_or(ContentType::TEXT_PLAIN)
    }

    /// Build the MIME message. Separated from sending so it can be tested
    /// without an SMTP server.
    fn build_message(
        &self,
        to: &str,
        subject: &str,
        body: &str,
        attachment: Option<&str>,
    ) -> anyhow::Result<lettre::Message> {
        let from: Mailbox = self
            .smtp
            .sender()
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid sender address: {e}"))?;
        let to: Mailbox = to
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid recipient address '{to}': {e}"))?;

        let builder = lettre::Message::builder()
            .from(from)
            .to(to)
            .subject(subject);

        let message = match attachment {
            Some(name) => {
                let path = self.resolve_attachment(name)?;
                let content = std::fs::read(&path)?;
                let filename = path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .unwrap_or("attachment")
                    .to_string();
                let part = Attachment::new(filename).body(content, Self::content_type_for(&path));
                builder.multipart(
                    MultiPart::mixed()
                        .singlepart(SinglePart::plain(body.to_string()))
                        .singlepart(part),
                )?
            }
            None => builder.singlepart(SinglePart::plain(body.to_string()))?,
        };

        Ok(message)
    }
}

#[async_trait]
impl Tool for EmailTool {
    fn name(&self) -> &str {
        "send_email"
    }

    fn description(&self) -> &str {
        "Send an email, optionally attaching a previously generated report or news file by filename."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "to": {
                    "type": "string",
                    "description": "Recipient email address"
                },
                "subject": {
                    "type": "string",
                    "description": "Email subject"
                },
                "body": {
                    "type": "string",
                    "description": "Email body text"
                },
                "attachment": {
                    "type": "string",
                    "description": "Filename of an artifact to attach"
                }
            },
            "required": ["to"]
        })
    }

    async fn execute(&self, params: HashMap<String, Value>) -> anyhow::Result<String> {
        let to = require_string(&params, "to")?;
        let subject =
            optional_string(&params, "subject").unwrap_or_else(|| "Message from Parley".to_string());
        let body = optional_string(&params, "body")
            .unwrap_or_else(|| format!("Sent by Parley at {}.", now_stamp()));
        let attachment = optional_string(&params, "attachment");

        if !self.smtp.is_configured() {
            anyhow::bail!("SMTP is not configured (set tools.smtp.server/username/password)");
        }

        let message = self.build_message(&to, &subject, &body, attachment.as_deref())?;

        debug!(to = %to, attachment = attachment.as_deref().unwrap_or("-"), "sending email");

        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&self.smtp.server)
            .map_err(|e| anyhow::anyhow!("SMTP relay setup failed: {e}"))?
            .port(self.smtp.port)
            .credentials(Credentials::new(
                self.smtp.username.clone(),
                self.smtp.password.clone(),
            ))
            .build();

        transport
            .send(message)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to send email: {e}"))?;

        info!(to = %to, "email sent");
        match attachment {
            Some(name) => Ok(format!("Email sent to {to} with attachment '{name}'.")),
            None => Ok(format!("Email sent to {to}.")),
        }
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
