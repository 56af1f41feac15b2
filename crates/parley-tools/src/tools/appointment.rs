//! Appointment tool — translates a natural-language request into SQL via
//! the completion model and runs it against the appointment database.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use rusqlite::Connection;
use serde_json::{json, Value};
use tracing::{debug, warn};

use parley_core::types::Message;
use parley_providers::CompletionClient;

use crate::base::{require_string, Tool};

const SQL_PROMPT: &str = "You are a SQL generator for a SQLite database with this table:\n\n\
CREATE TABLE appointment (\n\
    id INTEGER PRIMARY KEY AUTOINCREMENT,\n\
    username TEXT NOT NULL,\n\
    id_card TEXT NOT NULL,\n\
    department TEXT NOT NULL,\n\
    date TEXT NOT NULL,\n\
    time TEXT NOT NULL\n\
);\n\n\
Translate the user's request into exactly one SQL statement \
(SELECT, INSERT, UPDATE, or DELETE). Reply with the SQL only, no explanation.";

/// The statement kinds the tool will run.
#[derive(Clone, Copy, Debug, PartialEq)]
enum SqlKind {
    Select,
    Insert,
    Update,
    Delete,
}

/// Manages appointments through model-generated SQL.
pub struct AppointmentTool {
    completions: Arc<dyn CompletionClient>,
    db_path: PathBuf,
}

impl AppointmentTool {
    pub fn new(completions: Arc<dyn CompletionClient>, db_path: impl Into<PathBuf>) -> Self {
        Self {
            completions,
            db_path: db_path.into(),
        }
    }

    fn open(&self) -> anyhow::Result<Connection> {
        if let Some(parent) = self.db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(&self.db_path)?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS appointment (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT NOT NULL,
                id_card TEXT NOT NULL,
                department TEXT NOT NULL,
                date TEXT NOT NULL,
                time TEXT NOT NULL
            )",
            [],
        )?;
        Ok(conn)
    }

    /// Strip Markdown code fences and a trailing semicolon from model output.
    fn sanitize_sql(raw: &str) -> String {
        let mut sql = raw.trim();
        if let Some(rest) = sql.strip_prefix("```sql") {
            sql = rest;
        } else if let Some(rest) = sql.strip_prefix("```") {
            sql = rest;
        }
        if let Some(rest) = sql.strip_suffix("```") {
            sql = rest;
        }
        sql.trim().trim_end_matches(';').trim().to_string()
    }

    /// Classify by first keyword; anything else is rejected.
    fn sql_kind(sql: &str) -> Option<SqlKind> {
        let first = sql.split_whitespace().next()?.to_ascii_lowercase();
        match first.as_str() {
            "select" => Some(SqlKind::Select),
            "insert" => Some(SqlKind::Insert),
            "update" => Some(SqlKind::Update),
            "delete" => Some(SqlKind::Delete),
            _ => None,
        }
    }

    fn run_select(conn: &Connection, sql: &str) -> anyhow::Result<String> {
        let mut stmt = conn.prepare(sql)?;
        let headers: Vec<String> = stmt
            .column_names()
            .into_iter()
            .map(String::from)
            .collect();
        let column_count = headers.len();

        let mut rows = Vec::new();
        let mut query = stmt.query([])?;
        while let Some(row) = query.next()? {
            let mut cells = Vec::with_capacity(column_count);
            for i in 0..column_count {
                let cell: rusqlite::types::Value = row.get(i)?;
                cells.push(match cell {
                    rusqlite::types::Value::Null => String::new(),
                    rusqlite::types::Value::Integer(n) => n.to_string(),
                    rusqlite::types::Value::Real(f) => f.to_string(),
                    rusqlite::types::Value::Text(s) => s,
                    rusqlite::types::Value::Blob(_) => "<blob>".to_string(),
                });
            }
            rows.push(cells);
        }

        if rows.is_empty() {
            return Ok("No matching appointments.".to_string());
        }

        Ok(render_table(&headers, &rows))
    }
}

/// Render rows as an aligned text grid.
fn render_table(headers: &[String], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if i < widths.len() {
                widths[i] = widths[i].max(cell.chars().count());
            }
        }
    }

    let render_row = |cells: &[String]| {
        cells
            .iter()
            .enumerate()
            .map(|(i, c)| format!("{:<width$}", c, width = widths.get(i).copied().unwrap_or(0)))
            .collect::<Vec<_>>()
            .join(" | ")
    };

    let separator = widths
        .iter()
        .map(|w| "-".repeat(*w))
        .collect::<Vec<_>>()
        .join("-+-");

    let mut lines = vec![render_row(headers), separator];
    lines.extend(rows.iter().map(|r| render_row(r)));
    lines.join("\n")
}

#[async_trait]
impl Tool for AppointmentTool {
    fn name(&self) -> &str {
        "manage_appointments"
    }

    fn description(&self) -> &str {
        "Create, query, update, or cancel appointments from a natural-language request."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "request": {
                    "type": "string",
                    "description": "What to do, in plain language (e.g. 'book cardiology for Li Ming tomorrow at 9am')"
                }
            },
            "required": ["request"]
        })
    }

    async fn execute(&self, params: HashMap<String, Value>) -> anyhow::Result<String> {
        let request = require_string(&params, "request")?;

        let messages = vec![Message::system(SQL_PROMPT), Message::user(request)];
        let response = self
            .completions
            .complete(&messages, None)
            .await
            .map_err(|e| anyhow::anyhow!("SQL generation failed: {e}"))?;

        let raw = response
            .content
            .ok_or_else(|| anyhow::anyhow!("SQL generation returned no content"))?;
        let sql = Self::sanitize_sql(&raw);

        let kind = Self::sql_kind(&sql).ok_or_else(|| {
            warn!(sql = %sql, "generated statement rejected");
            anyhow::anyhow!("Generated statement is not a SELECT/INSERT/UPDATE/DELETE")
        })?;

        debug!(sql = %sql, kind = ?kind, "running appointment SQL");

        let conn = self.open()?;
        match kind {
            SqlKind::Select => Self::run_select(&conn, &sql),
            SqlKind::Insert | SqlKind::Update | SqlKind::Delete => {
                let affected = conn.execute(&sql, [])?;
                Ok(format!("Done, {affected} row(s) affected."))
            }
        }
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
