//! Session history store — append-only per-session message log with a
//! bounded replay window applied on read.
//!
//! File format: JSONL in `~/.parley/sessions/{safe_id}.jsonl`
//! - Line 1: `{"_type":"metadata","created_at":"...","updated_at":"...","metadata":{}}`
//! - Line 2+: `{"role":"user","content":"hello"}`
//!
//! Storage is unbounded; the replay window (`window` most-recent messages)
//! is enforced by `read`, never by `append`. Older entries stay on disk and
//! are never read back once they fall out of the window.

use std::collections::HashMap;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::types::{Message, Session};
use crate::utils;

// ─────────────────────────────────────────────
// Session metadata (first line of JSONL)
// ─────────────────────────────────────────────

/// Metadata header written as the first line of each JSONL session file.
#[derive(Debug, Serialize, Deserialize)]
struct SessionMetadata {
    #[serde(rename = "_type")]
    record_type: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    #[serde(default)]
    metadata: HashMap<String, String>,
}

// ─────────────────────────────────────────────
// HistoryStore
// ─────────────────────────────────────────────

/// Manages session histories with in-memory caching and JSONL persistence.
///
/// Thread-safe via `RwLock` — multiple readers, exclusive writer. Sessions
/// are created lazily on first read or append.
pub struct HistoryStore {
    /// Directory where `.jsonl` session files are stored.
    sessions_dir: PathBuf,
    /// Replay window: `read` returns at most this many most-recent messages.
    window: usize,
    /// In-memory cache of active sessions.
    cache: RwLock<HashMap<String, Session>>,
}

impl HistoryStore {
    /// Create a new history store.
    ///
    /// `sessions_dir` defaults to `~/.parley/sessions/` if `None`.
    /// The directory is created if it doesn't exist. `window` is fixed for
    /// the lifetime of the store.
    pub fn new(sessions_dir: Option<PathBuf>, window: usize) -> std::io::Result<Self> {
        let dir = sessions_dir.unwrap_or_else(utils::get_sessions_path);
        std::fs::create_dir_all(&dir)?;

        Ok(HistoryStore {
            sessions_dir: dir,
            window,
            cache: RwLock::new(HashMap::new()),
        })
    }

    /// The configured replay window size.
    pub fn window(&self) -> usize {
        self.window
    }

    /// Append a message to a session and persist it.
    pub fn append(&self, session_id: &str, message: Message) {
        let mut session = self.get_or_create(session_id);
        session.messages.push(message);
        session.updated_at = Utc::now();

        {
            let mut cache = self.cache.write().unwrap();
            cache.insert(session_id.to_string(), session.clone());
        }

        if let Err(e) = self.save_to_disk(&session) {
            warn!("Failed to persist session {}: {}", session_id, e);
        }
    }

    /// Read the replay window for a session: the most-recent `window`
    /// messages in their original order. Never mutates.
    pub fn read(&self, session_id: &str) -> Vec<Message> {
        let session = self.get_or_create(session_id);
        let len = session.messages.len();
        if len <= self.window {
            session.messages
        } else {
            session.messages[len - self.window..].to_vec()
        }
    }

    /// Read the full persisted history for a session, ignoring the window.
    pub fn read_all(&self, session_id: &str) -> Vec<Message> {
        self.get_or_create(session_id).messages
    }

    /// Clear all messages in a session (reset conversation).
    pub fn clear(&self, session_id: &str) {
        let mut session = self.get_or_create(session_id);
        session.messages.clear();
        session.updated_at = Utc::now();

        {
            let mut cache = self.cache.write().unwrap();
            cache.insert(session_id.to_string(), session.clone());
        }

        if let Err(e) = self.save_to_disk(&session) {
            warn!("Failed to persist cleared session {}: {}", session_id, e);
        }
    }

    /// Get an existing session or create a new one (lazy creation).
    fn get_or_create(&self, session_id: &str) -> Session {
        {
            let cache = self.cache.read().unwrap();
            if let Some(session) = cache.get(session_id) {
                return session.clone();
            }
        }

        if let Some(session) = self.load_from_disk(session_id) {
            let mut cache = self.cache.write().unwrap();
            cache.insert(session_id.to_string(), session.clone());
            return session;
        }

        let session = Session::new(session_id);
        let mut cache = self.cache.write().unwrap();
        cache.insert(session_id.to_string(), session.clone());
        session
    }

    /// Get the JSONL file path for a session id.
    fn session_path(&self, session_id: &str) -> PathBuf {
        let safe_id = utils::safe_filename(&session_id.replace(':', "_"));
        self.sessions_dir.join(format!("{}.jsonl", safe_id))
    }

    /// Load a session from a JSONL file.
    fn load_from_disk(&self, session_id: &str) -> Option<Session> {
        let path = self.session_path(session_id);
        if !path.exists() {
            return None;
        }

        let file = match std::fs::File::open(&path) {
            Ok(f) => f,
            Err(e) => {
                warn!("Failed to open session file {}: {}", path.display(), e);
                return None;
            }
        };

        let reader = std::io::BufReader::new(file);
        let mut session = Session::new(session_id);
        let mut messages = Vec::new();

        for line in reader.lines() {
            let line = match line {
                Ok(l) => l,
                Err(_) => continue,
            };

            if line.trim().is_empty() {
                continue;
            }

            // Try as metadata first
            if let Ok(meta) = serde_json::from_str::<SessionMetadata>(&line) {
                if meta.record_type == "metadata" {
                    session.created_at = meta.created_at;
                    session.updated_at = meta.updated_at;
                    session.metadata = meta.metadata;
                    continue;
                }
            }

            // Try as message
            if let Ok(msg) = serde_json::from_str::<Message>(&line) {
                messages.push(msg);
            }
        }

        session.messages = messages;
        debug!(
            "Loaded session '{}' with {} messages from disk",
            session_id,
            session.messages.len()
        );
        Some(session)
    }

    /// Save a session to a JSONL file (overwrite).
    fn save_to_disk(&self, session: &Session) -> std::io::Result<()> {
        let path = self.session_path(&session.id);

        let mut file = std::fs::File::create(&path)?;

        // Write metadata line
        let meta = SessionMetadata {
            record_type: "metadata".to_string(),
            created_at: session.created_at,
            updated_at: session.updated_at,
            metadata: session.metadata.clone(),
        };
        writeln!(file, "{}", serde_json::to_string(&meta)?)?;

        // Write each message
        for msg in &session.messages {
            writeln!(file, "{}", serde_json::to_string(msg)?)?;
        }

        debug!(
            "Saved session '{}' ({} messages) to {}",
            session.id,
            session.messages.len(),
            path.display()
        );
        Ok(())
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
