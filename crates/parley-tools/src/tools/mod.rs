//! Built-in tools.

mod appointment;
mod cleanup;
mod email;
mod knowledge;
mod news;
mod sentiment;

pub use appointment::AppointmentTool;
pub use cleanup::CleanupTool;
pub use email::EmailTool;
pub use knowledge::{FileRetriever, KnowledgeTool, Retriever, Snippet};
pub use news::NewsTool;
pub use sentiment::SentimentTool;

use std::path::{Path, PathBuf};

/// Directories where tools write their artifacts, under one root.
#[derive(Clone, Debug)]
pub struct OutputPaths {
    root: PathBuf,
}

impl OutputPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Saved news search results (JSON).
    pub fn news(&self) -> PathBuf {
        self.root.join("news")
    }

    /// Generated analysis reports (Markdown).
    pub fn reports(&self) -> PathBuf {
        self.root.join("reports")
    }

    /// Saved knowledge lookup answers (Markdown).
    pub fn knowledge(&self) -> PathBuf {
        self.root.join("knowledge")
    }

    /// All artifact directories, in attachment-search order.
    pub fn all(&self) -> Vec<PathBuf> {
        vec![self.news(), self.reports(), self.knowledge()]
    }

    /// Create a directory if needed and return it.
    pub fn ensure(dir: &Path) -> std::io::Result<&Path> {
        std::fs::create_dir_all(dir)?;
        Ok(dir)
    }
}
