//! Orchestration: the per-turn completion ↔ tool loop and the system
//! prompt template it refreshes each turn.

pub mod orchestrator;
pub mod prompt;

pub use orchestrator::Orchestrator;
pub use prompt::PromptTemplate;
