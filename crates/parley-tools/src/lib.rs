//! Tooling: the `Tool` trait, registry, argument validation, and the
//! executor boundary (in-process or external tool-host process).

pub mod args;
pub mod base;
pub mod builtin;
pub mod executor;
pub mod process;
pub mod registry;
pub mod tools;

pub use args::{decode_arguments, ArgumentError};
pub use base::Tool;
pub use builtin::build_registry;
pub use executor::{LocalExecutor, ToolExecutor, DEFAULT_TOOL_OUTPUT};
pub use process::{serve_stdio, ProcessExecutor};
pub use registry::ToolRegistry;
