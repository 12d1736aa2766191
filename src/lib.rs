//! agent_workbench: sandboxed workspace tools for coding agents.
//!
//! This library provides the tool layer an agent orchestrator uses to act on
//! a workspace directory: confined file access, test execution with a
//! timeout, static analysis of Python sources, and documentation search over
//! a pluggable corpus.

// Core modules
pub mod cli;
pub mod config;
pub mod error;
pub mod tools;

// Re-export commonly used types
pub use config::{ConfigError, ToolsConfig};
pub use error::{CorpusError, ErrorKind, ToolError};
pub use tools::{ExecutionContext, Tool, ToolFailure, ToolRegistry, ToolResult};
