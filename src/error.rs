//! Error types for workbench operations.
//!
//! Defines the error types for the tool layer:
//! - Tool execution failures, each mapped to a stable [`ErrorKind`]
//! - Documentation corpus loading

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Stable, serializable classification of a tool failure.
///
/// This is what an orchestrator branches on; the message is for humans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    AccessDenied,
    NotFound,
    WrongType,
    Timeout,
    SpawnFailed,
    NoTestsFound,
    InvalidParameters,
    UnknownTool,
    Internal,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ErrorKind::AccessDenied => "access_denied",
            ErrorKind::NotFound => "not_found",
            ErrorKind::WrongType => "wrong_type",
            ErrorKind::Timeout => "timeout",
            ErrorKind::SpawnFailed => "spawn_failed",
            ErrorKind::NoTestsFound => "no_tests_found",
            ErrorKind::InvalidParameters => "invalid_parameters",
            ErrorKind::UnknownTool => "unknown_tool",
            ErrorKind::Internal => "internal",
        };
        write!(f, "{}", s)
    }
}

/// Errors that can occur while executing a tool against a workspace.
#[derive(Debug, Error)]
pub enum ToolError {
    /// The requested path resolves outside the workspace root.
    #[error("Access denied: Path outside workspace")]
    AccessDenied,

    /// A file or directory does not exist.
    #[error("{0}")]
    NotFound(String),

    /// A file was expected but a directory was found, or the reverse.
    #[error("{0}")]
    WrongType(String),

    /// The test subprocess exceeded its wall-clock budget.
    #[error("Tests timed out after {seconds} seconds")]
    Timeout { seconds: u64 },

    /// The subprocess could not be started at all.
    #[error("Failed to spawn test command: {0}")]
    SpawnFailed(String),

    /// Test auto-detection found nothing to run.
    #[error("No test files found")]
    NoTestsFound,

    /// Invalid parameters provided to the tool.
    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    /// No tool is registered under the requested name.
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// Anything else: IO failures, parser setup, panics caught at the boundary.
    #[error("{0}")]
    Internal(String),

    /// Filesystem failure other than a missing path.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ToolError {
    /// Classify this error for the result envelope.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ToolError::AccessDenied => ErrorKind::AccessDenied,
            ToolError::NotFound(_) => ErrorKind::NotFound,
            ToolError::WrongType(_) => ErrorKind::WrongType,
            ToolError::Timeout { .. } => ErrorKind::Timeout,
            ToolError::SpawnFailed(_) => ErrorKind::SpawnFailed,
            ToolError::NoTestsFound => ErrorKind::NoTestsFound,
            ToolError::InvalidParameters(_) => ErrorKind::InvalidParameters,
            ToolError::UnknownTool(_) => ErrorKind::UnknownTool,
            ToolError::Internal(_) | ToolError::Io(_) => ErrorKind::Internal,
        }
    }
}

/// Errors that can occur while loading a documentation corpus.
#[derive(Debug, Error)]
pub enum CorpusError {
    #[error("Failed to read corpus file '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Duplicate topic '{0}' in corpus")]
    DuplicateTopic(String),

    #[error("Document '{0}' has an empty topic key")]
    EmptyTopic(String),
}
