//! Tool definitions and registry for the workspace tool layer.
//!
//! This module defines the result envelope every tool returns, the `Tool`
//! trait used by orchestrators that drive tools by name, and a registry that
//! dispatches JSON arguments to the right tool.
//!
//! Two layers are exposed:
//! - typed functions (`read_file`, `list_files`, `run_tests`, `lint`,
//!   `DocSearch::search`) returning [`ToolResult<T>`], for Rust callers;
//! - [`ToolRegistry::dispatch`], which takes a tool name plus JSON arguments
//!   and always returns a JSON envelope. This is the catch-all boundary:
//!   invalid arguments, unknown tools and panics all come back as
//!   `success: false` envelopes.

pub mod file;
pub mod lint;
pub mod search;
pub mod test_runner;
pub mod workspace;

pub use file::{
    list_files, read_file, DirectoryListing, EntryKind, FileContent, FileEntry, ListFilesTool,
    ReadFileTool,
};
pub use lint::{lint, IssueKind, LintIssue, LintReport, LintSummary, LintTool};
pub use search::{
    Corpus, DocSearch, DocSearchTool, Document, DocumentationPage, GetDocumentationTool,
    SearchHit, SearchReport, StaticCorpus,
};
pub use test_runner::{detect_test_command, run_tests, RunTestsTool, TestCounts, TestReport};

use async_trait::async_trait;
use futures::FutureExt;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error, warn};

use crate::config::ToolsConfig;
use crate::error::{ErrorKind, ToolError};

/// A typed tool payload.
///
/// `succeeded` decides the envelope's `success` flag for a completed call.
/// Most payloads are successful by construction; the test runner and the
/// static analyzer derive it from their content.
pub trait Payload: Serialize {
    fn succeeded(&self) -> bool {
        true
    }
}

/// Why a tool call failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolFailure {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<ToolError> for ToolFailure {
    fn from(err: ToolError) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

/// Result envelope returned by every tool operation.
///
/// Serializes to a flat object: `{"success": true, ...payload}` or
/// `{"success": false, "error_kind": "...", "error": "..."}`.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolResult<T> {
    /// The operation ran; the payload decides `success`.
    Completed(T),
    /// The operation could not run.
    Failed(ToolFailure),
}

impl<T> ToolResult<T> {
    /// Create a failed result.
    pub fn failure(kind: ErrorKind, message: impl Into<String>) -> Self {
        ToolResult::Failed(ToolFailure {
            kind,
            message: message.into(),
        })
    }

    /// The payload, if the operation ran.
    pub fn payload(&self) -> Option<&T> {
        match self {
            ToolResult::Completed(payload) => Some(payload),
            ToolResult::Failed(_) => None,
        }
    }

    /// The failure, if the operation could not run.
    pub fn failure_info(&self) -> Option<&ToolFailure> {
        match self {
            ToolResult::Completed(_) => None,
            ToolResult::Failed(failure) => Some(failure),
        }
    }

    /// Shorthand for the failure kind.
    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.failure_info().map(|f| f.kind)
    }
}

impl<T: Payload> ToolResult<T> {
    /// The envelope's `success` flag.
    pub fn success(&self) -> bool {
        match self {
            ToolResult::Completed(payload) => payload.succeeded(),
            ToolResult::Failed(_) => false,
        }
    }

    /// Serialize into the JSON envelope handed to orchestrators.
    pub fn to_json(&self) -> Value {
        match serde_json::to_value(self) {
            Ok(value) => value,
            Err(e) => failure_envelope(
                ErrorKind::Internal,
                format!("Failed to serialize tool result: {}", e),
            ),
        }
    }
}

impl<T> From<Result<T, ToolError>> for ToolResult<T> {
    fn from(result: Result<T, ToolError>) -> Self {
        match result {
            Ok(payload) => ToolResult::Completed(payload),
            Err(err) => ToolResult::Failed(err.into()),
        }
    }
}

impl<T: Payload> Serialize for ToolResult<T> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct CompletedEnvelope<'a, P: Serialize> {
            success: bool,
            #[serde(flatten)]
            payload: &'a P,
        }

        #[derive(Serialize)]
        struct FailedEnvelope<'a> {
            success: bool,
            error_kind: ErrorKind,
            error: &'a str,
        }

        match self {
            ToolResult::Completed(payload) => CompletedEnvelope {
                success: payload.succeeded(),
                payload,
            }
            .serialize(serializer),
            ToolResult::Failed(failure) => FailedEnvelope {
                success: false,
                error_kind: failure.kind,
                error: &failure.message,
            }
            .serialize(serializer),
        }
    }
}

/// Build a failure envelope without going through a typed result.
pub fn failure_envelope(kind: ErrorKind, message: impl Into<String>) -> Value {
    serde_json::json!({
        "success": false,
        "error_kind": kind,
        "error": message.into(),
    })
}

/// Context for tool execution: which workspace, under which limits.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    /// Root directory the agent is confined to.
    pub workspace_root: PathBuf,
    /// Limits shared by all tools.
    pub config: Arc<ToolsConfig>,
}

impl ExecutionContext {
    /// Create a new execution context with default limits.
    pub fn new(workspace_root: impl Into<PathBuf>) -> Self {
        Self {
            workspace_root: workspace_root.into(),
            config: Arc::new(ToolsConfig::default()),
        }
    }

    /// Replace the limits used by this context.
    pub fn with_config(mut self, config: ToolsConfig) -> Self {
        self.config = Arc::new(config);
        self
    }
}

/// Trait for tools that can be invoked by an orchestrator.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Returns the unique name of the tool.
    fn name(&self) -> &str;

    /// Returns a description of what the tool does.
    fn description(&self) -> &str;

    /// Returns the JSON schema for the tool's parameters.
    fn parameters_schema(&self) -> Value;

    /// Execute the tool with the given arguments and context.
    ///
    /// # Returns
    ///
    /// The serialized result envelope. `Err` is reserved for problems with
    /// the call itself (bad arguments); the registry turns it into a
    /// failure envelope.
    async fn execute(&self, args: Value, ctx: &ExecutionContext) -> Result<Value, ToolError>;
}

/// Deserialize tool arguments, treating a missing argument object as `{}`.
pub(crate) fn parse_params<P: DeserializeOwned>(args: Value) -> Result<P, ToolError> {
    let args = if args.is_null() {
        Value::Object(serde_json::Map::new())
    } else {
        args
    };
    serde_json::from_value(args).map_err(|e| ToolError::InvalidParameters(e.to_string()))
}

/// Registry for managing available tools.
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    /// Create a new empty tool registry.
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Create a registry with the default set of tools and the built-in
    /// documentation corpus.
    pub fn with_default_tools() -> Self {
        Self::with_corpus(Arc::new(StaticCorpus::builtin()))
    }

    /// Create a registry with the default tools, searching `corpus`.
    pub fn with_corpus(corpus: Arc<dyn Corpus>) -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(ReadFileTool));
        registry.register(Arc::new(ListFilesTool));
        registry.register(Arc::new(RunTestsTool));
        registry.register(Arc::new(LintTool));
        registry.register(Arc::new(DocSearchTool::new(corpus.clone())));
        registry.register(Arc::new(GetDocumentationTool::new(corpus)));
        registry
    }

    /// Register a new tool in the registry.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    /// Get a tool by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// List all registered tool names, sorted.
    pub fn list_tools(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tools.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// Get the number of registered tools.
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Generate a JSON schema for all registered tools.
    ///
    /// Returns a JSON array of tool definitions suitable for LLM function calling.
    pub fn to_json_schema(&self) -> Value {
        let tools: Vec<Value> = self
            .list_tools()
            .into_iter()
            .filter_map(|name| self.tools.get(name))
            .map(|tool| {
                serde_json::json!({
                    "type": "function",
                    "function": {
                        "name": tool.name(),
                        "description": tool.description(),
                        "parameters": tool.parameters_schema()
                    }
                })
            })
            .collect();

        Value::Array(tools)
    }

    /// Run a tool by name and return its JSON envelope.
    ///
    /// Never fails and never panics: unknown tools, invalid arguments and
    /// panics inside a tool all become `success: false` envelopes.
    pub async fn dispatch(&self, name: &str, args: Value, ctx: &ExecutionContext) -> Value {
        let Some(tool) = self.get(name) else {
            warn!(tool = name, "Dispatch to unknown tool");
            let err = ToolError::UnknownTool(name.to_string());
            return failure_envelope(err.kind(), err.to_string());
        };

        debug!(tool = name, workspace = %ctx.workspace_root.display(), "Dispatching tool");

        match AssertUnwindSafe(tool.execute(args, ctx)).catch_unwind().await {
            Ok(Ok(envelope)) => envelope,
            Ok(Err(err)) => {
                debug!(tool = name, error = %err, "Tool call rejected");
                failure_envelope(err.kind(), err.to_string())
            }
            Err(panic) => {
                let message = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                error!(tool = name, panic = %message, "Tool panicked");
                failure_envelope(
                    ErrorKind::Internal,
                    format!("Tool '{}' failed unexpectedly: {}", name, message),
                )
            }
        }
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
