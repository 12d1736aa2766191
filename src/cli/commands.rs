//! CLI command definitions for workbench.
//!
//! Every subcommand is a thin wrapper over one registry tool: it builds the
//! tool's JSON arguments, dispatches them, and prints the envelope.

use crate::config::ToolsConfig;
use crate::tools::{Corpus, ExecutionContext, StaticCorpus, ToolRegistry};
use anyhow::Context;
use clap::Parser;
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

/// Sandboxed workspace tools for coding agents.
#[derive(Parser)]
#[command(name = "workbench")]
#[command(about = "Run sandboxed workspace tools and print their JSON result")]
#[command(version)]
#[command(
    long_about = "workbench exposes the agent tool layer on the command line.\n\nEach subcommand runs one tool against the workspace directory and prints the result envelope as JSON on stdout. Logs go to stderr.\n\nExample usage:\n  workbench --workspace ./task lint\n  workbench --workspace ./task call read_file '{\"path\": \"main.py\"}'"
)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root the tools are confined to.
    #[arg(short, long, env = "WORKBENCH_WORKSPACE", default_value = ".", global = true)]
    pub workspace: PathBuf,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, default_value = "info", global = true)]
    pub log_level: String,
}

/// Available CLI subcommands.
#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Read a file from the workspace.
    Read {
        /// Workspace-relative path.
        path: String,
    },

    /// List one directory level.
    #[command(alias = "ls")]
    List {
        /// Workspace-relative directory.
        #[arg(default_value = ".")]
        directory: String,
    },

    /// Run the workspace's tests.
    Test {
        /// Command to run instead of the detected one.
        #[arg(short, long)]
        command: Option<String>,
    },

    /// Check Python files for errors and style issues.
    Lint {
        /// Single workspace-relative file to check.
        file: Option<String>,
    },

    /// Search the documentation corpus.
    Search {
        /// Search terms.
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,
    },

    /// Print the full documentation page for a topic.
    Doc {
        /// Topic key, e.g. "python unittest".
        topic: String,
    },

    /// Print the JSON schema of every registered tool.
    Tools,

    /// Invoke any tool by name with raw JSON arguments.
    Call {
        /// Tool name, e.g. read_file.
        tool: String,

        /// JSON object with the tool's arguments.
        #[arg(default_value = "{}")]
        args: String,
    },
}

impl Commands {
    /// Tool name and JSON arguments this subcommand dispatches to.
    ///
    /// `Tools` does not dispatch and yields `None`.
    fn to_invocation(&self) -> anyhow::Result<Option<(String, Value)>> {
        let invocation = match self {
            Commands::Read { path } => ("read_file".to_string(), json!({ "path": path })),
            Commands::List { directory } => {
                ("list_files".to_string(), json!({ "directory": directory }))
            }
            Commands::Test { command } => {
                ("run_tests".to_string(), json!({ "test_command": command }))
            }
            Commands::Lint { file } => ("lint_code".to_string(), json!({ "filepath": file })),
            Commands::Search { query } => {
                ("web_search".to_string(), json!({ "query": query.join(" ") }))
            }
            Commands::Doc { topic } => ("get_documentation".to_string(), json!({ "topic": topic })),
            Commands::Tools => return Ok(None),
            Commands::Call { tool, args } => {
                let args: Value = serde_json::from_str(args)
                    .with_context(|| format!("Arguments for '{}' are not valid JSON", tool))?;
                (tool.clone(), args)
            }
        };
        Ok(Some(invocation))
    }
}

/// Parse CLI arguments without executing any command.
///
/// This allows callers to access parsed arguments (like log_level) before
/// running the command, enabling proper logging initialization.
pub fn parse_cli() -> Cli {
    Cli::parse()
}

/// Run the CLI by parsing arguments and executing the command.
pub async fn run() -> anyhow::Result<()> {
    run_with_cli(parse_cli()).await
}

/// Run the CLI with the parsed arguments.
pub async fn run_with_cli(cli: Cli) -> anyhow::Result<()> {
    let config = ToolsConfig::from_env().context("Invalid WORKBENCH_* configuration")?;
    let registry = build_registry(&config)?;

    let output = match cli.command.to_invocation()? {
        None => registry.to_json_schema(),
        Some((tool, args)) => {
            let ctx = ExecutionContext::new(&cli.workspace).with_config(config);
            info!(tool = %tool, workspace = %cli.workspace.display(), "Running tool");
            registry.dispatch(&tool, args, &ctx).await
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

/// Registry over the configured corpus, or the built-in one.
fn build_registry(config: &ToolsConfig) -> anyhow::Result<ToolRegistry> {
    let corpus: Arc<dyn Corpus> = match &config.search_corpus {
        Some(path) => Arc::new(
            StaticCorpus::from_yaml_file(path)
                .with_context(|| format!("Failed to load search corpus {}", path.display()))?,
        ),
        None => {
            debug!("Using built-in search corpus");
            Arc::new(StaticCorpus::builtin())
        }
    };
    Ok(ToolRegistry::with_corpus(corpus))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parses() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_defaults() {
        let cli = Cli::try_parse_from(["workbench", "tools"]).expect("should parse");
        assert_eq!(cli.log_level, "info");
        assert!(matches!(cli.command, Commands::Tools));
    }

    #[test]
    fn test_workspace_after_subcommand() {
        let cli = Cli::try_parse_from(["workbench", "read", "main.py", "--workspace", "/tmp/ws"])
            .expect("should parse");
        assert_eq!(cli.workspace, PathBuf::from("/tmp/ws"));
        match cli.command {
            Commands::Read { path } => assert_eq!(path, "main.py"),
            _ => panic!("Expected Read command"),
        }
    }

    #[test]
    fn test_list_defaults_to_root() {
        let cli = Cli::try_parse_from(["workbench", "ls"]).expect("should parse");
        let (tool, args) = cli.command.to_invocation().unwrap().unwrap();
        assert_eq!(tool, "list_files");
        assert_eq!(args["directory"], ".");
    }

    #[test]
    fn test_search_joins_words() {
        let cli = Cli::try_parse_from(["workbench", "search", "python", "argparse"])
            .expect("should parse");
        let (tool, args) = cli.command.to_invocation().unwrap().unwrap();
        assert_eq!(tool, "web_search");
        assert_eq!(args["query"], "python argparse");
    }

    #[test]
    fn test_search_requires_query() {
        assert!(Cli::try_parse_from(["workbench", "search"]).is_err());
    }

    #[test]
    fn test_test_and_lint_optional_arguments() {
        let cli = Cli::try_parse_from(["workbench", "test"]).expect("should parse");
        let (tool, args) = cli.command.to_invocation().unwrap().unwrap();
        assert_eq!(tool, "run_tests");
        assert!(args["test_command"].is_null());

        let cli = Cli::try_parse_from(["workbench", "test", "-c", "pytest -q"]).expect("should parse");
        let (_, args) = cli.command.to_invocation().unwrap().unwrap();
        assert_eq!(args["test_command"], "pytest -q");

        let cli = Cli::try_parse_from(["workbench", "lint", "calc.py"]).expect("should parse");
        let (tool, args) = cli.command.to_invocation().unwrap().unwrap();
        assert_eq!(tool, "lint_code");
        assert_eq!(args["filepath"], "calc.py");
    }

    #[test]
    fn test_call_parses_json_arguments() {
        let cli = Cli::try_parse_from(["workbench", "call", "read_file", r#"{"path":"a.py"}"#])
            .expect("should parse");
        let (tool, args) = cli.command.to_invocation().unwrap().unwrap();
        assert_eq!(tool, "read_file");
        assert_eq!(args["path"], "a.py");

        let cli = Cli::try_parse_from(["workbench", "call", "read_file", "{not json"])
            .expect("should parse");
        assert!(cli.command.to_invocation().is_err());
    }

    #[test]
    fn test_tools_has_no_invocation() {
        assert!(Commands::Tools.to_invocation().unwrap().is_none());
    }

    #[test]
    fn test_build_registry_with_missing_corpus_fails() {
        let config = ToolsConfig::new().with_search_corpus("/nonexistent/corpus.yaml");
        assert!(build_registry(&config).is_err());
        assert_eq!(build_registry(&ToolsConfig::new()).unwrap().len(), 6);
    }
}
