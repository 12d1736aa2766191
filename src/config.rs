//! Limits and defaults for the workspace tools.
//!
//! Every limit the tools enforce lives here so that an orchestrator can tune
//! them per deployment without touching tool code. Values come from
//! [`ToolsConfig::default`], builder-style setters, or `WORKBENCH_*`
//! environment variables.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An environment variable has an invalid value.
    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    /// Configuration validation failed.
    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),
}

/// Configuration shared by all tools.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolsConfig {
    // File accessor
    /// Byte ceiling for `read_file` content before truncation.
    pub max_read_bytes: usize,

    // Test runner
    /// Wall-clock budget for a test run.
    pub test_timeout: Duration,
    /// Number of trailing characters of test output kept.
    pub output_tail_chars: usize,
    /// Interpreter used by auto-detected test commands.
    pub python: String,

    // Static analyzer
    /// Lines longer than this many characters are reported as style issues.
    pub max_line_length: usize,
    /// Maximum number of issues returned by `lint` (the summary is never capped).
    pub max_issues: usize,

    // Search
    /// Length of the snippet returned per search hit, in characters.
    pub snippet_chars: usize,
    /// Optional YAML corpus replacing the built-in documentation set.
    pub search_corpus: Option<PathBuf>,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            max_read_bytes: 100_000,
            test_timeout: Duration::from_secs(60),
            output_tail_chars: 5_000,
            python: "python3".to_string(),
            max_line_length: 120,
            max_issues: 50,
            snippet_chars: 500,
            search_corpus: None,
        }
    }
}

impl ToolsConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `WORKBENCH_MAX_READ_BYTES`: read ceiling in bytes (default: 100000)
    /// - `WORKBENCH_TEST_TIMEOUT_SECS`: test timeout in seconds (default: 60)
    /// - `WORKBENCH_OUTPUT_TAIL_CHARS`: kept test output (default: 5000)
    /// - `WORKBENCH_PYTHON`: interpreter for detected tests (default: python3)
    /// - `WORKBENCH_MAX_LINE_LENGTH`: lint line limit (default: 120)
    /// - `WORKBENCH_MAX_ISSUES`: lint issue cap (default: 50)
    /// - `WORKBENCH_SNIPPET_CHARS`: search snippet length (default: 500)
    /// - `WORKBENCH_SEARCH_CORPUS`: path to a YAML corpus file
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable has an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("WORKBENCH_MAX_READ_BYTES") {
            config.max_read_bytes = parse_env_value(&val, "WORKBENCH_MAX_READ_BYTES")?;
        }

        if let Ok(val) = std::env::var("WORKBENCH_TEST_TIMEOUT_SECS") {
            let secs: u64 = parse_env_value(&val, "WORKBENCH_TEST_TIMEOUT_SECS")?;
            config.test_timeout = Duration::from_secs(secs);
        }

        if let Ok(val) = std::env::var("WORKBENCH_OUTPUT_TAIL_CHARS") {
            config.output_tail_chars = parse_env_value(&val, "WORKBENCH_OUTPUT_TAIL_CHARS")?;
        }

        if let Ok(val) = std::env::var("WORKBENCH_PYTHON") {
            config.python = val;
        }

        if let Ok(val) = std::env::var("WORKBENCH_MAX_LINE_LENGTH") {
            config.max_line_length = parse_env_value(&val, "WORKBENCH_MAX_LINE_LENGTH")?;
        }

        if let Ok(val) = std::env::var("WORKBENCH_MAX_ISSUES") {
            config.max_issues = parse_env_value(&val, "WORKBENCH_MAX_ISSUES")?;
        }

        if let Ok(val) = std::env::var("WORKBENCH_SNIPPET_CHARS") {
            config.snippet_chars = parse_env_value(&val, "WORKBENCH_SNIPPET_CHARS")?;
        }

        if let Ok(val) = std::env::var("WORKBENCH_SEARCH_CORPUS") {
            if !val.trim().is_empty() {
                config.search_corpus = Some(PathBuf::from(val));
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationFailed` if any values are invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_read_bytes == 0 {
            return Err(ConfigError::ValidationFailed(
                "max_read_bytes must be greater than 0".to_string(),
            ));
        }

        if self.test_timeout.as_secs() == 0 {
            return Err(ConfigError::ValidationFailed(
                "test_timeout must be at least one second".to_string(),
            ));
        }

        if self.output_tail_chars == 0 {
            return Err(ConfigError::ValidationFailed(
                "output_tail_chars must be greater than 0".to_string(),
            ));
        }

        if self.python.trim().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "python interpreter cannot be empty".to_string(),
            ));
        }

        if self.max_line_length == 0 {
            return Err(ConfigError::ValidationFailed(
                "max_line_length must be greater than 0".to_string(),
            ));
        }

        if self.max_issues == 0 {
            return Err(ConfigError::ValidationFailed(
                "max_issues must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Sets the read ceiling in bytes.
    pub fn with_max_read_bytes(mut self, bytes: usize) -> Self {
        self.max_read_bytes = bytes;
        self
    }

    /// Sets the test timeout.
    pub fn with_test_timeout(mut self, timeout: Duration) -> Self {
        self.test_timeout = timeout;
        self
    }

    /// Sets the number of trailing output characters kept from a test run.
    pub fn with_output_tail_chars(mut self, chars: usize) -> Self {
        self.output_tail_chars = chars;
        self
    }

    /// Sets the interpreter for auto-detected test commands.
    pub fn with_python(mut self, python: impl Into<String>) -> Self {
        self.python = python.into();
        self
    }

    /// Sets the lint line-length limit.
    pub fn with_max_line_length(mut self, len: usize) -> Self {
        self.max_line_length = len;
        self
    }

    /// Sets the lint issue cap.
    pub fn with_max_issues(mut self, max: usize) -> Self {
        self.max_issues = max;
        self
    }

    /// Sets the search snippet length.
    pub fn with_snippet_chars(mut self, chars: usize) -> Self {
        self.snippet_chars = chars;
        self
    }

    /// Sets a YAML corpus file for the search tool.
    pub fn with_search_corpus(mut self, path: impl Into<PathBuf>) -> Self {
        self.search_corpus = Some(path.into());
        self
    }
}

/// Parses an environment variable value into the target type.
fn parse_env_value<T: std::str::FromStr>(value: &str, key: &str) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e: T::Err| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })
}
