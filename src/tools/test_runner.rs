//! Test runner tool.
//!
//! Detects a test command for the workspace (unless one is given), runs it
//! through `sh -c` with the workspace as working directory, and reports the
//! exit code together with heuristic pass/fail counts.
//!
//! The exit code is the only thing that decides `success`. The counts come
//! from substring matching on the captured output and are informational.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::Path;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use super::file::is_regular_file;
use super::workspace::canonical_root;
use super::{parse_params, ExecutionContext, Payload, Tool, ToolResult};
use crate::error::ToolError;

/// Tokens counted as passing tests in captured output.
const PASS_TOKENS: &[&str] = &[" ok", "... ok", "PASSED"];

/// Tokens counted as failing tests in captured output.
const FAIL_TOKENS: &[&str] = &["FAIL", "ERROR", "FAILED"];

/// Outcome of a test run that actually executed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestReport {
    /// Command that was run.
    pub command: String,
    /// Tail of stdout followed by stderr.
    pub output: String,
    /// Whether `output` lost its head to the tail limit.
    pub output_truncated: bool,
    /// Heuristic count of passing tests.
    pub passed: usize,
    /// Heuristic count of failing tests.
    pub failed: usize,
    /// Process exit code; `-signum` when killed by a signal.
    pub return_code: i32,
    pub duration_ms: u64,
}

impl Payload for TestReport {
    fn succeeded(&self) -> bool {
        self.return_code == 0
    }
}

/// Heuristic pass/fail counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TestCounts {
    pub passed: usize,
    pub failed: usize,
}

impl TestCounts {
    /// Count conventional unittest/pytest tokens in `output`.
    ///
    /// Overlapping tokens are counted once per token (`"... ok"` also
    /// contains `" ok"`), so the numbers are rough by construction.
    pub fn from_output(output: &str) -> Self {
        let count = |tokens: &[&str]| tokens.iter().map(|t| output.matches(t).count()).sum();
        Self {
            passed: count(PASS_TOKENS),
            failed: count(FAIL_TOKENS),
        }
    }
}

/// Run the workspace's tests.
///
/// With `explicit_command` the command runs as given. Otherwise the command
/// is detected from the workspace contents; see [`detect_test_command`].
pub async fn run_tests(ctx: &ExecutionContext, explicit_command: Option<&str>) -> ToolResult<TestReport> {
    run_tests_inner(ctx, explicit_command).await.into()
}

async fn run_tests_inner(
    ctx: &ExecutionContext,
    explicit_command: Option<&str>,
) -> Result<TestReport, ToolError> {
    let root = canonical_root(&ctx.workspace_root)?;

    let command = match explicit_command.map(str::trim) {
        Some(cmd) if !cmd.is_empty() => cmd.to_string(),
        Some(_) => {
            return Err(ToolError::InvalidParameters(
                "Command cannot be empty".to_string(),
            ))
        }
        None => detect_test_command(&root, &ctx.config.python)?,
    };

    let limit = ctx.config.test_timeout;
    info!(command = %command, timeout_secs = limit.as_secs(), "Running tests");

    let start = Instant::now();
    let (stdout, stderr, return_code) = execute_with_timeout(&command, &root, limit).await?;
    let duration_ms = start.elapsed().as_millis() as u64;

    let mut combined = stdout;
    combined.push_str(&stderr);

    let counts = TestCounts::from_output(&combined);
    let (output, output_truncated) = tail_chars(&combined, ctx.config.output_tail_chars);

    info!(
        return_code = return_code,
        passed = counts.passed,
        failed = counts.failed,
        duration_ms = duration_ms,
        "Test run finished"
    );

    Ok(TestReport {
        command,
        output,
        output_truncated,
        passed: counts.passed,
        failed: counts.failed,
        return_code,
        duration_ms,
    })
}

/// Pick a test command for `root`.
///
/// In order:
/// 1. `test_calculator.py` → `unittest` on that module
/// 2. `tests.py` → `pytest` on that file
/// 3. the first `test_*.py` by name → `unittest` on it
///
/// # Errors
///
/// `NoTestsFound` when none of these exist.
pub fn detect_test_command(root: &Path, python: &str) -> Result<String, ToolError> {
    if is_regular_file(&root.join("test_calculator.py")) {
        return Ok(format!("{} -m unittest test_calculator -v", python));
    }

    if is_regular_file(&root.join("tests.py")) {
        return Ok(format!("{} -m pytest tests.py -v", python));
    }

    let mut candidates: Vec<String> = fs::read_dir(root)?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .filter(|name| name.starts_with("test_") && name.ends_with(".py"))
        .collect();
    candidates.sort();

    match candidates.into_iter().next() {
        Some(file) => Ok(format!("{} -m unittest {} -v", python, file)),
        None => {
            debug!(workspace = %root.display(), "No test files detected");
            Err(ToolError::NoTestsFound)
        }
    }
}

/// Run `command` via the shell in `working_dir`, killing it after `limit`.
async fn execute_with_timeout(
    command: &str,
    working_dir: &Path,
    limit: Duration,
) -> Result<(String, String, i32), ToolError> {
    let mut cmd = Command::new("sh");
    cmd.arg("-c")
        .arg(command)
        .current_dir(working_dir)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    // Own process group, so a timeout takes the interpreter down with the shell.
    #[cfg(unix)]
    cmd.process_group(0);

    let child = cmd.spawn().map_err(|e| {
        warn!(command = command, error = %e, "Failed to spawn test process");
        ToolError::SpawnFailed(e.to_string())
    })?;
    let pid = child.id();

    match timeout(limit, child.wait_with_output()).await {
        Ok(Ok(output)) => {
            let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
            let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
            let return_code = exit_code(output.status);
            Ok((stdout, stderr, return_code))
        }
        Ok(Err(e)) => Err(ToolError::Internal(format!(
            "Failed to collect test output: {}",
            e
        ))),
        Err(_) => {
            warn!(command = command, timeout_secs = limit.as_secs(), "Test run timed out");
            if let Some(pid) = pid {
                kill_process_group(pid);
            }
            Err(ToolError::Timeout {
                seconds: limit.as_secs(),
            })
        }
    }
}

/// Exit code of a finished process; `-signum` when a signal ended it.
fn exit_code(status: std::process::ExitStatus) -> i32 {
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;

        if let Some(signal) = status.signal() {
            return -signal;
        }
    }
    status.code().unwrap_or(-1)
}

#[cfg(unix)]
fn kill_process_group(pid: u32) {
    use nix::sys::signal::{killpg, Signal};
    use nix::unistd::Pid;

    if let Err(e) = killpg(Pid::from_raw(pid as i32), Signal::SIGKILL) {
        debug!(pid = pid, error = %e, "killpg failed; process group already gone");
    }
}

#[cfg(not(unix))]
fn kill_process_group(_pid: u32) {
    // kill_on_drop already terminated the direct child.
}

/// Keep the last `max_chars` characters of `text`.
fn tail_chars(text: &str, max_chars: usize) -> (String, bool) {
    let total = text.chars().count();
    if total <= max_chars {
        return (text.to_string(), false);
    }
    let start = text
        .char_indices()
        .nth(total - max_chars)
        .map(|(i, _)| i)
        .unwrap_or(0);
    (text[start..].to_string(), true)
}

/// Parameters for the run_tests tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct RunTestsParams {
    /// Optional command overriding detection.
    #[serde(default)]
    test_command: Option<String>,
}

/// Tool for running the workspace's tests.
pub struct RunTestsTool;

#[async_trait]
impl Tool for RunTestsTool {
    fn name(&self) -> &str {
        "run_tests"
    }

    fn description(&self) -> &str {
        "Run the workspace's tests. Detects a unittest/pytest command unless one is given. success reflects the exit code only; passed/failed counts are approximate."
    }

    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "test_command": {
                    "type": "string",
                    "description": "Shell command to run instead of the detected one"
                }
            }
        })
    }

    async fn execute(&self, args: Value, ctx: &ExecutionContext) -> Result<Value, ToolError> {
        let params: RunTestsParams = parse_params(args)?;
        Ok(run_tests(ctx, params.test_command.as_deref()).await.to_json())
    }
}
