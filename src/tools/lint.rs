//! Static analyzer for Python sources in the workspace.
//!
//! Each file is parsed with the tree-sitter Python grammar. A file that does
//! not parse yields a single `syntax_error` issue and nothing else; a file
//! that parses goes through line heuristics and a docstring check over the
//! syntax tree.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tree_sitter::{Node, Parser};
use walkdir::WalkDir;

use super::file::is_regular_file;
use super::workspace::{canonical_root, relative_display, resolve_in_workspace};
use super::{parse_params, ExecutionContext, Payload, Tool, ToolResult};
use crate::error::ToolError;

/// Longest excerpt of offending source quoted in a syntax error message.
const SYNTAX_EXCERPT_CHARS: usize = 20;

/// Category of a lint finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    SyntaxError,
    Warning,
    Style,
    /// The file could not be read or decoded.
    Error,
}

/// A single lint finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LintIssue {
    /// Path relative to the workspace root.
    pub file: String,
    /// 1-based line; 0 when the issue concerns the whole file.
    pub line: usize,
    #[serde(rename = "type")]
    pub kind: IssueKind,
    pub message: String,
}

impl LintIssue {
    fn new(file: &str, line: usize, kind: IssueKind, message: impl Into<String>) -> Self {
        Self {
            file: file.to_string(),
            line,
            kind,
            message: message.into(),
        }
    }
}

/// Per-kind issue counts over every finding, including those past the cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LintSummary {
    pub syntax_errors: usize,
    pub warnings: usize,
    pub style_issues: usize,
    pub errors: usize,
    pub total: usize,
}

impl LintSummary {
    fn from_issues(issues: &[LintIssue]) -> Self {
        let mut summary = Self {
            total: issues.len(),
            ..Self::default()
        };
        for issue in issues {
            match issue.kind {
                IssueKind::SyntaxError => summary.syntax_errors += 1,
                IssueKind::Warning => summary.warnings += 1,
                IssueKind::Style => summary.style_issues += 1,
                IssueKind::Error => summary.errors += 1,
            }
        }
        summary
    }
}

/// Result of a lint run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LintReport {
    /// Workspace-relative paths of the files examined, in check order.
    pub files_checked: Vec<String>,
    /// Findings in file order, capped at the configured maximum.
    pub issues: Vec<LintIssue>,
    pub summary: LintSummary,
}

impl Payload for LintReport {
    fn succeeded(&self) -> bool {
        self.summary.syntax_errors == 0
    }
}

/// Lint one file, or every `*.py` file under the workspace when `file` is `None`.
///
/// An explicit file that does not exist is skipped, giving an empty report.
pub fn lint(ctx: &ExecutionContext, file: Option<&str>) -> ToolResult<LintReport> {
    lint_inner(ctx, file).into()
}

fn lint_inner(ctx: &ExecutionContext, file: Option<&str>) -> Result<LintReport, ToolError> {
    let root = canonical_root(&ctx.workspace_root)?;

    let targets = match file {
        Some(file) => {
            let resolved = resolve_in_workspace(&root, file)?;
            if resolved.is_dir() {
                return Err(ToolError::WrongType(format!("Not a file: {}", file)));
            }
            if is_regular_file(&resolved) {
                vec![resolved]
            } else {
                debug!(file = file, "Lint target does not exist; skipping");
                Vec::new()
            }
        }
        None => collect_python_files(&root),
    };

    let mut parser = python_parser()?;
    let mut issues = Vec::new();
    let mut files_checked = Vec::with_capacity(targets.len());

    for path in &targets {
        let display = relative_display(&root, path);
        match fs::read(path).map_err(|e| e.to_string()).and_then(|bytes| {
            String::from_utf8(bytes).map_err(|e| e.to_string())
        }) {
            Ok(source) => issues.extend(check_source(
                &mut parser,
                &display,
                &source,
                ctx.config.max_line_length,
            )),
            Err(e) => issues.push(LintIssue::new(
                &display,
                0,
                IssueKind::Error,
                format!("Could not parse: {}", e),
            )),
        }
        files_checked.push(display);
    }

    let summary = LintSummary::from_issues(&issues);
    issues.truncate(ctx.config.max_issues);

    info!(
        files_checked = files_checked.len(),
        total = summary.total,
        syntax_errors = summary.syntax_errors,
        "Lint finished"
    );

    Ok(LintReport {
        files_checked,
        issues,
        summary,
    })
}

/// Every `*.py` file under `root`, hidden directories included, sorted by
/// path. Symlinks are not followed.
fn collect_python_files(root: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| entry.path().extension().map(|ext| ext == "py").unwrap_or(false))
        .map(|entry| entry.into_path())
        .collect();
    files.sort();
    files
}

fn python_parser() -> Result<Parser, ToolError> {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_python::LANGUAGE.into())
        .map_err(|e| ToolError::Internal(format!("Failed to load Python grammar: {}", e)))?;
    Ok(parser)
}

/// All findings for one file's source.
fn check_source(parser: &mut Parser, file: &str, source: &str, max_line_length: usize) -> Vec<LintIssue> {
    let Some(tree) = parser.parse(source, None) else {
        return vec![LintIssue::new(file, 0, IssueKind::Error, "Could not parse: parser gave up")];
    };
    let root = tree.root_node();

    let parse_error = if root.has_error() {
        first_error_node(root).map(|node| SyntaxViolation {
            row: node.start_position().row,
            column: node.start_position().column,
            message: syntax_error_message(node, source),
        })
    } else {
        None
    };

    let mut violations = Vec::new();
    collect_python3_violations(root, source, &mut violations);

    if let Some(first) = parse_error
        .into_iter()
        .chain(violations)
        .min_by_key(|v| (v.row, v.column))
    {
        return vec![LintIssue::new(
            file,
            first.row + 1,
            IssueKind::SyntaxError,
            first.message,
        )];
    }

    let mut issues = check_lines(file, source, max_line_length);
    collect_missing_docstrings(root, source, file, &mut issues);
    issues
}

/// First `ERROR` or `MISSING` node in document order.
fn first_error_node(node: Node<'_>) -> Option<Node<'_>> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    let mut cursor = node.walk();
    let children: Vec<Node<'_>> = node.children(&mut cursor).collect();
    children
        .into_iter()
        .filter(|child| child.has_error())
        .find_map(first_error_node)
}

fn syntax_error_message(node: Node<'_>, source: &str) -> String {
    if node.is_missing() {
        return format!("missing '{}'", node.kind());
    }

    let text = node.utf8_text(source.as_bytes()).unwrap_or_default();
    let excerpt: String = text
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or_default()
        .chars()
        .take(SYNTAX_EXCERPT_CHARS)
        .collect();

    if excerpt.is_empty() {
        "invalid syntax".to_string()
    } else {
        format!("invalid syntax near '{}'", excerpt)
    }
}

/// A construct the grammar accepts but Python 3 rejects.
#[derive(Debug)]
struct SyntaxViolation {
    row: usize,
    column: usize,
    message: String,
}

impl SyntaxViolation {
    fn at(node: Node<'_>, message: impl Into<String>) -> Self {
        Self {
            row: node.start_position().row,
            column: node.start_position().column,
            message: message.into(),
        }
    }
}

/// The tree-sitter grammar still parses Python 2 statements and does not
/// enforce indentation between sibling statements. Collect the constructs
/// that make `compile()` fail on an otherwise error-free tree.
fn collect_python3_violations(node: Node<'_>, source: &str, out: &mut Vec<SyntaxViolation>) {
    match node.kind() {
        "print_statement" => out.push(SyntaxViolation::at(
            node,
            "Missing parentheses in call to 'print'. Did you mean print(...)?",
        )),
        "exec_statement" => out.push(SyntaxViolation::at(
            node,
            "Missing parentheses in call to 'exec'. Did you mean exec(...)?",
        )),
        "module" | "block" => check_indentation(node, out),
        "parameters" | "lambda_parameters" => check_parameters(node, source, out),
        "<>" if !node.is_named() => {
            out.push(SyntaxViolation::at(node, "invalid syntax near '<>'"))
        }
        _ => {}
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_python3_violations(child, source, out);
    }
}

/// Statements of one suite must start at the same column; module-level
/// statements at column 0.
fn check_indentation(suite: Node<'_>, out: &mut Vec<SyntaxViolation>) {
    let mut expected: Option<usize> = None;
    let mut previous_end_row: Option<usize> = None;

    let mut cursor = suite.walk();
    for statement in suite.named_children(&mut cursor) {
        if matches!(statement.kind(), "comment" | "line_continuation") {
            continue;
        }

        let start = statement.start_position();
        let starts_line = previous_end_row.map_or(true, |row| row != start.row);
        previous_end_row = Some(statement.end_position().row);
        if !starts_line {
            continue;
        }

        let column = match expected {
            Some(column) => column,
            None if suite.kind() == "module" => 0,
            None => start.column,
        };
        expected = Some(column);

        if start.column > column {
            out.push(SyntaxViolation::at(statement, "unexpected indent"));
        } else if start.column < column {
            out.push(SyntaxViolation::at(
                statement,
                "unindent does not match any outer indentation level",
            ));
        }
    }
}

/// Parameter names must be unique; parenthesized tuple parameters are gone.
fn check_parameters(parameters: Node<'_>, source: &str, out: &mut Vec<SyntaxViolation>) {
    let mut seen = HashSet::new();

    let mut cursor = parameters.walk();
    for parameter in parameters.named_children(&mut cursor) {
        if parameter.kind() == "tuple_pattern" {
            out.push(SyntaxViolation::at(
                parameter,
                "Function parameters cannot be parenthesized",
            ));
            continue;
        }
        if let Some(name) = parameter_name(parameter, source) {
            if !seen.insert(name) {
                out.push(SyntaxViolation::at(
                    parameter,
                    format!("duplicate argument '{}' in function definition", name),
                ));
            }
        }
    }
}

fn parameter_name<'s>(parameter: Node<'_>, source: &'s str) -> Option<&'s str> {
    match parameter.kind() {
        "identifier" => parameter.utf8_text(source.as_bytes()).ok(),
        "default_parameter" | "typed_default_parameter" => parameter
            .child_by_field_name("name")
            .and_then(|name| parameter_name(name, source)),
        "typed_parameter" | "list_splat_pattern" | "dictionary_splat_pattern" => parameter
            .named_child(0)
            .and_then(|inner| parameter_name(inner, source)),
        _ => None,
    }
}

/// Debug prints, overlong lines and TODO markers.
fn check_lines(file: &str, source: &str, max_line_length: usize) -> Vec<LintIssue> {
    let mut issues = Vec::new();
    let mut main_guard_seen = false;

    for (idx, line) in source.lines().enumerate() {
        let lineno = idx + 1;

        if line.contains("print(") && !line.trim_start().starts_with('#') && !main_guard_seen {
            issues.push(LintIssue::new(
                file,
                lineno,
                IssueKind::Warning,
                "Possible debug print statement",
            ));
        }

        let length = line.chars().count();
        if length > max_line_length {
            issues.push(LintIssue::new(
                file,
                lineno,
                IssueKind::Style,
                format!("Line too long ({} > {})", length, max_line_length),
            ));
        }

        if line.contains("TODO") || line.contains("FIXME") {
            issues.push(LintIssue::new(
                file,
                lineno,
                IssueKind::Warning,
                "Unresolved TODO/FIXME",
            ));
        }

        if line.contains("__name__") {
            main_guard_seen = true;
        }
    }

    issues
}

/// Function (sync or async) and class definitions without a docstring, in
/// source order.
fn collect_missing_docstrings(node: Node<'_>, source: &str, file: &str, issues: &mut Vec<LintIssue>) {
    if matches!(node.kind(), "function_definition" | "class_definition") && !has_docstring(node, source) {
        let name = node
            .child_by_field_name("name")
            .and_then(|n| n.utf8_text(source.as_bytes()).ok())
            .unwrap_or("<unknown>");
        issues.push(LintIssue::new(
            file,
            node.start_position().row + 1,
            IssueKind::Style,
            format!("Missing docstring for {}", name),
        ));
    }

    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        collect_missing_docstrings(child, source, file, issues);
    }
}

/// Whether the definition's body opens with a non-empty plain string literal.
fn has_docstring(definition: Node<'_>, source: &str) -> bool {
    let Some(body) = definition.child_by_field_name("body") else {
        return false;
    };

    let mut cursor = body.walk();
    let first = body
        .named_children(&mut cursor)
        .find(|child| child.kind() != "comment");
    let Some(statement) = first else {
        return false;
    };
    if statement.kind() != "expression_statement" || statement.named_child_count() != 1 {
        return false;
    }
    let Some(expr) = statement.named_child(0) else {
        return false;
    };

    match expr.kind() {
        "string" => plain_string_content(expr, source)
            .map(|content| !content.trim().is_empty())
            .unwrap_or(false),
        "concatenated_string" => {
            let mut cursor = expr.walk();
            let parts: Option<Vec<&str>> = expr
                .named_children(&mut cursor)
                .map(|part| plain_string_content(part, source))
                .collect();
            parts
                .map(|parts| parts.iter().any(|p| !p.trim().is_empty()))
                .unwrap_or(false)
        }
        _ => false,
    }
}

/// The text between the quotes of a non-f, non-bytes string literal.
fn plain_string_content<'s>(string: Node<'_>, source: &'s str) -> Option<&'s str> {
    if string.kind() != "string" {
        return None;
    }

    let mut cursor = string.walk();
    let mut start = None;
    let mut end = None;
    for child in string.children(&mut cursor) {
        match child.kind() {
            "string_start" => start = Some(child),
            "string_end" => end = Some(child),
            "interpolation" => return None,
            _ => {}
        }
    }
    let (start, end) = (start?, end?);

    let prefix = start.utf8_text(source.as_bytes()).ok()?.to_ascii_lowercase();
    if prefix.contains('f') || prefix.contains('b') {
        return None;
    }

    source.get(start.end_byte()..end.start_byte())
}

/// Parameters for the lint_code tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct LintParams {
    /// Optional single file to check.
    #[serde(default)]
    filepath: Option<String>,
}

/// Tool for checking Python code in the workspace.
pub struct LintTool;

#[async_trait]
impl Tool for LintTool {
    fn name(&self) -> &str {
        "lint_code"
    }

    fn description(&self) -> &str {
        "Check Python files for syntax errors, debug prints, long lines, TODO markers and missing docstrings. Checks every .py file unless a filepath is given."
    }

    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "filepath": {
                    "type": "string",
                    "description": "Workspace-relative file to check"
                }
            }
        })
    }

    async fn execute(&self, args: Value, ctx: &ExecutionContext) -> Result<Value, ToolError> {
        let params: LintParams = parse_params(args)?;
        Ok(lint(ctx, params.filepath.as_deref()).to_json())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ToolsConfig;
    use crate::error::ErrorKind;
    use tempfile::tempdir;

    fn lint_source(source: &str) -> Vec<LintIssue> {
        let mut parser = python_parser().unwrap();
        check_source(&mut parser, "mod.py", source, 120)
    }

    fn messages(issues: &[LintIssue]) -> Vec<&str> {
        issues.iter().map(|i| i.message.as_str()).collect()
    }

    #[test]
    fn test_clean_module_has_no_issues() {
        let source = r#""""Calculator."""


def add(a, b):
    """Add two numbers."""
    return a + b


class Calc:
    """A calculator."""

    async def run(self):
        """Run it."""
        return add(1, 2)
"#;
        assert!(lint_source(source).is_empty());
    }

    #[test]
    fn test_unmatched_paren_is_single_syntax_error() {
        let source = "def f(:\n    print('x')  # TODO\n";
        let issues = lint_source(source);
        assert_eq!(issues.len(), 1, "{:?}", issues);
        assert_eq!(issues[0].kind, IssueKind::SyntaxError);
        assert!(issues[0].line >= 1);
        assert!(issues[0].message.starts_with("missing") || issues[0].message.starts_with("invalid syntax"));
    }

    #[test]
    fn test_unclosed_call_is_syntax_error() {
        let issues = lint_source("x = foo(1, 2\n");
        assert_eq!(issues.len(), 1, "{:?}", issues);
        assert_eq!(issues[0].kind, IssueKind::SyntaxError);
    }

    fn single_syntax_error(source: &str) -> LintIssue {
        let issues = lint_source(source);
        assert_eq!(issues.len(), 1, "{:?}", issues);
        assert_eq!(issues[0].kind, IssueKind::SyntaxError);
        issues.into_iter().next().unwrap()
    }

    #[test]
    fn test_python2_print_statement_is_syntax_error() {
        let issue = single_syntax_error("\"\"\"M.\"\"\"\nprint \"hello\"\n");
        assert_eq!(issue.line, 2);
        assert!(issue.message.contains("Missing parentheses in call to 'print'"));
    }

    #[test]
    fn test_python2_exec_statement_is_syntax_error() {
        let issue = single_syntax_error("exec \"x = 1\"\n");
        assert_eq!(issue.line, 1);
        assert!(issue.message.contains("Missing parentheses in call to 'exec'"));
    }

    #[test]
    fn test_unexpected_indent_is_syntax_error() {
        let issue = single_syntax_error("x = 1\n  y = 2\n");
        assert_eq!(issue.line, 2);
        assert_eq!(issue.message, "unexpected indent");
    }

    #[test]
    fn test_indented_first_statement_is_syntax_error() {
        let issue = single_syntax_error("  x = 1\n");
        assert_eq!(issue.line, 1);
        assert_eq!(issue.message, "unexpected indent");
    }

    #[test]
    fn test_duplicate_parameter_is_syntax_error() {
        let issue = single_syntax_error("def f(a, a):\n    \"\"\"Doc.\"\"\"\n    return a\n");
        assert_eq!(issue.line, 1);
        assert_eq!(issue.message, "duplicate argument 'a' in function definition");

        let issue = single_syntax_error("g = lambda x, *x: x\n");
        assert_eq!(issue.message, "duplicate argument 'x' in function definition");
    }

    #[test]
    fn test_earliest_syntax_problem_wins() {
        let issue = single_syntax_error("x = 1\nprint x\n\n\ndef f(a, a):\n    pass\n");
        assert_eq!(issue.line, 2);
    }

    #[test]
    fn test_semicolons_and_nested_suites_are_not_indent_errors() {
        let source = "\"\"\"M.\"\"\"\nx = 1; y = 2\n\n\ndef f(a, b=1, *args, c: int = 2, **kw):\n    \"\"\"Doc.\"\"\"\n    if a:\n        return b\n    # comment\n    return c\n";
        assert!(lint_source(source).is_empty(), "{:?}", lint_source(source));
    }

    #[test]
    fn test_missing_docstrings() {
        let source = "def bare():\n    return 1\n\n\nclass Empty:\n    pass\n\n\nasync def later():\n    pass\n";
        let issues = lint_source(source);
        assert_eq!(
            messages(&issues),
            vec![
                "Missing docstring for bare",
                "Missing docstring for Empty",
                "Missing docstring for later"
            ]
        );
        assert_eq!(issues[0].line, 1);
        assert_eq!(issues[1].line, 5);
        assert_eq!(issues[2].line, 9);
        assert!(issues.iter().all(|i| i.kind == IssueKind::Style));
    }

    #[test]
    fn test_nested_and_decorated_definitions_are_checked() {
        let source = "def outer():\n    \"\"\"Doc.\"\"\"\n    def inner():\n        pass\n    return inner\n\n\n@staticmethod\ndef deco():\n    pass\n";
        let issues = lint_source(source);
        assert_eq!(
            messages(&issues),
            vec!["Missing docstring for inner", "Missing docstring for deco"]
        );
        assert_eq!(issues[0].line, 3);
    }

    #[test]
    fn test_empty_and_formatted_docstrings_count_as_missing() {
        let source = "def a():\n    \"\"\"\"\"\"\n\n\ndef b():\n    f\"\"\"doc {1}\"\"\"\n\n\ndef c():\n    b\"doc\"\n\n\ndef d():\n    'fine'\n";
        let issues = lint_source(source);
        assert_eq!(
            messages(&issues),
            vec![
                "Missing docstring for a",
                "Missing docstring for b",
                "Missing docstring for c"
            ]
        );
    }

    #[test]
    fn test_comment_before_docstring_is_ignored() {
        let source = "def a():\n    # note\n    \"\"\"Doc.\"\"\"\n";
        assert!(lint_source(source).is_empty());
    }

    #[test]
    fn test_print_before_main_guard_is_flagged() {
        let source = "\"\"\"M.\"\"\"\nprint('debug')\n# print('commented')\nif __name__ == '__main__':\n    print('ok')\n";
        let issues = lint_source(source);
        assert_eq!(issues.len(), 1, "{:?}", issues);
        assert_eq!(issues[0].line, 2);
        assert_eq!(issues[0].kind, IssueKind::Warning);
        assert_eq!(issues[0].message, "Possible debug print statement");
    }

    #[test]
    fn test_long_line_and_todo() {
        let long = format!("x = '{}'  # FIXME", "a".repeat(130));
        let issues = lint_source(&long);
        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0].kind, IssueKind::Style);
        assert_eq!(
            issues[0].message,
            format!("Line too long ({} > 120)", long.chars().count())
        );
        assert_eq!(issues[1].message, "Unresolved TODO/FIXME");
    }

    #[test]
    fn test_lint_workspace_walks_python_files() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("pkg")).unwrap();
        fs::write(dir.path().join("b.py"), "def f():\n    pass\n").unwrap();
        fs::write(dir.path().join("pkg/a.py"), "x = 1  # TODO\n").unwrap();
        fs::write(dir.path().join("notes.txt"), "print(1)\n").unwrap();

        let result = lint(&ExecutionContext::new(dir.path()), None);
        assert!(result.success());
        let report = result.payload().unwrap();
        assert_eq!(report.files_checked, vec!["b.py", "pkg/a.py"]);
        let files: Vec<&str> = report.issues.iter().map(|i| i.file.as_str()).collect();
        assert_eq!(files, vec!["b.py", "pkg/a.py"]);
        assert_eq!(report.summary.style_issues, 1);
        assert_eq!(report.summary.warnings, 1);
        assert_eq!(report.summary.total, 2);
    }

    #[test]
    fn test_hidden_directories_are_linted() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join(".hidden")).unwrap();
        fs::write(dir.path().join(".hidden/x.py"), "def g(:\n").unwrap();
        fs::write(dir.path().join("b.py"), "\"\"\"Doc.\"\"\"\n").unwrap();

        let result = lint(&ExecutionContext::new(dir.path()), None);
        assert!(!result.success());
        let report = result.payload().unwrap();
        assert_eq!(report.files_checked, vec![".hidden/x.py", "b.py"]);
        assert_eq!(report.summary.syntax_errors, 1);
        assert_eq!(report.issues[0].file, ".hidden/x.py");
    }

    #[test]
    fn test_syntax_error_fails_report() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("bad.py"), "def f(:\n    pass\n").unwrap();
        fs::write(dir.path().join("good.py"), "\"\"\"Doc.\"\"\"\n").unwrap();

        let result = lint(&ExecutionContext::new(dir.path()), None);
        assert!(!result.success());
        let json = result.to_json();
        assert_eq!(json["success"], false);
        assert_eq!(json["summary"]["syntax_errors"], 1);
        assert_eq!(json["issues"][0]["type"], "syntax_error");
        assert_eq!(json["issues"][0]["file"], "bad.py");
    }

    #[test]
    fn test_lint_is_idempotent() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("m.py"), "def f():\n    print(1)\n").unwrap();
        let ctx = ExecutionContext::new(dir.path());
        assert_eq!(lint(&ctx, None), lint(&ctx, None));
    }

    #[test]
    fn test_issue_cap_keeps_full_summary() {
        let dir = tempdir().unwrap();
        let source: String = (0..60).map(|i| format!("x{} = 1  # TODO\n", i)).collect();
        fs::write(dir.path().join("many.py"), source).unwrap();

        let result = lint(&ExecutionContext::new(dir.path()), None);
        let report = result.payload().unwrap();
        assert_eq!(report.issues.len(), 50);
        assert_eq!(report.summary.warnings, 60);
        assert_eq!(report.summary.total, 60);

        let ctx = ExecutionContext::new(dir.path()).with_config(ToolsConfig::new().with_max_issues(5));
        assert_eq!(lint(&ctx, None).payload().unwrap().issues.len(), 5);
    }

    #[test]
    fn test_explicit_file() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("one.py"), "def f():\n    pass\n").unwrap();
        fs::write(dir.path().join("two.py"), "def g():\n    pass\n").unwrap();

        let result = lint(&ExecutionContext::new(dir.path()), Some("two.py"));
        let report = result.payload().unwrap();
        assert_eq!(report.files_checked, vec!["two.py"]);
        assert_eq!(messages(&report.issues), vec!["Missing docstring for g"]);
    }

    #[test]
    fn test_missing_explicit_file_is_skipped() {
        let dir = tempdir().unwrap();
        let result = lint(&ExecutionContext::new(dir.path()), Some("ghost.py"));
        assert!(result.success());
        let report = result.payload().unwrap();
        assert!(report.files_checked.is_empty());
        assert!(report.issues.is_empty());
    }

    #[test]
    fn test_explicit_file_outside_workspace_is_denied() {
        let dir = tempdir().unwrap();
        let result = lint(&ExecutionContext::new(dir.path()), Some("../other.py"));
        assert_eq!(result.error_kind(), Some(ErrorKind::AccessDenied));
    }

    #[test]
    fn test_undecodable_file_is_error_issue() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("latin.py"), [0x78, 0x3d, 0xff, 0xfe, 0x0a]).unwrap();

        let result = lint(&ExecutionContext::new(dir.path()), None);
        assert!(result.success());
        let report = result.payload().unwrap();
        assert_eq!(report.issues.len(), 1);
        assert_eq!(report.issues[0].kind, IssueKind::Error);
        assert_eq!(report.issues[0].line, 0);
        assert!(report.issues[0].message.starts_with("Could not parse: "));
        assert_eq!(report.summary.errors, 1);
    }
}
