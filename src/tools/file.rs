//! File access tools confined to the workspace.
//!
//! This module provides two file-related tools:
//! - `ReadFileTool`: Read one file, truncated to a byte ceiling
//! - `ListFilesTool`: List one directory level, directories and files apart

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs::{self, File};
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

use super::workspace::{canonical_root, relative_display, resolve_in_workspace};
use super::{parse_params, ExecutionContext, Payload, Tool, ToolResult};
use crate::error::ToolError;

/// Marker appended to content cut at the read ceiling.
pub const TRUNCATION_MARKER: &str = "\n... (truncated)";

/// Extra bytes read past the ceiling so a character straddling it can still
/// be decoded.
const LOOKAHEAD_BYTES: u64 = 4;

// ============================================================================
// read_file
// ============================================================================

/// Content of a file read from the workspace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileContent {
    /// File content, possibly cut at the ceiling with [`TRUNCATION_MARKER`] appended.
    pub content: String,
    /// Path as requested.
    pub path: String,
    /// True size of the file on disk, in bytes.
    pub size: u64,
    /// Whether `content` was cut.
    pub truncated: bool,
}

impl Payload for FileContent {}

/// Read a single file inside the workspace.
pub fn read_file(ctx: &ExecutionContext, path: &str) -> ToolResult<FileContent> {
    read_file_inner(ctx, path).into()
}

fn read_file_inner(ctx: &ExecutionContext, path: &str) -> Result<FileContent, ToolError> {
    let absolute = resolve_in_workspace(&ctx.workspace_root, path)?;

    if !absolute.exists() {
        return Err(ToolError::NotFound(format!("File not found: {}", path)));
    }
    if !absolute.is_file() {
        return Err(ToolError::WrongType(format!("Not a file: {}", path)));
    }

    let ceiling = ctx.config.max_read_bytes;
    let file = File::open(&absolute)?;
    let size = file.metadata()?.len();

    let mut bytes = Vec::with_capacity(ceiling.min(size as usize) + LOOKAHEAD_BYTES as usize);
    file.take(ceiling as u64 + LOOKAHEAD_BYTES)
        .read_to_end(&mut bytes)?;

    let mut content = String::from_utf8_lossy(&bytes).into_owned();
    let truncated = size > ceiling as u64;
    if truncated {
        content.truncate(floor_char_boundary(&content, ceiling));
        content.push_str(TRUNCATION_MARKER);
    }

    info!(
        path = path,
        size = size,
        truncated = truncated,
        "Read file from workspace"
    );

    Ok(FileContent {
        content,
        path: path.to_string(),
        size,
        truncated,
    })
}

/// Largest index `<= index` that lies on a character boundary of `s`.
fn floor_char_boundary(s: &str, index: usize) -> usize {
    if index >= s.len() {
        return s.len();
    }
    let mut i = index;
    while !s.is_char_boundary(i) {
        i -= 1;
    }
    i
}

/// Parameters for the read_file tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ReadFileParams {
    /// Path to the file, relative to the workspace root.
    path: String,
}

/// Tool for reading file contents from the workspace.
pub struct ReadFileTool;

#[async_trait]
impl Tool for ReadFileTool {
    fn name(&self) -> &str {
        "read_file"
    }

    fn description(&self) -> &str {
        "Read the contents of a file in the workspace. Large files are truncated with a visible marker; the true size is always reported."
    }

    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "Path to the file, relative to the workspace root"
                }
            },
            "required": ["path"]
        })
    }

    async fn execute(&self, args: Value, ctx: &ExecutionContext) -> Result<Value, ToolError> {
        let params: ReadFileParams = parse_params(args)?;
        Ok(read_file(ctx, &params.path).to_json())
    }
}

// ============================================================================
// list_files
// ============================================================================

/// Kind of a directory entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Directory,
}

/// One entry of a directory listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileEntry {
    pub name: String,
    /// Path relative to the workspace root.
    pub path: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    /// Size in bytes, files only.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub size: Option<u64>,
}

/// A single directory level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectoryListing {
    /// Directory as requested.
    pub directory: String,
    pub directories: Vec<FileEntry>,
    pub files: Vec<FileEntry>,
    pub total: usize,
}

impl Payload for DirectoryListing {}

/// List one level of a directory inside the workspace.
pub fn list_files(ctx: &ExecutionContext, directory: &str) -> ToolResult<DirectoryListing> {
    list_files_inner(ctx, directory).into()
}

fn list_files_inner(ctx: &ExecutionContext, directory: &str) -> Result<DirectoryListing, ToolError> {
    let root = canonical_root(&ctx.workspace_root)?;
    let absolute = resolve_in_workspace(&root, directory)?;

    if !absolute.exists() {
        return Err(ToolError::NotFound(format!(
            "Directory not found: {}",
            directory
        )));
    }
    if !absolute.is_dir() {
        return Err(ToolError::WrongType(format!(
            "Not a directory: {}",
            directory
        )));
    }

    let mut directories = Vec::new();
    let mut files = Vec::new();

    for entry in fs::read_dir(&absolute)? {
        let entry = entry?;
        let item = entry.path();
        let name = entry.file_name().to_string_lossy().into_owned();
        let rel_path = relative_display(&root, &item);

        // Follow symlinks for the type, like the agent would see with `ls -L`;
        // fall back to the link itself when it dangles.
        let metadata = match fs::metadata(&item) {
            Ok(meta) => meta,
            Err(_) => fs::symlink_metadata(&item)?,
        };

        if metadata.is_dir() {
            directories.push(FileEntry {
                name,
                path: rel_path,
                kind: EntryKind::Directory,
                size: None,
            });
        } else {
            files.push(FileEntry {
                name,
                path: rel_path,
                kind: EntryKind::File,
                size: Some(metadata.len()),
            });
        }
    }

    directories.sort_by(|a, b| a.name.cmp(&b.name));
    files.sort_by(|a, b| a.name.cmp(&b.name));

    let total = directories.len() + files.len();
    debug!(
        directory = directory,
        directories = directories.len(),
        files = files.len(),
        "Listed workspace directory"
    );

    Ok(DirectoryListing {
        directory: directory.to_string(),
        directories,
        files,
        total,
    })
}

fn default_directory() -> String {
    ".".to_string()
}

/// Parameters for the list_files tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ListFilesParams {
    /// Directory relative to the workspace root (defaults to the root).
    #[serde(default = "default_directory")]
    directory: String,
}

/// Tool for listing one directory level of the workspace.
pub struct ListFilesTool;

#[async_trait]
impl Tool for ListFilesTool {
    fn name(&self) -> &str {
        "list_files"
    }

    fn description(&self) -> &str {
        "List the files and subdirectories of a workspace directory (one level, no recursion). File entries include their size in bytes."
    }

    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "directory": {
                    "type": "string",
                    "description": "Directory relative to the workspace root",
                    "default": "."
                }
            }
        })
    }

    async fn execute(&self, args: Value, ctx: &ExecutionContext) -> Result<Value, ToolError> {
        let params: ListFilesParams = parse_params(args)?;
        Ok(list_files(ctx, &params.directory).to_json())
    }
}

/// True when `path` exists and is a regular file.
pub(crate) fn is_regular_file(path: &Path) -> bool {
    fs::metadata(path).map(|m| m.is_file()).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ToolsConfig;
    use crate::error::ErrorKind;
    use tempfile::tempdir;

    fn ctx_for(dir: &Path) -> ExecutionContext {
        ExecutionContext::new(dir)
    }

    #[test]
    fn test_read_file_success() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("hello.py"), "print('hi')\n").unwrap();

        let result = read_file(&ctx_for(dir.path()), "hello.py");
        assert!(result.success());
        let payload = result.payload().unwrap();
        assert_eq!(payload.content, "print('hi')\n");
        assert_eq!(payload.size, 12);
        assert_eq!(payload.path, "hello.py");
        assert!(!payload.truncated);
    }

    #[test]
    fn test_read_file_truncates_at_ceiling() {
        let dir = tempdir().unwrap();
        let ceiling = 100_000;
        fs::write(dir.path().join("big.txt"), "a".repeat(ceiling + 2_345)).unwrap();

        let result = read_file(&ctx_for(dir.path()), "big.txt");
        let payload = result.payload().unwrap();
        assert!(payload.truncated);
        assert_eq!(payload.size, (ceiling + 2_345) as u64);
        assert_eq!(payload.content.len(), ceiling + TRUNCATION_MARKER.len());
        assert!(payload.content.ends_with(TRUNCATION_MARKER));
    }

    #[test]
    fn test_read_file_exactly_at_ceiling_is_not_truncated() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("edge.txt"), "b".repeat(10)).unwrap();
        let ctx = ctx_for(dir.path()).with_config(ToolsConfig::new().with_max_read_bytes(10));

        let payload = read_file(&ctx, "edge.txt").payload().cloned().unwrap();
        assert!(!payload.truncated);
        assert_eq!(payload.content, "b".repeat(10));
    }

    #[test]
    fn test_read_file_truncation_respects_char_boundaries() {
        let dir = tempdir().unwrap();
        // 'é' is two bytes; a 5-byte ceiling falls inside the third one.
        fs::write(dir.path().join("utf8.txt"), "éééééé").unwrap();
        let ctx = ctx_for(dir.path()).with_config(ToolsConfig::new().with_max_read_bytes(5));

        let payload = read_file(&ctx, "utf8.txt").payload().cloned().unwrap();
        assert!(payload.truncated);
        assert_eq!(payload.content, format!("éé{}", TRUNCATION_MARKER));
        assert_eq!(payload.size, 12);
    }

    #[test]
    fn test_read_file_not_found() {
        let dir = tempdir().unwrap();
        let result = read_file(&ctx_for(dir.path()), "missing.txt");
        assert_eq!(result.error_kind(), Some(ErrorKind::NotFound));
        assert_eq!(
            result.failure_info().unwrap().message,
            "File not found: missing.txt"
        );
    }

    #[test]
    fn test_read_file_on_directory() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("pkg")).unwrap();
        let result = read_file(&ctx_for(dir.path()), "pkg");
        assert_eq!(result.error_kind(), Some(ErrorKind::WrongType));
    }

    #[test]
    fn test_read_file_outside_workspace() {
        let parent = tempdir().unwrap();
        let ws = parent.path().join("ws");
        fs::create_dir(&ws).unwrap();
        fs::write(parent.path().join("secret.txt"), "s").unwrap();

        let result = read_file(&ctx_for(&ws), "../secret.txt");
        assert_eq!(result.error_kind(), Some(ErrorKind::AccessDenied));
        let json = result.to_json();
        assert_eq!(json["error"], "Access denied: Path outside workspace");
    }

    #[cfg(unix)]
    #[test]
    fn test_read_file_through_dangling_link_chain_is_denied() {
        let outside = tempdir().unwrap();
        fs::write(outside.path().join("secret.txt"), "TOP SECRET").unwrap();
        let dir = tempdir().unwrap();
        std::os::unix::fs::symlink(outside.path(), dir.path().join("inner")).unwrap();
        std::os::unix::fs::symlink("inner/missing", dir.path().join("d")).unwrap();

        let result = read_file(&ctx_for(dir.path()), "d/../secret.txt");
        assert_eq!(result.error_kind(), Some(ErrorKind::AccessDenied));
        assert!(result.payload().is_none());
    }

    #[test]
    fn test_list_files_basic() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("b.py"), "x = 1\n").unwrap();
        fs::write(dir.path().join("a.txt"), "").unwrap();
        fs::create_dir(dir.path().join("src")).unwrap();
        fs::create_dir(dir.path().join("docs")).unwrap();

        let result = list_files(&ctx_for(dir.path()), ".");
        assert!(result.success());
        let listing = result.payload().unwrap();
        assert_eq!(listing.total, 4);

        let dir_names: Vec<&str> = listing.directories.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(dir_names, vec!["docs", "src"]);
        assert!(listing.directories.iter().all(|e| e.size.is_none()));

        let file_names: Vec<&str> = listing.files.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(file_names, vec!["a.txt", "b.py"]);
        assert_eq!(listing.files[1].size, Some(6));
        assert_eq!(listing.files[1].kind, EntryKind::File);
    }

    #[test]
    fn test_list_files_nested_paths_are_workspace_relative() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("pkg/inner")).unwrap();
        fs::write(dir.path().join("pkg/mod.py"), "").unwrap();

        let listing = list_files(&ctx_for(dir.path()), "pkg")
            .payload()
            .cloned()
            .unwrap();
        assert_eq!(listing.directory, "pkg");
        assert_eq!(listing.directories[0].path, "pkg/inner");
        assert_eq!(listing.files[0].path, "pkg/mod.py");
    }

    #[test]
    fn test_list_files_is_not_recursive() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("a/b/c")).unwrap();
        fs::write(dir.path().join("a/b/c/deep.txt"), "").unwrap();

        let listing = list_files(&ctx_for(dir.path()), ".").payload().cloned().unwrap();
        assert_eq!(listing.total, 1);
        assert!(listing.files.is_empty());
    }

    #[test]
    fn test_list_files_empty_directory() {
        let dir = tempdir().unwrap();
        let result = list_files(&ctx_for(dir.path()), ".");
        assert!(result.success());
        let json = result.to_json();
        assert_eq!(json["directories"], serde_json::json!([]));
        assert_eq!(json["files"], serde_json::json!([]));
        assert_eq!(json["total"], 0);
    }

    #[test]
    fn test_list_files_errors() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("file.txt"), "").unwrap();
        let ctx = ctx_for(dir.path());

        assert_eq!(
            list_files(&ctx, "nope").error_kind(),
            Some(ErrorKind::NotFound)
        );
        assert_eq!(
            list_files(&ctx, "file.txt").error_kind(),
            Some(ErrorKind::WrongType)
        );
        assert_eq!(
            list_files(&ctx, "..").error_kind(),
            Some(ErrorKind::AccessDenied)
        );
    }

    #[test]
    fn test_read_file_tool_name() {
        assert_eq!(ReadFileTool.name(), "read_file");
        let schema = ReadFileTool.parameters_schema();
        assert!(schema["properties"]["path"].is_object());
    }

    #[tokio::test]
    async fn test_list_files_tool_defaults_to_root() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("x.py"), "").unwrap();
        let ctx = ctx_for(dir.path());

        let envelope = ListFilesTool.execute(Value::Null, &ctx).await.unwrap();
        assert_eq!(envelope["success"], true);
        assert_eq!(envelope["directory"], ".");
        assert_eq!(envelope["files"][0]["type"], "file");
    }

    #[tokio::test]
    async fn test_read_file_tool_missing_path_param() {
        let dir = tempdir().unwrap();
        let ctx = ctx_for(dir.path());
        let result = ReadFileTool.execute(serde_json::json!({}), &ctx).await;
        assert!(matches!(result, Err(ToolError::InvalidParameters(_))));
    }

    #[test]
    fn test_is_regular_file() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("f"), "").unwrap();
        assert!(is_regular_file(&dir.path().join("f")));
        assert!(!is_regular_file(dir.path()));
    }
}
