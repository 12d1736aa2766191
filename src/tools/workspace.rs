//! Path containment for the workspace sandbox.
//!
//! Every path an agent hands us is resolved to an absolute form with symlinks
//! followed and `.`/`..` collapsed, then compared component-wise against the
//! equally resolved workspace root. Nothing else in the crate opens a path
//! the agent supplied without going through [`resolve_in_workspace`].

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use tracing::warn;

use crate::error::ToolError;

/// Upper bound on symlinks followed while resolving one path.
const MAX_LINK_HOPS: usize = 40;

/// Resolve the workspace root itself.
pub fn canonical_root(root: &Path) -> Result<PathBuf, ToolError> {
    root.canonicalize().map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => {
            ToolError::NotFound(format!("Workspace not found: {}", root.display()))
        }
        _ => ToolError::Io(e),
    })
}

/// Resolve `candidate` relative to `root` and require the result to stay
/// inside `root`.
///
/// The candidate does not need to exist. Existing symlinks along the way are
/// followed, so a link pointing outside the workspace is rejected even though
/// its own path looks harmless.
///
/// # Errors
///
/// - `InvalidParameters` for empty candidates or embedded NUL bytes
/// - `AccessDenied` when the resolved path escapes the root
pub fn resolve_in_workspace(root: &Path, candidate: &str) -> Result<PathBuf, ToolError> {
    if candidate.trim().is_empty() {
        return Err(ToolError::InvalidParameters(
            "Path cannot be empty".to_string(),
        ));
    }

    if candidate.contains('\0') {
        return Err(ToolError::InvalidParameters(
            "Path contains invalid null character".to_string(),
        ));
    }

    let root = canonical_root(root)?;
    let resolved = resolve_path(&root.join(candidate))?;

    if !resolved.starts_with(&root) {
        warn!(
            candidate = candidate,
            resolved = %resolved.display(),
            "Rejected path outside workspace"
        );
        return Err(ToolError::AccessDenied);
    }

    Ok(resolved)
}

/// Render `path` relative to `root` with `/` separators; the root itself is `.`.
pub fn relative_display(root: &Path, path: &Path) -> String {
    match path.strip_prefix(root) {
        Ok(rel) if rel.as_os_str().is_empty() => ".".to_string(),
        Ok(rel) => rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/"),
        Err(_) => path.display().to_string(),
    }
}

/// Resolve a path without requiring it to exist.
///
/// Walks the components left to right. `..` pops the path built so far, which
/// by then has had every symlink replaced by its target, so `link/..` lands
/// next to the link's target like the kernel would.
fn resolve_path(path: &Path) -> Result<PathBuf, ToolError> {
    let mut hops = 0;
    resolve_components(path, &mut hops)
}

fn resolve_components(path: &Path, hops: &mut usize) -> Result<PathBuf, ToolError> {
    let mut resolved = PathBuf::new();

    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => resolved.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                resolved.pop();
            }
            Component::Normal(name) => {
                resolved.push(name);
                resolved = follow_symlink(resolved, hops)?;
            }
        }
    }

    Ok(resolved)
}

/// Replace `path` by its target if it is a symlink; leave it as is otherwise.
///
/// A dangling link's target is resolved component by component again, so
/// symlinks inside the target are followed before any later `..` applies.
fn follow_symlink(path: PathBuf, hops: &mut usize) -> Result<PathBuf, ToolError> {
    let is_link = match fs::symlink_metadata(&path) {
        Ok(meta) => meta.file_type().is_symlink(),
        Err(e) if e.kind() == io::ErrorKind::NotFound => false,
        Err(e) => return Err(ToolError::Io(e)),
    };

    if !is_link {
        return Ok(path);
    }

    *hops += 1;
    if *hops > MAX_LINK_HOPS {
        return Err(ToolError::Internal(format!(
            "Too many levels of symbolic links: {}",
            path.display()
        )));
    }

    match path.canonicalize() {
        Ok(target) => Ok(target),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            let target = fs::read_link(&path)?;
            let base = path.parent().map(Path::to_path_buf).unwrap_or_default();
            resolve_components(&base.join(target), hops)
        }
        Err(e) => Err(ToolError::Io(e)),
    }
}
