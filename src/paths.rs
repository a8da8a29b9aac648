//! Lexical path resolution and the project-root containment guard.
//!
//! Nothing here touches the filesystem: paths are resolved purely by their
//! components, so a target that does not exist yet can still be checked.

use std::path::{Component, Path, PathBuf};

use anyhow::Result;

use crate::error::PathError;

/// Resolve `path` against `root`, folding `.` and `..` components.
///
/// Relative paths are joined onto `root` first; absolute paths are only
/// normalized. A `..` above the filesystem root is dropped.
///
/// # Examples
///
/// ```
/// use codemucker_merge::paths::normalize;
/// use std::path::Path;
///
/// let p = normalize(Path::new("/project"), Path::new("build/../src/./index.ts"));
/// assert_eq!(p, Path::new("/project/src/index.ts"));
/// ```
#[must_use]
pub fn normalize(root: &Path, path: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    };

    let mut out = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Normalize `path` against `root` and fail unless it lies under `root`.
///
/// The comparison is component-wise, so `/project-other` is *not* inside
/// `/project`.
///
/// # Errors
///
/// Returns [`PathError::Escape`] if the normalized path is outside `root`.
pub fn ensure_within_root(root: &Path, path: &Path) -> Result<PathBuf> {
    let root = normalize(Path::new("/"), root);
    let resolved = normalize(&root, path);
    if resolved.starts_with(&root) {
        Ok(resolved)
    } else {
        Err(PathError::Escape {
            path: resolved,
            root,
        }
        .into())
    }
}
