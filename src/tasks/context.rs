//! Shared state handed to every task executor.
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;

use crate::config::ProfileRegistry;
use crate::logging::Log;
use crate::operations::{FileSystemOps, SystemFileSystemOps};
use crate::paths::ensure_within_root;

/// Shared context for task execution.
pub struct Context {
    /// Absolute project root. Every path a task touches must lie under it.
    pub root: PathBuf,
    /// Profiles available to `preTasks`/`postTasks`.
    pub registry: Arc<ProfileRegistry>,
    /// Logger for output and task recording.
    pub log: Arc<dyn Log>,
    /// Whether to perform a dry run (preview changes without applying).
    pub dry_run: bool,
    /// Filesystem operation abstraction (injectable for testing).
    pub fs_ops: Arc<dyn FileSystemOps>,
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("root", &self.root)
            .field("registry", &"<ProfileRegistry>")
            .field("log", &"<dyn Log>")
            .field("dry_run", &self.dry_run)
            .field("fs_ops", &self.fs_ops)
            .finish()
    }
}

impl Context {
    /// Creates a new context backed by the real filesystem.
    #[must_use]
    pub fn new(
        root: PathBuf,
        registry: Arc<ProfileRegistry>,
        log: Arc<dyn Log>,
        dry_run: bool,
    ) -> Self {
        Self {
            root,
            registry,
            log,
            dry_run,
            fs_ops: Arc::new(SystemFileSystemOps),
        }
    }

    /// Fail with [`PathError::Escape`](crate::error::PathError::Escape)
    /// unless `path` resolves under the project root.
    ///
    /// # Errors
    ///
    /// Returns an error if the normalized `path` is outside [`Context::root`].
    pub fn check_within_root(&self, path: &Path) -> Result<PathBuf> {
        ensure_within_root(&self.root, path)
    }

    /// `path` relative to the root, for log messages.
    #[must_use]
    pub fn display(&self, path: &Path) -> String {
        path.strip_prefix(&self.root)
            .unwrap_or(path)
            .display()
            .to_string()
    }

    /// Create a copy of this context with a different [`FileSystemOps`] implementation.
    ///
    /// Used in tests to inject a
    /// [`MemoryFileSystemOps`](crate::operations::MemoryFileSystemOps) so that
    /// tasks can be exercised without touching the real filesystem.
    #[cfg(test)]
    #[must_use]
    pub fn with_fs_ops(&self, fs_ops: Arc<dyn FileSystemOps>) -> Self {
        Self {
            root: self.root.clone(),
            registry: Arc::clone(&self.registry),
            log: Arc::clone(&self.log),
            dry_run: self.dry_run,
            fs_ops,
        }
    }
}
