// Shared helpers for integration tests.
//
// Provides a temporary-directory-backed project and a fluent builder so each
// integration test can lay out source files and a descriptor without
// repeating filesystem boilerplate.
//
// Used by all integration test binaries that declare `mod common;`.
#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use codemucker_merge::cli::{GlobalOpts, RunOpts, ValuesOpts};
use codemucker_merge::commands;
use codemucker_merge::logging::Logger;

/// An isolated project backed by a [`tempfile::TempDir`].
///
/// The directory is automatically deleted when dropped.
pub struct ProjectContext {
    /// Temporary directory acting as the project root.
    pub root: tempfile::TempDir,
}

impl ProjectContext {
    /// Create an empty project.
    pub fn new() -> Self {
        let root = tempfile::tempdir().expect("create temp dir");
        Self { root }
    }

    /// Path to the project root.
    pub fn root_path(&self) -> &Path {
        self.root.path()
    }

    /// Global options pointing at this project.
    pub fn global(&self) -> GlobalOpts {
        GlobalOpts {
            root: Some(self.root.path().to_path_buf()),
            ..GlobalOpts::default()
        }
    }

    /// Run profile `key` through the `run` command.
    pub fn run(&self, key: &str, dry_run: bool) -> Result<Arc<Logger>> {
        let log = Arc::new(Logger::new());
        let opts = RunOpts {
            key: key.to_string(),
            dry_run,
        };
        commands::run::run(&self.global(), &opts, &log, None)?;
        Ok(log)
    }

    /// Resolved profile `key` as printed by the `values` command.
    pub fn values(&self, key: &str) -> serde_json::Value {
        let mut out = Vec::new();
        let opts = ValuesOpts {
            key: key.to_string(),
        };
        commands::values::run(&self.global(), &opts, &mut out).expect("values command");
        serde_json::from_slice(&out).expect("values output is JSON")
    }

    /// Contents of `relative`, or `None` if it does not exist.
    pub fn read(&self, relative: &str) -> Option<String> {
        std::fs::read_to_string(self.root.path().join(relative)).ok()
    }

    /// Parse `relative` as JSON.
    pub fn read_json(&self, relative: &str) -> serde_json::Value {
        let content = self.read(relative).expect("file exists");
        serde_json::from_str(&content).expect("file is JSON")
    }

    /// Whether `relative` exists.
    pub fn exists(&self, relative: &str) -> bool {
        self.root.path().join(relative).exists()
    }

    /// Every file under the root, as sorted `/`-separated relative paths.
    pub fn files(&self) -> Vec<String> {
        fn walk(base: &Path, dir: &Path, out: &mut Vec<String>) {
            for entry in std::fs::read_dir(dir).expect("read dir") {
                let path = entry.expect("dir entry").path();
                if path.is_dir() {
                    walk(base, &path, out);
                } else {
                    let relative = path.strip_prefix(base).expect("under base");
                    out.push(relative.to_string_lossy().replace('\\', "/"));
                }
            }
        }
        let mut out = Vec::new();
        walk(self.root.path(), self.root.path(), &mut out);
        out.sort();
        out
    }
}

/// Fluent builder for [`ProjectContext`].
pub struct ProjectBuilder {
    ctx: ProjectContext,
}

impl ProjectBuilder {
    /// Begin building an empty project.
    pub fn new() -> Self {
        Self {
            ctx: ProjectContext::new(),
        }
    }

    /// Write `content` to `relative`, creating parent directories.
    pub fn with_file(self, relative: &str, content: &str) -> Self {
        let path = self.ctx.root.path().join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create parent dir");
        }
        std::fs::write(&path, content).expect("write file");
        self
    }

    /// Write the project descriptor (`package.json`).
    pub fn with_descriptor(self, descriptor: &serde_json::Value) -> Self {
        let content = serde_json::to_string_pretty(descriptor).expect("serialize descriptor");
        self.with_file("package.json", &format!("{content}\n"))
    }

    /// Finish building and return the configured project.
    pub fn build(self) -> ProjectContext {
        self.ctx
    }
}
