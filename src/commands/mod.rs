//! Top-level subcommand implementations and their shared setup.
pub mod keys;
pub mod run;
pub mod values;
pub mod version;

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};

use crate::cli::GlobalOpts;
use crate::config::ProfileRegistry;
use crate::config::loader::load_descriptor;

/// Resolve the project root: `--root` / `MERGE_ROOT`, else the current
/// directory, canonicalized.
///
/// # Errors
///
/// Returns an error if the directory does not exist or the current
/// directory cannot be determined.
pub fn resolve_root(global: &GlobalOpts) -> Result<PathBuf> {
    let root = match &global.root {
        Some(root) => root.clone(),
        None => std::env::current_dir().context("cannot determine current directory")?,
    };
    dunce::canonicalize(&root)
        .with_context(|| format!("project root '{}' is not accessible", root.display()))
}

/// Path of the project descriptor: `--config`, else `<root>/package.json`.
#[must_use]
pub fn descriptor_path(global: &GlobalOpts, root: &Path) -> PathBuf {
    global
        .config
        .clone()
        .unwrap_or_else(|| root.join("package.json"))
}

/// Load the project descriptor and layer it over the built-in profiles.
///
/// # Errors
///
/// Returns an error if the descriptor exists but cannot be read or parsed.
pub fn load_registry(global: &GlobalOpts, root: &Path) -> Result<ProfileRegistry> {
    let path = descriptor_path(global, root);
    let project = load_descriptor(&path)?;
    tracing::debug!(
        "loaded {} profile(s) from {}",
        project.len(),
        path.display()
    );
    Ok(ProfileRegistry::with_builtin_defaults(project))
}
