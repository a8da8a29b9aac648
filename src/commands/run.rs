//! Command: run a profile.
use std::sync::Arc;

use anyhow::Result;

use super::{load_registry, resolve_root};
use crate::cli::{GlobalOpts, RunOpts};
use crate::logging::{LevelHandle, Log, Logger};
use crate::orchestrator;
use crate::tasks::Context;

/// Resolve and run the profile named in `opts`, then log the summary.
///
/// When `level` is given (no level was forced on the command line), the
/// console level is switched to the profile's `logLevel` before any task
/// runs.
///
/// # Errors
///
/// Returns the first fatal error: an unresolvable profile, an unknown task
/// kind, a required-match failure, a path escaping the root, or an I/O error.
pub fn run(
    global: &GlobalOpts,
    opts: &RunOpts,
    log: &Arc<Logger>,
    level: Option<&LevelHandle>,
) -> Result<()> {
    let root = resolve_root(global)?;
    let registry = Arc::new(load_registry(global, &root)?);
    let profile = registry.resolve(&opts.key)?;

    if let Some(handle) = level {
        handle.set(profile.log_level.into())?;
    }

    log.debug(&format!("project root: {}", root.display()));
    if opts.dry_run {
        log.info("dry run: no files will be changed");
    }

    let ctx = Context::new(
        root,
        registry,
        Arc::clone(log) as Arc<dyn Log>,
        opts.dry_run,
    );
    let result = orchestrator::run_profile(&opts.key, &ctx, &mut Vec::new());
    log.print_summary();
    result
}
