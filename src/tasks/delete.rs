//! The `delete` task.
use anyhow::Result;

use super::helpers::{check_contained, task_name};
use super::{Context, TaskResult, TaskStats};
use crate::config::DeleteTask;
use crate::matcher::{Defaults, find_files};

/// Remove every matched file from the source directory.
///
/// # Errors
///
/// Returns an error if a matched path escapes the root or a removal fails.
pub fn run(task: &DeleteTask, ctx: &Context, defaults: &Defaults, profile: &str) -> Result<TaskResult> {
    let name = task_name(profile, task.label.as_deref(), "delete");
    let found = find_files(&task.selector, defaults, ctx)?;
    check_contained(ctx, &found)?;

    if found.is_empty() {
        ctx.log.debug(&format!("{name}: nothing to delete"));
    }

    let mut stats = TaskStats::new();
    for m in &found {
        if ctx.dry_run {
            ctx.log
                .dry_run(&format!("would delete '{}'", ctx.display(&m.source)));
        } else {
            ctx.fs_ops.remove(&m.source)?;
            ctx.log.debug(&format!("deleted '{}'", ctx.display(&m.source)));
        }
        stats.changed += 1;
    }

    Ok(stats.finish(ctx))
}
