//! The `run` task: an inline group of nested tasks.
use anyhow::Result;

use super::{Context, TaskResult};
use crate::config::RunTask;
use crate::matcher::Defaults;
use crate::orchestrator::run_tasks;

/// Execute an inline task list with the enclosing profile's defaults.
///
/// # Errors
///
/// Returns the first error raised by a nested task.
pub fn run(task: &RunTask, ctx: &Context, defaults: &Defaults, profile: &str) -> Result<TaskResult> {
    if task.tasks.is_empty() {
        return Ok(TaskResult::Skipped("no nested tasks".to_string()));
    }
    run_tasks(&task.tasks, ctx, defaults, profile)?;
    Ok(if ctx.dry_run {
        TaskResult::DryRun
    } else {
        TaskResult::Ok
    })
}
