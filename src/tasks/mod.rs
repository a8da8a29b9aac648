//! Executors for the four task kinds.
pub mod context;
pub mod copy;
pub mod delete;
mod helpers;
pub mod run;
pub mod update;

pub use context::Context;

use anyhow::Result;

use crate::config::Task;
use crate::error::TaskError;
use crate::logging::TaskStatus;
use crate::matcher::Defaults;

/// Result of a single task execution.
///
/// # Examples
///
/// ```
/// use codemucker_merge::tasks::TaskResult;
///
/// let skipped = TaskResult::Skipped("no expression".into());
/// assert!(matches!(skipped, TaskResult::Skipped(_)));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskResult {
    /// Task completed successfully.
    Ok,
    /// Task had nothing to do.
    Skipped(String),
    /// Task ran in dry-run mode; no changes were applied.
    DryRun,
}

/// Counters for file-level operations within a task.
///
/// # Examples
///
/// ```
/// use codemucker_merge::tasks::TaskStats;
///
/// let stats = TaskStats { changed: 1, already_ok: 2, skipped: 3 };
/// assert_eq!(stats.summary(false), "1 changed, 2 already ok, 3 skipped");
/// ```
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TaskStats {
    /// Number of files copied, deleted or rewritten.
    pub changed: u32,
    /// Number of files already in the desired state.
    pub already_ok: u32,
    /// Number of files left alone (an existing target with `overwrite: false`).
    pub skipped: u32,
}

impl TaskStats {
    /// Create a new empty stats counter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Format the stats as a human-readable summary string.
    ///
    /// # Examples
    ///
    /// ```
    /// use codemucker_merge::tasks::TaskStats;
    ///
    /// let stats = TaskStats { changed: 5, already_ok: 12, skipped: 0 };
    /// assert_eq!(stats.summary(false), "5 changed, 12 already ok");
    /// assert_eq!(stats.summary(true), "5 would change, 12 already ok");
    /// ```
    #[must_use]
    pub fn summary(&self, dry_run: bool) -> String {
        let verb = if dry_run { "would change" } else { "changed" };
        if self.skipped > 0 {
            format!(
                "{} {verb}, {} already ok, {} skipped",
                self.changed, self.already_ok, self.skipped
            )
        } else {
            format!("{} {verb}, {} already ok", self.changed, self.already_ok)
        }
    }

    /// Log the summary and return the appropriate `TaskResult`.
    #[must_use]
    pub fn finish(self, ctx: &Context) -> TaskResult {
        ctx.log.info(&self.summary(ctx.dry_run));
        if ctx.dry_run {
            TaskResult::DryRun
        } else {
            TaskResult::Ok
        }
    }
}

/// Execute one task of `profile`, recording the result in the logger.
///
/// # Errors
///
/// Returns the task's error unchanged after recording it as failed, or
/// [`TaskError::UnknownTaskKind`] for a task kind with no executor.
pub fn execute(task: &Task, ctx: &Context, defaults: &Defaults, profile: &str) -> Result<()> {
    let name = format!("{profile}: {}", task.display_name());
    ctx.log.stage(&name);

    let result = match task {
        Task::Copy(copy) => copy::run(copy, ctx, defaults, profile),
        Task::Delete(delete) => delete::run(delete, ctx, defaults, profile),
        Task::Update(update) => update::run(update, ctx, defaults, profile),
        Task::Run(group) => run::run(group, ctx, defaults, profile),
        Task::Unknown { kind } => Err(TaskError::UnknownTaskKind {
            kind: kind.clone(),
            profile: profile.to_string(),
        }
        .into()),
    };

    match result {
        Ok(TaskResult::Ok) => {
            ctx.log.record_task(&name, TaskStatus::Ok, None);
            Ok(())
        }
        Ok(TaskResult::Skipped(reason)) => {
            ctx.log.info(&format!("skipped: {reason}"));
            ctx.log.record_task(&name, TaskStatus::Skipped, Some(&reason));
            Ok(())
        }
        Ok(TaskResult::DryRun) => {
            ctx.log.record_task(&name, TaskStatus::DryRun, None);
            Ok(())
        }
        Err(e) => {
            ctx.log
                .record_task(&name, TaskStatus::Failed, Some(&format!("{e:#}")));
            Err(e)
        }
    }
}
