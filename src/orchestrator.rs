//! Profile execution: pre-tasks, own tasks, post-tasks.
//!
//! Execution is strictly sequential. A profile reached a second time within
//! one top-level run (through `preTasks`/`postTasks`) is skipped with a
//! warning; the keys already run are carried in an explicit stack.
use anyhow::Result;

use crate::config::Task;
use crate::matcher::Defaults;
use crate::tasks::{self, Context};

/// Run the profile `key` and, recursively, its pre- and post-tasks.
///
/// `stack` holds the keys already run in this top-level run; `key` is pushed
/// onto it and stays there.
///
/// # Errors
///
/// Returns the first resolution or task error; nothing after it runs.
pub fn run_profile(key: &str, ctx: &Context, stack: &mut Vec<String>) -> Result<()> {
    let profile = ctx.registry.resolve(key)?;

    if stack.iter().any(|k| k == key) {
        ctx.log.warn(&format!(
            "config '{key}' already run in this chain ({}), skipping",
            stack.join(" -> ")
        ));
        return Ok(());
    }
    stack.push(key.to_string());

    ctx.log.stage(&format!("running config '{key}'"));

    for pre in profile.pre_task_keys() {
        ctx.log.debug(&format!("'{key}': pre-task '{pre}'"));
        run_profile(pre, ctx, stack)?;
    }

    let defaults = Defaults::from_profile(&profile);
    ctx.log.debug(&format!(
        "'{key}': {} task(s), defaultSrc '{}', defaultDest '{}'",
        profile.tasks.len(),
        defaults.src_dir.display(),
        defaults.dest.display()
    ));
    run_tasks(&profile.tasks, ctx, &defaults, key)?;

    for post in profile.post_task_keys() {
        ctx.log.debug(&format!("'{key}': post-task '{post}'"));
        run_profile(post, ctx, stack)?;
    }

    Ok(())
}

/// Execute `tasks` in order on behalf of `profile`.
///
/// # Errors
///
/// Returns the first task error; later tasks are not run.
pub fn run_tasks(tasks: &[Task], ctx: &Context, defaults: &Defaults, profile: &str) -> Result<()> {
    for task in tasks {
        tasks::execute(task, ctx, defaults, profile)?;
    }
    Ok(())
}
