//! The `copy` task.
use anyhow::Result;

use super::helpers::{check_contained, check_required, task_name};
use super::{Context, TaskResult, TaskStats};
use crate::config::CopyTask;
use crate::matcher::{Defaults, find_files};

/// Copy every matched file onto its target.
///
/// All sources and targets are checked against the project root before the
/// first copy, so an escaping path aborts the task with nothing written.
///
/// # Errors
///
/// Returns an error if a required selector matches too few files (outside
/// dry-run), a path escapes the root, or a copy fails.
pub fn run(task: &CopyTask, ctx: &Context, defaults: &Defaults, profile: &str) -> Result<TaskResult> {
    let name = task_name(profile, task.label.as_deref(), "copy");
    let found = find_files(&task.selector, defaults, ctx)?;
    check_required(&task.selector, found.len(), ctx, &name)?;
    check_contained(ctx, &found)?;

    let mut stats = TaskStats::new();
    for m in &found {
        if !task.overwrite && ctx.fs_ops.exists(&m.target) {
            ctx.log.debug(&format!(
                "skipping as '{}' already exists and 'overwrite' is false",
                ctx.display(&m.target)
            ));
            stats.skipped += 1;
            continue;
        }

        if ctx.dry_run {
            ctx.log.dry_run(&format!(
                "would copy '{}' to '{}'",
                ctx.display(&m.source),
                ctx.display(&m.target)
            ));
        } else {
            ctx.fs_ops.copy_file(&m.source, &m.target)?;
            ctx.log.debug(&format!(
                "copied '{}' to '{}'",
                ctx.display(&m.source),
                ctx.display(&m.target)
            ));
        }
        stats.changed += 1;
    }

    Ok(stats.finish(ctx))
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::config::{FileSelector, OneOrMany};
    use crate::error::{PathError, TaskError};
    use crate::operations::MemoryFileSystemOps;
    use crate::tasks::test_helpers::memory_context;
    use std::path::PathBuf;

    fn defaults() -> Defaults {
        Defaults {
            src_dir: PathBuf::from("."),
            dest: PathBuf::from("build/release"),
        }
    }

    fn copy(patterns: &[&str]) -> CopyTask {
        CopyTask {
            label: None,
            selector: FileSelector {
                include: Some(OneOrMany::Many(
                    patterns.iter().map(ToString::to_string).collect(),
                )),
                ..FileSelector::default()
            },
            overwrite: true,
        }
    }

    #[test]
    fn copies_matches_to_dest() {
        let (ctx, _log, fs) = memory_context(
            MemoryFileSystemOps::new()
                .with_file("/p/LICENSE", "MIT")
                .with_file("/p/README.md", "# readme"),
        );
        let result = run(&copy(&["LICENSE", "README*"]), &ctx, &defaults(), "dist").unwrap();
        assert_eq!(result, TaskResult::Ok);
        assert_eq!(fs.contents("/p/build/release/LICENSE").as_deref(), Some("MIT"));
        assert_eq!(
            fs.contents("/p/build/release/README.md").as_deref(),
            Some("# readme")
        );
    }

    #[test]
    fn overwrite_false_keeps_existing_target() {
        let (ctx, log, fs) = memory_context(
            MemoryFileSystemOps::new()
                .with_file("/p/node_modules/tool/LICENSE", "new")
                .with_file("/p/LICENSE", "mine"),
        );
        let task = CopyTask {
            label: Some("license".to_string()),
            selector: FileSelector {
                include: Some(OneOrMany::One("LICENSE".to_string())),
                from_package: Some("tool".to_string()),
                dest: Some(".".to_string()),
                ..FileSelector::default()
            },
            overwrite: false,
        };
        run(&task, &ctx, &defaults(), "install").unwrap();
        assert_eq!(fs.contents("/p/LICENSE").as_deref(), Some("mine"));
        assert_eq!(fs.mutation_count(), 0);
        assert!(log.contains("info", "0 changed, 0 already ok, 1 skipped"));
    }

    #[test]
    fn required_shortfall_fails() {
        let (ctx, _log, fs) = memory_context(MemoryFileSystemOps::new().with_file("/p/a.txt", "a"));
        let mut task = copy(&["a.txt", "b.txt"]);
        task.selector.required = true;
        let err = run(&task, &ctx, &defaults(), "dist").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<TaskError>(),
            Some(TaskError::InsufficientMatches {
                expected: 2,
                found: 1,
                ..
            })
        ));
        assert_eq!(fs.mutation_count(), 0);
    }

    #[test]
    fn required_shortfall_is_logged_in_dry_run() {
        let (mut ctx, log, fs) =
            memory_context(MemoryFileSystemOps::new().with_file("/p/a.txt", "a"));
        ctx.dry_run = true;
        let mut task = copy(&["a.txt", "b.txt"]);
        task.selector.required = true;
        let result = run(&task, &ctx, &defaults(), "dist").unwrap();
        assert_eq!(result, TaskResult::DryRun);
        assert!(log.contains("error", "marked as 'required'"));
        assert!(log.contains("dry_run", "would copy 'a.txt' to 'build/release/a.txt'"));
        assert_eq!(fs.mutation_count(), 0);
    }

    #[test]
    fn escaping_target_writes_nothing() {
        let (ctx, _log, fs) = memory_context(
            MemoryFileSystemOps::new()
                .with_file("/p/a.txt", "a")
                .with_file("/p/b.txt", "b"),
        );
        let mut task = copy(&["*.txt"]);
        task.selector.dest = Some("../outside".to_string());
        let err = run(&task, &ctx, &defaults(), "dist").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PathError>(),
            Some(PathError::Escape { .. })
        ));
        assert_eq!(fs.mutation_count(), 0);
    }

    #[test]
    fn escaping_path_fails_in_dry_run_too() {
        let (mut ctx, _log, _fs) =
            memory_context(MemoryFileSystemOps::new().with_file("/p/a.txt", "a"));
        ctx.dry_run = true;
        let mut task = copy(&["a.txt"]);
        task.selector.target = Some("../../etc/a.txt".to_string());
        assert!(run(&task, &ctx, &defaults(), "dist").is_err());
    }
}
