//! Checks shared by the file-based task executors.
use anyhow::Result;

use super::Context;
use crate::config::FileSelector;
use crate::error::TaskError;
use crate::matcher::{MatchResult, min_matches};

/// Name used in diagnostics: `<profile>: <label>` or `<profile>: <kind>`.
pub(super) fn task_name(profile: &str, label: Option<&str>, kind: &str) -> String {
    format!("{profile}: {}", label.unwrap_or(kind))
}

/// Enforce the minimum match count of a `required` selector.
///
/// In dry-run mode a shortfall is logged and the task carries on.
pub(super) fn check_required(
    selector: &FileSelector,
    found: usize,
    ctx: &Context,
    name: &str,
) -> Result<()> {
    if !selector.required {
        return Ok(());
    }
    let expected = min_matches(selector);
    if found >= expected {
        return Ok(());
    }
    let err = TaskError::InsufficientMatches {
        task: name.to_string(),
        expected,
        found,
    };
    if ctx.dry_run {
        ctx.log.error(&err.to_string());
        Ok(())
    } else {
        Err(err.into())
    }
}

/// Check every matched source and target against the project root before
/// anything is touched.
pub(super) fn check_contained(ctx: &Context, matches: &[MatchResult]) -> Result<()> {
    for m in matches {
        ctx.check_within_root(&m.source)?;
        ctx.check_within_root(&m.target)?;
    }
    Ok(())
}

/// Report a value that could not be sourced from another document.
///
/// Required: fatal, or a logged error in dry-run. Otherwise a warning; the
/// caller leaves the content unchanged.
pub(super) fn missing_value(
    err: impl Into<anyhow::Error> + std::fmt::Display,
    required: bool,
    ctx: &Context,
) -> Result<()> {
    if !required {
        ctx.log.warn(&format!("{err}, leaving unchanged"));
        Ok(())
    } else if ctx.dry_run {
        ctx.log.error(&err.to_string());
        Ok(())
    } else {
        Err(err.into())
    }
}
