//! Enumerate the (source, target) pairs a task operates on.
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::Result;
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};

use crate::config::{FileSelector, Profile};
use crate::error::TaskError;
use crate::paths::normalize;
use crate::tasks::Context;

/// Patterns used when a task declares no `include`.
const MATCH_ALL: [&str; 2] = ["*", "**/*"];

/// One matched file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchResult {
    /// Absolute path of the matched file.
    pub source: PathBuf,
    /// Absolute path the task writes to (for copy) or reports against.
    pub target: PathBuf,
    /// Path of the match relative to the source directory.
    pub relative: PathBuf,
}

/// Source and destination directories for tasks that declare none.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Defaults {
    /// Default source directory, relative to the project root.
    pub src_dir: PathBuf,
    /// Default destination directory, relative to the project root.
    pub dest: PathBuf,
}

impl Defaults {
    /// Take the defaults from a resolved profile.
    #[must_use]
    pub fn from_profile(profile: &Profile) -> Self {
        Self {
            src_dir: PathBuf::from(&profile.default_src),
            dest: PathBuf::from(&profile.default_dest),
        }
    }
}

/// Directory the selector's patterns are matched in, relative to the root.
///
/// With `from_package`, `src_dir` is taken inside the installed package
/// (`node_modules/<package>`), and the package root is used when `src_dir`
/// is absent.
#[must_use]
pub fn source_dir(selector: &FileSelector, defaults: &Defaults) -> PathBuf {
    match &selector.from_package {
        Some(package) => match &selector.src_dir {
            Some(dir) => package_dir(package).join(dir),
            None => package_dir(package),
        },
        None => selector
            .src_dir
            .as_ref()
            .map_or_else(|| defaults.src_dir.clone(), PathBuf::from),
    }
}

/// Install location of `package`, relative to the root.
#[must_use]
pub fn package_dir(package: &str) -> PathBuf {
    Path::new("node_modules").join(package)
}

fn is_wildcard(pattern: &str) -> bool {
    pattern.contains(['*', '?', '[', '{'])
}

fn patterns(selector: &FileSelector) -> Vec<&str> {
    selector.include.as_ref().map_or_else(
        || MATCH_ALL.to_vec(),
        |include| include.as_slice().iter().map(String::as_str).collect(),
    )
}

/// Minimum number of matches a `required` selector must produce.
///
/// One per concrete (non-wildcard) pattern, and never less than one.
///
/// # Examples
///
/// ```
/// use codemucker_merge::config::{FileSelector, OneOrMany};
/// use codemucker_merge::matcher::min_matches;
///
/// let selector = FileSelector {
///     include: Some(OneOrMany::Many(vec!["LICENSE".into(), "README*".into(), "package.json".into()])),
///     ..FileSelector::default()
/// };
/// assert_eq!(min_matches(&selector), 2);
/// assert_eq!(min_matches(&FileSelector::default()), 1);
/// ```
#[must_use]
pub fn min_matches(selector: &FileSelector) -> usize {
    let concrete = selector
        .include
        .as_ref()
        .map_or(0, |include| {
            include.as_slice().iter().filter(|p| !is_wildcard(p)).count()
        });
    concrete.max(1)
}

fn build_glob_set(patterns: &[&str]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let trimmed = pattern.strip_prefix("./").unwrap_or(pattern);
        let glob = GlobBuilder::new(trimmed)
            .literal_separator(true)
            .build()
            .map_err(|e| TaskError::InvalidPattern {
                pattern: (*pattern).to_string(),
                message: e.to_string(),
            })?;
        builder.add(glob);
    }
    builder.build().map_err(|e| {
        TaskError::InvalidPattern {
            pattern: patterns.join(", "),
            message: e.to_string(),
        }
        .into()
    })
}

/// Collect every file under `dir`, as paths relative to `base`.
///
/// Directories are tracked by canonical path, so a symlink back to a
/// directory already being walked is not descended into again.
fn collect_files(
    ctx: &Context,
    base: &Path,
    dir: &Path,
    visited: &mut HashSet<PathBuf>,
    out: &mut Vec<PathBuf>,
) -> Result<()> {
    if !visited.insert(ctx.fs_ops.canonicalize(dir)) {
        ctx.log.debug(&format!(
            "not descending into {}: directory already walked",
            dir.display()
        ));
        return Ok(());
    }
    for entry in ctx.fs_ops.read_dir(dir)? {
        if ctx.fs_ops.is_dir(&entry) {
            collect_files(ctx, base, &entry, visited, out)?;
        } else if ctx.fs_ops.is_file(&entry)
            && let Ok(relative) = entry.strip_prefix(base)
        {
            out.push(relative.to_path_buf());
        }
    }
    Ok(())
}

/// `/`-separated form of a relative path, as matched by the glob set.
fn slash_path(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Find the files selected by `selector`, sorted by relative path.
///
/// A missing source directory yields no matches. Paths are normalized but
/// *not* checked for containment; executors do that before touching
/// anything.
///
/// # Errors
///
/// Returns [`TaskError::InvalidPattern`] for a malformed glob, or an I/O
/// error if a directory cannot be listed.
pub fn find_files(
    selector: &FileSelector,
    defaults: &Defaults,
    ctx: &Context,
) -> Result<Vec<MatchResult>> {
    let src_dir = normalize(&ctx.root, &source_dir(selector, defaults));
    let dest_dir = selector
        .dest
        .as_ref()
        .map_or_else(|| defaults.dest.clone(), PathBuf::from);
    let patterns = patterns(selector);
    let globs = build_glob_set(&patterns)?;

    if !ctx.fs_ops.is_dir(&src_dir) {
        ctx.log.debug(&format!(
            "source dir {} does not exist, nothing matched",
            src_dir.display()
        ));
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    collect_files(ctx, &src_dir, &src_dir, &mut HashSet::new(), &mut files)?;
    files.retain(|relative| globs.is_match(slash_path(relative)));
    files.sort();

    if selector.target.is_some() && files.len() > 1 {
        ctx.log.warn(&format!(
            "{} files matched {patterns:?} but 'target' is set; all of them map onto the same target",
            files.len()
        ));
    }

    let results = files
        .into_iter()
        .map(|relative| {
            let target = selector.target.as_ref().map_or_else(
                || normalize(&ctx.root, &dest_dir.join(&relative)),
                |target| normalize(&ctx.root, Path::new(target)),
            );
            MatchResult {
                source: src_dir.join(&relative),
                target,
                relative,
            }
        })
        .collect::<Vec<_>>();

    ctx.log.debug(&format!(
        "matched {} file(s) in {} with {patterns:?}",
        results.len(),
        src_dir.display()
    ));
    Ok(results)
}
