//! In-place content rewriting of matched files.
//!
//! The new content of each file is computed completely in memory and written
//! back atomically, and only when it differs from what is on disk.
use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use regex::{Captures, Regex};
use serde_json::Value;

use super::helpers::{check_contained, check_required, missing_value, task_name};
use super::{Context, TaskResult, TaskStats};
use crate::config::{ExpressionType, UpdateTask};
use crate::document::{NodeUpdate, find_nodes, update_nodes};
use crate::error::{DocumentError, TaskError};
use crate::matcher::{Defaults, find_files, package_dir};
use crate::paths::normalize;

/// Content type inferred from a file name when a task sets no `expressionType`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    /// `.json`
    Json,
    /// `.properties`, `.env`
    Property,
    /// Anything else.
    Text,
}

impl ContentType {
    /// Classify `path` by its file name.
    ///
    /// # Examples
    ///
    /// ```
    /// use codemucker_merge::tasks::update::ContentType;
    /// use std::path::Path;
    ///
    /// assert_eq!(ContentType::from_path(Path::new("package.json")), ContentType::Json);
    /// assert_eq!(ContentType::from_path(Path::new(".env")), ContentType::Property);
    /// assert_eq!(ContentType::from_path(Path::new("index.js.map")), ContentType::Text);
    /// ```
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();
        if name.ends_with(".json") {
            Self::Json
        } else if name.ends_with(".properties") || name.ends_with(".env") {
            Self::Property
        } else {
            Self::Text
        }
    }
}

impl From<ContentType> for ExpressionType {
    fn from(content: ContentType) -> Self {
        match content {
            ContentType::Json => Self::Json,
            ContentType::Property => Self::Property,
            ContentType::Text => Self::Text,
        }
    }
}

/// The document a replacement value is sourced from (`fromFile`).
struct ValueSource {
    path: PathBuf,
    content: String,
}

/// One `key=value` line rewrite.
struct PropertyEdit {
    pattern: Regex,
    value: String,
}

/// Literal replacement text: strings verbatim, other values as JSON.
fn literal(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Pattern matching a `key=value` line, optionally prefixed with `export`
/// as in `.env` files; group 1 is everything up to the value.
fn property_pattern(key: &str) -> Result<Regex> {
    let pattern = format!(
        r"(?m)^([ \t]*(?:export[ \t]+)?{}[ \t]*=[ \t]*)([^\r\n]*)$",
        regex::escape(key)
    );
    Regex::new(&pattern).map_err(|source| {
        TaskError::InvalidRegex {
            expression: key.to_string(),
            source,
        }
        .into()
    })
}

/// Value of `key` in a properties document, with surrounding quotes removed.
fn read_property(content: &str, key: &str) -> Result<Option<String>> {
    let pattern = property_pattern(key)?;
    Ok(pattern
        .captures(content)
        .and_then(|caps| caps.get(2))
        .map(|m| {
            let raw = m.as_str().trim();
            raw.strip_prefix('"')
                .and_then(|v| v.strip_suffix('"'))
                .or_else(|| raw.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')))
                .unwrap_or(raw)
                .to_string()
        }))
}

/// Read the `fromFile` document, unless a literal `value` is given.
///
/// `fromFile` is relative to the installed package when `fromPackage` is
/// set, otherwise to the project root.
fn load_source(task: &UpdateTask, ctx: &Context) -> Result<Option<ValueSource>> {
    if task.value.is_some() {
        return Ok(None);
    }
    let Some(file) = &task.from_file else {
        return Ok(None);
    };
    let base = task.selector.from_package.as_ref().map_or_else(
        || ctx.root.clone(),
        |package| normalize(&ctx.root, &package_dir(package)),
    );
    let path = ctx.check_within_root(&base.join(file))?;
    let content = ctx
        .fs_ops
        .read_to_string(&path)
        .with_context(|| format!("reading value source '{}'", ctx.display(&path)))?;
    ctx.log
        .debug(&format!("sourcing values from '{}'", ctx.display(&path)));
    Ok(Some(ValueSource { path, content }))
}

fn parse_json(path: &Path, content: &str) -> Result<Value> {
    serde_json::from_str(content).map_err(|source| {
        TaskError::InvalidJson {
            path: path.to_path_buf(),
            source,
        }
        .into()
    })
}

/// Applies one update task to file contents.
///
/// Regexes, property edits and JSON node updates are derived from the task
/// on first use and then shared by every matched file of that content type.
struct Updater<'a> {
    task: &'a UpdateTask,
    ctx: &'a Context,
    expressions: Vec<&'a str>,
    source: Option<ValueSource>,
    regexes: Option<Vec<Regex>>,
    properties: Option<Vec<PropertyEdit>>,
    json: Option<Vec<(String, NodeUpdate)>>,
}

impl<'a> Updater<'a> {
    fn new(task: &'a UpdateTask, ctx: &'a Context, source: Option<ValueSource>) -> Self {
        Self {
            task,
            ctx,
            expressions: task.expressions(),
            source,
            regexes: None,
            properties: None,
            json: None,
        }
    }

    fn build_regexes(&self) -> Result<Vec<Regex>> {
        self.expressions
            .iter()
            .map(|expression| {
                Regex::new(expression).map_err(|source| {
                    TaskError::InvalidRegex {
                        expression: (*expression).to_string(),
                        source,
                    }
                    .into()
                })
            })
            .collect()
    }

    fn build_property_edits(&self) -> Result<Vec<PropertyEdit>> {
        let mut edits = Vec::new();
        for expression in &self.expressions {
            let value = match &self.source {
                Some(source) => {
                    let key = self.task.from_expression.as_deref().unwrap_or(expression);
                    if let Some(value) = read_property(&source.content, key)? {
                        value
                    } else {
                        missing_value(
                            DocumentError::PropertyNotFound {
                                expression: key.to_string(),
                                file: source.path.clone(),
                            },
                            self.task.selector.required,
                            self.ctx,
                        )?;
                        continue;
                    }
                }
                None => literal(self.task.value.as_ref()),
            };
            edits.push(PropertyEdit {
                pattern: property_pattern(expression)?,
                value,
            });
        }
        Ok(edits)
    }

    fn build_json_updates(&self) -> Result<Vec<(String, NodeUpdate)>> {
        let source_doc = self
            .source
            .as_ref()
            .map(|s| parse_json(&s.path, &s.content).map(|doc| (s, doc)))
            .transpose()?;

        let mut updates = Vec::new();
        for expression in &self.expressions {
            let value = match &source_doc {
                Some((source, doc)) => {
                    let key = self.task.from_expression.as_deref().unwrap_or(expression);
                    let found: Vec<&Value> = find_nodes(doc, key)
                        .iter()
                        .filter_map(|node| node.get(doc))
                        .collect();
                    match found.as_slice() {
                        [] => {
                            missing_value(
                                DocumentError::NodeNotFound {
                                    expression: key.to_string(),
                                    file: source.path.clone(),
                                },
                                self.task.selector.required,
                                self.ctx,
                            )?;
                            continue;
                        }
                        [value] => Some((*value).clone()),
                        many => {
                            return Err(DocumentError::AmbiguousNode {
                                expression: key.to_string(),
                                file: source.path.clone(),
                                count: many.len(),
                            }
                            .into());
                        }
                    }
                }
                None => self.task.value.clone(),
            };
            updates.push((
                (*expression).to_string(),
                NodeUpdate {
                    value,
                    strategy: self.task.strategy,
                },
            ));
        }
        Ok(updates)
    }

    /// Compute the updated content of the file at `path`.
    fn transform(&mut self, kind: ExpressionType, path: &Path, content: &str) -> Result<String> {
        match kind {
            ExpressionType::Text => {
                let value = literal(self.task.value.as_ref());
                Ok(self
                    .expressions
                    .iter()
                    .fold(content.to_string(), |acc, expression| {
                        acc.replace(expression, &value)
                    }))
            }
            ExpressionType::Regex => {
                if self.regexes.is_none() {
                    self.regexes = Some(self.build_regexes()?);
                }
                let value = literal(self.task.value.as_ref());
                Ok(self
                    .regexes
                    .iter()
                    .flatten()
                    .fold(content.to_string(), |acc, re| {
                        re.replace_all(&acc, value.as_str()).into_owned()
                    }))
            }
            ExpressionType::Property => {
                if self.properties.is_none() {
                    self.properties = Some(self.build_property_edits()?);
                }
                Ok(self
                    .properties
                    .iter()
                    .flatten()
                    .fold(content.to_string(), |acc, edit| {
                        edit.pattern
                            .replace_all(&acc, |caps: &Captures<'_>| {
                                let prefix = caps.get(1).map_or("", |m| m.as_str());
                                format!("{prefix}\"{}\"", edit.value)
                            })
                            .into_owned()
                    }))
            }
            ExpressionType::Json => {
                if self.json.is_none() {
                    self.json = Some(self.build_json_updates()?);
                }
                let mut doc = parse_json(path, content)?;
                update_nodes(&mut doc, self.json.as_deref().unwrap_or_default());
                let mut out = serde_json::to_string_pretty(&doc)
                    .with_context(|| format!("serializing '{}'", self.ctx.display(path)))?;
                if content.ends_with('\n') {
                    out.push('\n');
                }
                Ok(out)
            }
        }
    }
}

/// Rewrite every matched file in place.
///
/// # Errors
///
/// Returns an error if a required selector matches too few files or a
/// required value cannot be sourced (both outside dry-run), a path escapes
/// the root, a source expression is ambiguous, content fails to parse, or a
/// write fails.
pub fn run(task: &UpdateTask, ctx: &Context, defaults: &Defaults, profile: &str) -> Result<TaskResult> {
    let name = task_name(profile, task.label.as_deref(), "update");
    if task.expressions().is_empty() {
        ctx.log.warn(&format!("no 'expression' for update '{name}'"));
        return Ok(TaskResult::Skipped("no expression".to_string()));
    }

    let found = find_files(&task.selector, defaults, ctx)?;
    check_required(&task.selector, found.len(), ctx, &name)?;
    check_contained(ctx, &found)?;

    let mut updater = Updater::new(task, ctx, load_source(task, ctx)?);
    let mut stats = TaskStats::new();

    for m in &found {
        let content = ctx.fs_ops.read_to_string(&m.source)?;
        let kind = task
            .expression_type
            .unwrap_or_else(|| ContentType::from_path(&m.source).into());
        ctx.log
            .trace(&format!("updating '{}' as {kind:?}", ctx.display(&m.source)));

        let updated = updater.transform(kind, &m.source, &content)?;
        if updated == content {
            stats.already_ok += 1;
            continue;
        }
        if ctx.dry_run {
            ctx.log
                .dry_run(&format!("would update '{}'", ctx.display(&m.source)));
        } else {
            ctx.fs_ops.write_atomic(&m.source, &updated)?;
            ctx.log.debug(&format!("updated '{}'", ctx.display(&m.source)));
        }
        stats.changed += 1;
    }

    Ok(stats.finish(ctx))
}
