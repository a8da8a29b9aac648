//! Task definitions as declared in a profile's `tasks` list.
use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::document::UpdateStrategy;

/// A single value or a list of values.
///
/// Profile authors may write `"include": "LICENSE"` as well as
/// `"include": ["LICENSE", "README*"]`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    /// A bare value.
    One(T),
    /// A list of values.
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    /// View the value(s) as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        match self {
            Self::One(value) => std::slice::from_ref(value),
            Self::Many(values) => values,
        }
    }
}

/// Fields shared by every task that works on a set of matched files.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileSelector {
    /// File name or glob pattern(s), relative to the source directory.
    /// Absent means every file at any depth.
    pub include: Option<OneOrMany<String>>,
    /// Source directory, relative to the project root (or to the installed
    /// package when `from_package` is set).
    #[serde(alias = "dir")]
    pub src_dir: Option<String>,
    /// Destination directory, relative to the project root.
    pub dest: Option<String>,
    /// Explicit destination file; overrides `dest` for every match.
    pub target: Option<String>,
    /// Resolve `src_dir` under `node_modules/<from_package>`.
    pub from_package: Option<String>,
    /// Fail when fewer files match than the include list names.
    #[serde(default)]
    pub required: bool,
}

const fn default_overwrite() -> bool {
    true
}

/// Copy matched files to their targets.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CopyTask {
    /// Diagnostic label.
    pub label: Option<String>,
    /// Files to copy.
    #[serde(flatten)]
    pub selector: FileSelector,
    /// When `false`, targets that already exist are left alone.
    #[serde(default = "default_overwrite")]
    pub overwrite: bool,
}

/// Delete matched files.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteTask {
    /// Diagnostic label.
    pub label: Option<String>,
    /// Files to delete.
    #[serde(flatten)]
    pub selector: FileSelector,
}

/// How the expressions of an update task are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpressionType {
    /// Literal substring replacement.
    Text,
    /// Regular expression replacement.
    #[serde(alias = "re")]
    Regex,
    /// Dotted path expressions into a JSON document.
    Json,
    /// `key=value` property lines.
    Property,
}

/// Rewrite the content of matched files in place.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTask {
    /// Diagnostic label.
    pub label: Option<String>,
    /// Files to update.
    #[serde(flatten)]
    pub selector: FileSelector,
    /// Content type; inferred from the file extension when absent.
    pub expression_type: Option<ExpressionType>,
    /// One or more match expressions.
    pub expression: Option<OneOrMany<String>>,
    /// Literal replacement value. For JSON, absent or `null` deletes.
    pub value: Option<Value>,
    /// Document to source the replacement value from when `value` is absent.
    pub from_file: Option<String>,
    /// Expression selecting the value inside `from_file`; defaults to the
    /// match expression itself.
    pub from_expression: Option<String>,
    /// JSON update strategy.
    #[serde(default)]
    pub strategy: UpdateStrategy,
}

impl UpdateTask {
    /// The non-empty match expressions, in declared order.
    #[must_use]
    pub fn expressions(&self) -> Vec<&str> {
        self.expression
            .as_ref()
            .map(OneOrMany::as_slice)
            .unwrap_or_default()
            .iter()
            .map(String::as_str)
            .filter(|e| !e.is_empty())
            .collect()
    }
}

/// Run an inline list of tasks.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunTask {
    /// Diagnostic label.
    pub label: Option<String>,
    /// Nested tasks, executed in order.
    #[serde(default)]
    pub tasks: Vec<Task>,
}

/// One entry of a profile's task list, discriminated by its `task` field.
#[derive(Debug, Clone, PartialEq)]
pub enum Task {
    /// `"task": "copy"`
    Copy(CopyTask),
    /// `"task": "delete"`
    Delete(DeleteTask),
    /// `"task": "update"`
    Update(UpdateTask),
    /// `"task": "run"`
    Run(RunTask),
    /// Any other discriminant. Loading succeeds; executing fails.
    Unknown {
        /// The unrecognised `task` value.
        kind: String,
    },
}

impl Task {
    /// The `task` discriminant.
    #[must_use]
    pub fn kind(&self) -> &str {
        match self {
            Self::Copy(_) => "copy",
            Self::Delete(_) => "delete",
            Self::Update(_) => "update",
            Self::Run(_) => "run",
            Self::Unknown { kind } => kind,
        }
    }

    /// The task's label, if any.
    #[must_use]
    pub fn label(&self) -> Option<&str> {
        match self {
            Self::Copy(t) => t.label.as_deref(),
            Self::Delete(t) => t.label.as_deref(),
            Self::Update(t) => t.label.as_deref(),
            Self::Run(t) => t.label.as_deref(),
            Self::Unknown { .. } => None,
        }
    }

    /// Label if set, otherwise the kind.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.label().unwrap_or_else(|| self.kind())
    }
}

impl<'de> Deserialize<'de> for Task {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        let kind = value
            .get("task")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let task = match kind.as_str() {
            "copy" => CopyTask::deserialize(value).map(Self::Copy),
            "delete" => DeleteTask::deserialize(value).map(Self::Delete),
            "update" => UpdateTask::deserialize(value).map(Self::Update),
            "run" => RunTask::deserialize(value).map(Self::Run),
            _ => return Ok(Self::Unknown { kind }),
        };
        task.map_err(|e| D::Error::custom(format!("invalid '{kind}' task: {e}")))
    }
}

#[cfg(test)]
#[allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::panic
)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: Value) -> Task {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn copy_task_defaults() {
        let Task::Copy(copy) = parse(json!({ "task": "copy" })) else {
            panic!("expected copy task");
        };
        assert!(copy.overwrite);
        assert!(!copy.selector.required);
        assert_eq!(copy.selector.include, None);
    }

    #[test]
    fn copy_task_full() {
        let task = parse(json!({
            "task": "copy",
            "label": "assets",
            "include": ["LICENSE", "README*"],
            "dir": "assets",
            "dest": ".",
            "fromPackage": "@codemucker/merge",
            "required": true,
            "overwrite": false
        }));
        assert_eq!(task.display_name(), "assets");
        let Task::Copy(copy) = task else {
            panic!("expected copy task");
        };
        assert!(!copy.overwrite);
        assert_eq!(copy.selector.src_dir.as_deref(), Some("assets"));
        assert_eq!(
            copy.selector.from_package.as_deref(),
            Some("@codemucker/merge")
        );
        assert_eq!(
            copy.selector.include.as_ref().unwrap().as_slice(),
            ["LICENSE", "README*"]
        );
    }

    #[test]
    fn update_task_with_single_expression() {
        let Task::Update(update) = parse(json!({
            "task": "update",
            "include": "package.json",
            "expression": "scripts",
            "expressionType": "re",
            "strategy": "merge",
            "value": { "test": "jest" }
        })) else {
            panic!("expected update task");
        };
        assert_eq!(update.expressions(), vec!["scripts"]);
        assert_eq!(update.expression_type, Some(ExpressionType::Regex));
        assert_eq!(update.strategy, UpdateStrategy::Merge);
        assert_eq!(update.value, Some(json!({ "test": "jest" })));
    }

    #[test]
    fn update_task_null_value_is_none() {
        let Task::Update(update) = parse(json!({
            "task": "update",
            "expression": ["a", "", "b"],
            "value": null
        })) else {
            panic!("expected update task");
        };
        assert_eq!(update.value, None);
        assert_eq!(update.strategy, UpdateStrategy::Replace);
        assert_eq!(update.expressions(), vec!["a", "b"]);
    }

    #[test]
    fn run_task_nests_tasks() {
        let Task::Run(run) = parse(json!({
            "task": "run",
            "tasks": [{ "task": "delete", "include": "*.tmp" }, { "task": "zip" }]
        })) else {
            panic!("expected run task");
        };
        assert_eq!(run.tasks.len(), 2);
        assert_eq!(run.tasks[0].kind(), "delete");
        assert_eq!(
            run.tasks[1],
            Task::Unknown {
                kind: "zip".to_string()
            }
        );
    }

    #[test]
    fn unknown_kind_is_preserved() {
        let task = parse(json!({ "task": "zip", "include": "*" }));
        assert_eq!(task.kind(), "zip");
        assert_eq!(task.display_name(), "zip");
    }

    #[test]
    fn missing_discriminant_is_unknown() {
        assert_eq!(
            parse(json!({ "include": "*" })),
            Task::Unknown {
                kind: String::new()
            }
        );
    }

    #[test]
    fn invalid_known_task_is_an_error() {
        let err = serde_json::from_value::<Task>(json!({ "task": "copy", "overwrite": "yes" }))
            .unwrap_err();
        assert!(err.to_string().contains("invalid 'copy' task"));
    }
}
