//! Dotted path expressions over JSON documents.
//!
//! An expression such as `scripts.build` or `dependencies.@types/*` is split
//! on `.` into segments. A literal segment addresses one child; a segment
//! ending in `*` addresses every key of the current container that starts
//! with the text before the `*`, and the remainder of the expression is
//! evaluated independently under each of them.
//!
//! Evaluation yields [`JsonNode`]s. A node is an *address* into the
//! document rather than a borrowed reference, so any number of nodes can be
//! held while the document is mutated through [`JsonNode::set`].

pub mod merge;

use serde::Deserialize;
use serde_json::Value;

pub use merge::{deep_merge, merge_into};

/// How a new value is combined with the value already at a node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdateStrategy {
    /// Deep-merge the new value over the existing one (see [`merge_into`]).
    Merge,
    /// Overwrite the existing value.
    #[default]
    Replace,
}

/// A pending change for every node matched by one expression.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeUpdate {
    /// New value; `None` (or `null`) deletes the node.
    pub value: Option<Value>,
    /// How to combine the value with what is already there.
    pub strategy: UpdateStrategy,
}

/// Address of one location inside a JSON document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonNode {
    /// Concrete keys from the document root down to the owning container.
    pub parent_path: Vec<String>,
    /// Key (or array index) of this node within its container.
    pub name: String,
    /// Dotted path from the root, e.g. `scripts.test`.
    pub full_path: String,
}

impl JsonNode {
    fn new(parent_path: &[String], name: &str) -> Self {
        let full_path = if parent_path.is_empty() {
            name.to_string()
        } else {
            format!("{}.{name}", parent_path.join("."))
        };
        Self {
            parent_path: parent_path.to_vec(),
            name: name.to_string(),
            full_path,
        }
    }

    /// The container that owns this node, if it still exists in `doc`.
    #[must_use]
    pub fn parent<'a>(&self, doc: &'a Value) -> Option<&'a Value> {
        self.parent_path
            .iter()
            .try_fold(doc, |value, segment| child(value, segment))
    }

    fn parent_mut<'a>(&self, doc: &'a mut Value) -> Option<&'a mut Value> {
        self.parent_path
            .iter()
            .try_fold(doc, |value, segment| child_mut(value, segment))
    }

    /// Current value at this node, or `None` if the key is absent.
    #[must_use]
    pub fn get<'a>(&self, doc: &'a Value) -> Option<&'a Value> {
        self.parent(doc).and_then(|parent| child(parent, &self.name))
    }

    /// Assign `value` to this node, or delete the key when `value` is `None`
    /// or `null`.
    ///
    /// Returns `false` when the owning container no longer exists or cannot
    /// hold the key (e.g. an out-of-range array index).
    pub fn set(&self, doc: &mut Value, value: Option<Value>) -> bool {
        let Some(parent) = self.parent_mut(doc) else {
            return false;
        };
        let value = value.filter(|v| !v.is_null());
        match parent {
            Value::Object(map) => match value {
                Some(v) => {
                    map.insert(self.name.clone(), v);
                    true
                }
                None => map.shift_remove(&self.name).is_some(),
            },
            Value::Array(items) => {
                let Some(index) = self.name.parse::<usize>().ok().filter(|&i| i < items.len())
                else {
                    return false;
                };
                match value {
                    Some(v) => {
                        if let Some(slot) = items.get_mut(index) {
                            *slot = v;
                        }
                    }
                    None => {
                        items.remove(index);
                    }
                }
                true
            }
            _ => false,
        }
    }
}

fn child<'a>(value: &'a Value, segment: &str) -> Option<&'a Value> {
    match value {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    }
}

fn child_mut<'a>(value: &'a mut Value, segment: &str) -> Option<&'a mut Value> {
    match value {
        Value::Object(map) => map.get_mut(segment),
        Value::Array(items) => segment
            .parse::<usize>()
            .ok()
            .and_then(move |i| items.get_mut(i)),
        _ => None,
    }
}

/// Find every node in `doc` addressed by `expression`.
///
/// The walk stops (contributing nothing) at an absent or `null`
/// intermediate container. A literal final segment yields a node even if
/// the key does not exist yet, so it can be created with [`JsonNode::set`];
/// a wildcard final segment only yields existing keys.
///
/// # Examples
///
/// ```
/// use codemucker_merge::document::find_nodes;
/// use serde_json::json;
///
/// let doc = json!({ "scripts": { "test": 1, "tex": 2, "other": 3 } });
/// let names: Vec<String> = find_nodes(&doc, "scripts.te*")
///     .into_iter()
///     .map(|n| n.full_path)
///     .collect();
/// assert_eq!(names, ["scripts.test", "scripts.tex"]);
/// ```
#[must_use]
pub fn find_nodes(doc: &Value, expression: &str) -> Vec<JsonNode> {
    if expression.is_empty() {
        return Vec::new();
    }
    let segments: Vec<&str> = expression.split('.').collect();
    let mut nodes = Vec::new();
    let mut path = Vec::new();
    walk(doc, &segments, &mut path, &mut nodes);
    nodes
}

fn walk(current: &Value, segments: &[&str], path: &mut Vec<String>, nodes: &mut Vec<JsonNode>) {
    let Some((segment, rest)) = segments.split_first() else {
        return;
    };
    if !matches!(current, Value::Object(_) | Value::Array(_)) {
        return;
    }
    for key in matching_keys(current, segment) {
        if rest.is_empty() {
            nodes.push(JsonNode::new(path, &key));
        } else if let Some(next) = child(current, &key).filter(|v| !v.is_null()) {
            path.push(key);
            walk(next, rest, path, nodes);
            path.pop();
        }
    }
}

/// Keys of `container` addressed by one segment, in document order.
fn matching_keys(container: &Value, segment: &str) -> Vec<String> {
    if let Some(prefix) = segment.strip_suffix('*') {
        return match container {
            Value::Object(map) => map
                .keys()
                .filter(|k| k.starts_with(prefix))
                .cloned()
                .collect(),
            Value::Array(items) => (0..items.len())
                .map(|i| i.to_string())
                .filter(|k| k.starts_with(prefix))
                .collect(),
            _ => Vec::new(),
        };
    }
    match container {
        Value::Array(items)
            if !segment
                .parse::<usize>()
                .is_ok_and(|index| index < items.len()) =>
        {
            Vec::new()
        }
        _ => vec![segment.to_string()],
    }
}

/// Apply `updates` to `doc`, in order.
///
/// Every node matched by an expression receives the update: `merge`
/// deep-merges the new value over the current one (or sets it when there is
/// no current value), `replace` overwrites it. A missing/`null` value
/// deletes the node. Applying the same updates twice leaves the document as
/// it was after the first application.
pub fn update_nodes(doc: &mut Value, updates: &[(String, NodeUpdate)]) {
    for (expression, update) in updates {
        let nodes = find_nodes(doc, expression);
        tracing::trace!(
            "update '{expression}' ({:?}) matched {} node(s)",
            update.strategy,
            nodes.len()
        );
        // Back to front so that deleting array elements keeps the remaining
        // indices valid.
        for node in nodes.iter().rev() {
            let new_value = match update.strategy {
                UpdateStrategy::Merge => match (node.get(doc), &update.value) {
                    (Some(existing), Some(value)) if !existing.is_null() => {
                        Some(deep_merge(existing, value))
                    }
                    (_, value) => value.clone(),
                },
                UpdateStrategy::Replace => update.value.clone(),
            };
            tracing::trace!(
                "{} node '{}'",
                if new_value.is_some() { "Replace" } else { "Delete" },
                node.full_path
            );
            node.set(doc, new_value);
        }
    }
}
