//! Recursive merge of JSON values.
//!
//! Used both for profile inheritance (child over parent, profile over hard
//! defaults) and for the `merge` strategy of JSON updates.
use serde_json::Value;

/// Merge `overlay` into `base` in place.
///
/// | base     | overlay  | result                                  |
/// |----------|----------|-----------------------------------------|
/// | object   | object   | key-wise merge; keys only in base stay  |
/// | any      | any      | overlay replaces base                   |
///
/// Arrays are replaced wholesale, never concatenated, and a `null` overlay
/// replaces whatever was there.
pub fn merge_into(base: &mut Value, overlay: &Value) {
    match (base, overlay) {
        (Value::Object(base_obj), Value::Object(overlay_obj)) => {
            for (key, overlay_value) in overlay_obj {
                match base_obj.get_mut(key) {
                    Some(existing) => merge_into(existing, overlay_value),
                    None => {
                        base_obj.insert(key.clone(), overlay_value.clone());
                    }
                }
            }
        }
        (base_value, overlay_value) => {
            *base_value = overlay_value.clone();
        }
    }
}

/// Return a new value with `overlay` merged over `base`.
///
/// See [`merge_into`] for the per-type rules.
///
/// # Examples
///
/// ```
/// use codemucker_merge::document::deep_merge;
/// use serde_json::json;
///
/// let parent = json!({ "logLevel": "info", "tasks": [1, 2], "nested": { "a": 1 } });
/// let child = json!({ "tasks": [3], "nested": { "b": 2 } });
///
/// assert_eq!(
///     deep_merge(&parent, &child),
///     json!({ "logLevel": "info", "tasks": [3], "nested": { "a": 1, "b": 2 } })
/// );
/// ```
#[must_use]
pub fn deep_merge(base: &Value, overlay: &Value) -> Value {
    let mut merged = base.clone();
    merge_into(&mut merged, overlay);
    merged
}
