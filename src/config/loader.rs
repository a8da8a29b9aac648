//! Project descriptor loading.
use anyhow::Result;
use serde_json::{Map, Value};
use std::path::Path;

use crate::error::ConfigError;

/// Load the profile entries of a project descriptor.
///
/// `.toml` files are parsed with `toml`, everything else as JSON. A missing
/// file yields an empty map so the built-in profiles still resolve. Only
/// top-level entries whose value is an object are kept, since a
/// `package.json` also carries `name`, `version` and friends.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] if the file exists but cannot be read, or
/// [`ConfigError::Parse`] if it is malformed or its top level is not a
/// table/object.
pub fn load_descriptor(path: &Path) -> Result<Map<String, Value>> {
    if !path.exists() {
        tracing::debug!("no project descriptor at {}", path.display());
        return Ok(Map::new());
    }

    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let parse_error = |message: String| ConfigError::Parse {
        path: path.to_path_buf(),
        message,
    };

    let is_toml = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
    let document: Value = if is_toml {
        toml::from_str(&content).map_err(|e| parse_error(e.to_string()))?
    } else {
        serde_json::from_str(&content).map_err(|e| parse_error(e.to_string()))?
    };

    match document {
        Value::Object(entries) => Ok(entries
            .into_iter()
            .filter(|(_, value)| value.is_object())
            .collect()),
        _ => Err(parse_error("top level must be an object".to_string()).into()),
    }
}
