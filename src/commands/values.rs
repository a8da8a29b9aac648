//! Command: print resolved profile content without running it.
use std::io::Write;

use anyhow::Result;
use serde_json::{Map, Value};

use super::{load_registry, resolve_root};
use crate::cli::{GlobalOpts, ValuesOpts};

/// Write the resolved profile `opts.key` as pretty JSON to `out`.
///
/// With `*`, every built-in profile is resolved and written as one object
/// keyed by profile key.
///
/// # Errors
///
/// Returns an error if a profile cannot be resolved or `out` fails.
pub fn run(global: &GlobalOpts, opts: &ValuesOpts, out: &mut impl Write) -> Result<()> {
    let root = resolve_root(global)?;
    let registry = load_registry(global, &root)?;

    let value = if opts.key == "*" {
        let mut all = Map::new();
        for key in registry.builtin_keys() {
            all.insert(key.to_string(), registry.resolve_value(key)?);
        }
        Value::Object(all)
    } else {
        registry.resolve_value(&opts.key)?
    };

    writeln!(out, "{}", serde_json::to_string_pretty(&value)?)?;
    Ok(())
}
