//! Command: list the built-in profile keys.
use std::io::Write;

use anyhow::Result;
use serde_json::Map;

use crate::config::ProfileRegistry;

/// Write every built-in profile key to `out`, one per line, sorted.
///
/// # Errors
///
/// Returns an error if writing to `out` fails.
pub fn run(out: &mut impl Write) -> Result<()> {
    let registry = ProfileRegistry::with_builtin_defaults(Map::new());
    for key in registry.builtin_keys() {
        writeln!(out, "{key}")?;
    }
    Ok(())
}
