//! Command: print version information.
use std::io::Write;

use anyhow::Result;

/// Version string: the build-time `MERGE_VERSION` if set, else the crate version.
#[must_use]
pub fn version() -> &'static str {
    option_env!("MERGE_VERSION").unwrap_or(env!("CARGO_PKG_VERSION"))
}

/// Write the version line to `out`.
///
/// # Errors
///
/// Returns an error if writing to `out` fails.
pub fn run(out: &mut impl Write) -> Result<()> {
    writeln!(out, "codemucker-merge {}", version())?;
    Ok(())
}
