//! Domain-specific error types for the merge engine.
//!
//! Engine modules return [`anyhow::Result`] with one of the typed errors
//! below as the root cause, so callers (and tests) can classify a failure
//! with [`anyhow::Error::downcast_ref`] while I/O failures still carry
//! human-readable context.
//!
//! # Error hierarchy
//!
//! ```text
//! ConfigError   : profile lookup, `extends` resolution, descriptor parsing
//! TaskError     : task kinds, match counts, patterns, content parsing
//! PathError     : project-root containment
//! DocumentError : sourcing values out of another document
//! ```

use std::path::PathBuf;

use thiserror::Error;

/// Errors that arise from loading the project descriptor and resolving profiles.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The profile key has no entry in the project descriptor or the built-in defaults.
    #[error("No config found for '{key}' (tried: {tried})")]
    NotFound {
        /// The key that was requested.
        key: String,
        /// Comma-separated list of the candidate keys that were looked up.
        tried: String,
    },

    /// The `extends` chain of a profile refers back to itself.
    #[error("Cyclic 'extends' chain: {0}")]
    ExtendsCycle(String),

    /// The resolved profile does not deserialize into a valid profile.
    #[error("Invalid config for '{key}': {source}")]
    Invalid {
        /// The profile key being resolved.
        key: String,
        /// Underlying deserialization error.
        source: serde_json::Error,
    },

    /// The project descriptor is not valid JSON/TOML.
    #[error("Failed to parse {path}: {message}")]
    Parse {
        /// Path of the descriptor.
        path: PathBuf,
        /// Parser message.
        message: String,
    },

    /// An I/O error occurred while reading the project descriptor.
    #[error("IO error reading config file {path}: {source}")]
    Io {
        /// Path to the file that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

/// Errors that arise while executing tasks.
#[derive(Error, Debug)]
pub enum TaskError {
    /// A task declared a `task` discriminant that has no executor.
    #[error("No task runner for task type '{kind}' (in config '{profile}')")]
    UnknownTaskKind {
        /// The unrecognised discriminant.
        kind: String,
        /// The profile whose task list contained it.
        profile: String,
    },

    /// A `required` task matched fewer files than its include list demands.
    #[error(
        "{task}: expected to find at least {expected} file(s), but was {found}, and was marked as 'required'"
    )]
    InsufficientMatches {
        /// Task label (or kind when no label is set).
        task: String,
        /// Minimum number of matches.
        expected: usize,
        /// Number of matches found.
        found: usize,
    },

    /// An include pattern is not a valid glob.
    #[error("Invalid include pattern '{pattern}': {message}")]
    InvalidPattern {
        /// The offending pattern.
        pattern: String,
        /// Reason reported by the glob compiler.
        message: String,
    },

    /// A `regex` expression does not compile.
    #[error("Invalid regular expression '{expression}': {source}")]
    InvalidRegex {
        /// The offending expression.
        expression: String,
        /// Underlying regex error.
        source: regex::Error,
    },

    /// A file handled as JSON does not parse.
    #[error("Invalid JSON in {path}: {source}")]
    InvalidJson {
        /// File that failed to parse.
        path: PathBuf,
        /// Underlying parse error.
        source: serde_json::Error,
    },
}

/// Errors that arise from path containment checks.
#[derive(Error, Debug)]
pub enum PathError {
    /// A computed path falls outside the project root.
    #[error(
        "Path '{path}' is not within the project root dir '{root}'. Bailing as this looks malicious or a bug"
    )]
    Escape {
        /// The normalized offending path.
        path: PathBuf,
        /// The project root.
        root: PathBuf,
    },
}

/// Errors that arise when sourcing a value from another document.
#[derive(Error, Debug)]
pub enum DocumentError {
    /// No JSON node matched the source expression.
    #[error("Can't find any json nodes with expression '{expression}' in file '{file}'")]
    NodeNotFound {
        /// The source expression.
        expression: String,
        /// The source document.
        file: PathBuf,
    },

    /// No property line matched the source key.
    #[error("Couldn't find property '{expression}' in file '{file}'")]
    PropertyNotFound {
        /// The source property key.
        expression: String,
        /// The source document.
        file: PathBuf,
    },

    /// The source expression matched more than one node.
    #[error(
        "Found {count} matching nodes for expression '{expression}' in file '{file}'. Don't know which one to use"
    )]
    AmbiguousNode {
        /// The source expression.
        expression: String,
        /// The source document.
        file: PathBuf,
        /// Number of nodes matched.
        count: usize,
    },
}
