//! Declarative file-merge engine.
//!
//! Runs named profiles of copy, delete and update tasks against a project
//! tree. Profiles live in the project descriptor (`package.json` by default)
//! or come built in, and inherit from one another through `extends`.
//!
//! The public API is organised into these layers:
//!
//! - **[`config`]**: profile/task models, the two-tier registry and built-in defaults
//! - **[`document`]**: JSON node addressing, deep merge and node updates
//! - **[`matcher`]**: glob-based file selection relative to the project root
//! - **[`tasks`]**: the copy, delete, update and run executors
//! - **[`orchestrator`]**: profile dependency resolution and task sequencing
//! - **[`commands`]**: top-level subcommands (`run`, `values`, `keys`, `version`)
#![deny(clippy::or_fun_call)]
#![deny(clippy::bool_to_int_with_if)]

pub mod cli;
pub mod commands;
pub mod config;
pub mod document;
pub mod error;
pub mod logging;
pub mod matcher;
pub mod operations;
pub mod orchestrator;
pub mod paths;
pub mod tasks;
