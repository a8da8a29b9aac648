//! The resolved, typed form of a profile.
use serde::Deserialize;
use tracing_subscriber::filter::LevelFilter;

use super::task::{OneOrMany, Task};

/// Console verbosity requested by a profile or forced on the command line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Everything, including per-node update traces.
    Trace,
    /// Per-file decisions.
    Debug,
    /// Stages, dry-run actions and summaries.
    #[default]
    Info,
    /// Warnings and errors only.
    Warn,
    /// Errors only.
    Error,
    /// Nothing at all.
    Fatal,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => Self::TRACE,
            LogLevel::Debug => Self::DEBUG,
            LogLevel::Info => Self::INFO,
            LogLevel::Warn => Self::WARN,
            LogLevel::Error => Self::ERROR,
            LogLevel::Fatal => Self::OFF,
        }
    }
}

/// A fully resolved profile: `extends` chain merged and hard defaults applied.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    /// Console verbosity for the run.
    #[serde(default)]
    pub log_level: LogLevel,
    /// Direct parent the profile was merged over, if any.
    pub extends: Option<String>,
    /// Profiles executed before this profile's own tasks.
    #[serde(alias = "preConfigs")]
    pub pre_tasks: Option<OneOrMany<String>>,
    /// Profiles executed after this profile's own tasks.
    #[serde(alias = "postConfigs")]
    pub post_tasks: Option<OneOrMany<String>>,
    /// Tasks, executed in order.
    #[serde(default)]
    pub tasks: Vec<Task>,
    /// Source directory for tasks that declare none.
    pub default_src: String,
    /// Destination directory for tasks that declare none.
    pub default_dest: String,
}

impl Profile {
    /// Keys of the profiles to run before this one.
    #[must_use]
    pub fn pre_task_keys(&self) -> &[String] {
        self.pre_tasks
            .as_ref()
            .map(OneOrMany::as_slice)
            .unwrap_or_default()
    }

    /// Keys of the profiles to run after this one.
    #[must_use]
    pub fn post_task_keys(&self) -> &[String] {
        self.post_tasks
            .as_ref()
            .map(OneOrMany::as_slice)
            .unwrap_or_default()
    }
}
