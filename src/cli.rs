//! Command-line interface definition.
use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::LogLevel;

/// Top-level CLI entry point for the merge engine.
#[derive(Parser, Debug)]
#[command(
    name = "codemucker-merge",
    about = "Declarative file-merge engine: run profiles of copy, delete and update tasks",
    version
)]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output (same as --log-level debug)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Options shared by every subcommand.
    #[command(flatten)]
    pub global: GlobalOpts,
}

/// Options shared across all subcommands.
#[derive(Parser, Debug, Clone, Default)]
pub struct GlobalOpts {
    /// Project root directory (defaults to the current directory)
    #[arg(long, global = true, env = "MERGE_ROOT")]
    pub root: Option<PathBuf>,

    /// Project descriptor holding the profiles (defaults to <root>/package.json)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Force the log level, overriding the profile's logLevel
    #[arg(short = 'l', long, global = true, value_enum)]
    pub log_level: Option<LogLevel>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a profile
    Run(RunOpts),
    /// Print the resolved (merged) profile without running it
    Values(ValuesOpts),
    /// List the built-in profile keys
    Keys,
    /// Print version information
    Version,
}

/// Options for the `run` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct RunOpts {
    /// Profile key, e.g. `dist` or `@codemucker/merge/install`
    pub key: String,

    /// Preview changes without applying
    #[arg(short = 'd', long)]
    pub dry_run: bool,
}

/// Options for the `values` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct ValuesOpts {
    /// Profile key, or `*` for every built-in profile
    #[arg(default_value = "*")]
    pub key: String,
}

#[cfg(test)]
#[allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::unreachable
)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_run() {
        let cli = Cli::parse_from(["codemucker-merge", "run", "dist"]);
        let Command::Run(opts) = cli.command else {
            unreachable!("expected run");
        };
        assert_eq!(opts.key, "dist");
        assert!(!opts.dry_run);
    }

    #[test]
    fn parse_run_dry_run() {
        let cli = Cli::parse_from(["codemucker-merge", "run", "install", "--dry-run"]);
        assert!(matches!(cli.command, Command::Run(RunOpts { dry_run: true, .. })));
    }

    #[test]
    fn parse_run_dry_run_short() {
        let cli = Cli::parse_from(["codemucker-merge", "run", "-d", "install"]);
        assert!(matches!(cli.command, Command::Run(RunOpts { dry_run: true, .. })));
    }

    #[test]
    fn parse_run_requires_key() {
        assert!(Cli::try_parse_from(["codemucker-merge", "run"]).is_err());
    }

    #[test]
    fn parse_log_level() {
        let cli = Cli::parse_from(["codemucker-merge", "-l", "trace", "run", "dist"]);
        assert_eq!(cli.global.log_level, Some(LogLevel::Trace));
        let cli = Cli::parse_from(["codemucker-merge", "run", "dist", "--log-level", "fatal"]);
        assert_eq!(cli.global.log_level, Some(LogLevel::Fatal));
    }

    #[test]
    fn parse_invalid_log_level() {
        assert!(Cli::try_parse_from(["codemucker-merge", "-l", "loud", "keys"]).is_err());
    }

    #[test]
    fn parse_values_defaults_to_all() {
        let cli = Cli::parse_from(["codemucker-merge", "values"]);
        let Command::Values(opts) = cli.command else {
            unreachable!("expected values");
        };
        assert_eq!(opts.key, "*");
    }

    #[test]
    fn parse_root_and_config() {
        let cli = Cli::parse_from([
            "codemucker-merge",
            "--root",
            "/project",
            "--config",
            "merge.toml",
            "keys",
        ]);
        assert_eq!(cli.global.root, Some(PathBuf::from("/project")));
        assert_eq!(cli.global.config, Some(PathBuf::from("merge.toml")));
        assert!(matches!(cli.command, Command::Keys));
    }

    #[test]
    fn parse_version() {
        let cli = Cli::parse_from(["codemucker-merge", "version"]);
        assert!(matches!(cli.command, Command::Version));
    }

    #[test]
    fn parse_verbose() {
        let cli = Cli::parse_from(["codemucker-merge", "-v", "keys"]);
        assert!(cli.verbose);
    }
}
