//! `codemucker-merge` command-line entry point.
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use codemucker_merge::cli::{Cli, Command};
use codemucker_merge::commands;
use codemucker_merge::logging::{Logger, init_subscriber};
use tracing_subscriber::filter::LevelFilter;

fn main() -> ExitCode {
    let _ = enable_ansi_support::enable_ansi_support();
    let args = Cli::parse();

    let forced = args
        .global
        .log_level
        .map(LevelFilter::from)
        .or_else(|| args.verbose.then_some(LevelFilter::DEBUG));
    let handle = init_subscriber(forced.unwrap_or(LevelFilter::INFO));
    let log = Arc::new(Logger::new());

    let result = match &args.command {
        Command::Run(opts) => {
            commands::run::run(&args.global, opts, &log, forced.is_none().then_some(&handle))
        }
        Command::Values(opts) => commands::values::run(&args.global, opts, &mut std::io::stdout()),
        Command::Keys => commands::keys::run(&mut std::io::stdout()),
        Command::Version => commands::version::run(&mut std::io::stdout()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            // `fatal` silences the console, but never the error ending the run.
            let level = handle
                .current()
                .map_or(LevelFilter::ERROR, |level| level.max(LevelFilter::ERROR));
            let _ = handle.set(level);
            tracing::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}
