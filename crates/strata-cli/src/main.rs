//! Strata CLI - structure-file validation
//!
//! Main entry point for the `strata` binary.

use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use strata_common_log::{LogConfig, LogLevel};
use tracing::debug;

mod cli;
mod commands;
mod error;
mod output;
mod runner;

use cli::Cli;
use error::CliError;

/// Application exit codes
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    Passed = 0,
    Failed = 1,
    Aborted = 2,
    IoError = 3,
}

impl From<Exit> for ExitCode {
    fn from(exit: Exit) -> Self {
        ExitCode::from(exit as u8)
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    init_logging(&cli);

    let result = build_runtime().and_then(|runtime| runtime.block_on(cli.execute()));
    match result {
        Ok(exit) => exit.into(),
        Err(e) => {
            debug!(error = ?e, "command failed");
            output::print_error(&e);
            e.exit().into()
        }
    }
}

fn build_runtime() -> Result<tokio::runtime::Runtime, CliError> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;
    Ok(runtime)
}

/// `-v`/`-q` win over `STRATA_LOG_LEVEL`.
fn init_logging(cli: &Cli) {
    let mut config = LogConfig::from_env();
    if cli.verbose > 0 {
        config.level = LogLevel::from_verbosity(cli.verbose);
    } else if cli.quiet {
        config.level = LogLevel::Error;
    }

    if let Err(e) = strata_common_log::init(config) {
        eprintln!("warning: logging disabled: {e}");
    }
}
