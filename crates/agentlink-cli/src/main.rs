//! # agentlink CLI entry point
//!
//! Parses arguments, installs logging and dispatches to the subcommand
//! handlers in the library crate.

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use agentlink_cli::{run, Cli};

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!("agentlink CLI starting");

    match run(&cli) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            eprintln!("error: {e:#}");
            ExitCode::from(1)
        }
    }
}
