use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use console::style;
use tracing::debug;

use crate::{args::Cli, commands::command_from_args, error::CommandError};

mod args;
mod commands;
mod config;
mod dependencies;
mod error;
mod formatting;
mod git;
mod interaction;
mod logging;
mod models;
mod table;
mod watch;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::setup_logging(cli.global_args.debug);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            report_error(&error);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut command = command_from_args(cli.command, &cli.global_args)?;
    command.execute().await
}

fn report_error(error: &anyhow::Error) {
    debug!(?error, "command failed");

    eprintln!("{} {error:#}", style("Error:").red().bold());

    if let Some(hint) = hint(error) {
        eprintln!("{}", style(hint).dim());
    }
}

/// Hint of the first [`CommandError`] in the error chain.
fn hint(error: &anyhow::Error) -> Option<String> {
    error
        .chain()
        .find_map(|cause| cause.downcast_ref::<CommandError>())
        .and_then(CommandError::hint)
}
