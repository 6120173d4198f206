use std::process::ExitCode;

use clap::Parser;
use gradledit::cli::{Cli, Commands};
use gradledit::error::GradleditError;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    init_logging();

    match run() {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(error) => {
            tracing::debug!(%error, "command failed");
            let serialized = serde_json::to_string_pretty(&error.to_error_response()).unwrap_or_else(
                |_| {
                    "{\"error\":{\"type\":\"serialization_error\",\"message\":\"Failed to serialize error response\"}}"
                        .to_string()
                },
            );
            println!("{serialized}");
            ExitCode::FAILURE
        }
    }
}

/// Logs go to stderr so stdout stays a single JSON document.
fn init_logging() {
    let filter =
        EnvFilter::try_from_env("GRADLEDIT_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn to_json(response: &impl Serialize) -> Result<String, GradleditError> {
    serde_json::to_string_pretty(response)
        .map_err(|source| GradleditError::ResponseSerialization { source })
}

fn run() -> Result<String, GradleditError> {
    let cli = Cli::parse();
    let config = cli.config.as_deref();

    match cli.command {
        Commands::Read(args) => to_json(&gradledit::cli::read::run_read(args, config)?),
        Commands::Tree(args) => to_json(&gradledit::cli::tree::run_tree(args)?),
        Commands::Edit(args) => to_json(&gradledit::cli::edit::run_edit(args, config)?),
        Commands::Merge(args) => to_json(&gradledit::cli::merge::run_merge(args, config)?),
        Commands::Effective(args) => {
            to_json(&gradledit::cli::effective::run_effective(args)?)
        }
    }
}
