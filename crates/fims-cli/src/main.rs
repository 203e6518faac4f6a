//! FIMS CLI - Main entry point

use anyhow::Context;
use clap::Parser;
use fims_cli::commands::{dataset, network, project};
use fims_cli::config::Settings;
use fims_cli::{Cli, Commands, DatasetCommand, NetworkCommand, ProjectCommand};
use fims_common::logging::init_logging;
use std::process;
use tracing::error;

#[tokio::main]
async fn main() {
    Settings::load_dotenv();
    let cli = Cli::parse();

    let settings = match Settings::from_env(cli.verbose) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(2);
        }
    };

    // the CLI works without logging
    if let Err(e) = init_logging(&settings.log).context("logging is disabled") {
        eprintln!("Warning: {:#}", e);
    }

    if let Err(e) = execute_command(&cli, &settings).await {
        error!(error = %e, "Command failed");
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

async fn execute_command(cli: &Cli, settings: &Settings) -> fims_cli::Result<()> {
    let format = settings.output_format(cli.format);

    match &cli.command {
        Commands::Network { command } => match command {
            NetworkCommand::Validate { network: path } => network::validate(path, format),
            NetworkCommand::Update { orig, updated } => network::update(orig, updated, format),
        },

        Commands::Project { command } => match command {
            ProjectCommand::Validate {
                network,
                project: path,
            } => project::validate(network, path, format),
            ProjectCommand::Merge {
                network,
                project: path,
                persisted,
            } => project::merge(network, path, *persisted, format),
        },

        Commands::Dataset { command } => match command {
            DatasetCommand::Validate {
                network,
                project,
                data,
                expedition,
                project_id,
                stored,
                reload,
            } => {
                let args = dataset::ValidateArgs {
                    network,
                    project,
                    data,
                    expedition: expedition.clone(),
                    project_id: *project_id,
                    stored: stored.as_deref(),
                    reload: *reload,
                };
                dataset::validate(args, format).await
            }
        },
    }
}
