//! FIMS CLI Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Command-line front end for checking FIMS configs and datasets.
//!
//! # Overview
//!
//! - **Network configs**: validate a network config, or apply an update to one
//!   (`fims network validate/update`)
//! - **Project configs**: validate a project config against its network, or
//!   print the merged result (`fims project validate/merge`)
//! - **Datasets**: validate worksheet rows against a project config
//!   (`fims dataset validate`)

pub mod commands;
pub mod config;
pub mod error;
pub mod output;

pub use error::{CliError, Result};
pub use output::OutputFormat;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// FIMS - config and dataset validation
#[derive(Parser, Debug)]
#[command(name = "fims")]
#[command(author, version, about, long_about = None)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format (defaults to FIMS_OUTPUT_FORMAT, then text)
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<OutputFormat>,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Network config commands
    Network {
        #[command(subcommand)]
        command: NetworkCommand,
    },

    /// Project config commands
    Project {
        #[command(subcommand)]
        command: ProjectCommand,
    },

    /// Dataset commands
    Dataset {
        #[command(subcommand)]
        command: DatasetCommand,
    },
}

/// Network config subcommands
#[derive(Subcommand, Debug)]
pub enum NetworkCommand {
    /// Validate a network config
    Validate {
        /// Network config JSON file
        network: PathBuf,
    },

    /// Apply an updated network config to an existing one
    Update {
        /// Current network config JSON file
        orig: PathBuf,

        /// Updated network config JSON file
        updated: PathBuf,
    },
}

/// Project config subcommands
#[derive(Subcommand, Debug)]
pub enum ProjectCommand {
    /// Validate a project config against its network config
    Validate {
        /// Network config JSON file
        network: PathBuf,

        /// Project config JSON file
        project: PathBuf,
    },

    /// Print the project config merged with its network config
    Merge {
        /// Network config JSON file
        network: PathBuf,

        /// Project config JSON file
        project: PathBuf,

        /// Print the stored form, holding only project overrides
        #[arg(long)]
        persisted: bool,
    },
}

/// Dataset subcommands
#[derive(Subcommand, Debug)]
pub enum DatasetCommand {
    /// Validate worksheet rows against a project config
    Validate {
        /// Network config JSON file
        network: PathBuf,

        /// Project config JSON file
        project: PathBuf,

        /// Data JSON file mapping worksheet names to arrays of rows
        data: PathBuf,

        /// Expedition the data is uploaded to; without it every row needs an expeditionCode
        #[arg(short, long, env = "FIMS_EXPEDITION")]
        expedition: Option<String>,

        /// Project id of the upload
        #[arg(long, env = "FIMS_PROJECT_ID", default_value = "1")]
        project_id: i32,

        /// Existing records, a JSON file mapping conceptAlias to arrays of records
        #[arg(long)]
        stored: Option<PathBuf>,

        /// Replace the expedition's records instead of adding to them
        #[arg(long)]
        reload: bool,
    },
}
