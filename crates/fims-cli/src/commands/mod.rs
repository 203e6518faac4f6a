//! CLI command implementations
//!
//! Each subcommand group has its own module. Commands print their report,
//! then fail with [`CliError::Invalid`] when the checked input is invalid.

pub mod dataset;
pub mod network;
pub mod project;

use crate::error::{CliError, Result};
use fims_config::network::NetworkConfig;
use serde::de::DeserializeOwned;
use std::path::Path;
use tracing::debug;

/// Read and deserialize a JSON file
pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let display = path.display().to_string();
    if !path.exists() {
        return Err(CliError::FileNotFound(display));
    }
    let contents = std::fs::read_to_string(path)?;
    debug!(file = %path.display(), bytes = contents.len(), "Read JSON file");
    serde_json::from_str(&contents).map_err(|e| CliError::json_parse(display, e))
}

/// Load a network config that must be valid for the command to go on
pub(crate) fn load_valid_network(path: &Path) -> Result<NetworkConfig> {
    let mut network: NetworkConfig = read_json(path)?;
    if !network.is_valid() {
        let errors = network.errors()?;
        return Err(CliError::invalid_network(errors.join("; ")));
    }
    Ok(network)
}
