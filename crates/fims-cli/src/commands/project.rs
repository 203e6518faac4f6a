//! `fims project` command implementations

use super::{load_valid_network, read_json};
use crate::error::{CliError, Result};
use crate::output::{self, OutputFormat};
use fims_config::project::{PersistedProjectConfig, ProjectConfig};
use serde_json::json;
use std::path::Path;

/// Validate a project config against its network config
pub fn validate(network: &Path, project: &Path, format: OutputFormat) -> Result<()> {
    let network = load_valid_network(network)?;
    let mut config: ProjectConfig = read_json(project)?;

    let valid = config.is_valid(&network);
    let errors = config.errors()?;

    match format {
        OutputFormat::Json => output::print_json(&json!({ "valid": valid, "errors": errors }))?,
        OutputFormat::Text if valid => output::print_success("Project config is valid"),
        OutputFormat::Text => output::print_errors("Project config is invalid:", errors),
    }

    if !valid {
        return Err(CliError::invalid(format!(
            "project config has {} error(s)",
            errors.len()
        )));
    }
    Ok(())
}

/// Print the project config with everything inherited from the network
///
/// With `persisted` only the project's own overrides are printed, as they
/// would be stored.
pub fn merge(network: &Path, project: &Path, persisted: bool, format: OutputFormat) -> Result<()> {
    let network = load_valid_network(network)?;
    let mut config: ProjectConfig = read_json(project)?;

    if !config.is_valid(&network) {
        let errors = config.errors()?;
        match format {
            OutputFormat::Json => output::print_json(&json!({ "valid": false, "errors": errors }))?,
            OutputFormat::Text => output::print_errors("Project config is invalid:", errors),
        }
        return Err(CliError::invalid("project config is invalid, nothing merged"));
    }

    // both output formats print the config itself as JSON
    if persisted {
        output::print_json(&PersistedProjectConfig::from_project_config(&mut config))
    } else {
        config.add_default_rules();
        output::print_json(&config)
    }
}
