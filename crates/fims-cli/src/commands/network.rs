//! `fims network` command implementations

use super::{load_valid_network, read_json};
use crate::error::{CliError, Result};
use crate::output::{self, OutputFormat};
use fims_config::network::{NetworkConfig, NetworkConfigUpdator};
use serde_json::json;
use std::path::Path;
use tracing::info;

/// Validate a network config
pub fn validate(path: &Path, format: OutputFormat) -> Result<()> {
    let mut network: NetworkConfig = read_json(path)?;
    let valid = network.is_valid();
    let errors = network.errors()?;

    match format {
        OutputFormat::Json => output::print_json(&json!({ "valid": valid, "errors": errors }))?,
        OutputFormat::Text if valid => output::print_success(&format!(
            "Network config is valid ({} entities, {} lists)",
            network.entities.len(),
            network.lists.len()
        )),
        OutputFormat::Text => output::print_errors("Network config is invalid:", errors),
    }

    if !valid {
        return Err(CliError::invalid(format!(
            "network config has {} error(s)",
            errors.len()
        )));
    }
    Ok(())
}

/// Apply `updated` to `orig`, keeping what may not change once projects exist
pub fn update(orig: &Path, updated: &Path, format: OutputFormat) -> Result<()> {
    let orig = load_valid_network(orig)?;
    let updated: NetworkConfig = read_json(updated)?;

    let mut updator = NetworkConfigUpdator::new(updated);
    updator.update(&orig);

    let new_entities: Vec<String> = updator
        .new_entities()
        .iter()
        .map(|e| e.concept_alias.clone())
        .collect();
    let removed_entities: Vec<String> = updator
        .removed_entities()
        .iter()
        .map(|e| e.concept_alias.clone())
        .collect();
    info!(new = new_entities.len(), removed = removed_entities.len(), "Updated network config");

    let mut config = updator.into_config();
    let valid = config.is_valid();
    let errors = config.errors()?;

    match format {
        OutputFormat::Json => output::print_json(&json!({
            "valid": valid,
            "errors": errors,
            "newEntities": new_entities,
            "removedEntities": removed_entities,
            "config": config,
        }))?,
        OutputFormat::Text => {
            if !new_entities.is_empty() {
                println!("New entities: {}", new_entities.join(", "));
            }
            if !removed_entities.is_empty() {
                println!("Removed entities: {}", removed_entities.join(", "));
            }
            if valid {
                output::print_success("Updated network config is valid");
                output::print_json(&config)?;
            } else {
                output::print_errors("Updated network config is invalid:", errors);
            }
        }
    }

    if !valid {
        return Err(CliError::invalid("updated network config is invalid"));
    }
    Ok(())
}
