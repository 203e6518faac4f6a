//! `fims dataset` command implementations

use super::{load_valid_network, read_json};
use crate::error::{CliError, Result};
use crate::output::{self, OutputFormat};
use fims_config::dataset::{DatasetBuilder, InMemoryRecordRepository};
use fims_config::project::ProjectConfig;
use fims_config::records::Record;
use fims_config::validation::DatasetValidator;
use indexmap::IndexMap;
use serde_json::{json, Value};
use std::path::Path;
use tracing::{debug, info};

/// Worksheet name to rows, each row a column to value object
type SheetData = IndexMap<String, Vec<IndexMap<String, Value>>>;

/// Inputs of `fims dataset validate`
#[derive(Debug)]
pub struct ValidateArgs<'a> {
    pub network: &'a Path,
    pub project: &'a Path,
    pub data: &'a Path,
    pub expedition: Option<String>,
    pub project_id: i32,
    pub stored: Option<&'a Path>,
    pub reload: bool,
}

/// Validate worksheet rows against a project config
///
/// Records from `--stored` stand in for what the project already holds, so
/// uniqueness and parent identifiers are checked against them too.
pub async fn validate(args: ValidateArgs<'_>, format: OutputFormat) -> Result<()> {
    let network = load_valid_network(args.network)?;
    let mut config: ProjectConfig = read_json(args.project)?;
    if !config.is_valid(&network) {
        let errors = config.errors()?;
        return Err(CliError::invalid(format!(
            "project config is invalid: {}",
            errors.join("; ")
        )));
    }
    config.add_default_rules();

    let repository = InMemoryRecordRepository::new();
    if let Some(path) = args.stored {
        let stored: IndexMap<String, Vec<Record>> = read_json(path)?;
        for (alias, records) in stored {
            debug!(entity = %alias, records = records.len(), "Loaded stored records");
            repository.insert(args.project_id, &alias, records).await;
        }
    }

    let data: SheetData = read_json(args.data)?;
    let mut builder = DatasetBuilder::new(&config, &repository, args.project_id, args.expedition);
    for (sheet, rows) in &data {
        let rows: Vec<IndexMap<String, String>> = rows.iter().map(row_strings).collect();
        builder.add_sheet(sheet, &rows, args.reload)?;
    }

    let mismatched: Vec<String> = builder
        .mismatched_expeditions()
        .iter()
        .map(|((alias, sheet), codes)| {
            let codes: Vec<&str> = codes.iter().map(String::as_str).collect();
            format!(
                "{alias} ({}) rows name expedition(s) [{}] that differ from the upload",
                sheet.as_deref().unwrap_or("no worksheet"),
                codes.join(", ")
            )
        })
        .collect();

    let mut dataset = builder.build().await?;
    let mut validator = DatasetValidator::new(&config);
    let valid = validator.validate(&mut dataset);
    let has_error = validator.has_error();
    let records: usize = dataset.iter().map(|r| r.records_to_persist().count()).sum();
    info!(valid, has_error, records, "Validated dataset");

    match format {
        OutputFormat::Json => output::print_json(&json!({
            "valid": valid,
            "hasError": has_error,
            "mismatchedExpeditions": mismatched,
            "messages": validator.messages(),
        }))?,
        OutputFormat::Text => {
            for m in &mismatched {
                println!("warning: {m}");
            }
            output::print_messages(validator.messages());
            if valid {
                output::print_success(&format!("Dataset is valid ({records} records)"));
            } else if !has_error {
                output::print_success(&format!(
                    "Dataset has warnings only ({records} records can be saved)"
                ));
            }
        }
    }

    if has_error {
        return Err(CliError::invalid("dataset has errors"));
    }
    Ok(())
}

/// Cell values as the strings a worksheet would hold
fn row_strings(row: &IndexMap<String, Value>) -> IndexMap<String, String> {
    row.iter()
        .map(|(column, value)| {
            let value = match value {
                Value::Null => String::new(),
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            (column.clone(), value)
        })
        .collect()
}
