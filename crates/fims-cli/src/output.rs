//! Report rendering for text and JSON output

use crate::error::Result;
use clap::ValueEnum;
use colored::Colorize;
use fims_config::validation::EntityMessages;
use serde::Serialize;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown output format '{other}', expected text or json")),
        }
    }
}

/// Print `value` as pretty JSON on stdout
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn print_success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

/// Config validation errors, one per line
pub fn print_errors(title: &str, errors: &[String]) {
    println!("{} {}", "✗".red(), title.bold());
    for e in errors {
        println!("  - {e}");
    }
}

/// Grouped validation messages, entity by entity
pub fn print_messages(messages: &[EntityMessages]) {
    for entity in messages {
        match &entity.sheet_name {
            Some(sheet) => println!("{} (worksheet \"{sheet}\")", entity.concept_alias.cyan().bold()),
            None => println!("{}", entity.concept_alias.cyan().bold()),
        }
        for group in &entity.errors {
            println!("  {} {}", "error:".red().bold(), group.name);
            for m in &group.messages {
                println!("    - {m}");
            }
        }
        for group in &entity.warnings {
            println!("  {} {}", "warning:".yellow().bold(), group.name);
            for m in &group.messages {
                println!("    - {m}");
            }
        }
    }
}
