//! Config validation driver
//!
//! [`ConfigValidator`] runs the checks every config shares and delegates the
//! network or project specific checks to a [`ConfigChecks`] implementation.
//! Problems are collected as messages; validation never stops at the first.

use crate::config::Config;
use crate::models::Entity;
use crate::rules::{Rule, RuleLevel};
use indexmap::IndexMap;
use std::collections::HashSet;
use tracing::{debug, warn};

/// Checks specific to one kind of config
pub trait ConfigChecks {
    /// Config wide checks, run before the shared config checks
    fn validate_config(&self, config: &Config, errors: &mut Vec<String>);

    /// Per entity checks, run after the shared entity checks
    fn validate_entity(&self, config: &Config, entity: &Entity, errors: &mut Vec<String>);
}

pub struct ConfigValidator<C> {
    checks: C,
}

impl<C: ConfigChecks> ConfigValidator<C> {
    pub fn new(checks: C) -> Self {
        Self { checks }
    }

    /// Configure the entities of `config` then collect every problem found
    pub fn validate(&self, config: &mut Config) -> Vec<String> {
        config.configure_entities();

        let mut errors = Vec::new();
        self.checks.validate_config(config, &mut errors);
        most_atomic_worksheet_entity_is_not_hashed(config, &mut errors);
        worksheet_attributes_are_unique(config, &mut errors);
        expedition_metadata_have_name(config, &mut errors);

        for entity in &config.entities {
            entity_with_worksheet_has_unique_key(entity, &mut errors);
            unique_key_has_matching_attribute(entity, &mut errors);
            hashed_entity_has_required_value(entity, &mut errors);
            rules_have_valid_configuration(config, entity, &mut errors);
            self.checks.validate_entity(config, entity, &mut errors);
            if !entity.is_valid() {
                errors.extend(entity.validation_error_messages());
            }
        }

        debug!(
            entities = config.entities.len(),
            errors = errors.len(),
            "Validated config"
        );
        errors
    }

    /// Validate and record the outcome on `config`
    pub fn is_valid(&self, config: &mut Config) -> bool {
        let errors = self.validate(config);
        let valid = errors.is_empty();
        if !valid {
            warn!(errors = errors.len(), "Config is invalid");
        }
        config.set_validated(errors);
        valid
    }
}

/// Entities grouped by worksheet, in config order
fn sheet_entities(config: &Config) -> IndexMap<&str, Vec<&Entity>> {
    let mut sheets: IndexMap<&str, Vec<&Entity>> = IndexMap::new();
    for entity in &config.entities {
        if let Some(sheet) = entity.worksheet.as_deref().filter(|_| entity.has_worksheet()) {
            sheets.entry(sheet).or_default().push(entity);
        }
    }
    sheets
}

fn most_atomic_worksheet_entity_is_not_hashed(config: &Config, errors: &mut Vec<String>) {
    for (sheet, entities) in sheet_entities(config) {
        let Some(mut most_atomic) = entities.first().copied() else {
            continue;
        };
        for &entity in entities.iter().skip(1) {
            if config.is_entity_child_descendent(&most_atomic.concept_alias, &entity.concept_alias) {
                most_atomic = entity;
            }
        }

        if most_atomic.hashed {
            errors.push(format!(
                "Entity \"{}\" is the most atomic (child) entity in the worksheet: \"{sheet}\". This entity can not be a hashed entity.",
                most_atomic.concept_alias
            ));
        }
    }
}

fn worksheet_attributes_are_unique(config: &Config, errors: &mut Vec<String>) {
    for (sheet, mut entities) in sheet_entities(config) {
        // Duplicates within one entity are reported by the network checks.
        if entities.len() == 1 {
            continue;
        }
        entities.sort_by_key(|e| config.parent_entities(&e.concept_alias).len());

        let mut columns: HashSet<&str> = HashSet::new();
        let mut uris: HashSet<&str> = HashSet::new();

        for entity in &entities {
            let parent = entity
                .parent_entity
                .as_deref()
                .filter(|_| entity.is_child_entity())
                .and_then(|p| entities.iter().find(|e| e.concept_alias == p));

            for attribute in &entity.attributes {
                let mut dup_column = !columns.insert(&attribute.column);
                let mut dup_uri = !uris.insert(&attribute.uri);

                // A child may repeat its parent's uniqueKey.
                if let Some(parent) = parent {
                    dup_column = dup_column && parent.unique_key() != Some(attribute.column.as_str());
                    dup_uri = dup_uri && parent.unique_key_uri() != Some(attribute.uri.as_str());
                }

                if dup_column {
                    errors.push(format!(
                        "Worksheet \"{sheet}\" contains a duplicate column \"{}\"",
                        attribute.column
                    ));
                }
                if dup_uri {
                    errors.push(format!(
                        "Worksheet \"{sheet}\" contains a duplicate attribute uri \"{}\"",
                        attribute.uri
                    ));
                }
            }
        }
    }
}

fn expedition_metadata_have_name(config: &Config, errors: &mut Vec<String>) {
    for prop in &config.expedition_metadata_properties {
        if prop.name.trim().is_empty() {
            errors.push("ExpeditionMetadataProperty is missing a name.".to_string());
        }
    }
}

fn entity_with_worksheet_has_unique_key(entity: &Entity, errors: &mut Vec<String>) {
    let has_worksheet = entity.worksheet.as_deref().is_some_and(|w| !w.is_empty());
    let has_unique_key = entity.unique_key.as_deref().is_some_and(|k| !k.is_empty());
    if has_worksheet && !has_unique_key {
        errors.push(format!(
            "Entity \"{}\" specifies a worksheet but is missing a uniqueKey",
            entity.concept_alias
        ));
    }
}

fn unique_key_has_matching_attribute(entity: &Entity, errors: &mut Vec<String>) {
    if let Some(key) = entity.unique_key() {
        if entity.attribute_uri(key).is_none() {
            errors.push(format!(
                "Entity \"{}\" specifies a uniqueKey but can not find an Attribute with a matching column",
                entity.concept_alias
            ));
        }
    }
}

/// A hashed entity derives its key from other columns, so at least one of
/// them must be required
fn hashed_entity_has_required_value(entity: &Entity, errors: &mut Vec<String>) {
    if !entity.hashed {
        return;
    }
    let key = entity.unique_key.clone().unwrap_or_default();

    let satisfied = entity
        .rules
        .iter()
        .filter(|r| r.level() == RuleLevel::Error)
        .any(|rule| match rule {
            Rule::RequiredValue(r) => r.columns().len() > 1 || !r.columns().contains(&key),
            Rule::RequiredValueInGroup(r) => !r.columns().contains(&key),
            _ => false,
        });

    if !satisfied {
        errors.push(format!(
            "Entity \"{}\" is a hashed entity, but is missing at least 1 RequiredValueRule with level = \"ERROR\" and a column that is not the uniqueKey \"{key}\"",
            entity.concept_alias
        ));
    }
}

fn rules_have_valid_configuration(config: &Config, entity: &Entity, errors: &mut Vec<String>) {
    for rule in &entity.rules {
        rule.valid_configuration(errors, entity, config);

        if let Rule::UniqueValue(r) = rule {
            if r.unique_across_project()
                && entity.unique_key.as_deref() == Some(r.column())
                && !entity.unique_across_project
            {
                errors.push(format!(
                    "UniqueValueRule for uniqueKey column: \"{}\" has uniqueAcrossProject = true, however entity: \"{}\" uniqueAcrossProject = false",
                    r.column(),
                    entity.concept_alias
                ));
            }
        }
    }
}
