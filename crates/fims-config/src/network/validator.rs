use crate::config::Config;
use crate::models::Entity;
use crate::validator::ConfigChecks;
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

#[allow(clippy::expect_used)]
static ATTRIBUTE_URI: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9_:/]+$").expect("valid regex"));

#[allow(clippy::expect_used)]
static CONCEPT_ALIAS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9_]+$").expect("valid regex"));

/// Checks for network configs
#[derive(Debug, Clone, Copy, Default)]
pub struct NetworkChecks;

impl ConfigChecks for NetworkChecks {
    fn validate_config(&self, config: &Config, errors: &mut Vec<String>) {
        entities_have_unique_concept_alias(config, errors);
        attributes_have_unique_and_valid_uri(config, errors);
        attributes_have_unique_column(config, errors);
    }

    fn validate_entity(&self, config: &Config, entity: &Entity, errors: &mut Vec<String>) {
        let alias = &entity.concept_alias;

        if !alias.trim().is_empty() && !CONCEPT_ALIAS.is_match(alias) {
            errors.push(
                "Entity conceptAlias contains one or more invalid characters. Only letters, digits, and _ are valid"
                    .to_string(),
            );
        }
        if entity.concept_uri.trim().is_empty() {
            errors.push(format!("Entity \"{alias}\" is missing a conceptURI"));
        }
        if let Some(message) = parent_problem(config, entity) {
            errors.push(message);
        }
        for attribute in &entity.attributes {
            let missing_format = attribute.data_format.as_deref().is_none_or(str::is_empty);
            if attribute.data_type.is_temporal() && missing_format {
                errors.push(format!(
                    "Entity \"{alias}\" specifies an attribute \"{}\" with dataType \"{}\" but is missing a dataFormat",
                    attribute.uri, attribute.data_type
                ));
            }
        }
    }
}

fn entities_have_unique_concept_alias(config: &Config, errors: &mut Vec<String>) {
    let mut aliases = HashSet::new();
    for entity in &config.entities {
        if entity.concept_alias.is_empty() {
            errors.push("Entity is missing a conceptAlias".to_string());
        } else if !aliases.insert(entity.concept_alias.to_lowercase()) {
            errors.push(format!(
                "Duplicate entity conceptAlias detected \"{}\". conceptAliases are not case sensitive.",
                entity.concept_alias
            ));
        }
    }
}

fn attributes_have_unique_and_valid_uri(config: &Config, errors: &mut Vec<String>) {
    for entity in &config.entities {
        let mut uris = HashSet::new();
        for attribute in &entity.attributes {
            if !ATTRIBUTE_URI.is_match(&attribute.uri) {
                errors.push(format!(
                    "Invalid Attribute uri \"{}\" found in entity \"{}\". Uri must only contain alpha-numeric or _:/ characters.",
                    attribute.uri, entity.concept_alias
                ));
            }
            if !uris.insert(attribute.uri.as_str()) {
                errors.push(format!(
                    "Duplicate Attribute uri \"{}\" found in entity \"{}\"",
                    attribute.uri, entity.concept_alias
                ));
            }
        }
    }
}

fn attributes_have_unique_column(config: &Config, errors: &mut Vec<String>) {
    for entity in &config.entities {
        let mut columns = HashSet::new();
        for attribute in &entity.attributes {
            if !columns.insert(attribute.column.as_str()) {
                errors.push(format!(
                    "Duplicate Attribute column \"{}\" found in entity \"{}\"",
                    attribute.column, entity.concept_alias
                ));
            }
        }
    }
}

/// First problem with a child entity's parent link
fn parent_problem(config: &Config, entity: &Entity) -> Option<String> {
    let parent_alias = entity
        .parent_entity
        .as_deref()
        .filter(|_| entity.is_child_entity())?;
    let alias = &entity.concept_alias;

    let Some(parent) = config.entity(parent_alias) else {
        return Some(format!(
            "Entity \"{alias}\" specifies a parent entity that does not exist"
        ));
    };
    let Some(parent_key) = parent.unique_key() else {
        return Some(format!(
            "Entity \"{alias}\" specifies a parent entity that is missing a uniqueKey"
        ));
    };
    let Some(uri) = entity.attribute_uri(parent_key) else {
        return Some(format!(
            "Entity \"{alias}\" specifies a parent entity but is missing an attribute for the parent entity uniqueKey: \"{parent_key}\""
        ));
    };

    let parent_uri = parent.unique_key_uri().unwrap_or_default();
    if uri != parent_uri {
        return Some(format!(
            "Entity \"{alias}\" specifies a parent entity but the attribute for the parent entity uniqueKey: \"{parent_key}\" has a different uri: \"{uri}\" instead of \"{parent_uri}\""
        ));
    }
    if parent.concept_alias == *alias {
        return Some(format!(
            "Entity \"{alias}\" specifies a parent entity that is itself"
        ));
    }
    if entity.unique_across_project && !parent.unique_across_project {
        return Some(format!(
            "Entity \"{alias}\" requires the key to be unique across the entire project, but the parentEntity is not unique across the project."
        ));
    }
    None
}
