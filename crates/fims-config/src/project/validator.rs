use crate::config::Config;
use crate::models::Entity;
use crate::network::NetworkConfig;
use crate::validator::ConfigChecks;

/// Checks a project config against the network config it extends
#[derive(Debug, Clone, Copy)]
pub struct ProjectChecks<'a> {
    network: &'a NetworkConfig,
}

impl<'a> ProjectChecks<'a> {
    pub fn new(network: &'a NetworkConfig) -> Self {
        Self { network }
    }

    fn validation_lists_match(&self, config: &Config, errors: &mut Vec<String>) {
        let mut missing: Vec<&str> = self.network.lists.iter().map(|l| l.alias.as_str()).collect();

        for list in &config.lists {
            let Some(network_list) = self.network.find_list(&list.alias) else {
                continue;
            };
            if network_list != list {
                errors.push(format!(
                    "Project config validation list \"{}\" differs from the network config validation list with the same alias",
                    list.alias
                ));
            }
            missing.retain(|alias| *alias != list.alias);
        }

        if !missing.is_empty() {
            errors.push(format!(
                "Project config validation lists are missing the following network config validation lists: [\"{}\"]",
                missing.join("\", \"")
            ));
        }
    }

    fn contains_network_expedition_props(&self, config: &Config, errors: &mut Vec<String>) {
        for prop in &self.network.expedition_metadata_properties {
            if !config.expedition_metadata_properties.contains(prop) {
                errors.push(format!(
                    "Project config expeditionMetadataProperties is missing a network prop: \"{}\"",
                    prop.name
                ));
            }
        }
    }
}

impl ConfigChecks for ProjectChecks<'_> {
    fn validate_config(&self, config: &Config, errors: &mut Vec<String>) {
        self.validation_lists_match(config, errors);
        self.contains_network_expedition_props(config, errors);
    }

    fn validate_entity(&self, config: &Config, entity: &Entity, errors: &mut Vec<String>) {
        let alias = &entity.concept_alias;
        let Some(network_entity) = self.network.entity(alias) else {
            errors.push(format!(
                "Entity \"{alias}\" is not a registered entity for this network"
            ));
            return;
        };

        let immutable = [
            ("conceptUri", network_entity.concept_uri == entity.concept_uri),
            ("parentEntity", network_entity.parent_entity == entity.parent_entity),
            ("recordType", network_entity.record_type == entity.record_type),
            ("type", network_entity.kind == entity.kind),
        ];
        for (field, matches) in immutable {
            if !matches {
                errors.push(format!(
                    "Entity \"{alias}\".{field} does not match the network entity's {field}"
                ));
            }
        }

        attributes_match_network(entity, network_entity, errors);
        contains_network_rules(entity, network_entity, errors);
        has_valid_unique_key(config, entity, network_entity, errors);
    }
}

fn attributes_match_network(entity: &Entity, network_entity: &Entity, errors: &mut Vec<String>) {
    let alias = &entity.concept_alias;

    for attribute in &entity.attributes {
        let Ok(network_attribute) = network_entity.attribute_by_uri(&attribute.uri) else {
            errors.push(format!(
                "Entity \"{alias}\" contains an Attribute \"{}\" that is not found in the network entity",
                attribute.uri
            ));
            continue;
        };

        let properties = [
            ("column", network_attribute.column == attribute.column),
            ("dataType", network_attribute.data_type == attribute.data_type),
            ("dataFormat", network_attribute.data_format == attribute.data_format),
            ("internal property", network_attribute.internal == attribute.internal),
            ("definedBy", network_attribute.defined_by == attribute.defined_by),
            ("delimitedBy", network_attribute.delimited_by == attribute.delimited_by),
        ];
        for (property, matches) in properties {
            if !matches {
                errors.push(format!(
                    "Entity \"{alias}\" contains an Attribute \"{}\" whos {property} does not match the network Attribute's {property}",
                    attribute.uri
                ));
            }
        }
    }
}

/// Every network rule that applies to the project's columns must be kept
fn contains_network_rules(entity: &Entity, network_entity: &Entity, errors: &mut Vec<String>) {
    let columns: Vec<String> = entity.attributes.iter().map(|a| a.column.clone()).collect();

    for rule in network_entity
        .rules
        .iter()
        .filter_map(|r| r.to_project_rule(&columns))
    {
        if !entity.rules.iter().any(|r| *r == rule || r.contains(&rule)) {
            errors.push(format!(
                "Entity \"{}\" is missing a network Rule: type: \"{}\", level: \"{}\"",
                entity.concept_alias,
                rule.name(),
                rule.level()
            ));
        }
    }
}

/// The uniqueKey may be the network's or, for a child, its non-hashed parent's
fn has_valid_unique_key(
    config: &Config,
    entity: &Entity,
    network_entity: &Entity,
    errors: &mut Vec<String>,
) {
    if entity.hashed || network_entity.unique_key == entity.unique_key {
        return;
    }

    if entity.is_child_entity() {
        let parent = entity.parent_entity.as_deref().and_then(|p| config.entity(p));
        if let Some(parent) = parent {
            if !parent.hashed && parent.unique_key().is_some() && parent.unique_key == entity.unique_key {
                return;
            }
        }
    }

    errors.push(format!(
        "Entity \"{}\" does not specify a valid uniqueKey. The uniqueKey can be the network entity's uniqueKey or a parent entity's uniqueKey",
        entity.concept_alias
    ));
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::models::{Attribute, DataType, ExpeditionMetadataProperty, List};
    use crate::rules::{RegExp, RuleLevel};
    use crate::validator::ConfigValidator;
    use pretty_assertions::assert_eq;

    fn network() -> NetworkConfig {
        let mut event = Entity::new("event", "urn:event").with_unique_key("eventID");
        event.add_attribute(Attribute::new("eventID", "urn:eventID"));
        event.add_attribute(Attribute::new("code", "urn:code"));
        event.add_rule(RegExp::new("code", "[A-Z]+", false, RuleLevel::Error).into());

        let mut sample = Entity::child("sample", "urn:sample", "event").with_unique_key("sampleID");
        sample.add_attribute(Attribute::new("sampleID", "urn:sampleID"));
        sample.add_attribute(Attribute::new("eventID", "urn:eventID"));

        let mut network = NetworkConfig::default();
        network.add_entity(event);
        network.add_entity(sample);
        network.add_list(List::new("yesNo", ["yes", "no"]));
        network.add_list(List::new("markers", ["COI"]));
        network
            .expedition_metadata_properties
            .push(ExpeditionMetadataProperty::new("public", true));
        network
    }

    /// Runs the checks without merging first
    fn validate(project: &mut Config, network: &NetworkConfig) -> Vec<String> {
        ConfigValidator::new(ProjectChecks::new(network)).validate(project)
    }

    #[test]
    fn test_config_level_checks() {
        let network = network();
        let mut project = Config::default();
        project.add_list(List::new("yesNo", ["Yes", "No"]));

        assert_eq!(
            validate(&mut project, &network),
            vec![
                "Project config validation list \"yesNo\" differs from the network config validation list with the same alias".to_string(),
                "Project config validation lists are missing the following network config validation lists: [\"markers\"]".to_string(),
                "Project config expeditionMetadataProperties is missing a network prop: \"public\"".to_string(),
            ]
        );
    }

    #[test]
    fn test_entity_checks() {
        let network = network();
        let mut project = Config::default();
        project.lists = network.lists.clone();
        project.expedition_metadata_properties = network.expedition_metadata_properties.clone();

        let mut event = Entity::new("event", "urn:other").with_unique_key("code");
        event.record_type = "Event".into();
        event.add_attribute(Attribute::new("eventID", "urn:eventID").with_data_type(DataType::Integer));
        event.add_attribute(Attribute::new("code", "urn:code"));
        event.add_attribute(Attribute::new("extra", "urn:extra"));
        project.add_entity(event);
        project.add_entity(Entity::new("unknown", "urn:unknown"));

        assert_eq!(
            validate(&mut project, &network),
            vec![
                "Entity \"event\".conceptUri does not match the network entity's conceptUri".to_string(),
                "Entity \"event\".recordType does not match the network entity's recordType".to_string(),
                "Entity \"event\" contains an Attribute \"urn:eventID\" whos dataType does not match the network Attribute's dataType".to_string(),
                "Entity \"event\" contains an Attribute \"urn:extra\" that is not found in the network entity".to_string(),
                "Entity \"event\" is missing a network Rule: type: \"RegExp\", level: \"ERROR\"".to_string(),
                "Entity \"event\" does not specify a valid uniqueKey. The uniqueKey can be the network entity's uniqueKey or a parent entity's uniqueKey".to_string(),
                "Entity \"unknown\" is not a registered entity for this network".to_string(),
            ]
        );
    }

    #[test]
    fn test_child_may_use_parent_unique_key() {
        let network = network();
        let mut project = Config::default();
        project.lists = network.lists.clone();
        project.expedition_metadata_properties = network.expedition_metadata_properties.clone();

        let mut event = Entity::new("event", "urn:event").with_unique_key("eventID");
        event.add_attribute(Attribute::new("eventID", "urn:eventID"));
        let mut sample = Entity::child("sample", "urn:sample", "event").with_unique_key("eventID");
        sample.add_attribute(Attribute::new("eventID", "urn:eventID"));
        project.add_entity(event);
        project.add_entity(sample);

        assert!(validate(&mut project, &network).is_empty());
    }
}
