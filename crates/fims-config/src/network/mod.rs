//! The network config: the base schema every project of a network extends

mod updator;
mod validator;

pub use updator::NetworkConfigUpdator;
pub use validator::NetworkChecks;

use crate::config::Config;
use crate::models::Entity;
use crate::rules::{Rule, RuleLevel};
use crate::validator::ConfigValidator;
use serde::{Deserialize, Serialize, Serializer};
use std::ops::{Deref, DerefMut};

/// A [`Config`] whose rules are all network rules
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(from = "Config")]
pub struct NetworkConfig(Config);

impl NetworkConfig {
    /// Add `entity`, marking its rules as network rules
    pub fn add_entity(&mut self, mut entity: Entity) {
        mark_network_rules(&mut entity);
        self.0.add_entity(entity);
    }

    /// Validate, recording the messages on the config
    pub fn is_valid(&mut self) -> bool {
        ConfigValidator::new(NetworkChecks).is_valid(&mut self.0)
    }

    /// Columns of every RequiredValue rule of `entity` at `level`
    pub fn required_columns_for_entity(entity: &Entity, level: RuleLevel) -> Vec<String> {
        let mut columns: Vec<String> = Vec::new();
        for rule in &entity.rules {
            if let Rule::RequiredValue(r) = rule {
                if rule.level() == level {
                    for c in r.columns() {
                        if !columns.contains(c) {
                            columns.push(c.clone());
                        }
                    }
                }
            }
        }
        columns
    }

    pub fn into_inner(self) -> Config {
        self.0
    }
}

pub(crate) fn mark_network_rules(entity: &mut Entity) {
    for rule in entity.rules.iter_mut() {
        rule.set_network_rule(true);
    }
}

impl From<Config> for NetworkConfig {
    fn from(mut config: Config) -> Self {
        for entity in &mut config.entities {
            mark_network_rules(entity);
        }
        Self(config)
    }
}

impl Serialize for NetworkConfig {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl Deref for NetworkConfig {
    type Target = Config;

    fn deref(&self) -> &Config {
        &self.0
    }
}

impl DerefMut for NetworkConfig {
    fn deref_mut(&mut self) -> &mut Config {
        &mut self.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::models::Attribute;
    use crate::rules::RequiredValue;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_deserialized_rules_are_network_rules() {
        let network: NetworkConfig = serde_json::from_str(
            r#"{
                "entities": [{
                    "conceptAlias": "event",
                    "conceptURI": "urn:event",
                    "uniqueKey": "eventID",
                    "attributes": [{"column": "eventID", "uri": "urn:eventID"}],
                    "rules": [{"name": "RequiredValue", "columns": ["eventID"], "level": "ERROR"}]
                }]
            }"#,
        )
        .unwrap();

        let event = network.entity("event").unwrap();
        assert!(event.rules.iter().all(Rule::is_network_rule));
        assert_eq!(
            NetworkConfig::required_columns_for_entity(event, RuleLevel::Error),
            vec!["eventID"]
        );
    }

    #[test]
    fn test_add_entity_marks_rules() {
        let mut event = Entity::new("event", "urn:event").with_unique_key("eventID");
        event.add_attribute(Attribute::new("eventID", "urn:eventID"));
        event.add_rule(RequiredValue::new(vec!["eventID".into()], RuleLevel::Warning).into());

        let mut network = NetworkConfig::default();
        network.add_entity(event);
        assert!(network.entities[0].rules.iter().all(Rule::is_network_rule));
        assert!(network.is_valid());
        assert!(network.errors().unwrap().is_empty());
    }
}
