use super::{mark_network_rules, NetworkConfig};
use crate::models::Entity;
use tracing::info;

/// Applies an updated network config over the stored one
///
/// Tracks added and removed entities, and keeps the data a network entity may
/// never change once created: its `parentEntity`, its `uniqueKey` and the URI
/// of every attribute.
#[derive(Debug)]
pub struct NetworkConfigUpdator {
    updated: NetworkConfig,
    new_entities: Vec<Entity>,
    removed_entities: Vec<Entity>,
}

impl NetworkConfigUpdator {
    pub fn new(updated: NetworkConfig) -> Self {
        Self {
            updated,
            new_entities: Vec::new(),
            removed_entities: Vec::new(),
        }
    }

    /// Reconcile the updated config against `orig`, returning the config to store
    pub fn update(&mut self, orig: &NetworkConfig) -> &NetworkConfig {
        self.new_entities.clear();
        self.removed_entities.clear();

        for entity in &mut self.updated.entities {
            match orig.entity(&entity.concept_alias) {
                Some(orig_entity) => preserve_immutable_data(entity, orig_entity),
                None => self.new_entities.push(entity.clone()),
            }
            mark_network_rules(entity);
        }

        for entity in &orig.entities {
            if self.updated.entity(&entity.concept_alias).is_none() {
                self.removed_entities.push(entity.clone());
            }
        }

        info!(
            new = self.new_entities.len(),
            removed = self.removed_entities.len(),
            "Updated network config"
        );
        &self.updated
    }

    pub fn new_entities(&self) -> &[Entity] {
        &self.new_entities
    }

    pub fn removed_entities(&self) -> &[Entity] {
        &self.removed_entities
    }

    pub fn into_config(self) -> NetworkConfig {
        self.updated
    }
}

fn preserve_immutable_data(updated: &mut Entity, orig: &Entity) {
    updated.parent_entity = orig.parent_entity.clone();
    updated.unique_key = orig.unique_key.clone();

    for attribute in &mut updated.attributes {
        if let Some(uri) = orig.attribute_uri(&attribute.column) {
            attribute.uri = uri.to_string();
            continue;
        }

        // A renamed uniqueKey column is matched back through its URI.
        if let (Some(key), Some(key_uri)) = (orig.unique_key(), orig.unique_key_uri()) {
            if key_uri == attribute.uri {
                attribute.column = key.to_string();
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::models::Attribute;
    use crate::rules::{Rule, RuleLevel, UniqueValue};
    use pretty_assertions::assert_eq;

    fn orig() -> NetworkConfig {
        let mut event = Entity::new("event", "urn:event").with_unique_key("eventID");
        event.add_attribute(Attribute::new("eventID", "urn:eventID"));
        event.add_attribute(Attribute::new("locality", "urn:locality"));

        let mut sample = Entity::child("sample", "urn:sample", "event").with_unique_key("sampleID");
        sample.add_attribute(Attribute::new("sampleID", "urn:sampleID"));

        let mut network = NetworkConfig::default();
        network.add_entity(event);
        network.add_entity(sample);
        network
    }

    #[test]
    fn test_update_preserves_immutable_data() {
        let mut event = Entity::new("event", "urn:event").with_unique_key("locality");
        event.add_attribute(Attribute::new("eventIdentifier", "urn:eventID"));
        event.add_attribute(Attribute::new("locality", "urn:changed"));
        event.add_attribute(Attribute::new("country", "urn:country"));
        event.parent_entity = Some("other".into());
        event.add_rule(UniqueValue::new("eventID", false, RuleLevel::Error).into());

        let mut photo = Entity::new("photo", "urn:photo");
        photo.add_rule(UniqueValue::new("photoID", false, RuleLevel::Error).into());

        let mut updated = NetworkConfig::default();
        updated.entities.push(event);
        updated.entities.push(photo);

        let mut updator = NetworkConfigUpdator::new(updated);
        let config = updator.update(&orig());

        let event = config.entity("event").unwrap();
        assert_eq!(event.parent_entity, None);
        assert_eq!(event.unique_key.as_deref(), Some("eventID"));
        assert_eq!(
            event
                .attributes
                .iter()
                .map(|a| (a.column.as_str(), a.uri.as_str()))
                .collect::<Vec<_>>(),
            vec![
                ("eventID", "urn:eventID"),
                ("locality", "urn:locality"),
                ("country", "urn:country")
            ]
        );
        assert!(config
            .entities
            .iter()
            .flat_map(|e| e.rules.iter())
            .all(Rule::is_network_rule));

        assert_eq!(
            updator
                .new_entities()
                .iter()
                .map(|e| e.concept_alias.as_str())
                .collect::<Vec<_>>(),
            vec!["photo"]
        );
        assert_eq!(
            updator
                .removed_entities()
                .iter()
                .map(|e| e.concept_alias.as_str())
                .collect::<Vec<_>>(),
            vec!["sample"]
        );
    }
}
