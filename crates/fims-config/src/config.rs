//! The schema shared by network and project configs
//!
//! A [`Config`] is a forest of entities linked by `parentEntity`. Most of the
//! queries here walk that forest: finding ancestors, ordering entities so
//! parents are processed before children, and describing the join path
//! between two entities.

use crate::error::{ConfigError, Result};
use crate::models::{Attribute, Entity, ExpeditionMetadataProperty, List};
use crate::rules::{Rule, RuleLevel};
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Order in which [`Config::entities_sorted`] returns entities
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntitySort {
    ChildrenFirst,
    ParentsFirst,
}

/// One parent/child hop on the path between two entities
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntityRelation<'a> {
    pub parent: &'a Entity,
    pub child: &'a Entity,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default)]
    pub entities: Vec<Entity>,

    #[serde(default)]
    pub lists: Vec<List>,

    #[serde(default)]
    pub expedition_metadata_properties: Vec<ExpeditionMetadataProperty>,

    #[serde(skip)]
    errors: Vec<String>,

    #[serde(skip)]
    validated: bool,
}

impl Config {
    pub fn find_list(&self, alias: &str) -> Option<&List> {
        self.lists.iter().find(|l| l.alias == alias)
    }

    pub fn entity(&self, concept_alias: &str) -> Option<&Entity> {
        self.entities
            .iter()
            .find(|e| e.concept_alias == concept_alias)
    }

    pub fn entity_mut(&mut self, concept_alias: &str) -> Option<&mut Entity> {
        self.entities
            .iter_mut()
            .find(|e| e.concept_alias == concept_alias)
    }

    fn require_entity(&self, concept_alias: &str) -> Result<&Entity> {
        self.entity(concept_alias)
            .ok_or_else(|| ConfigError::UnknownEntity(concept_alias.to_string()))
    }

    pub fn add_entity(&mut self, entity: Entity) {
        self.entities.push(entity);
        self.validated = false;
    }

    pub fn add_list(&mut self, list: List) {
        self.lists.push(list);
        self.validated = false;
    }

    pub fn entities_for_sheet(&self, sheet_name: &str) -> Vec<&Entity> {
        self.entities
            .iter()
            .filter(|e| e.worksheet.as_deref() == Some(sheet_name))
            .collect()
    }

    pub fn attributes_for_sheet(&self, sheet_name: &str) -> Vec<&Attribute> {
        self.entities_for_sheet(sheet_name)
            .into_iter()
            .flat_map(|e| e.attributes.iter())
            .collect()
    }

    /// Whether the entity's worksheet is shared with other entities
    pub fn is_multi_sheet_entity(&self, concept_alias: &str) -> bool {
        self.entity(concept_alias)
            .and_then(|e| e.worksheet.as_deref().filter(|_| e.has_worksheet()))
            .is_some_and(|sheet| self.entities_for_sheet(sheet).len() > 1)
    }

    /// Ancestors of the entity ordered parent, grandparent, …
    ///
    /// The walk stops at a missing parent or a cycle.
    pub fn parent_entities(&self, concept_alias: &str) -> Vec<&Entity> {
        let mut parents: Vec<&Entity> = Vec::new();
        let mut current = self.entity(concept_alias);

        while let Some(entity) = current {
            let Some(parent) = entity
                .parent_entity
                .as_deref()
                .filter(|_| entity.is_child_entity())
                .and_then(|alias| self.entity(alias))
            else {
                break;
            };
            if parent.concept_alias == concept_alias
                || parents.iter().any(|p| p.concept_alias == parent.concept_alias)
            {
                break;
            }
            parents.push(parent);
            current = Some(parent);
        }
        parents
    }

    /// `elder` is a (grand)parent of `child`
    pub fn is_parent_entity(&self, child: &str, elder: &str) -> bool {
        self.parent_entities(child)
            .iter()
            .any(|p| p.concept_alias == elder)
    }

    pub fn is_entity_child_descendent(&self, parent: &str, child: &str) -> bool {
        self.entity(child).is_some_and(Entity::is_child_entity) && self.is_parent_entity(child, parent)
    }

    /// Whether two distinct entities share an ancestor
    pub fn are_related_entities(&self, a: &str, b: &str) -> bool {
        if a == b || self.entity(a).is_none() || self.entity(b).is_none() {
            return false;
        }
        self.common_ancestor(a, b).is_some()
    }

    /// Lowest entity found on both ancestor chains (each chain includes the
    /// entity itself), as indices into both chains
    fn common_ancestor(&self, a: &str, b: &str) -> Option<(usize, usize)> {
        let chain_a = self.chain(a);
        let chain_b = self.chain(b);
        chain_a.iter().enumerate().find_map(|(i, e)| {
            chain_b
                .iter()
                .position(|other| other.concept_alias == e.concept_alias)
                .map(|j| (i, j))
        })
    }

    fn chain(&self, concept_alias: &str) -> Vec<&Entity> {
        let mut chain: Vec<&Entity> = self.entity(concept_alias).into_iter().collect();
        chain.extend(self.parent_entities(concept_alias));
        chain
    }

    /// Hops needed to walk from `primary` to `other` through the entity tree
    ///
    /// Relations up to the common ancestor come first, then the relations back
    /// down towards `other`. Unrelated entities yield an empty list.
    pub fn entity_relations(&self, primary: &str, other: &str) -> Result<Vec<EntityRelation<'_>>> {
        self.require_entity(primary)?;
        self.require_entity(other)?;

        if primary == other {
            return Ok(Vec::new());
        }
        let Some((up, down)) = self.common_ancestor(primary, other) else {
            return Ok(Vec::new());
        };

        let chain_up = self.chain(primary);
        let chain_down = self.chain(other);

        let mut relations: Vec<EntityRelation<'_>> = chain_up[..=up]
            .windows(2)
            .map(|w| EntityRelation {
                parent: w[1],
                child: w[0],
            })
            .collect();
        relations.extend(chain_down[..=down].windows(2).rev().map(|w| EntityRelation {
            parent: w[1],
            child: w[0],
        }));
        Ok(relations)
    }

    /// Entities ordered so every child precedes (or follows) its ancestors
    ///
    /// Unrelated entities keep their config order.
    pub fn entities_sorted(&self, order: EntitySort) -> Vec<&Entity> {
        let mut sorted: Vec<&Entity> = Vec::with_capacity(self.entities.len());
        let mut seen: HashSet<&str> = HashSet::new();

        match order {
            EntitySort::ParentsFirst => {
                for entity in &self.entities {
                    let mut lineage = self.parent_entities(&entity.concept_alias);
                    lineage.reverse();
                    lineage.push(entity);
                    for e in lineage {
                        if seen.insert(&e.concept_alias) {
                            sorted.push(e);
                        }
                    }
                }
            }
            EntitySort::ChildrenFirst => {
                for entity in &self.entities {
                    self.push_descendants_first(entity, &mut seen, &mut sorted);
                }
            }
        }
        sorted
    }

    fn push_descendants_first<'a>(
        &'a self,
        entity: &'a Entity,
        seen: &mut HashSet<&'a str>,
        sorted: &mut Vec<&'a Entity>,
    ) {
        if !seen.insert(&entity.concept_alias) {
            return;
        }
        for child in self
            .entities
            .iter()
            .filter(|e| {
                e.is_child_entity() && e.parent_entity.as_deref() == Some(entity.concept_alias.as_str())
            })
        {
            self.push_descendants_first(child, seen, sorted);
        }
        sorted.push(entity);
    }

    pub fn generate_uris(&mut self) {
        for entity in &mut self.entities {
            entity.generate_uris();
        }
    }

    /// Attach default rules to every entity
    pub fn add_default_rules(&mut self, is_network: bool) {
        let parent_keys: Vec<Option<String>> = self
            .entities
            .iter()
            .map(|e| {
                e.parent_entity
                    .as_deref()
                    .and_then(|p| self.entity(p))
                    .and_then(|p| p.unique_key().map(str::to_string))
            })
            .collect();

        for (entity, parent_key) in self.entities.iter_mut().zip(parent_keys) {
            entity.add_default_rules(parent_key.as_deref(), is_network);
        }
    }

    /// Let every entity configure itself against its parent
    pub fn configure_entities(&mut self) {
        for i in 0..self.entities.len() {
            let parent = self.entities[i]
                .parent_entity
                .as_deref()
                .and_then(|p| self.entity(p))
                .cloned();
            self.entities[i].configure(parent.as_ref());
        }
    }

    /// Columns required at `level` by any entity on the sheet
    pub fn required_columns(&self, sheet_name: &str, level: RuleLevel) -> IndexSet<String> {
        self.entities_for_sheet(sheet_name)
            .into_iter()
            .flat_map(|e| required_columns_of(e, level))
            .collect()
    }

    pub fn required_columns_for_entity(&self, concept_alias: &str, level: RuleLevel) -> Vec<String> {
        self.entity(concept_alias)
            .map(|e| required_columns_of(e, level))
            .unwrap_or_default()
    }

    /// Messages from the last validation run
    pub fn errors(&self) -> Result<&[String]> {
        if !self.validated {
            return Err(ConfigError::NotValidated);
        }
        Ok(&self.errors)
    }

    pub fn is_validated(&self) -> bool {
        self.validated
    }

    pub(crate) fn set_validated(&mut self, errors: Vec<String>) {
        self.errors = errors;
        self.validated = true;
    }
}

fn required_columns_of(entity: &Entity, level: RuleLevel) -> Vec<String> {
    match entity.rule("RequiredValue", level) {
        Some(Rule::RequiredValue(rule)) => rule.columns().to_vec(),
        _ => Vec::new(),
    }
}

impl PartialEq for Config {
    fn eq(&self, other: &Self) -> bool {
        self.entities == other.entities
            && self.lists == other.lists
            && self.expedition_metadata_properties == other.expedition_metadata_properties
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::rules::RequiredValue;
    use pretty_assertions::assert_eq;

    /// event <- sample <- tissue, event <- photo, plus an unrelated location
    fn tree() -> Config {
        let mut config = Config::default();
        config.add_entity(Entity::new("event", "urn:event").with_unique_key("eventID"));
        config.add_entity(Entity::child("sample", "urn:sample", "event"));
        config.add_entity(Entity::child("tissue", "urn:tissue", "sample"));
        config.add_entity(Entity::child("photo", "urn:photo", "event"));
        config.add_entity(Entity::new("location", "urn:location"));
        config
    }

    fn aliases(entities: &[&Entity]) -> Vec<String> {
        entities.iter().map(|e| e.concept_alias.clone()).collect()
    }

    fn hops(relations: &[EntityRelation<'_>]) -> Vec<(String, String)> {
        relations
            .iter()
            .map(|r| (r.parent.concept_alias.clone(), r.child.concept_alias.clone()))
            .collect()
    }

    #[test]
    fn test_parent_entities() {
        let config = tree();
        assert_eq!(aliases(&config.parent_entities("tissue")), vec!["sample", "event"]);
        assert!(config.parent_entities("event").is_empty());
        assert!(config.is_parent_entity("tissue", "event"));
        assert!(!config.is_parent_entity("event", "tissue"));
        assert!(config.is_entity_child_descendent("event", "tissue"));
    }

    #[test]
    fn test_parent_cycle_terminates() {
        let mut config = Config::default();
        config.add_entity(Entity::child("a", "urn:a", "b"));
        config.add_entity(Entity::child("b", "urn:b", "a"));
        assert_eq!(aliases(&config.parent_entities("a")), vec!["b"]);
    }

    #[test]
    fn test_are_related_entities() {
        let config = tree();
        assert!(config.are_related_entities("tissue", "photo"));
        assert!(config.are_related_entities("event", "tissue"));
        assert!(!config.are_related_entities("event", "location"));
        assert!(!config.are_related_entities("event", "event"));
        assert!(!config.are_related_entities("event", "missing"));
    }

    #[test]
    fn test_entity_relations() {
        let config = tree();

        assert_eq!(
            hops(&config.entity_relations("tissue", "event").unwrap()),
            vec![
                ("sample".to_string(), "tissue".to_string()),
                ("event".to_string(), "sample".to_string())
            ]
        );
        assert_eq!(
            hops(&config.entity_relations("event", "tissue").unwrap()),
            vec![
                ("event".to_string(), "sample".to_string()),
                ("sample".to_string(), "tissue".to_string())
            ]
        );
        assert_eq!(
            hops(&config.entity_relations("tissue", "photo").unwrap()),
            vec![
                ("sample".to_string(), "tissue".to_string()),
                ("event".to_string(), "sample".to_string()),
                ("event".to_string(), "photo".to_string())
            ]
        );
        assert!(config.entity_relations("event", "location").unwrap().is_empty());
        assert!(matches!(
            config.entity_relations("event", "nope"),
            Err(ConfigError::UnknownEntity(_))
        ));
    }

    #[test]
    fn test_entities_sorted() {
        let mut config = Config::default();
        config.add_entity(Entity::child("tissue", "urn:tissue", "sample"));
        config.add_entity(Entity::new("location", "urn:location"));
        config.add_entity(Entity::child("sample", "urn:sample", "event"));
        config.add_entity(Entity::new("event", "urn:event"));

        assert_eq!(
            aliases(&config.entities_sorted(EntitySort::ParentsFirst)),
            vec!["event", "sample", "tissue", "location"]
        );
        assert_eq!(
            aliases(&config.entities_sorted(EntitySort::ChildrenFirst)),
            vec!["tissue", "location", "sample", "event"]
        );
    }

    #[test]
    fn test_multi_sheet_and_required_columns() {
        let mut config = Config::default();
        let mut event = Entity::new("event", "urn:event").with_worksheet("Samples");
        event.add_rule(RequiredValue::new(vec!["eventID".into()], RuleLevel::Error).into());
        let mut sample = Entity::child("sample", "urn:sample", "event").with_worksheet("Samples");
        sample.add_rule(
            RequiredValue::new(vec!["sampleID".into(), "eventID".into()], RuleLevel::Error).into(),
        );
        sample.add_rule(RequiredValue::new(vec!["depth".into()], RuleLevel::Warning).into());
        config.add_entity(event);
        config.add_entity(sample);
        config.add_entity(Entity::new("photo", "urn:photo").with_worksheet("Photos"));

        assert!(config.is_multi_sheet_entity("event"));
        assert!(!config.is_multi_sheet_entity("photo"));
        assert_eq!(
            config.required_columns("Samples", RuleLevel::Error).into_iter().collect::<Vec<_>>(),
            vec!["eventID", "sampleID"]
        );
        assert_eq!(
            config.required_columns_for_entity("sample", RuleLevel::Warning),
            vec!["depth"]
        );
    }

    #[test]
    fn test_add_default_rules_uses_parent_unique_key() {
        let mut config = tree();
        config.entity_mut("sample").unwrap().unique_key = Some("sampleID".into());
        config.add_default_rules(false);

        assert_eq!(
            config.required_columns_for_entity("sample", RuleLevel::Error),
            vec!["sampleID", "eventID"]
        );
        assert!(config
            .entity("sample")
            .unwrap()
            .rule("ValidParentIdentifiers", RuleLevel::Error)
            .is_some());
    }

    #[test]
    fn test_configure_entities_copies_parent_key_attribute() {
        let mut config = Config::default();
        let mut event = Entity::new("event", "urn:event").with_unique_key("eventID");
        event.add_attribute(Attribute::new("eventID", "urn:eventID"));
        config.add_entity(event);
        config.add_entity(Entity::child("sample", "urn:sample", "event"));

        config.configure_entities();
        assert_eq!(
            config.entity("sample").unwrap().attribute_uri("eventID"),
            Some("urn:eventID")
        );
    }

    #[test]
    fn test_errors_require_validation() {
        let mut config = Config::default();
        assert!(matches!(config.errors(), Err(ConfigError::NotValidated)));
        config.set_validated(vec!["boom".into()]);
        assert_eq!(config.errors().unwrap(), &["boom".to_string()]);
        config.add_list(List::new("yesNo", ["yes"]));
        assert!(!config.is_validated());
    }
}
