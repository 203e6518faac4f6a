//! Project configs: per-project overrides of a network config
//!
//! A project may pick a subset of the network's entities and attributes,
//! tighten rules, choose worksheets and choose between the network uniqueKey
//! and hashing. Everything else is inherited from the network verbatim, which
//! [`ProjectConfig::merge_network_config`] enforces before validation.

mod columns;
mod persisted;
mod validator;

pub use columns::ColumnComparator;
pub use persisted::{PersistedProjectConfig, ProjectAttribute, ProjectEntity};
pub use validator::ProjectChecks;

use crate::config::Config;
use crate::network::NetworkConfig;
use crate::rules::RuleLevel;
use crate::validator::ConfigValidator;
use serde::{Deserialize, Serialize};
use std::ops::{Deref, DerefMut};
use tracing::debug;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectConfig(Config);

impl ProjectConfig {
    pub fn new(config: Config) -> Self {
        Self(config)
    }

    /// Merge `network` then validate against it
    pub fn is_valid(&mut self, network: &NetworkConfig) -> bool {
        self.merge_network_config(network);
        ConfigValidator::new(ProjectChecks::new(network)).is_valid(&mut self.0)
    }

    /// Attach the default rules of a project config
    pub fn add_default_rules(&mut self) {
        self.0.add_default_rules(false);
    }

    /// Pull inherited data from `network` into this config
    ///
    /// Fixes every difference a project is not allowed to have, so validation
    /// only reports what merging can not resolve.
    pub fn merge_network_config(&mut self, network: &NetworkConfig) {
        for prop in &network.expedition_metadata_properties {
            if !self.0.expedition_metadata_properties.contains(prop) {
                let mut prop = prop.clone();
                prop.network_prop = true;
                self.0.expedition_metadata_properties.push(prop);
            }
        }

        for list in &network.lists {
            match self.0.lists.iter_mut().find(|l| l.alias == list.alias) {
                Some(project_list) => project_list.network_list = true,
                None => {
                    let mut list = list.clone();
                    list.network_list = true;
                    self.0.add_list(list);
                }
            }
        }

        for network_entity in &network.entities {
            let Some(entity) = self.0.entity_mut(&network_entity.concept_alias) else {
                continue;
            };

            entity.hashed |= network_entity.hashed;
            entity.unique_across_project |= network_entity.unique_across_project;
            if entity.unique_key.is_none() && !entity.hashed {
                entity.unique_key = network_entity.unique_key.clone();
            }
            if network_entity.has_worksheet() && entity.worksheet.is_none() {
                entity.worksheet = network_entity.worksheet.clone();
            }
            entity.concept_uri = network_entity.concept_uri.clone();
            entity.parent_entity = network_entity.parent_entity.clone();
            entity.record_type = network_entity.record_type.clone();

            for attribute in &mut entity.attributes {
                let Ok(network_attribute) = network_entity.attribute_by_uri(&attribute.uri) else {
                    continue;
                };
                attribute.column = network_attribute.column.clone();
                attribute.data_type = network_attribute.data_type;
                attribute.internal = network_attribute.internal;
                attribute.defined_by = network_attribute.defined_by.clone();
                attribute.data_format = network_attribute.data_format.clone();
                attribute.delimited_by = network_attribute.delimited_by.clone();
                if attribute.group.is_none() {
                    attribute.group = network_attribute.group.clone();
                }
                if attribute.definition.is_none() {
                    attribute.definition = network_attribute.definition.clone();
                }
            }

            for column in NetworkConfig::required_columns_for_entity(network_entity, RuleLevel::Error) {
                if entity.attribute(&column).is_err() {
                    if let Ok(attribute) = network_entity.attribute(&column) {
                        entity.add_attribute(attribute.clone());
                    }
                }
            }

            let columns: Vec<String> = entity.attributes.iter().map(|a| a.column.clone()).collect();
            for rule in &network_entity.rules {
                if let Some(rule) = rule.to_project_rule(&columns) {
                    entity.add_rule(rule);
                }
            }
        }

        debug!(entities = self.0.entities.len(), "Merged network config");
    }

    pub fn into_inner(self) -> Config {
        self.0
    }
}

impl Deref for ProjectConfig {
    type Target = Config;

    fn deref(&self) -> &Config {
        &self.0
    }
}

impl DerefMut for ProjectConfig {
    fn deref_mut(&mut self) -> &mut Config {
        &mut self.0
    }
}
