use super::ProjectConfig;
use crate::error::{ConfigError, Result};
use crate::models::{Attribute, Entity, ExpeditionMetadataProperty, List};
use crate::network::NetworkConfig;
use crate::rules::Rules;
use serde::{Deserialize, Serialize};

/// Attribute settings a project may override
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectAttribute {
    /// URI of the network attribute being overridden
    pub uri: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub definition: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_unknown: Option<bool>,
}

impl From<&Attribute> for ProjectAttribute {
    fn from(a: &Attribute) -> Self {
        Self {
            uri: a.uri.clone(),
            group: a.group.clone(),
            definition: a.definition.clone(),
            allow_unknown: Some(a.allow_unknown),
        }
    }
}

impl ProjectAttribute {
    fn to_attribute(&self, base: &Attribute) -> Result<Attribute> {
        if base.uri != self.uri {
            return Err(ConfigError::Invalid(format!(
                "attribute override \"{}\" applied to \"{}\"",
                self.uri, base.uri
            )));
        }

        Ok(Attribute {
            group: self.group.clone().or_else(|| base.group.clone()),
            definition: self.definition.clone().or_else(|| base.definition.clone()),
            allow_unknown: self.allow_unknown.unwrap_or(base.allow_unknown),
            ..base.clone()
        })
    }
}

/// Entity settings a project may override, plus its own rules
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectEntity {
    /// conceptAlias of the network entity being overridden
    pub concept_alias: String,

    #[serde(default)]
    pub attributes: Vec<ProjectAttribute>,

    /// Rules added by the project on top of the network rules
    #[serde(default)]
    pub rules: Rules,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub worksheet: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unique_key: Option<String>,

    #[serde(default)]
    pub unique_across_project: bool,

    #[serde(default)]
    pub hashed: bool,

    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub additional_props: serde_json::Map<String, serde_json::Value>,
}

impl From<&Entity> for ProjectEntity {
    fn from(e: &Entity) -> Self {
        Self {
            concept_alias: e.concept_alias.clone(),
            attributes: e.attributes.iter().map(ProjectAttribute::from).collect(),
            rules: e.rules.iter().filter(|r| !r.is_network_rule()).cloned().collect(),
            worksheet: e.worksheet.clone(),
            unique_key: e.unique_key.clone(),
            unique_across_project: e.unique_across_project,
            hashed: e.hashed,
            additional_props: e.additional_props.clone(),
        }
    }
}

impl ProjectEntity {
    /// Apply the overrides to a copy of the network entity `base`
    ///
    /// Internal network attributes are always kept. Rules are the network
    /// rules that apply to the project's columns followed by project rules.
    pub fn to_entity(&self, base: &Entity) -> Result<Entity> {
        if base.concept_alias != self.concept_alias {
            return Err(ConfigError::Invalid(format!(
                "entity override \"{}\" applied to \"{}\"",
                self.concept_alias, base.concept_alias
            )));
        }

        let mut entity = Entity {
            hashed: self.hashed,
            unique_across_project: self.unique_across_project,
            unique_key: self.unique_key.clone(),
            worksheet: self.worksheet.clone(),
            additional_props: self.additional_props.clone(),
            attributes: Vec::new(),
            rules: Rules::new(),
            ..base.clone()
        };

        for attribute in &self.attributes {
            let base_attribute = base.attribute_by_uri(&attribute.uri)?;
            entity.add_attribute(attribute.to_attribute(base_attribute)?);
        }
        for attribute in base.attributes.iter().filter(|a| a.internal) {
            if !entity.attributes.contains(attribute) {
                entity.add_attribute(attribute.clone());
            }
        }

        let columns: Vec<String> = entity.attributes.iter().map(|a| a.column.clone()).collect();
        for rule in base.rules.iter().filter_map(|r| r.to_project_rule(&columns)) {
            entity.add_rule(rule);
        }
        for rule in &self.rules {
            entity.add_rule(rule.clone());
        }
        Ok(entity)
    }
}

/// The stored form of a project config: only what differs from the network
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedProjectConfig {
    #[serde(default)]
    pub entities: Vec<ProjectEntity>,

    #[serde(default)]
    pub lists: Vec<List>,

    #[serde(default)]
    pub expedition_metadata_properties: Vec<ExpeditionMetadataProperty>,
}

impl PersistedProjectConfig {
    /// Strip network data from `config` after attaching its default rules
    pub fn from_project_config(config: &mut ProjectConfig) -> Self {
        config.add_default_rules();

        Self {
            entities: config.entities.iter().map(ProjectEntity::from).collect(),
            lists: config.lists.iter().filter(|l| !l.network_list).cloned().collect(),
            expedition_metadata_properties: config
                .expedition_metadata_properties
                .iter()
                .filter(|p| !p.network_prop)
                .cloned()
                .collect(),
        }
    }

    /// Rebuild the full project config on top of `network`
    pub fn to_project_config(&self, network: &NetworkConfig) -> Result<ProjectConfig> {
        let mut config = ProjectConfig::default();

        for prop in &network.expedition_metadata_properties {
            let mut prop = prop.clone();
            prop.network_prop = true;
            config.expedition_metadata_properties.push(prop);
        }
        config
            .expedition_metadata_properties
            .extend(self.expedition_metadata_properties.iter().cloned());

        for project_entity in &self.entities {
            let base = network
                .entity(&project_entity.concept_alias)
                .ok_or_else(|| ConfigError::UnknownEntity(project_entity.concept_alias.clone()))?;
            config.add_entity(project_entity.to_entity(base)?);
        }

        for list in &network.lists {
            let mut list = list.clone();
            list.network_list = true;
            config.add_list(list);
        }
        for list in &self.lists {
            config.add_list(list.clone());
        }

        config.add_default_rules();
        Ok(config)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::rules::{RegExp, RequiredValue, Rule, RuleLevel};
    use pretty_assertions::assert_eq;

    fn project_rules(entity: &Entity) -> Vec<&Rule> {
        entity.rules.iter().filter(|r| !r.is_network_rule()).collect()
    }

    fn network() -> NetworkConfig {
        let mut event = Entity::new("event", "urn:event").with_unique_key("eventID");
        event.add_attribute(Attribute::new("eventID", "urn:eventID"));
        event.add_attribute(Attribute::new("locality", "urn:locality"));
        let mut internal = Attribute::new("bcid", "urn:bcid");
        internal.internal = true;
        event.add_attribute(internal);
        event.add_rule(RegExp::new("locality", "[a-z]+", false, RuleLevel::Warning).into());
        event.add_rule(RegExp::new("missing", "x", false, RuleLevel::Warning).into());

        let mut network = NetworkConfig::default();
        network.add_entity(event);
        network.add_list(List::new("yesNo", ["yes", "no"]));
        network
            .expedition_metadata_properties
            .push(ExpeditionMetadataProperty::new("public", true));
        network
    }

    fn persisted() -> PersistedProjectConfig {
        let mut event = ProjectEntity {
            concept_alias: "event".into(),
            worksheet: Some("Events".into()),
            unique_key: Some("eventID".into()),
            ..Default::default()
        };
        event.attributes.push(ProjectAttribute {
            uri: "urn:eventID".into(),
            ..Default::default()
        });
        event.attributes.push(ProjectAttribute {
            uri: "urn:locality".into(),
            group: Some("Where".into()),
            allow_unknown: Some(true),
            ..Default::default()
        });
        event
            .rules
            .add(RequiredValue::new(vec!["locality".into()], RuleLevel::Warning).into());

        PersistedProjectConfig {
            entities: vec![event],
            lists: vec![List::new("sexes", ["male", "female"])],
            expedition_metadata_properties: vec![ExpeditionMetadataProperty::new("permit", false)],
        }
    }

    #[test]
    fn test_to_project_config() {
        let config = persisted().to_project_config(&network()).unwrap();

        assert_eq!(
            config
                .expedition_metadata_properties
                .iter()
                .map(|p| (p.name.as_str(), p.network_prop))
                .collect::<Vec<_>>(),
            vec![("public", true), ("permit", false)]
        );
        assert_eq!(
            config.lists.iter().map(|l| l.alias.as_str()).collect::<Vec<_>>(),
            vec!["yesNo", "sexes"]
        );

        let event = config.entity("event").unwrap();
        assert_eq!(event.worksheet.as_deref(), Some("Events"));
        assert_eq!(
            event.attributes.iter().map(|a| a.column.as_str()).collect::<Vec<_>>(),
            vec!["eventID", "locality", "bcid"]
        );
        let locality = event.attribute("locality").unwrap();
        assert_eq!(locality.group.as_deref(), Some("Where"));
        assert!(locality.allow_unknown);

        assert!(event.rule("RegExp", RuleLevel::Warning).is_some_and(Rule::is_network_rule));
        assert_eq!(event.rules.iter().filter(|r| r.name() == "RegExp").count(), 1);
        assert!(event.rule("UniqueValue", RuleLevel::Error).is_some());
    }

    #[test]
    fn test_round_trip_keeps_only_project_data() {
        let network = network();
        let mut config = persisted().to_project_config(&network).unwrap();
        let stored = PersistedProjectConfig::from_project_config(&mut config);

        assert_eq!(stored.lists, persisted().lists);
        assert_eq!(stored.expedition_metadata_properties, persisted().expedition_metadata_properties);
        assert_eq!(stored.entities[0].attributes.len(), 3);
        assert!(stored.entities[0]
            .rules
            .iter()
            .any(|r| r.name() == "RequiredValue" && r.level() == RuleLevel::Warning));
        assert_eq!(
            project_rules(config.entity("event").unwrap()).len(),
            stored.entities[0].rules.len()
        );
    }

    #[test]
    fn test_unknown_entity() {
        let mut stored = persisted();
        stored.entities[0].concept_alias = "nope".into();
        assert!(matches!(
            stored.to_project_config(&network()),
            Err(ConfigError::UnknownEntity(alias)) if alias == "nope"
        ));
    }

    #[test]
    fn test_unknown_attribute() {
        let mut stored = persisted();
        stored.entities[0].attributes[0].uri = "urn:nope".into();
        assert!(matches!(
            stored.to_project_config(&network()),
            Err(ConfigError::MissingAttribute { .. })
        ));
    }
}
