use super::Attribute;
use crate::error::{ConfigError, Result};
use crate::rules::{
    RequiredValue, Rule, RuleLevel, Rules, UniqueValue, ValidDataTypeFormat, ValidForUri,
    ValidParentIdentifiers,
};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const DEFAULT_RECORD_TYPE: &str = "GenericRecord";

/// Behavioral kind of an entity, serialized as its `type`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EntityKind {
    #[default]
    DefaultEntity,
    ChildEntity,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::DefaultEntity => f.write_str("DefaultEntity"),
            EntityKind::ChildEntity => f.write_str("ChildEntity"),
        }
    }
}

fn default_record_type() -> String {
    DEFAULT_RECORD_TYPE.to_string()
}

/// A node in the config's entity tree
///
/// Network-owned fields (`conceptURI`, `parentEntity`, `recordType`, attribute
/// URIs) are immutable from a project's point of view; `worksheet`,
/// `uniqueKey`, `uniqueAcrossProject` and `hashed` may be tuned per project.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    #[serde(default)]
    pub concept_alias: String,

    #[serde(default, rename = "conceptURI")]
    pub concept_uri: String,

    #[serde(default)]
    pub attributes: Vec<Attribute>,

    #[serde(default)]
    pub rules: Rules,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_entity: Option<String>,

    #[serde(default = "default_record_type")]
    pub record_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub worksheet: Option<String>,

    /// Column of the attribute identifying a record within its expedition
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unique_key: Option<String>,

    #[serde(default)]
    pub unique_across_project: bool,

    #[serde(default)]
    pub hashed: bool,

    #[serde(default, rename = "type")]
    pub kind: EntityKind,

    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub additional_props: serde_json::Map<String, serde_json::Value>,
}

impl Entity {
    pub fn new(concept_alias: impl Into<String>, concept_uri: impl Into<String>) -> Self {
        Self {
            concept_alias: concept_alias.into(),
            concept_uri: concept_uri.into(),
            record_type: default_record_type(),
            ..Default::default()
        }
    }

    pub fn child(
        concept_alias: impl Into<String>,
        concept_uri: impl Into<String>,
        parent_entity: impl Into<String>,
    ) -> Self {
        Self {
            parent_entity: Some(parent_entity.into()),
            kind: EntityKind::ChildEntity,
            ..Self::new(concept_alias, concept_uri)
        }
    }

    pub fn with_unique_key(mut self, column: impl Into<String>) -> Self {
        self.unique_key = Some(column.into());
        self
    }

    pub fn with_worksheet(mut self, worksheet: impl Into<String>) -> Self {
        self.worksheet = Some(worksheet.into());
        self
    }

    pub fn is_child_entity(&self) -> bool {
        self.parent_entity.as_deref().is_some_and(|p| !p.is_empty())
    }

    pub fn has_worksheet(&self) -> bool {
        self.worksheet.as_deref().is_some_and(|w| !w.trim().is_empty())
    }

    pub fn unique_key(&self) -> Option<&str> {
        self.unique_key.as_deref().filter(|k| !k.trim().is_empty())
    }

    /// URI of the attribute whose column is the uniqueKey
    pub fn unique_key_uri(&self) -> Option<&str> {
        let key = self.unique_key()?;
        self.attribute_uri(key)
    }

    pub fn add_attribute(&mut self, attribute: Attribute) {
        self.attributes.push(attribute);
    }

    pub fn add_rule(&mut self, rule: Rule) {
        self.rules.add(rule);
    }

    pub fn attribute(&self, column: &str) -> Result<&Attribute> {
        self.attributes
            .iter()
            .find(|a| a.column == column)
            .ok_or_else(|| ConfigError::missing_attribute(&self.concept_alias, column))
    }

    pub fn attribute_by_uri(&self, uri: &str) -> Result<&Attribute> {
        self.attributes
            .iter()
            .find(|a| a.uri == uri)
            .ok_or_else(|| ConfigError::missing_attribute(&self.concept_alias, uri))
    }

    pub fn attribute_uri(&self, column: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.column == column)
            .map(|a| a.uri.as_str())
    }

    pub fn attribute_column(&self, uri: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.uri == uri)
            .map(|a| a.column.as_str())
    }

    /// First rule named `name` at `level`
    pub fn rule(&self, name: &str, level: RuleLevel) -> Option<&Rule> {
        self.rules
            .iter()
            .find(|r| r.name() == name && r.level() == level)
    }

    /// Fill blank attribute URIs with `<conceptAlias>_<normalized column>`
    ///
    /// Colliding URIs get the first free numeric suffix.
    pub fn generate_uris(&mut self) {
        let mut existing: Vec<String> = self.attributes.iter().map(|a| a.uri.clone()).collect();

        for attribute in self.attributes.iter_mut() {
            if !attribute.uri.trim().is_empty() {
                continue;
            }

            let base = format!("{}_{}", self.concept_alias, normalize_column(&attribute.column));
            let mut uri = base.clone();
            let mut i = 1;
            while existing.contains(&uri) {
                uri = format!("{base}{i}");
                i += 1;
            }

            existing.push(uri.clone());
            attribute.uri = uri;
        }
    }

    /// Attach the rules every entity carries
    ///
    /// Network configs skip uniqueKey rules since projects may choose a
    /// different uniqueKey. `parent_unique_key` is the parent entity's
    /// uniqueKey column for child entities.
    pub fn add_default_rules(&mut self, parent_unique_key: Option<&str>, is_network: bool) {
        self.add_rule(ValidDataTypeFormat::default().into());

        if !is_network {
            let unique_key = self.unique_key.clone().unwrap_or_default();
            self.add_rule(ValidForUri::new(unique_key.clone(), RuleLevel::Error).into());

            let mut columns = vec![unique_key.clone()];
            if self.is_child_entity() {
                columns.push(parent_unique_key.unwrap_or_default().to_string());
            }
            self.add_rule(RequiredValue::new(columns, RuleLevel::Error).into());

            self.add_rule(
                UniqueValue::new(unique_key, self.unique_across_project, RuleLevel::Error).into(),
            );
        }

        if self.is_child_entity() {
            self.add_rule(ValidParentIdentifiers::default().into());
        }
    }

    /// Self-configure against the parent entity
    ///
    /// A child entity carries a copy of its parent's uniqueKey attribute.
    pub fn configure(&mut self, parent: Option<&Entity>) {
        if self.kind != EntityKind::ChildEntity {
            return;
        }
        let Some(parent) = parent else { return };
        let Some(uri) = parent.unique_key_uri() else {
            return;
        };

        if self.attribute_by_uri(uri).is_err() {
            if let Ok(attribute) = parent.attribute_by_uri(uri) {
                self.add_attribute(attribute.clone());
            }
        }
    }

    pub fn is_valid(&self) -> bool {
        match self.kind {
            EntityKind::DefaultEntity => true,
            EntityKind::ChildEntity => self.is_child_entity(),
        }
    }

    pub fn validation_error_messages(&self) -> Vec<String> {
        match self.kind {
            EntityKind::DefaultEntity => Vec::new(),
            EntityKind::ChildEntity => vec![format!(
                "Entity \"{}\" is missing a valid parentEntity",
                self.concept_alias
            )],
        }
    }

    /// Whether an upload may replace every stored record of the expedition
    pub fn can_reload(&self) -> bool {
        self.kind == EntityKind::DefaultEntity
    }

    pub fn build_child_identifier(parent_identifier: &str, local_identifier: &str) -> String {
        format!("{parent_identifier}_{local_identifier}")
    }
}

impl PartialEq for Entity {
    fn eq(&self, other: &Self) -> bool {
        self.concept_alias == other.concept_alias
            && self.concept_uri == other.concept_uri
            && self.attributes == other.attributes
            && self.rules == other.rules
            && self.parent_entity == other.parent_entity
            && self.record_type == other.record_type
            && self.worksheet == other.worksheet
            && self.unique_key == other.unique_key
            && self.unique_across_project == other.unique_across_project
            && self.hashed == other.hashed
            && self.kind == other.kind
    }
}

fn normalize_column(column: &str) -> String {
    column
        .replace(' ', "_")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect::<String>()
        .to_lowercase()
}
