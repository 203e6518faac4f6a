use serde::{Deserialize, Serialize};

/// Value type of an expedition metadata property
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PropertyType {
    #[default]
    String,
    List,
    Boolean,
}

/// A property every expedition in a project must (or may) carry
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpeditionMetadataProperty {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub required: bool,

    #[serde(default, rename = "type")]
    pub property_type: PropertyType,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<String>,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub network_prop: bool,
}

impl ExpeditionMetadataProperty {
    pub fn new(name: impl Into<String>, required: bool) -> Self {
        Self {
            name: name.into(),
            required,
            ..Default::default()
        }
    }
}

impl PartialEq for ExpeditionMetadataProperty {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.required == other.required
    }
}
