use super::DataType;
use serde::{Deserialize, Serialize};

/// A single column of an entity, mapped to a term URI
///
/// Two attributes are the same attribute when their URIs match; every other
/// field is presentation or validation detail.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attribute {
    #[serde(default)]
    pub column: String,

    #[serde(default)]
    pub uri: String,

    #[serde(default)]
    pub data_type: DataType,

    #[serde(default)]
    pub internal: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub defined_by: Option<String>,

    /// Comma separated list of accepted formats for date/time values
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_format: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delimited_by: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub definition: Option<String>,

    #[serde(default)]
    pub allow_unknown: bool,

    #[serde(default, rename = "allowTBD")]
    pub allow_tbd: bool,
}

impl Attribute {
    pub fn new(column: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            uri: uri.into(),
            ..Default::default()
        }
    }

    pub fn with_data_type(mut self, data_type: DataType) -> Self {
        self.data_type = data_type;
        self
    }

    pub fn with_data_format(mut self, format: impl Into<String>) -> Self {
        self.data_format = Some(format.into());
        self
    }

    pub fn is_unknown_value(&self, value: &str) -> bool {
        value.eq_ignore_ascii_case("unknown")
    }

    pub fn is_tbd_value(&self, value: &str) -> bool {
        value.eq_ignore_ascii_case("tbd") || value.eq_ignore_ascii_case("to be determined")
    }

    /// Configured date formats, split and trimmed
    pub fn data_formats(&self) -> Vec<&str> {
        self.data_format
            .as_deref()
            .map(|f| f.split(',').map(str::trim).filter(|f| !f.is_empty()).collect())
            .unwrap_or_default()
    }
}

impl PartialEq for Attribute {
    fn eq(&self, other: &Self) -> bool {
        self.uri == other.uri
    }
}

impl Eq for Attribute {}
