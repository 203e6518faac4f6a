use serde::{Deserialize, Serialize};

/// A controlled vocabulary term
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,

    pub value: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub defined_by: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub definition: Option<String>,
}

impl Field {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            ..Default::default()
        }
    }
}

/// A named controlled vocabulary referenced by `ControlledVocabulary` rules
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct List {
    pub alias: String,

    #[serde(default)]
    pub case_insensitive: bool,

    #[serde(default)]
    pub fields: Vec<Field>,

    /// Set when the list was inherited from the network config
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub network_list: bool,
}

impl List {
    pub fn new(alias: impl Into<String>, values: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            alias: alias.into(),
            fields: values.into_iter().map(Field::new).collect(),
            ..Default::default()
        }
    }

    pub fn contains(&self, value: &str) -> bool {
        if self.case_insensitive {
            self.fields.iter().any(|f| f.value.eq_ignore_ascii_case(value))
        } else {
            self.fields.iter().any(|f| f.value == value)
        }
    }
}

// Provenance is not part of a list's identity.
impl PartialEq for List {
    fn eq(&self, other: &Self) -> bool {
        self.alias == other.alias
            && self.case_insensitive == other.case_insensitive
            && self.fields == other.fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_respects_case_sensitivity() {
        let mut list = List::new("yesNo", ["Yes", "No"]);
        assert!(list.contains("Yes"));
        assert!(!list.contains("yes"));

        list.case_insensitive = true;
        assert!(list.contains("yes"));
        assert!(!list.contains("maybe"));
    }

    #[test]
    fn test_network_flag_does_not_affect_equality() {
        let a = List::new("a", ["x"]);
        let mut b = a.clone();
        b.network_list = true;
        assert_eq!(a, b);

        b.fields.push(Field::new("y"));
        assert_ne!(a, b);
    }
}
