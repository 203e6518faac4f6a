use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

pub const EXPEDITION_CODE_KEY: &str = "expeditionCode";
pub const PROJECT_ID_KEY: &str = "projectId";
pub const ROOT_IDENTIFIER_KEY: &str = "rootIdentifier";

/// A single row of data for one entity, keyed by attribute URI
///
/// Freshly read records are flagged for persistence. Records loaded from a
/// [`RecordRepository`](crate::dataset::RecordRepository) are not, so they take
/// part in uniqueness and parent checks without being validated themselves.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "IndexMap<String, String>", into = "IndexMap<String, String>")]
pub struct Record {
    properties: IndexMap<String, String>,
    root_identifier: Option<String>,
    project_id: Option<i32>,
    expedition_code: String,
    persist: bool,
    error: bool,
}

impl Record {
    pub fn new(project_id: Option<i32>, expedition_code: impl Into<String>) -> Self {
        Self {
            project_id,
            expedition_code: expedition_code.into(),
            persist: true,
            ..Default::default()
        }
    }

    /// Build a record from a property map, lifting out the special keys
    pub fn from_properties(properties: IndexMap<String, String>) -> Self {
        let mut record = Record {
            persist: true,
            ..Default::default()
        };
        for (key, value) in properties {
            record.set(key, value);
        }
        record
    }

    /// Trimmed value for `uri`, or `""` when absent
    pub fn get(&self, uri: &str) -> &str {
        self.properties.get(uri).map(|v| v.trim()).unwrap_or("")
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match key.as_str() {
            EXPEDITION_CODE_KEY => self.expedition_code = value,
            PROJECT_ID_KEY => self.project_id = value.trim().parse().ok(),
            ROOT_IDENTIFIER_KEY => self.root_identifier = Some(value),
            _ => {
                self.properties.insert(key, value);
            }
        }
        self.persist = true;
    }

    pub fn properties(&self) -> &IndexMap<String, String> {
        &self.properties
    }

    pub fn has_value(&self) -> bool {
        self.properties.values().any(|v| !v.trim().is_empty())
    }

    pub fn expedition_code(&self) -> &str {
        &self.expedition_code
    }

    pub fn set_expedition_code(&mut self, code: impl Into<String>) {
        self.expedition_code = code.into();
    }

    pub fn project_id(&self) -> Option<i32> {
        self.project_id
    }

    pub fn set_project_id(&mut self, project_id: i32) {
        self.project_id = Some(project_id);
    }

    pub fn root_identifier(&self) -> Option<&str> {
        self.root_identifier.as_deref()
    }

    pub fn set_root_identifier(&mut self, root: impl Into<String>) {
        self.root_identifier = Some(root.into());
    }

    /// Errored records are never persisted
    pub fn persist(&self) -> bool {
        self.persist && !self.error
    }

    pub fn set_persist(&mut self, persist: bool) {
        self.persist = persist;
    }

    /// Mark a record loaded from storage so it is not re-validated
    pub fn stored(mut self) -> Self {
        self.persist = false;
        self
    }

    pub fn has_error(&self) -> bool {
        self.error
    }

    pub fn set_error(&mut self) {
        self.error = true;
    }
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        self.properties == other.properties
            && self.expedition_code == other.expedition_code
            && self.project_id == other.project_id
    }
}

impl From<IndexMap<String, String>> for Record {
    fn from(properties: IndexMap<String, String>) -> Self {
        Record::from_properties(properties)
    }
}

impl From<Record> for IndexMap<String, String> {
    fn from(record: Record) -> Self {
        let mut map = record.properties;
        if !record.expedition_code.is_empty() {
            map.insert(EXPEDITION_CODE_KEY.to_string(), record.expedition_code);
        }
        if let Some(id) = record.project_id {
            map.insert(PROJECT_ID_KEY.to_string(), id.to_string());
        }
        if let Some(root) = record.root_identifier {
            map.insert(ROOT_IDENTIFIER_KEY.to_string(), root);
        }
        map
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_get_trims_and_defaults_to_empty() {
        let mut record = Record::new(Some(1), "exp");
        record.set("urn:name", "  value ");
        assert_eq!(record.get("urn:name"), "value");
        assert_eq!(record.get("urn:missing"), "");
    }

    #[test]
    fn test_special_keys_are_lifted() {
        let record: Record = serde_json::from_str(
            r#"{"urn:a": "1", "expeditionCode": "exp1", "projectId": "7", "rootIdentifier": "ark:/1"}"#,
        )
        .unwrap();

        assert_eq!(record.expedition_code(), "exp1");
        assert_eq!(record.project_id(), Some(7));
        assert_eq!(record.root_identifier(), Some("ark:/1"));
        assert_eq!(record.properties().len(), 1);
        assert!(record.persist());
    }

    #[test]
    fn test_errored_records_do_not_persist() {
        let mut record = Record::new(None, "exp");
        assert!(record.persist());
        record.set_error();
        assert!(!record.persist());
        assert!(!Record::new(None, "exp").stored().persist());
    }

    #[test]
    fn test_equality_ignores_flags() {
        let mut a = Record::new(Some(1), "exp");
        a.set("urn:a", "x");
        let b = a.clone().stored();
        assert_eq!(a, b);

        let mut c = a.clone();
        c.set_expedition_code("other");
        assert_ne!(a, c);
    }
}
