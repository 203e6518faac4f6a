use super::Record;
use crate::error::{ConfigError, Result};
use crate::models::Entity;
use std::collections::HashMap;
use tracing::debug;

type CacheKey = (Option<i32>, String, String);

/// All records of a single entity within one expedition upload
#[derive(Debug, Clone)]
pub struct RecordSet {
    entity: Entity,
    records: Vec<Record>,
    reload: bool,
    expedition_code: Option<String>,
    deduplicated: bool,
}

impl RecordSet {
    pub fn new(entity: Entity, reload: bool) -> Self {
        Self {
            entity,
            records: Vec::new(),
            reload,
            expedition_code: None,
            deduplicated: false,
        }
    }

    pub fn with_records(entity: Entity, records: Vec<Record>, reload: bool) -> Self {
        let mut set = Self::new(entity, reload);
        set.records = records;
        set
    }

    pub fn entity(&self) -> &Entity {
        &self.entity
    }

    pub fn concept_alias(&self) -> &str {
        &self.entity.concept_alias
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn records_mut(&mut self) -> &mut [Record] {
        &mut self.records
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn add(&mut self, record: Record) {
        self.deduplicated = false;
        self.records.push(record);
    }

    /// Records flagged for persistence, with their index in [`records`](Self::records)
    pub fn records_to_persist(&self) -> impl Iterator<Item = (usize, &Record)> {
        self.records.iter().enumerate().filter(|(_, r)| r.persist())
    }

    pub fn has_record_to_persist(&self) -> bool {
        self.records.iter().any(Record::persist)
    }

    /// Reloading replaces every stored record of the expedition
    pub fn reload(&self) -> bool {
        self.reload && self.entity.can_reload()
    }

    /// The upload's expedition, defaulting to that of the first persisting record
    pub fn expedition_code(&self) -> &str {
        match &self.expedition_code {
            Some(code) => code,
            None => self
                .records
                .iter()
                .find(|r| r.persist())
                .map(Record::expedition_code)
                .unwrap_or(""),
        }
    }

    /// Apply `code` to every persisting record
    pub fn set_expedition_code(&mut self, code: impl Into<String>) {
        let code = code.into();
        if self.expedition_code.as_deref() == Some(code.as_str()) {
            return;
        }
        for record in self.records.iter_mut().filter(|r| r.persist()) {
            record.set_expedition_code(code.clone());
        }
        self.expedition_code = Some(code);
    }

    pub fn project_id(&self) -> Option<i32> {
        self.records
            .iter()
            .find(|r| r.persist())
            .and_then(Record::project_id)
    }

    fn cache_key(&self, record: &Record) -> CacheKey {
        let uri = self.entity.unique_key_uri().unwrap_or_default();
        (
            record.project_id(),
            record.expedition_code().to_string(),
            record.get(uri).to_string(),
        )
    }

    fn build_cache(&self) -> HashMap<CacheKey, Vec<usize>> {
        let mut cache: HashMap<CacheKey, Vec<usize>> = HashMap::new();
        for (i, record) in self.records.iter().enumerate() {
            cache.entry(self.cache_key(record)).or_default().push(i);
        }
        cache
    }

    /// Collapse identical records sharing a project, expedition and uniqueKey
    ///
    /// Fails with [`ConfigError::InvalidRecords`] listing the identifiers of
    /// duplicates whose other values differ.
    pub fn remove_duplicates(&mut self) -> Result<()> {
        if self.deduplicated {
            return Ok(());
        }

        let uri = self.entity.unique_key_uri().unwrap_or_default().to_string();
        let mut groups: Vec<Vec<usize>> = self
            .build_cache()
            .into_values()
            .filter(|idx| idx.len() > 1)
            .collect();
        groups.sort();

        let mut invalid = Vec::new();
        let mut to_remove = Vec::new();
        for group in &groups {
            let first = &self.records[group[0]];
            if group.iter().any(|&i| self.records[i] != *first) {
                invalid.push(first.get(&uri).to_string());
            } else {
                to_remove.extend_from_slice(&group[1..]);
            }
        }

        if !invalid.is_empty() {
            return Err(ConfigError::InvalidRecords(invalid.join(", ")));
        }

        if !to_remove.is_empty() {
            debug!(
                entity = %self.entity.concept_alias,
                removed = to_remove.len(),
                "Removed duplicate records"
            );
        }
        to_remove.sort_unstable();
        for i in to_remove.into_iter().rev() {
            self.records.remove(i);
        }
        self.deduplicated = true;
        Ok(())
    }

    /// Add `records` that are not already present
    ///
    /// A record is present when one with the same project, expedition and
    /// uniqueKey exists and, if `parent_unique_key_uri` is given, the same
    /// parent identifier.
    pub fn merge(&mut self, records: Vec<Record>, parent_unique_key_uri: Option<&str>) {
        let mut cache = self.build_cache();
        for record in records {
            let key = self.cache_key(&record);
            let exists = cache.get(&key).is_some_and(|existing| {
                existing.iter().any(|&i| match parent_unique_key_uri {
                    None => true,
                    Some(uri) => self.records[i].get(uri) == record.get(uri),
                })
            });
            if !exists {
                cache.entry(key).or_default().push(self.records.len());
                self.add(record);
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::models::{Attribute, Entity};

    fn entity() -> Entity {
        let mut e = Entity::new("event", "urn:event");
        e.unique_key = Some("eventID".into());
        e.add_attribute(Attribute::new("eventID", "urn:eventID"));
        e.add_attribute(Attribute::new("col2", "urn:col2"));
        e
    }

    fn record(id: &str, col2: &str) -> Record {
        let mut r = Record::new(Some(1), "exp");
        r.set("urn:eventID", id);
        r.set("urn:col2", col2);
        r
    }

    #[test]
    fn test_remove_duplicates_collapses_identical_records() {
        let mut set = RecordSet::with_records(
            entity(),
            vec![record("1", "a"), record("1", "a"), record("2", "b")],
            false,
        );
        set.remove_duplicates().unwrap();
        assert_eq!(set.records().len(), 2);
    }

    #[test]
    fn test_remove_duplicates_fails_on_conflicting_values() {
        let mut set = RecordSet::with_records(
            entity(),
            vec![record("1", "a"), record("1", "b")],
            false,
        );
        match set.remove_duplicates() {
            Err(ConfigError::InvalidRecords(ids)) => assert_eq!(ids, "1"),
            other => panic!("expected InvalidRecords, got {other:?}"),
        }
    }

    #[test]
    fn test_merge_skips_existing_records() {
        let mut set = RecordSet::with_records(entity(), vec![record("1", "a")], false);
        set.merge(
            vec![record("1", "changed").stored(), record("3", "c").stored()],
            None,
        );
        assert_eq!(set.records().len(), 2);
        assert_eq!(set.records()[0].get("urn:col2"), "a");
        assert_eq!(set.records_to_persist().count(), 1);
    }

    #[test]
    fn test_expedition_code_defaults_to_first_persisting_record() {
        let mut other = record("9", "z").stored();
        other.set_expedition_code("stored");
        let mut set = RecordSet::with_records(entity(), vec![other, record("1", "a")], false);
        assert_eq!(set.expedition_code(), "exp");

        set.set_expedition_code("new");
        assert_eq!(set.expedition_code(), "new");
        assert_eq!(set.records()[0].expedition_code(), "stored");
        assert_eq!(set.records()[1].expedition_code(), "new");
    }

    #[test]
    fn test_child_entities_never_reload() {
        let mut child = entity();
        child.parent_entity = Some("parent".into());
        assert!(RecordSet::new(entity(), true).reload());
        assert!(!RecordSet::new(child, true).reload());
    }
}
