use crate::config::{Config, EntitySort};
use crate::models::Entity;
use crate::records::{Record, RecordSet, EXPEDITION_CODE_KEY};
use fims_common::hashing::hash_properties;
use indexmap::IndexMap;
use std::collections::HashMap;
use tracing::debug;

/// Turns parsed worksheet rows into record sets
///
/// Every entity mapped to the worksheet gets one record per non-blank row.
/// Records are grouped into one record set per entity and expedition.
#[derive(Debug, Clone, Copy)]
pub struct SheetReader<'a> {
    config: &'a Config,
    reload: bool,
}

impl<'a> SheetReader<'a> {
    pub fn new(config: &'a Config, reload: bool) -> Self {
        Self { config, reload }
    }

    pub fn read(&self, sheet: &str, rows: &[IndexMap<String, String>]) -> Vec<RecordSet> {
        let entities: Vec<&Entity> = self
            .config
            .entities_sorted(EntitySort::ParentsFirst)
            .into_iter()
            .filter(|e| e.worksheet.as_deref() == Some(sheet))
            .collect();

        let mut records: IndexMap<&str, Vec<Record>> = IndexMap::new();
        for row in rows
            .iter()
            .filter(|row| row.values().any(|v| !v.trim().is_empty()))
        {
            for (alias, record) in self.row_records(&entities, row) {
                records.entry(alias).or_default().push(record);
            }
        }

        let mut record_sets = Vec::new();
        for entity in entities {
            let Some(entity_records) = records.shift_remove(entity.concept_alias.as_str()) else {
                continue;
            };

            let mut by_expedition: IndexMap<String, Vec<Record>> = IndexMap::new();
            for record in entity_records {
                by_expedition
                    .entry(record.expedition_code().to_string())
                    .or_default()
                    .push(record);
            }

            for (code, group) in by_expedition {
                let mut record_set = RecordSet::with_records(entity.clone(), group, self.reload);
                if !code.is_empty() {
                    record_set.set_expedition_code(code);
                }
                record_sets.push(record_set);
            }
        }

        debug!(sheet, rows = rows.len(), record_sets = record_sets.len(), "Read worksheet");
        record_sets
    }

    /// One record per entity for `row`; `entities` must list parents first
    fn row_records<'e>(
        &self,
        entities: &[&'e Entity],
        row: &IndexMap<String, String>,
    ) -> Vec<(&'e str, Record)> {
        let expedition = row
            .get(EXPEDITION_CODE_KEY)
            .map(|c| c.trim().to_string())
            .unwrap_or_default();

        let mut hashed: HashMap<&str, String> = HashMap::new();
        let mut records = Vec::with_capacity(entities.len());

        for entity in entities {
            let mut record = Record::new(None, expedition.clone());
            for attribute in &entity.attributes {
                if let Some(value) = row.get(&attribute.column) {
                    record.set(attribute.uri.clone(), value.clone());
                }
            }

            if entity.hashed {
                if let Some(uri) = entity.unique_key_uri() {
                    let identifier = hash_properties(record.properties());
                    record.set(uri, identifier.clone());
                    hashed.insert(entity.concept_alias.as_str(), identifier);
                }
            }

            // a child of a hashed parent can only learn the parent's identifier here
            if let Some(parent_alias) = entity.parent_entity.as_deref() {
                let parent_uri = self.config.entity(parent_alias).and_then(Entity::unique_key_uri);
                if let (Some(identifier), Some(uri)) = (hashed.get(parent_alias), parent_uri) {
                    record.set(uri, identifier.clone());
                }
            }

            records.push((entity.concept_alias.as_str(), record));
        }
        records
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::models::Attribute;
    use pretty_assertions::assert_eq;

    fn row(values: &[(&str, &str)]) -> IndexMap<String, String> {
        values
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn config() -> Config {
        let mut event = Entity::new("event", "urn:event")
            .with_unique_key("eventID")
            .with_worksheet("Samples");
        event.hashed = true;
        event.add_attribute(Attribute::new("eventID", "urn:eventID"));
        event.add_attribute(Attribute::new("locality", "urn:locality"));

        let mut sample = Entity::child("sample", "urn:sample", "event")
            .with_unique_key("sampleID")
            .with_worksheet("Samples");
        sample.add_attribute(Attribute::new("sampleID", "urn:sampleID"));
        sample.add_attribute(Attribute::new("eventID", "urn:eventID"));

        let mut config = Config::default();
        config.add_entity(sample);
        config.add_entity(event);
        config
    }

    #[test]
    fn test_hashed_parent_identifier_reaches_child() {
        let config = config();
        let rows = vec![
            row(&[("locality", "Moorea"), ("sampleID", "1"), ("expeditionCode", "exp")]),
            row(&[("locality", " "), ("sampleID", "")]),
            row(&[("locality", "Tahiti"), ("sampleID", "2"), ("expeditionCode", "exp")]),
        ];

        let sets = SheetReader::new(&config, false).read("Samples", &rows);
        assert_eq!(
            sets.iter().map(RecordSet::concept_alias).collect::<Vec<_>>(),
            vec!["event", "sample"]
        );

        let events = sets[0].records();
        assert_eq!(events.len(), 2);
        let first_hash = events[0].get("urn:eventID");
        assert_eq!(first_hash.len(), 64);
        assert_ne!(first_hash, events[1].get("urn:eventID"));

        let samples = sets[1].records();
        assert_eq!(samples[0].get("urn:eventID"), first_hash);
        assert_eq!(sets[1].expedition_code(), "exp");
    }

    #[test]
    fn test_groups_by_expedition() {
        let config = config();
        let rows = vec![
            row(&[("locality", "a"), ("sampleID", "1"), ("expeditionCode", "one")]),
            row(&[("locality", "b"), ("sampleID", "2"), ("expeditionCode", "two")]),
            row(&[("locality", "c"), ("sampleID", "3"), ("expeditionCode", "one")]),
        ];

        let sets = SheetReader::new(&config, true).read("Samples", &rows);
        let samples: Vec<(&str, usize)> = sets
            .iter()
            .filter(|s| s.concept_alias() == "sample")
            .map(|s| (s.expedition_code(), s.records().len()))
            .collect();
        assert_eq!(samples, vec![("one", 2), ("two", 1)]);
        assert!(sets[0].reload());
    }

    #[test]
    fn test_unknown_sheet_reads_nothing() {
        let config = config();
        assert!(SheetReader::new(&config, false)
            .read("Other", &[row(&[("sampleID", "1")])])
            .is_empty());
    }
}
