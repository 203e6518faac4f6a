use super::{Dataset, RecordRepository, SheetReader};
use crate::config::{Config, EntitySort};
use crate::error::{ConfigError, Result};
use crate::models::Entity;
use crate::records::{Record, RecordSet};
use indexmap::{IndexMap, IndexSet};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info};

/// Concept alias and worksheet of a record set carrying a foreign expedition
pub type MismatchKey = (String, Option<String>);

/// Assembles a [`Dataset`] from uploaded record sets and stored records
///
/// Child record sets are validated against their parents, so stored parent
/// records are fetched and merged in. Entities unique across the project
/// pull in every stored record of the project.
pub struct DatasetBuilder<'a> {
    config: &'a Config,
    repository: &'a dyn RecordRepository,
    project_id: i32,
    expedition_code: Option<String>,
    record_sets: IndexMap<String, Vec<RecordSet>>,
    reloaded_entities: IndexSet<String>,
    child_entities: IndexSet<String>,
    project_records: HashMap<String, Vec<Record>>,
    mismatched_expeditions: IndexMap<MismatchKey, IndexSet<String>>,
}

impl<'a> DatasetBuilder<'a> {
    /// Without an `expedition_code` the data must name its own expeditions
    pub fn new(
        config: &'a Config,
        repository: &'a dyn RecordRepository,
        project_id: i32,
        expedition_code: Option<String>,
    ) -> Self {
        Self {
            config,
            repository,
            project_id,
            expedition_code: expedition_code.filter(|c| !c.trim().is_empty()),
            record_sets: IndexMap::new(),
            reloaded_entities: IndexSet::new(),
            child_entities: IndexSet::new(),
            project_records: HashMap::new(),
            mismatched_expeditions: IndexMap::new(),
        }
    }

    pub fn add_record_set(&mut self, mut record_set: RecordSet) -> Result<&mut Self> {
        if !self.resolve_expedition_code(&mut record_set) {
            return Err(ConfigError::invalid_dataset("data is missing an expeditionCode"));
        }
        self.add(record_set);
        Ok(self)
    }

    /// Read `rows` of worksheet `sheet` and add the resulting record sets
    pub fn add_sheet(
        &mut self,
        sheet: &str,
        rows: &[IndexMap<String, String>],
        reload: bool,
    ) -> Result<&mut Self> {
        for mut record_set in SheetReader::new(self.config, reload).read(sheet, rows) {
            if !self.resolve_expedition_code(&mut record_set) {
                return Err(ConfigError::invalid_dataset(format!(
                    "Data on the worksheet: \"{sheet}\" is missing an expeditionCode"
                )));
            }
            self.add(record_set);
        }
        Ok(self)
    }

    /// Expedition codes found in the data that differ from the upload's
    pub fn mismatched_expeditions(&self) -> &IndexMap<MismatchKey, IndexSet<String>> {
        &self.mismatched_expeditions
    }

    pub async fn build(mut self) -> Result<Dataset> {
        self.merge_project_records().await?;
        self.fetch_and_merge_parent_records().await?;
        self.drop_children_of_reloaded_parents();

        if self.record_sets.is_empty() {
            return Err(ConfigError::EmptyDataset);
        }

        let record_sets: Vec<RecordSet> = self.record_sets.into_values().flatten().collect();
        info!(
            record_sets = record_sets.len(),
            expedition = self.expedition_code.as_deref().unwrap_or("*"),
            "Built dataset"
        );
        Ok(Dataset::new(self.config, record_sets))
    }

    /// Apply the upload's expedition, or check the data carries its own
    fn resolve_expedition_code(&mut self, record_set: &mut RecordSet) -> bool {
        let Some(expected) = self.expedition_code.clone() else {
            return !record_set.expedition_code().is_empty();
        };

        let found = record_set.expedition_code();
        if !found.is_empty() && found != expected {
            let found = found.to_string();
            self.mismatched_expeditions
                .entry((
                    record_set.concept_alias().to_string(),
                    record_set.entity().worksheet.clone(),
                ))
                .or_default()
                .insert(found);
        }
        record_set.set_expedition_code(expected);
        true
    }

    fn add(&mut self, mut record_set: RecordSet) {
        for record in record_set.records_mut() {
            if record.project_id().is_none() {
                record.set_project_id(self.project_id);
            }
        }

        let entity = record_set.entity();
        if record_set.reload() {
            self.reloaded_entities.insert(entity.concept_alias.clone());
        }
        if entity.is_child_entity() {
            self.child_entities.insert(entity.concept_alias.clone());
        }

        self.record_sets
            .entry(entity.concept_alias.clone())
            .or_default()
            .push(record_set);
    }

    /// uniqueKey URI of the parent of `entity`, used to tell child records apart
    fn parent_unique_key_uri(&self, entity: &Entity) -> Option<String> {
        let parent = self.config.entity(entity.parent_entity.as_deref()?)?;
        parent.unique_key_uri().map(str::to_string)
    }

    async fn project_records_for(&mut self, entity: &Entity) -> Result<Vec<Record>> {
        if let Some(records) = self.project_records.get(&entity.concept_alias) {
            return Ok(records.clone());
        }

        let records = self
            .repository
            .project_records(self.project_id, &entity.concept_alias)
            .await?;
        debug!(entity = %entity.concept_alias, records = records.len(), "Fetched project records");
        self.project_records
            .insert(entity.concept_alias.clone(), records.clone());
        Ok(records)
    }

    /// Merge stored records into entities unique across the project
    ///
    /// Expeditions being reloaded are left out since their records are
    /// about to be replaced.
    async fn merge_project_records(&mut self) -> Result<()> {
        let config = self.config;
        for entity in config.entities.iter().filter(|e| e.unique_across_project) {
            let Some(sets) = self.record_sets.get(&entity.concept_alias) else {
                continue;
            };
            let reloaded: HashSet<String> = sets
                .iter()
                .filter(|r| r.reload())
                .map(|r| r.expedition_code().to_string())
                .collect();

            let records: Vec<Record> = self
                .project_records_for(entity)
                .await?
                .into_iter()
                .filter(|r| !reloaded.contains(r.expedition_code()))
                .collect();

            let parent_uri = self.parent_unique_key_uri(entity);
            if let Some(sets) = self.record_sets.get_mut(&entity.concept_alias) {
                for set in sets.iter_mut().filter(|r| !r.is_empty()) {
                    set.merge(records.clone(), parent_uri.as_deref());
                }
            }
        }
        Ok(())
    }

    /// Fetch stored parent records for every child record set
    ///
    /// Only direct parents are fetched, never the full ancestry.
    async fn fetch_and_merge_parent_records(&mut self) -> Result<()> {
        let config = self.config;
        let mut parents: Vec<&Entity> = Vec::new();
        for alias in &self.child_entities {
            let Some(parent) = config
                .entity(alias)
                .and_then(|child| child.parent_entity.as_deref())
                .and_then(|p| config.entity(p))
            else {
                continue;
            };
            if !parents.iter().any(|p| p.concept_alias == parent.concept_alias) {
                parents.push(parent);
            }
        }

        for parent in parents {
            if !self.should_fetch(&parent.concept_alias) {
                continue;
            }

            let mut stored: HashMap<String, Vec<Record>> = HashMap::new();
            match self.expedition_code.clone() {
                Some(code) => {
                    let records = if parent.unique_across_project {
                        self.project_records_for(parent)
                            .await?
                            .into_iter()
                            .filter(|r| r.expedition_code() == code)
                            .collect()
                    } else {
                        self.repository
                            .expedition_records(self.project_id, &code, &parent.concept_alias)
                            .await?
                    };
                    stored.insert(code, records);
                }
                None => {
                    for record in self.project_records_for(parent).await? {
                        stored
                            .entry(record.expedition_code().to_string())
                            .or_default()
                            .push(record);
                    }
                }
            }

            let grandparent_uri = self.parent_unique_key_uri(parent);
            for set in self.parent_record_sets(parent).iter_mut().filter(|r| !r.reload()) {
                let records = stored.get(set.expedition_code()).cloned().unwrap_or_default();
                set.merge(records, grandparent_uri.as_deref());
            }
        }
        Ok(())
    }

    /// A parent is fetched unless every uploaded set of it is a reload
    fn should_fetch(&self, concept_alias: &str) -> bool {
        self.record_sets
            .get(concept_alias)
            .is_none_or(|sets| sets.iter().any(|r| !r.reload()))
    }

    /// Record sets of `parent`, one per expedition its children were uploaded for
    fn parent_record_sets(&mut self, parent: &Entity) -> &mut Vec<RecordSet> {
        let mut expeditions: Vec<String> = match &self.expedition_code {
            Some(code) => vec![code.clone()],
            None => {
                let mut codes: Vec<String> = Vec::new();
                for child in &self.child_entities {
                    let is_child = self
                        .config
                        .entity(child)
                        .is_some_and(|e| e.parent_entity.as_deref() == Some(parent.concept_alias.as_str()));
                    if !is_child {
                        continue;
                    }
                    for set in self.record_sets.get(child).into_iter().flatten() {
                        let code = set.expedition_code().to_string();
                        if !codes.contains(&code) {
                            codes.push(code);
                        }
                    }
                }
                codes
            }
        };

        let sets = self
            .record_sets
            .entry(parent.concept_alias.clone())
            .or_default();
        expeditions.retain(|code| !sets.iter().any(|r| r.expedition_code() == code));

        for code in expeditions {
            let mut set = RecordSet::new(parent.clone(), false);
            set.set_expedition_code(code);
            sets.push(set);
        }
        sets
    }

    /// Drop merged project records whose parent is removed by a reload
    fn drop_children_of_reloaded_parents(&mut self) {
        let config = self.config;
        for child in config.entities_sorted(EntitySort::ParentsFirst) {
            if !self.child_entities.contains(&child.concept_alias) || !child.unique_across_project {
                continue;
            }
            let Some(parent) = child.parent_entity.as_deref().and_then(|p| config.entity(p)) else {
                continue;
            };
            if !self.reloaded_entities.contains(&parent.concept_alias) {
                continue;
            }
            let key_uri = parent.unique_key_uri().unwrap_or_default();

            let parent_identifiers: HashMap<String, HashSet<String>> = self
                .record_sets
                .get(&parent.concept_alias)
                .into_iter()
                .flatten()
                .map(|set| {
                    let ids = set
                        .records_to_persist()
                        .map(|(_, r)| r.get(key_uri).to_string())
                        .collect();
                    (set.expedition_code().to_string(), ids)
                })
                .collect();

            let expedition_code = self.expedition_code.clone();
            let Some(sets) = self.record_sets.get_mut(&child.concept_alias) else {
                continue;
            };
            for set in sets.iter_mut() {
                let empty = HashSet::new();
                let ids = parent_identifiers.get(set.expedition_code()).unwrap_or(&empty);
                let kept: Vec<Record> = set
                    .records()
                    .iter()
                    .filter(|r| {
                        expedition_code.as_deref() != Some(r.expedition_code())
                            || ids.contains(r.get(key_uri))
                    })
                    .cloned()
                    .collect();

                if kept.len() != set.records().len() {
                    let code = set.expedition_code().to_string();
                    let mut replacement =
                        RecordSet::with_records(set.entity().clone(), kept, set.reload());
                    replacement.set_expedition_code(code);
                    *set = replacement;
                }
            }
        }
    }
}
