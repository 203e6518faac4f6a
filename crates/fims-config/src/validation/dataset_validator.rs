use super::{EntityMessages, Message, RecordValidator};
use crate::config::Config;
use crate::dataset::Dataset;
use crate::error::ConfigError;
use indexmap::IndexMap;
use tracing::{info, warn};

const DUPLICATE_PARENT_GROUP: &str = "Duplicate parent records";
const MISSING_EXPEDITION_GROUP: &str = "Missing expeditionCode";

/// Validates every record set of a [`Dataset`]
///
/// Parents living on the same worksheet as a child are de-duplicated first,
/// since every row of a multi-entity sheet repeats the parent's columns.
#[derive(Debug)]
pub struct DatasetValidator<'a> {
    config: &'a Config,
    messages: Vec<EntityMessages>,
    has_error: bool,
}

impl<'a> DatasetValidator<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self {
            config,
            messages: Vec::new(),
            has_error: false,
        }
    }

    /// Returns true when the dataset may be persisted
    pub fn validate(&mut self, dataset: &mut Dataset) -> bool {
        self.messages.clear();
        self.has_error = false;

        let duplicates = self.remove_duplicate_parent_records(dataset);
        let mut is_valid = true;
        let validator = RecordValidator::new(self.config);

        for i in 0..dataset.len() {
            let parent = dataset.parent_of(i);
            let (head, tail) = dataset.record_sets_mut().split_at_mut(i);
            let record_set = &mut tail[0];
            if !record_set.has_record_to_persist() {
                continue;
            }

            let result = validator.validate(record_set, parent.map(|p| &head[p]));
            if !result.is_valid {
                is_valid = false;
                self.has_error |= result.has_error;
                self.messages.push(result.messages);
            }

            if record_set.expedition_code().is_empty() {
                let alias = record_set.concept_alias().to_string();
                self.entity_messages(&alias, record_set.entity().worksheet.clone())
                    .add_error(
                        MISSING_EXPEDITION_GROUP,
                        Message::new(format!(
                            "One or more records are missing an expeditionCode. When uploading data from multiple expeditions, each record in the {alias} worksheet must have a pre-existing expeditionCode specified for all records (in the column \"expeditionCode\"). Note: All expedition codes in the worksheet MUST EXIST."
                        )),
                    );
                is_valid = false;
                self.has_error = true;
            }
        }

        for (alias, (worksheet, message)) in duplicates {
            self.entity_messages(&alias, worksheet)
                .add_error(DUPLICATE_PARENT_GROUP, message);
        }
        self.merge_messages();

        if self.has_error {
            warn!(entities = self.messages.len(), "Dataset has errors");
        } else {
            info!(record_sets = dataset.len(), is_valid, "Validated dataset");
        }
        !self.has_error && is_valid
    }

    pub fn has_error(&self) -> bool {
        self.has_error
    }

    pub fn messages(&self) -> &[EntityMessages] {
        &self.messages
    }

    pub fn into_messages(self) -> Vec<EntityMessages> {
        self.messages
    }

    /// De-duplicate parents of child entities spread over several sheets
    fn remove_duplicate_parent_records(
        &mut self,
        dataset: &mut Dataset,
    ) -> IndexMap<String, (Option<String>, Message)> {
        let mut duplicates = IndexMap::new();

        for i in 0..dataset.len() {
            let entity = dataset.record_sets()[i].entity();
            if !entity.is_child_entity() || !self.config.is_multi_sheet_entity(&entity.concept_alias) {
                continue;
            }
            let Some(p) = dataset.parent_of(i) else {
                continue;
            };

            let parent = &mut dataset.record_sets_mut()[p];
            if let Err(ConfigError::InvalidRecords(_)) = parent.remove_duplicates() {
                self.has_error = true;
                let entity = parent.entity();
                duplicates.insert(
                    entity.concept_alias.clone(),
                    (
                        entity.worksheet.clone(),
                        Message::new(format!(
                            "Duplicate \"{}\" values, however the other columns are not the same.",
                            entity.unique_key.as_deref().unwrap_or_default()
                        )),
                    ),
                );
            }
        }
        duplicates
    }

    /// First messages for `alias`, created when missing
    fn entity_messages(&mut self, alias: &str, worksheet: Option<String>) -> &mut EntityMessages {
        let index = match self.messages.iter().position(|m| m.concept_alias == alias) {
            Some(index) => index,
            None => {
                self.messages.push(EntityMessages::new(alias, worksheet));
                self.messages.len() - 1
            }
        };
        &mut self.messages[index]
    }

    /// Multi-expedition uploads produce one entry per record set; fold them
    /// by entity and sheet
    fn merge_messages(&mut self) {
        let mut merged: IndexMap<(String, Option<String>), EntityMessages> = IndexMap::new();
        for messages in self.messages.drain(..) {
            let key = (messages.concept_alias.clone(), messages.sheet_name.clone());
            match merged.get_mut(&key) {
                Some(existing) => existing.merge(messages),
                None => {
                    merged.insert(key, messages);
                }
            }
        }
        self.messages = merged.into_values().collect();
    }
}
