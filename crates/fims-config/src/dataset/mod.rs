//! Upload datasets: record sets assembled from sheets and stored records

mod builder;
mod reader;
mod repository;

pub use builder::DatasetBuilder;
pub use reader::SheetReader;
pub use repository::{InMemoryRecordRepository, RecordRepository};

use crate::config::{Config, EntitySort};
use crate::records::RecordSet;

/// Record sets ordered so that every parent comes before its children
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    record_sets: Vec<RecordSet>,
}

impl Dataset {
    /// Order `record_sets` by their entity's position in `config`
    ///
    /// Record sets of entities `config` does not know sort last.
    pub fn new(config: &Config, mut record_sets: Vec<RecordSet>) -> Self {
        let order: Vec<&str> = config
            .entities_sorted(EntitySort::ParentsFirst)
            .into_iter()
            .map(|e| e.concept_alias.as_str())
            .collect();

        record_sets.sort_by_key(|r| {
            order
                .iter()
                .position(|alias| *alias == r.concept_alias())
                .unwrap_or(order.len())
        });
        Self { record_sets }
    }

    pub fn record_sets(&self) -> &[RecordSet] {
        &self.record_sets
    }

    pub fn record_sets_mut(&mut self) -> &mut [RecordSet] {
        &mut self.record_sets
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RecordSet> {
        self.record_sets.iter()
    }

    pub fn len(&self) -> usize {
        self.record_sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.record_sets.is_empty()
    }

    /// Index of the parent record set of the record set at `index`
    ///
    /// The parent shares the child's expedition and always sorts before it.
    pub fn parent_of(&self, index: usize) -> Option<usize> {
        let child = self.record_sets.get(index)?;
        let parent_alias = child
            .entity()
            .parent_entity
            .as_deref()
            .filter(|_| child.entity().is_child_entity())?;

        self.record_sets[..index].iter().position(|r| {
            r.concept_alias() == parent_alias && r.expedition_code() == child.expedition_code()
        })
    }
}

impl<'a> IntoIterator for &'a Dataset {
    type Item = &'a RecordSet;
    type IntoIter = std::slice::Iter<'a, RecordSet>;

    fn into_iter(self) -> Self::IntoIter {
        self.record_sets.iter()
    }
}
