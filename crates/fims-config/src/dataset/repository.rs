use crate::error::Result;
use crate::records::Record;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Read access to stored records
///
/// Returned records are flagged as stored so validation checks against them
/// without validating them again.
#[async_trait]
pub trait RecordRepository: Send + Sync {
    /// Every stored record of `concept_alias` in the project
    async fn project_records(&self, project_id: i32, concept_alias: &str) -> Result<Vec<Record>>;

    /// Stored records of `concept_alias` in one expedition of the project
    async fn expedition_records(
        &self,
        project_id: i32,
        expedition_code: &str,
        concept_alias: &str,
    ) -> Result<Vec<Record>>;
}

/// Repository backed by a map, for tests and offline validation
#[derive(Debug, Default)]
pub struct InMemoryRecordRepository {
    records: RwLock<HashMap<(i32, String), Vec<Record>>>,
}

impl InMemoryRecordRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `records` for `concept_alias`, stamping them with `project_id`
    pub async fn insert(&self, project_id: i32, concept_alias: &str, records: Vec<Record>) {
        let mut stored = self.records.write().await;
        let entry = stored
            .entry((project_id, concept_alias.to_string()))
            .or_default();

        for mut record in records {
            record.set_project_id(project_id);
            entry.push(record);
        }
    }
}

#[async_trait]
impl RecordRepository for InMemoryRecordRepository {
    async fn project_records(&self, project_id: i32, concept_alias: &str) -> Result<Vec<Record>> {
        let stored = self.records.read().await;
        Ok(stored
            .get(&(project_id, concept_alias.to_string()))
            .map(|records| records.iter().cloned().map(Record::stored).collect())
            .unwrap_or_default())
    }

    async fn expedition_records(
        &self,
        project_id: i32,
        expedition_code: &str,
        concept_alias: &str,
    ) -> Result<Vec<Record>> {
        Ok(self
            .project_records(project_id, concept_alias)
            .await?
            .into_iter()
            .filter(|r| r.expedition_code() == expedition_code)
            .collect())
    }
}
