//! Materialized data rows and per-entity record sets

mod record;
mod record_set;

pub use record::{Record, EXPEDITION_CODE_KEY, PROJECT_ID_KEY, ROOT_IDENTIFIER_KEY};
pub use record_set::RecordSet;
