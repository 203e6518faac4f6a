//! Error types for the configuration engine

use thiserror::Error;

/// Result type alias for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors raised while building, validating or applying configs
///
/// Schema problems found by the validators are not errors: they are reported
/// as message lists on the config. These variants cover misuse and data that
/// cannot be processed at all.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Entity \"{entity}\" has no Attribute for {lookup}")]
    MissingAttribute { entity: String, lookup: String },

    #[error("Unknown entity: \"{0}\"")]
    UnknownEntity(String),

    #[error("Config has not been validated")]
    NotValidated,

    #[error("Invalid config: {0}")]
    Invalid(String),

    #[error("Duplicate records with conflicting values for identifier(s): {0}")]
    InvalidRecords(String),

    #[error("Dataset is empty")]
    EmptyDataset,

    #[error("Invalid dataset: {0}")]
    InvalidDataset(String),

    #[error("Record repository error: {0}")]
    Repository(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ConfigError {
    pub fn missing_attribute(entity: impl Into<String>, lookup: impl Into<String>) -> Self {
        Self::MissingAttribute {
            entity: entity.into(),
            lookup: lookup.into(),
        }
    }

    pub fn invalid_dataset(msg: impl Into<String>) -> Self {
        Self::InvalidDataset(msg.into())
    }

    pub fn repository(msg: impl Into<String>) -> Self {
        Self::Repository(msg.into())
    }
}
