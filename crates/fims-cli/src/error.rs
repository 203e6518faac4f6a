//! Error types for the FIMS CLI
//!
//! Every variant is shown to the user, so messages say what to do next.

use thiserror::Error;

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Error, Debug)]
pub enum CliError {
    /// Required file is missing
    #[error("File not found: '{0}'. Verify the file path exists and you have read permissions.")]
    FileNotFound(String),

    /// JSON parsing failed
    #[error("Failed to parse JSON in '{file}': {source}. Check the file syntax.")]
    JsonParse {
        file: String,
        #[source]
        source: serde_json::Error,
    },

    /// The network config a command depends on did not validate
    #[error("Invalid network config: {0}. Run 'fims network validate' for details.")]
    InvalidNetwork(String),

    /// The checked input did not validate; details were already printed
    #[error("{0}")]
    Invalid(String),

    /// Settings from the environment are invalid
    #[error("Configuration error: {0}. Check your FIMS_* environment variables or .env file.")]
    Config(String),

    /// Config engine failure
    #[error(transparent)]
    Engine(#[from] fims_config::ConfigError),

    /// File system operation failed
    #[error("File operation failed: {0}. Check file permissions.")]
    Io(#[from] std::io::Error),

    /// Output could not be serialized
    #[error("Failed to write JSON output: {0}")]
    Output(#[from] serde_json::Error),
}

impl CliError {
    pub fn json_parse(file: impl Into<String>, source: serde_json::Error) -> Self {
        Self::JsonParse {
            file: file.into(),
            source,
        }
    }

    pub fn invalid_network(msg: impl Into<String>) -> Self {
        Self::InvalidNetwork(msg.into())
    }

    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::Invalid(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
