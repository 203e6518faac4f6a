//! Error types shared by FIMS crates

use thiserror::Error;

/// Result type alias for FIMS operations
pub type Result<T> = std::result::Result<T, FimsError>;

/// Errors raised by shared infrastructure
#[derive(Error, Debug)]
pub enum FimsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid logging configuration: {0}")]
    Logging(String),
}
