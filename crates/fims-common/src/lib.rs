//! FIMS Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared error handling, logging setup, and hashing utilities for the FIMS
//! workspace.
//!
//! # Overview
//!
//! - **Error Handling**: [`FimsError`] and the [`Result`] alias
//! - **Logging**: [`logging::LogConfig`] and [`logging::init_logging`]
//! - **Hashing**: stable SHA-256 digests used to derive identifiers for hashed entities
//!
//! # Example
//!
//! ```
//! use fims_common::hashing::hash_properties;
//!
//! let id = hash_properties([("urn:name", "eggs"), ("urn:count", "12")]);
//! assert_eq!(id.len(), 64);
//! ```

pub mod error;
pub mod hashing;
pub mod logging;

pub use error::{FimsError, Result};
