//! FIMS Config Engine
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Entity schema model, network and project config validation, the
//! network→project merge, rule based record validation and dataset assembly.
//!
//! # Overview
//!
//! - **Schema**: [`Config`] holds a tree of [`models::Entity`] values linked by
//!   `parentEntity`, plus validation [`models::List`]s
//! - **Network configs**: [`network::NetworkConfig`] is the base schema shared
//!   by every project of a network
//! - **Project configs**: [`project::ProjectConfig`] overrides the network
//!   config within the limits checked by [`project::ProjectChecks`]
//! - **Records**: [`records::RecordSet`] values are assembled into a
//!   [`dataset::Dataset`] and checked by [`validation::DatasetValidator`]
//!
//! # Example
//!
//! ```
//! use fims_config::models::{Attribute, Entity};
//! use fims_config::network::NetworkConfig;
//!
//! let mut event = Entity::new("event", "http://rs.tdwg.org/dwc/terms/Event")
//!     .with_unique_key("eventID");
//! event.add_attribute(Attribute::new("eventID", "urn:eventID"));
//!
//! let mut network = NetworkConfig::default();
//! network.add_entity(event);
//! assert!(network.is_valid());
//! ```

pub mod config;
pub mod dataset;
pub mod error;
pub mod models;
pub mod network;
pub mod project;
pub mod records;
pub mod rules;
pub mod validation;
pub mod validator;

pub use config::{Config, EntityRelation, EntitySort};
pub use error::{ConfigError, Result};
pub use validator::{ConfigChecks, ConfigValidator};
