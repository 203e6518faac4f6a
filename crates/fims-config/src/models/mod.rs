//! Schema building blocks: entities, attributes, lists and metadata props

mod attribute;
mod data_type;
mod entity;
mod list;
mod metadata;

pub use attribute::Attribute;
pub use data_type::DataType;
pub use entity::{Entity, EntityKind, DEFAULT_RECORD_TYPE};
pub use list::{Field, List};
pub use metadata::{ExpeditionMetadataProperty, PropertyType};
