use serde::{Deserialize, Serialize};
use std::fmt;

/// Value type of an [`Attribute`](super::Attribute)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DataType {
    #[default]
    String,
    Integer,
    Float,
    Date,
    Datetime,
    Time,
    Boolean,
}

impl DataType {
    /// Date and time types must declare a `dataFormat`
    pub fn is_temporal(self) -> bool {
        matches!(self, DataType::Date | DataType::Datetime | DataType::Time)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DataType::String => "STRING",
            DataType::Integer => "INTEGER",
            DataType::Float => "FLOAT",
            DataType::Date => "DATE",
            DataType::Datetime => "DATETIME",
            DataType::Time => "TIME",
            DataType::Boolean => "BOOLEAN",
        };
        f.write_str(s)
    }
}
