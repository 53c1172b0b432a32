//! Enums for the table model and catalog metadata
//!
//! # Serde Casing Conventions
//!
//! - `SCREAMING_SNAKE_CASE`: storage types and replication methods, matching the
//!   spelling Singer catalogs use for `forced-replication-method`
//! - `lowercase`: inclusion modes (`automatic`, `available`, `unsupported`)

use super::column::StructType;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Storage type of a column or struct field
///
/// A closed set of scalar types plus the composite [`StorageType::Struct`].
/// Dialects map each variant to a concrete SQL type, see
/// [`crate::export::SQLExporter::type_definition`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StorageType {
    Int,
    Number,
    Text,
    Date,
    /// Date and time without time zone
    Timestamp,
    /// Date and time with time zone
    #[serde(rename = "TIMESTAMPTZ")]
    TimestampTz,
    Bool,
    Json,
    Xml,
    /// Nested record type
    Struct(StructType),
}

impl StorageType {
    pub fn is_struct(&self) -> bool {
        matches!(self, StorageType::Struct(_))
    }

    /// Short upper-case name used in error messages
    pub fn name(&self) -> &'static str {
        match self {
            StorageType::Int => "INT",
            StorageType::Number => "NUMBER",
            StorageType::Text => "TEXT",
            StorageType::Date => "DATE",
            StorageType::Timestamp => "TIMESTAMP",
            StorageType::TimestampTz => "TIMESTAMPTZ",
            StorageType::Bool => "BOOL",
            StorageType::Json => "JSON",
            StorageType::Xml => "XML",
            StorageType::Struct(_) => "STRUCT",
        }
    }
}

impl fmt::Display for StorageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Replication strategy of a stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReplicationMethod {
    /// Replace the whole table on every sync
    #[default]
    FullTable,
    /// Upsert by primary key, newest staged row wins
    Incremental,
    /// Apply changes in the order the source log delivered them
    LogBased,
}

impl FromStr for ReplicationMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "FULL_TABLE" => Ok(ReplicationMethod::FullTable),
            "INCREMENTAL" => Ok(ReplicationMethod::Incremental),
            "LOG_BASED" => Ok(ReplicationMethod::LogBased),
            _ => Err(format!(
                "Unknown replication method: {}. Use 'FULL_TABLE', 'INCREMENTAL' or 'LOG_BASED'.",
                s
            )),
        }
    }
}

impl fmt::Display for ReplicationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReplicationMethod::FullTable => write!(f, "FULL_TABLE"),
            ReplicationMethod::Incremental => write!(f, "INCREMENTAL"),
            ReplicationMethod::LogBased => write!(f, "LOG_BASED"),
        }
    }
}

/// Inclusion mode of a schema node
///
/// - Automatic: always replicated, cannot be deselected
/// - Available: replicated when selected
/// - Unsupported: never replicated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Inclusion {
    Automatic,
    Available,
    Unsupported,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replication_method_round_trips_singer_spelling() {
        let method: ReplicationMethod = serde_json::from_str("\"LOG_BASED\"").unwrap();
        assert_eq!(method, ReplicationMethod::LogBased);
        assert_eq!(
            serde_json::to_string(&ReplicationMethod::FullTable).unwrap(),
            "\"FULL_TABLE\""
        );
        assert_eq!(
            "incremental".parse::<ReplicationMethod>().unwrap(),
            ReplicationMethod::Incremental
        );
        assert!("SNAPSHOT".parse::<ReplicationMethod>().is_err());
    }

    #[test]
    fn test_storage_type_names() {
        assert_eq!(StorageType::TimestampTz.to_string(), "TIMESTAMPTZ");
        assert_eq!(
            serde_json::to_string(&StorageType::TimestampTz).unwrap(),
            "\"TIMESTAMPTZ\""
        );
        assert!(StorageType::Struct(StructType::anonymous()).is_struct());
    }
}
