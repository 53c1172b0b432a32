//! Export functionality
//!
//! Provides SQL generators for table models:
//! - Dialects and identifier quoting
//! - DDL (CREATE TABLE, DROP TABLE, DELETE/TRUNCATE)
//! - Merge statements from staged JSON documents

pub mod dialect;
pub mod merge;
pub mod sql;

/// Error during SQL generation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, serde::Serialize, serde::Deserialize)]
pub enum ExportError {
    #[error("No {dialect} type for {data_type} (column '{column}')")]
    UnsupportedType {
        dialect: SqlDialect,
        column: String,
        data_type: String,
    },
    #[error("{operation} is not supported for {dialect}")]
    UnsupportedOperation { dialect: SqlDialect, operation: String },
    #[error("Table '{table}' has no primary key, an incremental merge needs one")]
    MissingPrimaryKey { table: String },
    #[error("Table '{table}' has no columns")]
    NoColumns { table: String },
}

// Re-export for convenience
pub use dialect::SqlDialect;
pub use merge::{StagingTable, extract_jsondoc_to_target, pre_sync_statement};
pub use sql::{SQLExporter, SqlOptions};
