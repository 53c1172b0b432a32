//! Models module for the SDK
//!
//! Defines the dialect-agnostic table model produced from catalog streams and
//! consumed by the SQL exporters.

pub mod column;
pub mod enums;
pub mod table;

pub use column::{Column, StructField, StructType};
pub use enums::*;
pub use table::Table;

/// Error raised when a table model invariant would be broken
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    #[error("Column '{column}' of table '{table}' is a primary key and can not be nullable")]
    NullablePrimaryKey { table: String, column: String },
    #[error("Column '{column}' appears more than once in table '{table}'")]
    DuplicateColumn { table: String, column: String },
    #[error("Field '{field}' appears more than once in struct {struct_name}")]
    DuplicateField { struct_name: String, field: String },
}
