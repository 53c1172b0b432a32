//! Singer Schema SDK - relational tables and SQL from Singer catalogs
//!
//! Provides unified interfaces for:
//! - Catalog reading/writing and stream selection
//! - JSON Schema type resolution and table building
//! - Dialect-aware DDL and merge SQL generation
//! - Identifier validation
//! - Configuration files with environment overrides

pub mod catalog;
pub mod config;
pub mod export;
pub mod import;
pub mod models;
pub mod validation;

// Re-export commonly used types
pub use catalog::{
    Breadcrumb, Catalog, CatalogEntry, CatalogError, MetadataTree, SelectionError, SelectionTree,
    StreamSelection,
};
pub use config::{ConfigError, SqlConfig};
pub use export::{
    ExportError, SQLExporter, SqlDialect, SqlOptions, StagingTable, extract_jsondoc_to_target,
    pre_sync_statement,
};
pub use import::{BuildOptions, JsonSchemaResolver, ResolvedType, SchemaError, TableBuilder};
pub use validation::ValidationError;

// Re-export models
pub use models::enums::*;
pub use models::{Column, ModelError, StructField, StructType, Table};
