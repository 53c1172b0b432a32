//! Import functionality
//!
//! Turns catalog streams into table models:
//! - JSON Schema type resolution ([`json_schema`])
//! - Table building from a catalog entry ([`table_builder`])

pub mod json_schema;
pub mod table_builder;

use crate::models::ModelError;

/// Error raised when a stream's JSON Schema can not be turned into a table
///
/// Always fatal to the one stream being built; nothing is defaulted silently.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    #[error("The JSON schema of stream '{stream}' must be of type object to be convertible to a SQL table")]
    NonObjectRoot { stream: String },
    #[error("The JSON schema of stream '{stream}' must not allow additional properties in its main object")]
    AdditionalProperties { stream: String },
    #[error("Ambiguous object at '{path}': type object without properties")]
    AmbiguousObject { path: String },
    #[error("Unsupported anyOf shape at '{path}': expected an array schema followed by a null schema")]
    UnsupportedAnyOf { path: String },
    #[error("Could not determine type for property '{path}'")]
    TypeUndetermined { path: String },
    #[error("Could not map type '{type_name}' with format '{}' at '{path}'", .format.as_deref().unwrap_or("none"))]
    UnknownType {
        path: String,
        type_name: String,
        format: Option<String>,
    },
    #[error("Schema nesting at '{path}' exceeds the maximum depth of {max_depth}")]
    MaxDepthExceeded { path: String, max_depth: usize },
    #[error("Invalid definition at '{path}': {reason}")]
    InvalidDefinition { path: String, reason: String },
    #[error("Key property '{property}' of stream '{stream}' is not declared in the schema")]
    UnknownKeyProperty { stream: String, property: String },
    #[error("Stream '{stream}': {source}")]
    Stream {
        stream: String,
        #[source]
        source: Box<SchemaError>,
    },
    #[error(transparent)]
    Model(#[from] ModelError),
}

pub use json_schema::{DEFAULT_MAX_DEPTH, JsonSchemaResolver, ResolvedType};
pub use table_builder::{BuildOptions, TableBuilder};
