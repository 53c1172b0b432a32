//! Table builder: catalog entry to table model
//!
//! Combines type resolution, selection and key properties into a [`Table`].
//! Column order is the declaration order of the stream's JSON Schema.

use super::SchemaError;
use super::json_schema::{DEFAULT_MAX_DEPTH, JsonSchemaResolver};
use crate::catalog::CatalogEntry;
use crate::models::Table;
use crate::validation::input::{validate_column_name, validate_table_name};
use serde_json::Value;
use tracing::{debug, info, warn};

/// Options for [`TableBuilder`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOptions {
    /// Overrides the stream's `schema-name` metadata
    pub schema_name: Option<String>,
    /// Reject streams whose root allows `additionalProperties`
    pub reject_additional_properties: bool,
    pub max_depth: usize,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            schema_name: None,
            reject_additional_properties: true,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Builds table models from catalog entries.
///
/// # Example
///
/// ```rust
/// use singer_schema_sdk::catalog::CatalogEntry;
/// use singer_schema_sdk::import::TableBuilder;
/// use serde_json::json;
///
/// let mut entry = CatalogEntry::new("users", json!({
///     "type": "object",
///     "properties": {"id": {"type": ["null", "integer"]}, "name": {"type": "string"}}
/// }));
/// entry.key_properties = Some(vec!["id".to_string()]);
/// entry.mark_as_selected(Some(&["name".to_string()])).unwrap();
///
/// let table = TableBuilder::new().build(&entry).unwrap();
/// assert_eq!(table.primary_key_names(), vec!["id"]);
/// assert!(!table.column("id").unwrap().nullable);
/// ```
#[derive(Debug, Clone, Default)]
pub struct TableBuilder {
    options: BuildOptions,
}

impl TableBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: BuildOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &BuildOptions {
        &self.options
    }

    /// Build the table of a stream using the selection stored in its catalog entry.
    pub fn build(&self, entry: &CatalogEntry) -> Result<Table, SchemaError> {
        self.build_table(entry, None)
    }

    /// Build the table of a stream for an explicit property set, leaving the
    /// catalog entry untouched.
    ///
    /// Names that match no property are ignored with a warning.
    pub fn build_selected(&self, entry: &CatalogEntry, properties: &[String]) -> Result<Table, SchemaError> {
        self.build_table(entry, Some(properties))
    }

    fn build_table(&self, entry: &CatalogEntry, requested: Option<&[String]>) -> Result<Table, SchemaError> {
        let stream = entry.id().to_string();
        let schema = &entry.schema;

        if !is_object_root(schema) {
            return Err(SchemaError::NonObjectRoot { stream });
        }
        if self.options.reject_additional_properties
            && schema.get("additionalProperties").and_then(Value::as_bool) == Some(true)
        {
            return Err(SchemaError::AdditionalProperties { stream });
        }

        let empty = serde_json::Map::new();
        let properties = match schema.get("properties") {
            None => &empty,
            Some(Value::Object(properties)) => properties,
            Some(_) => {
                return Err(SchemaError::InvalidDefinition {
                    path: "<root>".to_string(),
                    reason: format!("properties of stream '{}' must be an object", stream),
                });
            }
        };

        let key_properties = entry.key_properties();
        if let Some(missing) = key_properties.iter().find(|k| !properties.contains_key(k.as_str())) {
            return Err(SchemaError::UnknownKeyProperty {
                stream,
                property: missing.clone(),
            });
        }
        if let Some(requested) = requested {
            for name in requested.iter().filter(|n| !properties.contains_key(n.as_str())) {
                warn!("Stream '{}' has no property '{}' to select", stream, name);
            }
        }

        let table_name = entry.table_name.as_deref().unwrap_or(&entry.stream);
        if let Err(e) = validate_table_name(table_name) {
            warn!("Table name validation warning for '{}': {}", table_name, e);
        }
        let mut table = Table::new(table_name);
        table.schema_name = self
            .options
            .schema_name
            .clone()
            .or_else(|| entry.schema_name().map(str::to_string));

        let mut selection = entry.selection();
        if let Some(requested) = requested {
            selection = selection.with_requested(requested);
        }
        let resolver = JsonSchemaResolver::new().with_max_depth(self.options.max_depth);

        for (name, definition) in properties {
            if !selection.is_property_selected(name) {
                debug!("Skipping unselected property '{}' of stream '{}'", name, stream);
                continue;
            }
            let is_key = key_properties.iter().any(|k| k == name);
            let resolved = resolver
                .resolve_property(name, definition)
                .map_err(|e| SchemaError::Stream {
                    stream: stream.clone(),
                    source: Box::new(e),
                })?;

            if let Err(e) = validate_column_name(name) {
                warn!("Column name validation warning for '{}': {}", name, e);
            }
            let nullable = if is_key { false } else { resolved.nullable };
            table.add_column(
                name.as_str(),
                resolved.data_type,
                Some(nullable),
                resolved.is_array,
                is_key,
            )?;
        }

        if table.columns.is_empty() {
            warn!("Stream '{}' produced a table without columns", stream);
        }
        info!(
            "Built table {} with {} columns ({} primary key)",
            table.display_name(),
            table.columns.len(),
            table.primary_key_names().len()
        );
        Ok(table)
    }
}

fn is_object_root(schema: &Value) -> bool {
    match schema.get("type") {
        Some(Value::String(t)) => t == "object",
        Some(Value::Array(types)) => types.iter().any(|t| t.as_str() == Some("object")),
        _ => false,
    }
}
