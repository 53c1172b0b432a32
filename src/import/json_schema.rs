//! JSON Schema type resolution
//!
//! Maps one property definition of a stream schema to a storage type, a
//! nullability flag and an array flag. Supported subset:
//!
//! - `type` as a single name or a union list; `"null"` only sets nullability
//! - `object` with `properties` (recursive struct; an empty map is `JSON`)
//! - `array` with `items` (element type, `is_array = true`)
//! - `string` with `format` `date` / `date-time`, `boolean`, `integer`, `number`
//! - the legacy nullable-array idiom `anyOf: [{type: array, items}, {type: null}]`
//!
//! Arrays of arrays collapse to one array level of the innermost item type.

use super::SchemaError;
use crate::catalog::Breadcrumb;
use crate::models::{StorageType, StructType};
use serde_json::{Map, Value};
use tracing::debug;

/// Nesting limit used when none is configured
pub const DEFAULT_MAX_DEPTH: usize = 32;

const KNOWN_TYPES: &[&str] = &["null", "object", "array", "string", "boolean", "integer", "number"];

/// Outcome of resolving one property definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedType {
    pub data_type: StorageType,
    pub nullable: bool,
    pub is_array: bool,
}

impl ResolvedType {
    fn scalar(data_type: StorageType) -> Self {
        Self {
            data_type,
            nullable: false,
            is_array: false,
        }
    }
}

/// Resolver for stream property definitions.
///
/// Resolution is pure: the same definition always resolves to the same type.
///
/// # Example
///
/// ```rust
/// use singer_schema_sdk::import::JsonSchemaResolver;
/// use singer_schema_sdk::models::StorageType;
/// use serde_json::json;
///
/// let resolver = JsonSchemaResolver::new();
/// let resolved = resolver
///     .resolve_property("created_at", &json!({"type": ["null", "string"], "format": "date-time"}))
///     .unwrap();
/// assert_eq!(resolved.data_type, StorageType::TimestampTz);
/// assert!(resolved.nullable);
/// ```
#[derive(Debug, Clone)]
pub struct JsonSchemaResolver {
    max_depth: usize,
}

impl Default for JsonSchemaResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl JsonSchemaResolver {
    pub fn new() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Limit how deep objects and arrays may nest before resolution fails
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Resolve a first-level property of a stream schema.
    pub fn resolve_property(&self, name: &str, definition: &Value) -> Result<ResolvedType, SchemaError> {
        self.resolve_at(definition, &Breadcrumb::property(name), 0)
    }

    /// Resolve a definition addressed by `path`; errors name that path.
    pub fn resolve(&self, definition: &Value, path: &Breadcrumb) -> Result<ResolvedType, SchemaError> {
        self.resolve_at(definition, path, 0)
    }

    fn resolve_at(&self, definition: &Value, path: &Breadcrumb, depth: usize) -> Result<ResolvedType, SchemaError> {
        if depth > self.max_depth {
            return Err(SchemaError::MaxDepthExceeded {
                path: path.to_string(),
                max_depth: self.max_depth,
            });
        }
        let Some(obj) = definition.as_object() else {
            return Err(invalid(path, "property definition must be an object"));
        };

        let mut nullable = false;
        let mut resolved = None;

        if let Some(type_value) = obj.get("type") {
            let names = type_names(type_value, path)?;
            for name in &names {
                if !KNOWN_TYPES.contains(name) {
                    return Err(SchemaError::UnknownType {
                        path: path.to_string(),
                        type_name: name.to_string(),
                        format: format_of(obj).map(str::to_string),
                    });
                }
            }
            nullable = names.contains(&"null");
            if let Some(name) = pick_type(&names) {
                resolved = Some(self.resolve_type(name, obj, path, depth)?);
            }
        }

        if resolved.is_none()
            && let Some(any_of) = obj.get("anyOf")
        {
            resolved = Some(self.resolve_any_of(any_of, path, depth)?);
        }

        let Some(resolved) = resolved else {
            return Err(SchemaError::TypeUndetermined {
                path: path.to_string(),
            });
        };

        Ok(ResolvedType {
            nullable: nullable || resolved.nullable,
            ..resolved
        })
    }

    fn resolve_type(
        &self,
        name: &str,
        obj: &Map<String, Value>,
        path: &Breadcrumb,
        depth: usize,
    ) -> Result<ResolvedType, SchemaError> {
        match name {
            "object" => self.resolve_object(obj, path, depth),
            "array" => {
                let Some(items) = obj.get("items") else {
                    return Err(SchemaError::TypeUndetermined {
                        path: path.to_string(),
                    });
                };
                self.resolve_items(items, path, depth)
            }
            "string" => Ok(ResolvedType::scalar(match format_of(obj) {
                Some("date") => StorageType::Date,
                Some("date-time") => StorageType::TimestampTz,
                _ => StorageType::Text,
            })),
            "boolean" => Ok(ResolvedType::scalar(StorageType::Bool)),
            "integer" => Ok(ResolvedType::scalar(StorageType::Int)),
            "number" => Ok(ResolvedType::scalar(StorageType::Number)),
            other => Err(SchemaError::UnknownType {
                path: path.to_string(),
                type_name: other.to_string(),
                format: format_of(obj).map(str::to_string),
            }),
        }
    }

    fn resolve_object(
        &self,
        obj: &Map<String, Value>,
        path: &Breadcrumb,
        depth: usize,
    ) -> Result<ResolvedType, SchemaError> {
        let properties = match obj.get("properties") {
            None => {
                return Err(SchemaError::AmbiguousObject {
                    path: path.to_string(),
                });
            }
            Some(Value::Object(properties)) => properties,
            Some(_) => return Err(invalid(path, "properties must be an object")),
        };

        if properties.is_empty() {
            debug!("Object at {} has no properties, storing as JSON", path);
            return Ok(ResolvedType::scalar(StorageType::Json));
        }

        let mut struct_type = StructType::anonymous();
        for (field_name, field_definition) in properties {
            let field = self.resolve_at(field_definition, &path.child(field_name), depth + 1)?;
            struct_type.add_field(Some(field_name), field.data_type, field.nullable, field.is_array)?;
        }
        Ok(ResolvedType::scalar(StorageType::Struct(struct_type)))
    }

    fn resolve_items(&self, items: &Value, path: &Breadcrumb, depth: usize) -> Result<ResolvedType, SchemaError> {
        if items.is_array() {
            return Err(invalid(path, "tuple-typed items are not supported"));
        }
        let item = self.resolve_at(items, &path.items(), depth + 1)?;
        if item.is_array {
            debug!("Nested array at {} flattened to one level", path);
        }
        Ok(ResolvedType {
            data_type: item.data_type,
            nullable: item.nullable,
            is_array: true,
        })
    }

    fn resolve_any_of(&self, any_of: &Value, path: &Breadcrumb, depth: usize) -> Result<ResolvedType, SchemaError> {
        let unsupported = || SchemaError::UnsupportedAnyOf {
            path: path.to_string(),
        };
        let entries = any_of.as_array().ok_or_else(unsupported)?;
        let [array_schema, null_schema] = entries.as_slice() else {
            return Err(unsupported());
        };
        if array_schema.get("type").and_then(Value::as_str) != Some("array") {
            return Err(unsupported());
        }
        let Some(items) = array_schema.get("items") else {
            return Err(SchemaError::TypeUndetermined {
                path: path.to_string(),
            });
        };

        let resolved = self.resolve_items(items, path, depth)?;
        let null_allowed = null_schema.get("type").and_then(Value::as_str) == Some("null");
        Ok(ResolvedType {
            nullable: resolved.nullable || null_allowed,
            ..resolved
        })
    }
}

fn invalid(path: &Breadcrumb, reason: &str) -> SchemaError {
    SchemaError::InvalidDefinition {
        path: path.to_string(),
        reason: reason.to_string(),
    }
}

fn format_of(obj: &Map<String, Value>) -> Option<&str> {
    obj.get("format").and_then(Value::as_str)
}

fn type_names<'a>(type_value: &'a Value, path: &Breadcrumb) -> Result<Vec<&'a str>, SchemaError> {
    match type_value {
        Value::String(name) => Ok(vec![name.as_str()]),
        Value::Array(names) => names
            .iter()
            .map(|n| {
                n.as_str()
                    .ok_or_else(|| invalid(path, "type list entries must be strings"))
            })
            .collect(),
        _ => Err(invalid(path, "type must be a string or a list of strings")),
    }
}

/// Storage type of a union: `string` yields to any other non-null type,
/// otherwise the first non-null type wins.
fn pick_type<'a>(names: &[&'a str]) -> Option<&'a str> {
    let mut candidates = names.iter().copied().filter(|n| *n != "null");
    let first = candidates.next()?;
    if first != "string" {
        return Some(first);
    }
    Some(candidates.find(|n| *n != "string").unwrap_or(first))
}
