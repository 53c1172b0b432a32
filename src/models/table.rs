//! Table model for the SDK

use super::ModelError;
use super::column::Column;
use super::enums::StorageType;
use serde::{Deserialize, Serialize};

/// Table model built from one catalog stream
///
/// A table is a value: it is built fresh for each stream and handed to the SQL
/// generators unchanged. Column order is the JSON Schema declaration order and
/// the primary key lists its columns in that same order.
///
/// # Example
///
/// ```rust
/// use singer_schema_sdk::models::{StorageType, Table};
///
/// let mut table = Table::new("users");
/// table.add_column("id", StorageType::Int, None, false, true).unwrap();
/// table.add_column("name", StorageType::Text, None, false, false).unwrap();
///
/// assert_eq!(table.primary_key_names(), vec!["id"]);
/// assert!(!table.column("id").unwrap().nullable);
/// assert!(table.column("name").unwrap().nullable);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    pub table_name: String,
    /// Schema name (namespace within the database)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema_name: Option<String>,
    #[serde(default)]
    pub columns: Vec<Column>,
}

impl Table {
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            schema_name: None,
            columns: Vec::new(),
        }
    }

    pub fn with_schema(mut self, schema_name: impl Into<String>) -> Self {
        self.schema_name = Some(schema_name.into());
        self
    }

    /// Append a column.
    ///
    /// `nullable = None` means "not nullable when primary key, else nullable".
    /// An explicit `Some(true)` on a primary key column is rejected.
    pub fn add_column(
        &mut self,
        name: impl Into<String>,
        data_type: StorageType,
        nullable: Option<bool>,
        is_array: bool,
        is_primary_key: bool,
    ) -> Result<&Column, ModelError> {
        let name = name.into();
        if is_primary_key && nullable == Some(true) {
            return Err(ModelError::NullablePrimaryKey {
                table: self.table_name.clone(),
                column: name,
            });
        }
        if self.column(&name).is_some() {
            return Err(ModelError::DuplicateColumn {
                table: self.table_name.clone(),
                column: name,
            });
        }

        self.columns.push(Column {
            name,
            data_type,
            nullable: nullable.unwrap_or(!is_primary_key),
            is_array,
            primary_key: is_primary_key,
        });
        Ok(&self.columns[self.columns.len() - 1])
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Primary key columns in declaration order
    pub fn primary_key_columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(|c| c.primary_key)
    }

    pub fn primary_key_names(&self) -> Vec<&str> {
        self.primary_key_columns().map(|c| c.name.as_str()).collect()
    }

    pub fn has_primary_key(&self) -> bool {
        self.columns.iter().any(|c| c.primary_key)
    }

    /// `schema.table` for log and error messages (unquoted)
    pub fn display_name(&self) -> String {
        match &self.schema_name {
            Some(schema) => format!("{}.{}", schema, self.table_name),
            None => self.table_name.clone(),
        }
    }
}
