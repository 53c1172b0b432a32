//! Column and struct types for the table model

use super::ModelError;
use super::enums::StorageType;
use serde::{Deserialize, Serialize};

/// A field of a [`StructType`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructField {
    /// Field name; anonymous fields render as their bare type
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Field type, possibly another struct
    pub data_type: StorageType,
    #[serde(default = "default_true")]
    pub nullable: bool,
    #[serde(default)]
    pub is_array: bool,
}

/// Composite record type with an ordered list of uniquely named fields
///
/// # Example
///
/// ```rust
/// use singer_schema_sdk::models::{StorageType, StructType};
///
/// let mut address = StructType::anonymous();
/// address.add_field(Some("street"), StorageType::Text, true, false).unwrap();
/// address.add_field(Some("zip"), StorageType::Text, true, false).unwrap();
/// assert!(address.add_field(Some("zip"), StorageType::Int, true, false).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StructType {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub fields: Vec<StructField>,
}

impl StructType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            fields: Vec::new(),
        }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Append a field, rejecting a name that is already present.
    pub fn add_field(
        &mut self,
        name: Option<&str>,
        data_type: StorageType,
        nullable: bool,
        is_array: bool,
    ) -> Result<(), ModelError> {
        if let Some(name) = name
            && self.field(name).is_some()
        {
            return Err(ModelError::DuplicateField {
                struct_name: self.name.clone().unwrap_or_else(|| "<anonymous>".to_string()),
                field: name.to_string(),
            });
        }

        self.fields.push(StructField {
            name: name.map(|s| s.to_string()),
            data_type,
            nullable,
            is_array,
        });
        Ok(())
    }

    pub fn field(&self, name: &str) -> Option<&StructField> {
        self.fields
            .iter()
            .find(|f| f.name.as_deref() == Some(name))
    }

    /// Nesting depth, 1 for a struct of scalars
    pub fn depth(&self) -> usize {
        1 + self
            .fields
            .iter()
            .map(|f| match &f.data_type {
                StorageType::Struct(inner) => inner.depth(),
                _ => 0,
            })
            .max()
            .unwrap_or(0)
    }
}

/// Column model representing a field in a table
///
/// Columns are owned by exactly one [`crate::models::Table`]; the primary key
/// flag is set through [`crate::models::Table::add_column`] so that the
/// non-null invariant for key columns holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    /// Column name, taken verbatim from the JSON Schema property name
    pub name: String,
    pub data_type: StorageType,
    /// Whether the column allows NULL values (default: true)
    #[serde(default = "default_true")]
    pub nullable: bool,
    /// Whether every value is an array of `data_type`
    #[serde(default)]
    pub is_array: bool,
    /// Whether this column is part of the primary key (default: false)
    #[serde(default)]
    pub primary_key: bool,
}

fn default_true() -> bool {
    true
}

impl Column {
    /// Create a nullable, non-array, non-key column.
    ///
    /// # Example
    ///
    /// ```rust
    /// use singer_schema_sdk::models::{Column, StorageType};
    ///
    /// let col = Column::new("user_id", StorageType::Int);
    /// assert!(col.nullable);
    /// ```
    pub fn new(name: impl Into<String>, data_type: StorageType) -> Self {
        Self {
            name: name.into(),
            data_type,
            nullable: true,
            is_array: false,
            primary_key: false,
        }
    }
}
