//! Identifier sanity checks.
//!
//! Table and column names come verbatim from catalog stream and property
//! names. The SQL generators quote every identifier that needs it, so these
//! checks only flag names that no database will accept even when quoted.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Maximum length for table names
pub const MAX_TABLE_NAME_LENGTH: usize = 255;

/// Maximum length for column names
pub const MAX_COLUMN_NAME_LENGTH: usize = 255;

/// Errors that can occur during identifier validation.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum ValidationError {
    /// Input is empty when a value is required
    #[error("{0} cannot be empty")]
    Empty(&'static str),

    /// Input exceeds maximum allowed length
    #[error("{field} exceeds maximum length (max: {max}, got: {actual})")]
    TooLong {
        field: &'static str,
        max: usize,
        actual: usize,
    },

    /// Input contains invalid characters
    #[error("{field} contains invalid characters: {reason}")]
    InvalidCharacters { field: &'static str, reason: String },
}

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Validate a table name.
///
/// # Rules
///
/// - Must not be empty
/// - Must not exceed 255 characters
/// - Must not contain control characters
///
/// # Examples
///
/// ```
/// use singer_schema_sdk::validation::input::validate_table_name;
///
/// assert!(validate_table_name("users").is_ok());
/// assert!(validate_table_name("user-orders").is_ok());
/// assert!(validate_table_name("").is_err());
/// ```
pub fn validate_table_name(name: &str) -> ValidationResult<()> {
    validate_identifier(name, "table name", MAX_TABLE_NAME_LENGTH)
}

/// Validate a column name.
///
/// Same rules as [`validate_table_name`]; spaces, dots and reserved words are
/// allowed because the generators quote them.
///
/// # Examples
///
/// ```
/// use singer_schema_sdk::validation::input::validate_column_name;
///
/// assert!(validate_column_name("select").is_ok());
/// assert!(validate_column_name("first name").is_ok());
/// assert!(validate_column_name("bad\nname").is_err());
/// ```
pub fn validate_column_name(name: &str) -> ValidationResult<()> {
    validate_identifier(name, "column name", MAX_COLUMN_NAME_LENGTH)
}

fn validate_identifier(name: &str, field: &'static str, max: usize) -> ValidationResult<()> {
    if name.is_empty() {
        return Err(ValidationError::Empty(field));
    }

    let length = name.chars().count();
    if length > max {
        return Err(ValidationError::TooLong {
            field,
            max,
            actual: length,
        });
    }

    if let Some(c) = name.chars().find(|c| c.is_control()) {
        return Err(ValidationError::InvalidCharacters {
            field,
            reason: format!("control character {:?}", c),
        });
    }

    Ok(())
}
