//! Validation functionality
//!
//! Provides identifier checks for table and column names taken from catalogs.

pub mod input;

pub use input::{ValidationError, ValidationResult, validate_column_name, validate_table_name};
