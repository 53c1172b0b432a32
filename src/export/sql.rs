//! SQL DDL exporter
//!
//! Renders CREATE TABLE, DROP TABLE and the pre-load DELETE/TRUNCATE for a
//! table model in one of the supported dialects.

use super::ExportError;
use super::dialect::SqlDialect;
use crate::models::{Column, StorageType, StructType, Table};
use tracing::debug;

/// Options shared by the SQL generators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SqlOptions {
    /// `CREATE TABLE IF NOT EXISTS`
    pub if_not_exists: bool,
    /// `DROP TABLE IF EXISTS`
    pub if_exists: bool,
    /// Quote every identifier, not only the ones that need it
    pub force_quote: bool,
}

/// Exporter for SQL statements of one dialect.
///
/// # Example
///
/// ```rust
/// use singer_schema_sdk::export::{SQLExporter, SqlDialect};
/// use singer_schema_sdk::models::{StorageType, Table};
///
/// let mut table = Table::new("orders").with_schema("shop");
/// table.add_column("id", StorageType::Int, None, false, true).unwrap();
/// table.add_column("note", StorageType::Text, None, false, false).unwrap();
///
/// let sql = SQLExporter::new(SqlDialect::Postgres).create_table(&table).unwrap();
/// assert_eq!(
///     sql,
///     "CREATE TABLE shop.orders (\n  id bigint NOT NULL,\n  note text,\n  PRIMARY KEY (id)\n)"
/// );
/// ```
#[derive(Debug, Clone, Copy)]
pub struct SQLExporter {
    dialect: SqlDialect,
    options: SqlOptions,
}

impl SQLExporter {
    pub fn new(dialect: SqlDialect) -> Self {
        Self::with_options(dialect, SqlOptions::default())
    }

    pub fn with_options(dialect: SqlDialect, options: SqlOptions) -> Self {
        Self { dialect, options }
    }

    pub fn dialect(&self) -> SqlDialect {
        self.dialect
    }

    pub fn options(&self) -> &SqlOptions {
        &self.options
    }

    /// Quote an identifier following the dialect and `force_quote`
    pub fn quote(&self, name: &str) -> String {
        self.dialect.quote_identifier(name, self.options.force_quote)
    }

    /// `schema.table` with each part quoted as needed
    pub fn qualified_name(&self, table: &Table) -> String {
        match &table.schema_name {
            Some(schema) => format!("{}.{}", self.quote(schema), self.quote(&table.table_name)),
            None => self.quote(&table.table_name),
        }
    }

    /// Generate a CREATE TABLE statement.
    pub fn create_table(&self, table: &Table) -> Result<String, ExportError> {
        if table.columns.is_empty() {
            return Err(ExportError::NoColumns {
                table: table.display_name(),
            });
        }

        let mut lines = Vec::with_capacity(table.columns.len() + 1);
        for column in &table.columns {
            lines.push(self.column_definition(column)?);
        }

        if table.has_primary_key() {
            if self.dialect.supports_inline_primary_key() {
                let keys: Vec<String> = table
                    .primary_key_columns()
                    .map(|c| self.quote(&c.name))
                    .collect();
                lines.push(format!("PRIMARY KEY ({})", keys.join(", ")));
            } else {
                debug!(
                    "{} has no inline primary keys, omitting key of {}",
                    self.dialect,
                    table.display_name()
                );
            }
        }

        let name = self.qualified_name(table);
        let body = format!("(\n  {}\n)", lines.join(",\n  "));
        let sql = match (self.options.if_not_exists, self.dialect) {
            (false, _) => format!("CREATE TABLE {} {}", name, body),
            (true, SqlDialect::SqlServer) => format!(
                "IF OBJECT_ID(N{}, N'U') IS NULL\nCREATE TABLE {} {}",
                self.dialect.string_literal(&name),
                name,
                body
            ),
            (true, _) => format!("CREATE TABLE IF NOT EXISTS {} {}", name, body),
        };
        debug!("Generated CREATE TABLE for {}", table.display_name());
        Ok(sql)
    }

    /// Generate a DROP TABLE statement.
    pub fn drop_table(&self, table: &Table) -> String {
        format!(
            "DROP TABLE {}{}",
            if self.options.if_exists { "IF EXISTS " } else { "" },
            self.qualified_name(table)
        )
    }

    /// Statement that empties the table before a full reload.
    pub fn delete_from(&self, table: &Table) -> String {
        let name = self.qualified_name(table);
        match self.dialect {
            SqlDialect::Postgres | SqlDialect::Sqlite => format!("DELETE FROM {}", name),
            // A DELETE without predicate is rejected
            SqlDialect::BigQuery => format!("DELETE FROM {} WHERE 1=1", name),
            SqlDialect::SqlServer => format!("TRUNCATE TABLE {}", name),
        }
    }

    fn column_definition(&self, column: &Column) -> Result<String, ExportError> {
        let data_type = self.type_definition(&column.data_type, column.is_array, &column.name)?;
        // Repeated fields can not be NOT NULL
        let not_null = !column.nullable && !(column.is_array && self.dialect == SqlDialect::BigQuery);
        Ok(format!(
            "{} {}{}",
            self.quote(&column.name),
            data_type,
            if not_null { " NOT NULL" } else { "" }
        ))
    }

    /// SQL type of a storage type, including the array wrapper.
    ///
    /// `column` only names the offending column in errors.
    pub fn type_definition(&self, data_type: &StorageType, is_array: bool, column: &str) -> Result<String, ExportError> {
        let base = self.scalar_type(data_type, column)?;
        if !is_array {
            return Ok(base);
        }
        if !self.dialect.supports_arrays() {
            return Err(ExportError::UnsupportedType {
                dialect: self.dialect,
                column: column.to_string(),
                data_type: format!("{}[]", data_type),
            });
        }
        match self.dialect {
            SqlDialect::BigQuery => Ok(format!("ARRAY<{}>", base)),
            _ => Ok(format!("{}[]", base)),
        }
    }

    fn scalar_type(&self, data_type: &StorageType, column: &str) -> Result<String, ExportError> {
        if let StorageType::Struct(fields) = data_type
            && self.dialect.supports_nested_types()
        {
            return self.struct_type(fields, column);
        }

        let sql = match self.dialect {
            SqlDialect::Postgres => match data_type {
                StorageType::Int => "bigint",
                StorageType::Number => "numeric",
                StorageType::Text => "text",
                StorageType::Date => "date",
                StorageType::Timestamp => "timestamp",
                StorageType::TimestampTz => "timestamp with time zone",
                StorageType::Bool => "boolean",
                StorageType::Json | StorageType::Struct(_) => "jsonb",
                StorageType::Xml => "xml",
            },
            SqlDialect::BigQuery => match data_type {
                StorageType::Int => "INT64",
                StorageType::Number => "NUMERIC",
                StorageType::Text
                | StorageType::Json
                | StorageType::Xml
                | StorageType::Struct(_) => "STRING",
                StorageType::Date => "DATE",
                StorageType::Timestamp | StorageType::TimestampTz => "TIMESTAMP",
                StorageType::Bool => "BOOL",
            },
            SqlDialect::SqlServer => match data_type {
                StorageType::Int => "BIGINT",
                StorageType::Number => "DECIMAL(38, 9)",
                StorageType::Text | StorageType::Json | StorageType::Struct(_) => "NVARCHAR(MAX)",
                StorageType::Date => "DATE",
                StorageType::Timestamp => "DATETIME2",
                StorageType::TimestampTz => "DATETIMEOFFSET",
                StorageType::Bool => "BIT",
                StorageType::Xml => "XML",
            },
            SqlDialect::Sqlite => match data_type {
                StorageType::Int => "INTEGER",
                StorageType::Number => "REAL",
                StorageType::Bool => "BOOLEAN",
                StorageType::Text
                | StorageType::Date
                | StorageType::Timestamp
                | StorageType::TimestampTz
                | StorageType::Json
                | StorageType::Xml
                | StorageType::Struct(_) => "TEXT",
            },
        };
        Ok(sql.to_string())
    }

    fn struct_type(&self, fields: &StructType, column: &str) -> Result<String, ExportError> {
        let mut parts = Vec::with_capacity(fields.fields.len());
        for field in &fields.fields {
            let field_type = self.type_definition(&field.data_type, field.is_array, column)?;
            let not_null = !field.nullable && !field.is_array;
            let mut part = match &field.name {
                Some(name) => format!("{} {}", self.quote(name), field_type),
                None => field_type,
            };
            if not_null {
                part.push_str(" NOT NULL");
            }
            parts.push(part);
        }
        Ok(format!("STRUCT<{}>", parts.join(", ")))
    }
}
