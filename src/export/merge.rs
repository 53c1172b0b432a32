//! Merge statements from a staged JSON document table
//!
//! Records are first loaded into a staging relation with one JSON document
//! column and one increasing row-order column. The statements generated here
//! move them into the typed target table:
//!
//! - `FULL_TABLE` / `LOG_BASED`: a plain `INSERT ... SELECT`; for a full table
//!   reload run [`pre_sync_statement`] first.
//! - `INCREMENTAL`: the newest staged row per primary key wins and replaces the
//!   existing target row (upsert).

use super::ExportError;
use super::dialect::SqlDialect;
use super::sql::{SQLExporter, SqlOptions};
use crate::models::{Column, ReplicationMethod, StorageType, Table};
use tracing::debug;

/// Staging relation holding raw records as JSON documents
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagingTable {
    /// Relation name, optionally `schema.table`
    pub name: String,
    pub document_column: String,
    /// Increasing load order; higher rows are newer
    pub row_column: String,
}

impl StagingTable {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            document_column: "data".to_string(),
            row_column: "row".to_string(),
        }
    }

    pub fn with_columns(mut self, document_column: impl Into<String>, row_column: impl Into<String>) -> Self {
        self.document_column = document_column.into();
        self.row_column = row_column.into();
        self
    }
}

/// Statement to run before loading a stream, if any.
///
/// A full table reload empties the target first; incremental and log based
/// loads keep existing rows.
pub fn pre_sync_statement(dialect: SqlDialect, table: &Table, method: ReplicationMethod) -> Option<String> {
    match method {
        ReplicationMethod::FullTable => Some(SQLExporter::new(dialect).delete_from(table)),
        ReplicationMethod::Incremental | ReplicationMethod::LogBased => None,
    }
}

/// Generate the statement moving staged JSON documents into `table`.
///
/// # Example
///
/// ```rust
/// use singer_schema_sdk::export::{SqlDialect, SqlOptions, StagingTable, extract_jsondoc_to_target};
/// use singer_schema_sdk::models::{ReplicationMethod, StorageType, Table};
///
/// let mut table = Table::new("items");
/// table.add_column("id", StorageType::Int, None, false, true).unwrap();
/// table.add_column("value", StorageType::Text, None, false, false).unwrap();
///
/// let sql = extract_jsondoc_to_target(
///     SqlDialect::Postgres,
///     &table,
///     &StagingTable::new("items_stage"),
///     ReplicationMethod::Incremental,
///     &SqlOptions::default(),
/// )
/// .unwrap();
/// assert!(sql.contains("ON CONFLICT (id)"));
/// assert!(sql.contains("UPDATE SET value = EXCLUDED.value"));
/// ```
pub fn extract_jsondoc_to_target(
    dialect: SqlDialect,
    table: &Table,
    staging: &StagingTable,
    method: ReplicationMethod,
    options: &SqlOptions,
) -> Result<String, ExportError> {
    let generator = MergeGenerator {
        exporter: SQLExporter::with_options(dialect, *options),
        table,
        staging,
    };

    if !dialect.supports_staged_merge() {
        return Err(ExportError::UnsupportedOperation {
            dialect,
            operation: "merge from staged JSON documents".to_string(),
        });
    }
    if table.columns.is_empty() {
        return Err(ExportError::NoColumns {
            table: table.display_name(),
        });
    }
    let incremental = method == ReplicationMethod::Incremental;
    if incremental && !table.has_primary_key() {
        return Err(ExportError::MissingPrimaryKey {
            table: table.display_name(),
        });
    }

    let sql = match (dialect, incremental) {
        (SqlDialect::BigQuery, true) => generator.bigquery_merge()?,
        _ => generator.insert_select(incremental)?,
    };
    debug!("Generated {} load for {} ({})", method, table.display_name(), dialect);
    Ok(sql)
}

struct MergeGenerator<'a> {
    exporter: SQLExporter,
    table: &'a Table,
    staging: &'a StagingTable,
}

impl MergeGenerator<'_> {
    fn dialect(&self) -> SqlDialect {
        self.exporter.dialect()
    }

    fn quote(&self, name: &str) -> String {
        self.exporter.quote(name)
    }

    fn staging_name(&self) -> String {
        self.staging
            .name
            .split('.')
            .map(|part| self.quote(part))
            .collect::<Vec<_>>()
            .join(".")
    }

    fn column_names(&self, columns: &[&Column]) -> Vec<String> {
        columns.iter().map(|c| self.quote(&c.name)).collect()
    }

    /// Extraction expression of every column, in column order
    fn extractions(&self) -> Result<Vec<String>, ExportError> {
        self.table
            .columns
            .iter()
            .map(|column| match self.dialect() {
                SqlDialect::BigQuery => self.bigquery_extract(column),
                _ => self.postgres_extract(column),
            })
            .collect()
    }

    fn key_extractions(&self, extractions: &[String]) -> Vec<String> {
        self.table
            .columns
            .iter()
            .zip(extractions)
            .filter(|(column, _)| column.primary_key)
            .map(|(_, expr)| expr.clone())
            .collect()
    }

    /// INSERT ... SELECT, with DISTINCT ON and ON CONFLICT when incremental
    fn insert_select(&self, incremental: bool) -> Result<String, ExportError> {
        let columns: Vec<&Column> = self.table.columns.iter().collect();
        let names = self.column_names(&columns);
        let extractions = self.extractions()?;
        let select_list: Vec<String> = extractions
            .iter()
            .zip(&names)
            .map(|(expr, name)| format!("{} AS {}", expr, name))
            .collect();

        let mut sql = format!(
            "INSERT INTO {} (\n  {}\n)\nSELECT",
            self.exporter.qualified_name(self.table),
            names.join(",\n  ")
        );

        let keys = self.key_extractions(&extractions);
        if incremental {
            sql.push_str(&format!("\n  DISTINCT ON ({})", keys.join(", ")));
        }
        sql.push_str(&format!(
            "\n  {}\nFROM {}",
            select_list.join(",\n  "),
            self.staging_name()
        ));

        if incremental {
            sql.push_str(&format!(
                "\nORDER BY {}, {} DESC",
                keys.join(", "),
                self.quote(&self.staging.row_column)
            ));

            let key_columns: Vec<&Column> = self.table.primary_key_columns().collect();
            sql.push_str(&format!(
                "\nON CONFLICT ({})",
                self.column_names(&key_columns).join(", ")
            ));

            let updates: Vec<String> = self
                .table
                .columns
                .iter()
                .filter(|c| !c.primary_key)
                .map(|c| {
                    let name = self.quote(&c.name);
                    format!("{} = EXCLUDED.{}", name, name)
                })
                .collect();
            if updates.is_empty() {
                sql.push_str("\nDO NOTHING");
            } else {
                sql.push_str(&format!("\nDO UPDATE SET {}", updates.join(",\n  ")));
            }
        }
        Ok(sql)
    }

    /// MERGE keeping the newest staged row per key
    fn bigquery_merge(&self) -> Result<String, ExportError> {
        let columns: Vec<&Column> = self.table.columns.iter().collect();
        let names = self.column_names(&columns);
        let extractions = self.extractions()?;
        let keys = self.key_extractions(&extractions);
        let select_list: Vec<String> = extractions
            .iter()
            .zip(&names)
            .map(|(expr, name)| format!("{} AS {}", expr, name))
            .collect();

        let key_columns: Vec<&Column> = self.table.primary_key_columns().collect();
        let on: Vec<String> = self
            .column_names(&key_columns)
            .iter()
            .map(|name| format!("target.{} = source.{}", name, name))
            .collect();

        let mut sql = format!(
            "MERGE INTO {} AS target\nUSING (\n  SELECT\n    {}\n  FROM {}\n  WHERE TRUE\n  QUALIFY ROW_NUMBER() OVER (PARTITION BY {} ORDER BY {} DESC) = 1\n) AS source\nON {}",
            self.exporter.qualified_name(self.table),
            select_list.join(",\n    "),
            self.staging_name(),
            keys.join(", "),
            self.quote(&self.staging.row_column),
            on.join(" AND ")
        );

        let updates: Vec<String> = self
            .table
            .columns
            .iter()
            .zip(&names)
            .filter(|(c, _)| !c.primary_key)
            .map(|(_, name)| format!("{} = source.{}", name, name))
            .collect();
        if !updates.is_empty() {
            sql.push_str(&format!(
                "\nWHEN MATCHED THEN\n  UPDATE SET {}",
                updates.join(",\n    ")
            ));
        }

        let sources: Vec<String> = names.iter().map(|n| format!("source.{}", n)).collect();
        sql.push_str(&format!(
            "\nWHEN NOT MATCHED THEN\n  INSERT ({}) VALUES ({})",
            names.join(", "),
            sources.join(", ")
        ));
        Ok(sql)
    }

    fn postgres_extract(&self, column: &Column) -> Result<String, ExportError> {
        let document = self.quote(&self.staging.document_column);
        let key = self.dialect().string_literal(&column.name);
        let base = self
            .exporter
            .type_definition(&column.data_type, false, &column.name)?;
        let is_json = matches!(column.data_type, StorageType::Json | StorageType::Struct(_));

        if column.is_array {
            let (elements, element) = match &column.data_type {
                StorageType::Json | StorageType::Struct(_) => ("jsonb_array_elements", "e".to_string()),
                StorageType::Text => ("jsonb_array_elements_text", "e".to_string()),
                _ => ("jsonb_array_elements_text", format!("CAST(e AS {})", base)),
            };
            // jsonb_typeof guard: a JSON null or scalar stays SQL NULL
            return Ok(format!(
                "CASE WHEN jsonb_typeof({doc} -> {key}) = 'array' THEN ARRAY(SELECT {element} FROM {elements}({doc} -> {key}) AS e) END",
                doc = document,
                key = key,
                element = element,
                elements = elements
            ));
        }

        Ok(match &column.data_type {
            _ if is_json => format!("{} -> {}", document, key),
            StorageType::Text => format!("{} ->> {}", document, key),
            _ => format!("CAST({} ->> {} AS {})", document, key, base),
        })
    }

    fn bigquery_extract(&self, column: &Column) -> Result<String, ExportError> {
        if column.data_type.is_struct() {
            return Err(ExportError::UnsupportedType {
                dialect: self.dialect(),
                column: column.name.clone(),
                data_type: column.data_type.to_string(),
            });
        }

        let document = self.quote(&self.staging.document_column);
        let path = self.dialect().string_literal(&json_path(&column.name));
        let base = self
            .exporter
            .type_definition(&column.data_type, false, &column.name)?;

        if column.is_array {
            let element = match column.data_type {
                StorageType::Json => "e".to_string(),
                StorageType::Text | StorageType::Xml => "JSON_VALUE(e, '$')".to_string(),
                _ => format!("CAST(JSON_VALUE(e, '$') AS {})", base),
            };
            return Ok(format!(
                "ARRAY(SELECT {} FROM UNNEST(JSON_QUERY_ARRAY({}, {})) AS e)",
                element, document, path
            ));
        }

        Ok(match column.data_type {
            StorageType::Json => format!("JSON_QUERY({}, {})", document, path),
            StorageType::Text | StorageType::Xml => format!("JSON_VALUE({}, {})", document, path),
            _ => format!("CAST(JSON_VALUE({}, {}) AS {})", document, path, base),
        })
    }
}

/// JSONPath of a top-level member
fn json_path(name: &str) -> String {
    if SqlDialect::BigQuery.needs_quoting(name) {
        format!("$.\"{}\"", name.replace('"', "\\\""))
    } else {
        format!("$.{}", name)
    }
}
