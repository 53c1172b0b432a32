//! Export module tests

use singer_schema_sdk::export::{
    ExportError, SQLExporter, SqlDialect, SqlOptions, StagingTable, extract_jsondoc_to_target,
    pre_sync_statement,
};
use singer_schema_sdk::models::{ReplicationMethod, StorageType, StructType, Table};
use sqlparser::dialect::{BigQueryDialect, MsSqlDialect, PostgreSqlDialect, SQLiteDialect};
use sqlparser::parser::Parser;

fn customers() -> Table {
    let mut table = Table::new("customers").with_schema("crm");
    table.add_column("id", StorageType::Int, None, false, true).unwrap();
    table.add_column("email", StorageType::Text, Some(false), false, false).unwrap();
    table.add_column("balance", StorageType::Number, None, false, false).unwrap();
    table.add_column("signed_up", StorageType::Date, None, false, false).unwrap();
    table.add_column("active", StorageType::Bool, None, false, false).unwrap();
    table.add_column("profile", StorageType::Json, None, false, false).unwrap();
    table
}

fn with_arrays() -> Table {
    let mut table = customers();
    table.add_column("tags", StorageType::Text, None, true, false).unwrap();
    table
}

fn keyless() -> Table {
    let mut table = Table::new("events");
    table.add_column("kind", StorageType::Text, None, false, false).unwrap();
    table
}

fn keys_only() -> Table {
    let mut table = Table::new("links");
    table.add_column("from_id", StorageType::Int, None, false, true).unwrap();
    table.add_column("to_id", StorageType::Int, None, false, true).unwrap();
    table
}

mod sql_export_tests {
    use super::*;

    #[test]
    fn test_postgres_create_table_parses() {
        let exporter = SQLExporter::with_options(
            SqlDialect::Postgres,
            SqlOptions {
                if_not_exists: true,
                ..Default::default()
            },
        );
        let sql = exporter.create_table(&with_arrays()).unwrap();
        assert!(sql.starts_with("CREATE TABLE IF NOT EXISTS crm.customers ("));
        assert!(sql.contains("id bigint NOT NULL"));
        assert!(sql.contains("email text NOT NULL"));
        assert!(sql.contains("balance numeric,"));
        assert!(sql.contains("profile jsonb"));
        assert!(sql.contains("tags text[]"));
        assert!(sql.contains("PRIMARY KEY (id)"));

        let statements = Parser::parse_sql(&PostgreSqlDialect {}, &sql).unwrap();
        assert_eq!(statements.len(), 1);
    }

    #[test]
    fn test_sqlite_and_sqlserver_create_table_parse() {
        let sqlite = SQLExporter::new(SqlDialect::Sqlite).create_table(&customers()).unwrap();
        assert!(sqlite.contains("id INTEGER NOT NULL"));
        assert!(sqlite.contains("balance REAL"));
        assert!(sqlite.contains("signed_up TEXT"));
        Parser::parse_sql(&SQLiteDialect {}, &sqlite).unwrap();

        let mssql = SQLExporter::new(SqlDialect::SqlServer).create_table(&customers()).unwrap();
        assert!(mssql.contains("balance DECIMAL(38, 9)"));
        assert!(mssql.contains("profile NVARCHAR(MAX)"));
        assert!(mssql.contains("active BIT"));
        Parser::parse_sql(&MsSqlDialect {}, &mssql).unwrap();
    }

    #[test]
    fn test_bigquery_create_table_parses() {
        let sql = SQLExporter::new(SqlDialect::BigQuery).create_table(&with_arrays()).unwrap();
        assert!(sql.contains("id INT64 NOT NULL"));
        assert!(sql.contains("tags ARRAY<STRING>"));
        assert!(sql.contains("profile STRING"));
        assert!(!sql.contains("PRIMARY KEY"));
        Parser::parse_sql(&BigQueryDialect {}, &sql).unwrap();
    }

    #[test]
    fn test_keyword_and_plain_names() {
        let mut table = Table::new("order");
        table.add_column("select", StorageType::Int, None, false, true).unwrap();
        table.add_column("my_col", StorageType::Text, None, false, false).unwrap();

        for dialect in SqlDialect::ALL {
            let exporter = SQLExporter::new(dialect);
            let (open, close) = dialect.quote_chars();
            assert_eq!(exporter.quote("select"), format!("{open}select{close}"));
            assert_eq!(exporter.quote("my_col"), "my_col");
            assert_eq!(exporter.quote("Mixed Case"), format!("{open}Mixed Case{close}"));
        }

        let sql = SQLExporter::new(SqlDialect::Postgres).create_table(&table).unwrap();
        assert!(sql.starts_with("CREATE TABLE \"order\" ("));
        assert!(sql.contains("PRIMARY KEY (\"select\")"));
        Parser::parse_sql(&PostgreSqlDialect {}, &sql).unwrap();
    }

    #[test]
    fn test_upper_case_quoted_only_where_case_folds() {
        assert_eq!(SqlDialect::Postgres.quote_identifier("UserId", false), "\"UserId\"");
        assert_eq!(SqlDialect::SqlServer.quote_identifier("UserId", false), "UserId");
    }

    #[test]
    fn test_force_quote() {
        let exporter = SQLExporter::with_options(
            SqlDialect::SqlServer,
            SqlOptions {
                force_quote: true,
                ..Default::default()
            },
        );
        assert_eq!(exporter.qualified_name(&customers()), "[crm].[customers]");
    }

    #[test]
    fn test_drop_and_delete() {
        let table = customers();
        let options = SqlOptions {
            if_exists: true,
            ..Default::default()
        };
        let drop = SQLExporter::with_options(SqlDialect::Postgres, options).drop_table(&table);
        assert_eq!(drop, "DROP TABLE IF EXISTS crm.customers");
        Parser::parse_sql(&PostgreSqlDialect {}, &drop).unwrap();

        let delete = SQLExporter::new(SqlDialect::Postgres).delete_from(&table);
        assert_eq!(delete, "DELETE FROM crm.customers");
        Parser::parse_sql(&PostgreSqlDialect {}, &delete).unwrap();

        assert_eq!(
            SQLExporter::new(SqlDialect::BigQuery).delete_from(&table),
            "DELETE FROM crm.customers WHERE 1=1"
        );
        assert_eq!(
            SQLExporter::new(SqlDialect::SqlServer).delete_from(&table),
            "TRUNCATE TABLE crm.customers"
        );
    }

    #[test]
    fn test_struct_columns() {
        let mut address = StructType::anonymous();
        address.add_field(Some("city"), StorageType::Text, true, false).unwrap();
        let mut table = Table::new("people");
        table
            .add_column("address", StorageType::Struct(address), None, false, false)
            .unwrap();

        let bigquery = SQLExporter::new(SqlDialect::BigQuery).create_table(&table).unwrap();
        assert!(bigquery.contains("address STRUCT<city STRING>"));

        let postgres = SQLExporter::new(SqlDialect::Postgres).create_table(&table).unwrap();
        assert!(postgres.contains("address jsonb"));
        let sqlite = SQLExporter::new(SqlDialect::Sqlite).create_table(&table).unwrap();
        assert!(sqlite.contains("address TEXT"));
    }

    #[test]
    fn test_empty_table_is_an_error() {
        let err = SQLExporter::new(SqlDialect::Postgres)
            .create_table(&Table::new("nothing"))
            .unwrap_err();
        assert_eq!(
            err,
            ExportError::NoColumns {
                table: "nothing".to_string()
            }
        );
    }
}

mod merge_export_tests {
    use super::*;

    fn load(dialect: SqlDialect, table: &Table, method: ReplicationMethod) -> Result<String, ExportError> {
        extract_jsondoc_to_target(
            dialect,
            table,
            &StagingTable::new("stage.customers_load"),
            method,
            &SqlOptions::default(),
        )
    }

    #[test]
    fn test_postgres_full_table_insert_parses() {
        let sql = load(SqlDialect::Postgres, &keyless(), ReplicationMethod::FullTable).unwrap();
        assert_eq!(
            sql,
            "INSERT INTO events (\n  kind\n)\nSELECT\n  data ->> 'kind' AS kind\nFROM stage.customers_load"
        );
        Parser::parse_sql(&PostgreSqlDialect {}, &sql).unwrap();
    }

    #[test]
    fn test_postgres_upsert() {
        let sql = load(SqlDialect::Postgres, &customers(), ReplicationMethod::Incremental).unwrap();
        assert!(sql.contains("DISTINCT ON (CAST(data ->> 'id' AS bigint))"));
        assert!(sql.contains("CAST(data ->> 'balance' AS numeric) AS balance"));
        assert!(sql.contains("data -> 'profile' AS profile"));
        assert!(sql.contains("ORDER BY CAST(data ->> 'id' AS bigint), \"row\" DESC"));
        assert!(sql.contains("ON CONFLICT (id)"));
        assert!(sql.contains("DO UPDATE SET email = EXCLUDED.email"));
        assert!(!sql.contains("id = EXCLUDED.id"));
        Parser::parse_sql(&PostgreSqlDialect {}, &sql).unwrap();
    }

    #[test]
    fn test_postgres_keys_only_does_nothing_on_conflict() {
        let sql = load(SqlDialect::Postgres, &keys_only(), ReplicationMethod::Incremental).unwrap();
        assert!(sql.contains("ON CONFLICT (from_id, to_id)"));
        assert!(sql.ends_with("DO NOTHING"));
    }

    #[test]
    fn test_postgres_array_extraction() {
        let sql = load(SqlDialect::Postgres, &with_arrays(), ReplicationMethod::FullTable).unwrap();
        assert!(sql.contains(
            "CASE WHEN jsonb_typeof(data -> 'tags') = 'array' THEN ARRAY(SELECT e FROM jsonb_array_elements_text(data -> 'tags') AS e) END AS tags"
        ));
    }

    #[test]
    fn test_bigquery_merge() {
        let sql = load(SqlDialect::BigQuery, &customers(), ReplicationMethod::Incremental).unwrap();
        assert!(sql.starts_with("MERGE INTO crm.customers AS target"));
        assert!(sql.contains("CAST(JSON_VALUE(data, '$.id') AS INT64) AS id"));
        assert!(sql.contains("JSON_QUERY(data, '$.profile') AS profile"));
        assert!(sql.contains("QUALIFY ROW_NUMBER() OVER (PARTITION BY CAST(JSON_VALUE(data, '$.id') AS INT64) ORDER BY row DESC) = 1"));
        assert!(sql.contains("ON target.id = source.id"));
        assert!(sql.contains("WHEN MATCHED THEN\n  UPDATE SET email = source.email"));
        assert!(sql.contains("WHEN NOT MATCHED THEN\n  INSERT (id, email"));
    }

    #[test]
    fn test_bigquery_full_table_is_plain_insert() {
        let sql = load(SqlDialect::BigQuery, &customers(), ReplicationMethod::FullTable).unwrap();
        assert!(sql.starts_with("INSERT INTO crm.customers ("));
        assert!(!sql.contains("DISTINCT ON"));
        assert!(!sql.contains("MERGE"));
    }

    #[test]
    fn test_incremental_needs_a_key() {
        for dialect in [SqlDialect::Postgres, SqlDialect::BigQuery] {
            assert_eq!(
                load(dialect, &keyless(), ReplicationMethod::Incremental).unwrap_err(),
                ExportError::MissingPrimaryKey {
                    table: "events".to_string()
                }
            );
        }
    }

    #[test]
    fn test_unsupported_dialects() {
        for dialect in [SqlDialect::SqlServer, SqlDialect::Sqlite] {
            assert!(matches!(
                load(dialect, &customers(), ReplicationMethod::FullTable),
                Err(ExportError::UnsupportedOperation { .. })
            ));
        }
    }

    #[test]
    fn test_pre_sync_statement() {
        let table = customers();
        assert_eq!(
            pre_sync_statement(SqlDialect::Postgres, &table, ReplicationMethod::FullTable).as_deref(),
            Some("DELETE FROM crm.customers")
        );
        assert_eq!(
            pre_sync_statement(SqlDialect::Postgres, &table, ReplicationMethod::Incremental),
            None
        );
        assert_eq!(
            pre_sync_statement(SqlDialect::Postgres, &table, ReplicationMethod::LogBased),
            None
        );
    }

    #[test]
    fn test_custom_staging_columns() {
        let staging = StagingTable::new("load").with_columns("doc", "seq");
        let sql = extract_jsondoc_to_target(
            SqlDialect::Postgres,
            &customers(),
            &staging,
            ReplicationMethod::Incremental,
            &SqlOptions::default(),
        )
        .unwrap();
        assert!(sql.contains("doc ->> 'email' AS email"));
        assert!(sql.contains(", seq DESC"));
    }
}
