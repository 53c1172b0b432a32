//! SQL dialects and identifier quoting
//!
//! Each dialect owns a keyword set and a quoting rule. An identifier is quoted
//! when it contains a space, is a keyword of the dialect (case-insensitive),
//! is not a plain identifier for the dialect, or quoting is forced.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Target database dialect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SqlDialect {
    #[default]
    Postgres,
    BigQuery,
    SqlServer,
    Sqlite,
}

impl std::str::FromStr for SqlDialect {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(SqlDialect::Postgres),
            "bigquery" => Ok(SqlDialect::BigQuery),
            "sqlserver" | "mssql" => Ok(SqlDialect::SqlServer),
            "sqlite" => Ok(SqlDialect::Sqlite),
            _ => Err(format!(
                "Unknown SQL dialect: {}. Use 'postgres', 'bigquery', 'sqlserver' or 'sqlite'.",
                s
            )),
        }
    }
}

impl std::fmt::Display for SqlDialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SqlDialect::Postgres => write!(f, "postgres"),
            SqlDialect::BigQuery => write!(f, "bigquery"),
            SqlDialect::SqlServer => write!(f, "sqlserver"),
            SqlDialect::Sqlite => write!(f, "sqlite"),
        }
    }
}

static RE_LOWER_IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z_][a-z0-9_]*$").expect("Invalid regex"));
static RE_MIXED_IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("Invalid regex"));

static POSTGRES_KEYWORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "all", "analyse", "analyze", "and", "any", "array", "as", "asc", "asymmetric",
        "authorization", "binary", "both", "case", "cast", "check", "collate", "collation",
        "column", "concurrently", "constraint", "create", "cross", "current_catalog",
        "current_date", "current_role", "current_schema", "current_time", "current_timestamp",
        "current_user", "default", "deferrable", "desc", "distinct", "do", "else", "end",
        "except", "false", "fetch", "for", "foreign", "freeze", "from", "full", "grant",
        "group", "having", "ilike", "in", "initially", "inner", "intersect", "into", "is",
        "isnull", "join", "lateral", "leading", "left", "like", "limit", "localtime",
        "localtimestamp", "natural", "not", "notnull", "null", "offset", "on", "only", "or",
        "order", "outer", "overlaps", "placing", "primary", "references", "returning",
        "right", "row", "select", "session_user", "similar", "some", "symmetric",
        "system_user", "table", "tablesample", "then", "to", "trailing", "true", "union",
        "unique", "user", "using", "variadic", "verbose", "when", "where", "window", "with",
    ]
    .into_iter()
    .collect()
});

static BIGQUERY_KEYWORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "all", "and", "any", "array", "as", "asc", "assert_rows_modified", "at", "between",
        "by", "case", "cast", "collate", "contains", "create", "cross", "cube", "current",
        "default", "define", "desc", "distinct", "else", "end", "enum", "escape", "except",
        "exclude", "exists", "extract", "false", "fetch", "following", "for", "from", "full",
        "group", "grouping", "groups", "hash", "having", "if", "ignore", "in", "inner",
        "intersect", "interval", "into", "is", "join", "lateral", "left", "like", "limit",
        "lookup", "merge", "natural", "new", "no", "not", "null", "nulls", "of", "on", "or",
        "order", "outer", "over", "partition", "preceding", "proto", "qualify", "range",
        "recursive", "respect", "right", "rollup", "rows", "select", "set", "some", "struct",
        "tablesample", "then", "to", "treat", "true", "unbounded", "union", "unnest", "using",
        "when", "where", "window", "with", "within",
    ]
    .into_iter()
    .collect()
});

static SQLSERVER_KEYWORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "add", "all", "alter", "and", "any", "as", "asc", "authorization", "backup", "begin",
        "between", "break", "browse", "bulk", "by", "cascade", "case", "check", "checkpoint",
        "close", "clustered", "coalesce", "collate", "column", "commit", "compute",
        "constraint", "contains", "containstable", "continue", "convert", "create", "cross",
        "current", "current_date", "current_time", "current_timestamp", "current_user",
        "cursor", "database", "dbcc", "deallocate", "declare", "default", "delete", "deny",
        "desc", "disk", "distinct", "distributed", "double", "drop", "dump", "else", "end",
        "errlvl", "escape", "except", "exec", "execute", "exists", "exit", "external",
        "fetch", "file", "fillfactor", "for", "foreign", "freetext", "freetexttable", "from",
        "full", "function", "goto", "grant", "group", "having", "holdlock", "identity",
        "identity_insert", "identitycol", "if", "in", "index", "inner", "insert",
        "intersect", "into", "is", "join", "key", "kill", "left", "like", "lineno", "load",
        "merge", "national", "nocheck", "nonclustered", "not", "null", "nullif", "of", "off",
        "offsets", "on", "open", "opendatasource", "openquery", "openrowset", "openxml",
        "option", "or", "order", "outer", "over", "percent", "pivot", "plan", "precision",
        "primary", "print", "proc", "procedure", "public", "raiserror", "read", "readtext",
        "reconfigure", "references", "replication", "restore", "restrict", "return",
        "revert", "revoke", "right", "rollback", "rowcount", "rowguidcol", "rule", "save",
        "schema", "securityaudit", "select", "session_user", "set", "setuser", "shutdown",
        "some", "statistics", "system_user", "table", "tablesample", "textsize", "then", "to",
        "top", "tran", "transaction", "trigger", "truncate", "try_convert", "tsequal",
        "union", "unique", "unpivot", "update", "updatetext", "use", "user", "values",
        "varying", "view", "waitfor", "when", "where", "while", "with", "within", "writetext",
    ]
    .into_iter()
    .collect()
});

static SQLITE_KEYWORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "abort", "action", "add", "after", "all", "alter", "always", "analyze", "and", "as",
        "asc", "attach", "autoincrement", "before", "begin", "between", "by", "cascade",
        "case", "cast", "check", "collate", "column", "commit", "conflict", "constraint",
        "create", "cross", "current", "current_date", "current_time", "current_timestamp",
        "database", "default", "deferrable", "deferred", "delete", "desc", "detach",
        "distinct", "do", "drop", "each", "else", "end", "escape", "except", "exclude",
        "exclusive", "exists", "explain", "fail", "filter", "first", "following", "for",
        "foreign", "from", "full", "generated", "glob", "group", "groups", "having", "if",
        "ignore", "immediate", "in", "index", "indexed", "initially", "inner", "insert",
        "instead", "intersect", "into", "is", "isnull", "join", "key", "last", "left", "like",
        "limit", "match", "materialized", "natural", "no", "not", "nothing", "notnull",
        "null", "nulls", "of", "offset", "on", "or", "order", "others", "outer", "over",
        "partition", "plan", "pragma", "preceding", "primary", "query", "raise", "range",
        "recursive", "references", "regexp", "reindex", "release", "rename", "replace",
        "restrict", "returning", "right", "rollback", "row", "rows", "savepoint", "select",
        "set", "table", "temp", "temporary", "then", "ties", "to", "transaction", "trigger",
        "unbounded", "union", "unique", "update", "using", "vacuum", "values", "view",
        "virtual", "when", "where", "window", "with", "without",
    ]
    .into_iter()
    .collect()
});

impl SqlDialect {
    pub const ALL: [SqlDialect; 4] = [
        SqlDialect::Postgres,
        SqlDialect::BigQuery,
        SqlDialect::SqlServer,
        SqlDialect::Sqlite,
    ];

    /// Opening and closing identifier quote characters
    pub fn quote_chars(&self) -> (char, char) {
        match self {
            SqlDialect::Postgres | SqlDialect::Sqlite => ('"', '"'),
            SqlDialect::BigQuery => ('`', '`'),
            SqlDialect::SqlServer => ('[', ']'),
        }
    }

    /// Whether struct columns keep their shape (otherwise stored as text/json)
    pub fn supports_nested_types(&self) -> bool {
        matches!(self, SqlDialect::BigQuery)
    }

    pub fn supports_arrays(&self) -> bool {
        matches!(self, SqlDialect::Postgres | SqlDialect::BigQuery)
    }

    /// Whether staged JSON documents can be merged into a target table
    pub fn supports_staged_merge(&self) -> bool {
        matches!(self, SqlDialect::Postgres | SqlDialect::BigQuery)
    }

    pub fn supports_inline_primary_key(&self) -> bool {
        !matches!(self, SqlDialect::BigQuery)
    }

    /// Whether unquoted identifiers are folded to lower case
    pub fn folds_case(&self) -> bool {
        matches!(self, SqlDialect::Postgres | SqlDialect::Sqlite)
    }

    pub fn is_keyword(&self, word: &str) -> bool {
        let lower = word.to_lowercase();
        let keywords = match self {
            SqlDialect::Postgres => &POSTGRES_KEYWORDS,
            SqlDialect::BigQuery => &BIGQUERY_KEYWORDS,
            SqlDialect::SqlServer => &SQLSERVER_KEYWORDS,
            SqlDialect::Sqlite => &SQLITE_KEYWORDS,
        };
        keywords.contains(lower.as_str())
    }

    fn is_plain_identifier(&self, name: &str) -> bool {
        if self.folds_case() {
            RE_LOWER_IDENTIFIER.is_match(name)
        } else {
            RE_MIXED_IDENTIFIER.is_match(name)
        }
    }

    pub fn needs_quoting(&self, name: &str) -> bool {
        name.contains(' ') || self.is_keyword(name) || !self.is_plain_identifier(name)
    }

    /// Quote an identifier when needed (or always when `force`).
    ///
    /// Embedded closing quote characters are doubled.
    ///
    /// ```rust
    /// use singer_schema_sdk::export::SqlDialect;
    ///
    /// assert_eq!(SqlDialect::Postgres.quote_identifier("my_col", false), "my_col");
    /// assert_eq!(SqlDialect::Postgres.quote_identifier("select", false), "\"select\"");
    /// assert_eq!(SqlDialect::SqlServer.quote_identifier("a]b", false), "[a]]b]");
    /// assert_eq!(SqlDialect::BigQuery.quote_identifier("id", true), "`id`");
    /// ```
    pub fn quote_identifier(&self, name: &str, force: bool) -> String {
        if !force && !self.needs_quoting(name) {
            return name.to_string();
        }
        let (open, close) = self.quote_chars();
        let escaped = name.replace(close, &format!("{}{}", close, close));
        format!("{}{}{}", open, escaped, close)
    }

    /// Render a string literal
    pub fn string_literal(&self, value: &str) -> String {
        match self {
            SqlDialect::BigQuery => {
                format!("'{}'", value.replace('\\', "\\\\").replace('\'', "\\'"))
            }
            _ => format!("'{}'", value.replace('\'', "''")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reserved_word_quoted_everywhere() {
        assert_eq!(SqlDialect::Postgres.quote_identifier("select", false), "\"select\"");
        assert_eq!(SqlDialect::BigQuery.quote_identifier("select", false), "`select`");
        assert_eq!(SqlDialect::SqlServer.quote_identifier("select", false), "[select]");
        assert_eq!(SqlDialect::Sqlite.quote_identifier("SELECT", false), "\"SELECT\"");
    }

    #[test]
    fn test_plain_identifier_never_quoted() {
        for dialect in SqlDialect::ALL {
            for name in ["my_col", "id", "value", "data", "amount"] {
                assert_eq!(dialect.quote_identifier(name, false), name, "{} {}", dialect, name);
            }
        }
    }

    #[test]
    fn test_spaces_and_odd_characters_are_quoted() {
        assert_eq!(SqlDialect::Postgres.quote_identifier("first name", false), "\"first name\"");
        assert_eq!(SqlDialect::BigQuery.quote_identifier("user-id", false), "`user-id`");
        assert_eq!(SqlDialect::SqlServer.quote_identifier("1st", false), "[1st]");
    }

    #[test]
    fn test_upper_case_quoted_only_where_case_folds() {
        assert_eq!(SqlDialect::Postgres.quote_identifier("UserId", false), "\"UserId\"");
        assert_eq!(SqlDialect::BigQuery.quote_identifier("UserId", false), "UserId");
        assert_eq!(SqlDialect::SqlServer.quote_identifier("UserId", false), "UserId");
    }

    #[test]
    fn test_embedded_quotes_are_doubled() {
        assert_eq!(SqlDialect::Postgres.quote_identifier("a\"b", false), "\"a\"\"b\"");
        assert_eq!(SqlDialect::BigQuery.quote_identifier("a`b", false), "`a``b`");
    }

    #[test]
    fn test_string_literals() {
        assert_eq!(SqlDialect::Postgres.string_literal("it's"), "'it''s'");
        assert_eq!(SqlDialect::BigQuery.string_literal("it's"), "'it\\'s'");
    }

    #[test]
    fn test_dialect_names() {
        assert_eq!("PostgreSQL".parse::<SqlDialect>().unwrap(), SqlDialect::Postgres);
        assert_eq!("mssql".parse::<SqlDialect>().unwrap(), SqlDialect::SqlServer);
        assert!("oracle".parse::<SqlDialect>().is_err());
        for dialect in SqlDialect::ALL {
            assert_eq!(dialect.to_string().parse::<SqlDialect>().unwrap(), dialect);
        }
    }
}
