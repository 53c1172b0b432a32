//! SQL generation configuration file support
//!
//! Handles parsing of `.singer-sql.toml` configuration files and
//! environment variable overrides.

use crate::export::{SqlDialect, SqlOptions, StagingTable};
use crate::import::{BuildOptions, DEFAULT_MAX_DEPTH};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, warn};

/// Default configuration filename
pub const CONFIG_FILENAME: &str = ".singer-sql.toml";

/// Environment variable for the SQL dialect
pub const ENV_DIALECT: &str = "SINGER_SQL_DIALECT";

/// Environment variable forcing identifier quoting
pub const ENV_FORCE_QUOTE: &str = "SINGER_SQL_FORCE_QUOTE";

/// Environment variable for the schema nesting limit
pub const ENV_MAX_DEPTH: &str = "SINGER_SQL_MAX_DEPTH";

/// Error while loading or saving configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),
    #[error("Config error: {0}")]
    ParseError(String),
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// SQL generation section
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SqlSection {
    #[serde(default)]
    pub dialect: SqlDialect,

    /// Emit `CREATE TABLE IF NOT EXISTS`
    #[serde(default)]
    pub create_if_not_exists: bool,

    /// Emit `DROP TABLE IF EXISTS`
    #[serde(default)]
    pub drop_if_exists: bool,

    /// Quote every identifier
    #[serde(default)]
    pub force_quote: bool,
}

/// Staging table layout
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagingSection {
    /// Column holding one JSON document per record
    #[serde(default = "default_document_column")]
    pub document_column: String,

    /// Column holding the increasing load order
    #[serde(default = "default_row_column")]
    pub row_column: String,
}

fn default_document_column() -> String {
    "data".to_string()
}

fn default_row_column() -> String {
    "row".to_string()
}

impl Default for StagingSection {
    fn default() -> Self {
        Self {
            document_column: default_document_column(),
            row_column: default_row_column(),
        }
    }
}

/// JSON Schema handling
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaSection {
    /// Refuse streams whose root allows additional properties
    #[serde(default = "default_true")]
    pub reject_additional_properties: bool,

    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

fn default_true() -> bool {
    true
}

fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

impl Default for SchemaSection {
    fn default() -> Self {
        Self {
            reject_additional_properties: true,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Main configuration structure
///
/// Represents the `.singer-sql.toml` configuration file format.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SqlConfig {
    #[serde(default)]
    pub sql: SqlSection,

    #[serde(default)]
    pub staging: StagingSection,

    #[serde(default)]
    pub schema: SchemaSection,
}

impl SqlConfig {
    /// Create a new default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a directory
    ///
    /// Looks for `.singer-sql.toml` in the directory and falls back to
    /// defaults if not found. Environment overrides are applied last.
    pub fn load(dir: &Path) -> ConfigResult<Self> {
        let config_path = dir.join(CONFIG_FILENAME);

        let mut config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)
                .map_err(|e| ConfigError::IoError(format!("Failed to read config: {}", e)))?;
            debug!("Loaded configuration from {}", config_path.display());
            Self::parse(&content)?
        } else {
            Self::default()
        };

        config.apply_env_overrides();

        Ok(config)
    }

    /// Parse configuration from TOML string
    pub fn parse(content: &str) -> ConfigResult<Self> {
        toml::from_str(content)
            .map_err(|e| ConfigError::ParseError(format!("Failed to parse config: {}", e)))
    }

    /// Save configuration to a directory
    pub fn save(&self, dir: &Path) -> ConfigResult<()> {
        let config_path = dir.join(CONFIG_FILENAME);
        let content = self.to_toml()?;

        std::fs::write(&config_path, content)
            .map_err(|e| ConfigError::IoError(format!("Failed to write config: {}", e)))?;

        Ok(())
    }

    /// Convert configuration to TOML string
    pub fn to_toml(&self) -> ConfigResult<String> {
        toml::to_string_pretty(self).map_err(|e| {
            ConfigError::SerializationError(format!("Failed to serialize config: {}", e))
        })
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from any key lookup; unparsable values are logged and ignored
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(dialect) = parse_override(ENV_DIALECT, lookup(ENV_DIALECT)) {
            self.sql.dialect = dialect;
        }

        if let Some(force) = lookup(ENV_FORCE_QUOTE) {
            match force.to_lowercase().as_str() {
                "1" | "true" | "yes" => self.sql.force_quote = true,
                "0" | "false" | "no" => self.sql.force_quote = false,
                other => warn!("Ignoring {}: not a boolean: {}", ENV_FORCE_QUOTE, other),
            }
        }

        if let Some(depth) = parse_override(ENV_MAX_DEPTH, lookup(ENV_MAX_DEPTH)) {
            self.schema.max_depth = depth;
        }
    }

    /// Options for the SQL generators
    pub fn sql_options(&self) -> SqlOptions {
        SqlOptions {
            if_not_exists: self.sql.create_if_not_exists,
            if_exists: self.sql.drop_if_exists,
            force_quote: self.sql.force_quote,
        }
    }

    /// Options for the table builder
    pub fn build_options(&self) -> BuildOptions {
        BuildOptions {
            schema_name: None,
            reject_additional_properties: self.schema.reject_additional_properties,
            max_depth: self.schema.max_depth,
        }
    }

    /// Staging table with the configured column names
    pub fn staging_table(&self, name: impl Into<String>) -> StagingTable {
        StagingTable::new(name).with_columns(
            self.staging.document_column.clone(),
            self.staging.row_column.clone(),
        )
    }
}

/// Parse an override value, warning and yielding `None` when it is invalid
fn parse_override<T>(key: &str, value: Option<String>) -> Option<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match value?.parse() {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            warn!("Ignoring {}: {}", key, e);
            None
        }
    }
}
