//! Singer catalog model
//!
//! A catalog is the document a tap writes in discovery mode: a list of
//! streams, each described by a JSON Schema plus breadcrumb-addressed
//! metadata. This module parses and writes that document, answers replication
//! and key questions per stream, and applies a caller's stream selection.

pub mod metadata;
pub mod selection;

pub use metadata::{Breadcrumb, Metadata, MetadataEntry, MetadataTree, standard_metadata};
pub use selection::{SelectionTree, mark_selected, mark_unselected, missing_properties};

use crate::models::ReplicationMethod;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::{info, warn};

/// Error raised while reading, writing or querying a catalog
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Failed to parse catalog: {0}")]
    ParseError(String),
    #[error("Failed to serialize catalog: {0}")]
    SerializationError(String),
    #[error("Could not find stream '{0}' in catalog")]
    StreamNotFound(String),
    #[error(transparent)]
    Selection(#[from] SelectionError),
}

/// Every name of a stream selection that does not exist in the catalog
#[derive(Debug, Clone, PartialEq, Eq, Default, thiserror::Error)]
#[error("{}", describe_missing(.missing_streams, .missing_properties))]
pub struct SelectionError {
    /// Requested streams that are not in the catalog
    pub missing_streams: Vec<String>,
    /// Requested `(stream, property)` pairs the stream does not declare
    pub missing_properties: Vec<(String, String)>,
}

impl SelectionError {
    pub fn is_empty(&self) -> bool {
        self.missing_streams.is_empty() && self.missing_properties.is_empty()
    }
}

fn describe_missing(streams: &[String], properties: &[(String, String)]) -> String {
    let mut parts = Vec::new();
    if !streams.is_empty() {
        parts.push(format!("unknown streams: {}", streams.join(", ")));
    }
    if !properties.is_empty() {
        let names: Vec<String> = properties
            .iter()
            .map(|(stream, property)| format!("{}.{}", stream, property))
            .collect();
        parts.push(format!("unknown properties: {}", names.join(", ")));
    }
    format!("Invalid stream selection ({})", parts.join("; "))
}

/// Which streams, and optionally which of their properties, to replicate
///
/// Deserializes from either `["orders", "users"]` or
/// `{"orders": ["id", "total"], "users": []}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StreamSelection {
    Streams(Vec<String>),
    Properties(BTreeMap<String, Vec<String>>),
}

/// One stream of a catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tap_stream_id: Option<String>,
    /// Stream name; also the name of the target table
    pub stream: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_name: Option<String>,
    /// JSON Schema of one record
    #[serde(default)]
    pub schema: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_properties: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "MetadataTree::is_empty")]
    pub metadata: MetadataTree,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replication_method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replication_key: Option<String>,
    /// Keys this crate does not interpret, written back unchanged
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CatalogEntry {
    pub fn new(stream: impl Into<String>, schema: Value) -> Self {
        Self {
            tap_stream_id: None,
            stream: stream.into(),
            table_name: None,
            schema,
            key_properties: None,
            metadata: MetadataTree::new(),
            replication_method: None,
            replication_key: None,
            extra: Map::new(),
        }
    }

    /// `tap_stream_id` when present, else the stream name
    pub fn id(&self) -> &str {
        self.tap_stream_id.as_deref().unwrap_or(&self.stream)
    }

    /// Key properties: the entry's own list wins (even when empty), then the
    /// root `table-key-properties`, then `view-key-properties`.
    pub fn key_properties(&self) -> &[String] {
        if let Some(keys) = &self.key_properties {
            return keys;
        }
        self.metadata
            .root()
            .and_then(|root| {
                root.table_key_properties
                    .as_deref()
                    .or(root.view_key_properties.as_deref())
            })
            .unwrap_or(&[])
    }

    pub fn schema_name(&self) -> Option<&str> {
        self.metadata.root().and_then(|m| m.schema_name.as_deref())
    }

    pub fn replication_method(&self) -> ReplicationMethod {
        if let Some(raw) = &self.replication_method {
            match raw.parse() {
                Ok(method) => return method,
                Err(e) => warn!("Stream '{}': {}", self.id(), e),
            }
        }
        self.metadata
            .root()
            .and_then(Metadata::replication_method)
            .unwrap_or_default()
    }

    pub fn replication_key(&self) -> Option<&str> {
        self.replication_key.as_deref().or_else(|| {
            self.metadata
                .root()
                .and_then(|m| m.replication_key.as_deref())
        })
    }

    /// Selection view with the key properties applied
    pub fn selection(&self) -> SelectionTree<'_> {
        SelectionTree::new(&self.schema, &self.metadata).with_key_properties(self.key_properties())
    }

    pub fn is_selected(&self) -> bool {
        self.selection().is_stream_selected()
    }

    /// Mark the stream selected, with an explicit property set or by default.
    ///
    /// Every requested name is checked first; nothing changes when one is
    /// unknown.
    pub fn mark_as_selected(&mut self, properties: Option<&[String]>) -> Result<(), SelectionError> {
        if let Some(requested) = properties {
            let missing = missing_properties(&self.schema, &self.metadata, requested);
            if !missing.is_empty() {
                return Err(SelectionError {
                    missing_streams: Vec::new(),
                    missing_properties: missing
                        .into_iter()
                        .map(|p| (self.id().to_string(), p))
                        .collect(),
                });
            }
        }
        mark_selected(&mut self.schema, &mut self.metadata, properties);
        Ok(())
    }

    pub fn mark_as_unselected(&mut self) {
        mark_unselected(&mut self.schema, &mut self.metadata);
    }
}

/// A Singer catalog document
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub streams: Vec<CatalogEntry>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Catalog {
    pub fn new(streams: Vec<CatalogEntry>) -> Self {
        Self {
            streams,
            extra: Map::new(),
        }
    }

    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let catalog: Catalog =
            serde_json::from_str(json).map_err(|e| CatalogError::ParseError(e.to_string()))?;
        info!("Parsed catalog with {} streams", catalog.streams.len());
        Ok(catalog)
    }

    pub fn to_json(&self) -> Result<String, CatalogError> {
        serde_json::to_string_pretty(self).map_err(|e| CatalogError::SerializationError(e.to_string()))
    }

    /// Find a stream by `tap_stream_id` or stream name
    pub fn stream(&self, id: &str) -> Option<&CatalogEntry> {
        self.streams
            .iter()
            .find(|s| s.tap_stream_id.as_deref() == Some(id) || s.stream == id)
    }

    pub fn stream_mut(&mut self, id: &str) -> Option<&mut CatalogEntry> {
        self.streams
            .iter_mut()
            .find(|s| s.tap_stream_id.as_deref() == Some(id) || s.stream == id)
    }

    /// Like [`Catalog::stream`], failing with [`CatalogError::StreamNotFound`]
    pub fn require_stream(&self, id: &str) -> Result<&CatalogEntry, CatalogError> {
        self.stream(id)
            .ok_or_else(|| CatalogError::StreamNotFound(id.to_string()))
    }

    pub fn stream_names(&self) -> Vec<&str> {
        self.streams.iter().map(|s| s.stream.as_str()).collect()
    }

    pub fn selected_streams(&self) -> Vec<&CatalogEntry> {
        self.streams.iter().filter(|s| s.is_selected()).collect()
    }

    /// Mark the named streams selected.
    ///
    /// All names are validated before anything is written; the returned error
    /// lists every unknown stream and property. Streams that are not named keep
    /// their current selection.
    pub fn apply_selection(&mut self, selection: &StreamSelection) -> Result<(), SelectionError> {
        let requests: Vec<(&str, Option<&[String]>)> = match selection {
            StreamSelection::Streams(names) => names.iter().map(|n| (n.as_str(), None)).collect(),
            StreamSelection::Properties(map) => map
                .iter()
                .map(|(name, props)| (name.as_str(), Some(props.as_slice())))
                .collect(),
        };

        let mut error = SelectionError::default();
        for (name, properties) in &requests {
            match self.stream(name) {
                None => error.missing_streams.push(name.to_string()),
                Some(entry) => {
                    if let Some(requested) = properties {
                        for missing in missing_properties(&entry.schema, &entry.metadata, requested) {
                            error.missing_properties.push((name.to_string(), missing));
                        }
                    }
                }
            }
        }
        if !error.is_empty() {
            return Err(error);
        }

        for (name, properties) in requests {
            if let Some(entry) = self.stream_mut(name) {
                entry.mark_as_selected(properties)?;
                info!("Selected stream '{}'", name);
            }
        }
        Ok(())
    }
}
