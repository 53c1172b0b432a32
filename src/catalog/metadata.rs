//! Breadcrumb-addressed stream metadata
//!
//! Singer catalogs attach metadata to schema nodes through a list of
//! `{"breadcrumb": [...], "metadata": {...}}` records. The breadcrumb is the
//! path of the node inside the stream's JSON Schema: `[]` is the stream root,
//! `["properties", "id"]` a first-level property, and deeper nodes keep
//! alternating `"properties"`/name, with `"items"` for array elements.

use crate::models::{Inclusion, ReplicationMethod};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use tracing::warn;

/// Structural path of a schema node
///
/// Lookups always compare segments; [`Breadcrumb::render`] is for messages only.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Breadcrumb(Vec<String>);

impl Breadcrumb {
    /// The stream root, `[]`
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// A first-level property, `["properties", name]`
    pub fn property(name: &str) -> Self {
        Self::root().child(name)
    }

    /// Nested property below this node
    pub fn child(&self, name: &str) -> Self {
        let mut segments = self.0.clone();
        segments.push("properties".to_string());
        segments.push(name.to_string());
        Self(segments)
    }

    /// Array element node below this node
    pub fn items(&self) -> Self {
        let mut segments = self.0.clone();
        segments.push("items".to_string());
        Self(segments)
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether this addresses `["properties", name]`
    pub fn is_top_level_property(&self) -> bool {
        self.0.len() == 2 && self.0[0] == "properties"
    }

    /// Name of the first-level property this node belongs to
    pub fn top_level_property(&self) -> Option<&str> {
        match self.0.as_slice() {
            [kind, name, ..] if kind == "properties" => Some(name.as_str()),
            _ => None,
        }
    }

    /// Enclosing node, `None` for the root
    pub fn parent(&self) -> Option<Breadcrumb> {
        match self.0.last().map(String::as_str) {
            None => None,
            Some("items") => Some(Self(self.0[..self.0.len() - 1].to_vec())),
            Some(_) => {
                let len = self.0.len();
                if len >= 2 && self.0[len - 2] == "properties" {
                    Some(Self(self.0[..len - 2].to_vec()))
                } else {
                    Some(Self(self.0[..len - 1].to_vec()))
                }
            }
        }
    }

    /// Human readable path: properties joined with `.`, array items as `[]`.
    ///
    /// ```rust
    /// use singer_schema_sdk::catalog::Breadcrumb;
    ///
    /// let crumb = Breadcrumb::property("lines").items().child("sku");
    /// assert_eq!(crumb.render(), "lines[].sku");
    /// assert_eq!(Breadcrumb::root().render(), "");
    /// ```
    pub fn render(&self) -> String {
        let mut out = String::new();
        let mut segments = self.0.iter();
        while let Some(segment) = segments.next() {
            match segment.as_str() {
                "properties" => {
                    if let Some(name) = segments.next() {
                        if !out.is_empty() {
                            out.push('.');
                        }
                        out.push_str(name);
                    }
                }
                "items" => out.push_str("[]"),
                other => {
                    if !out.is_empty() {
                        out.push('.');
                    }
                    out.push_str(other);
                }
            }
        }
        out
    }

    /// Follow this path through a JSON Schema document.
    pub fn resolve<'a>(&self, schema: &'a Value) -> Option<&'a Value> {
        self.0
            .iter()
            .try_fold(schema, |node, segment| node.get(segment.as_str()))
    }
}

impl fmt::Display for Breadcrumb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            f.write_str("<root>")
        } else {
            f.write_str(&self.render())
        }
    }
}

/// Metadata flags of one schema node
///
/// Keys the SDK does not interpret (e.g. `sql-datatype`, `is-view`) are kept
/// in `extra` so a catalog survives a read/write cycle unchanged.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Metadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_by_default: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inclusion: Option<Inclusion>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forced_replication_method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replication_method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replication_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_replication_keys: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_key_properties: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view_key_properties: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_name: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Metadata {
    pub fn is_automatic(&self) -> bool {
        self.inclusion == Some(Inclusion::Automatic)
    }

    pub fn is_unsupported(&self) -> bool {
        self.inclusion == Some(Inclusion::Unsupported)
    }

    /// Forced method if the tap set one, else the chosen method.
    pub fn replication_method(&self) -> Option<ReplicationMethod> {
        let raw = self
            .forced_replication_method
            .as_deref()
            .or(self.replication_method.as_deref())?;
        match raw.parse() {
            Ok(method) => Some(method),
            Err(e) => {
                warn!("Ignoring replication method metadata: {}", e);
                None
            }
        }
    }
}

/// One record of the serialized metadata list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataEntry {
    pub breadcrumb: Breadcrumb,
    pub metadata: Metadata,
}

/// Metadata of a stream, keyed by breadcrumb, in catalog order
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "Vec<MetadataEntry>", into = "Vec<MetadataEntry>")]
pub struct MetadataTree {
    entries: Vec<MetadataEntry>,
    index: HashMap<Breadcrumb, usize>,
}

impl From<Vec<MetadataEntry>> for MetadataTree {
    fn from(entries: Vec<MetadataEntry>) -> Self {
        let mut tree = MetadataTree::default();
        for entry in entries {
            tree.insert(entry.breadcrumb, entry.metadata);
        }
        tree
    }
}

impl From<MetadataTree> for Vec<MetadataEntry> {
    fn from(tree: MetadataTree) -> Self {
        tree.entries
    }
}

impl MetadataTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the metadata of a node, replacing what was there.
    pub fn insert(&mut self, breadcrumb: Breadcrumb, metadata: Metadata) {
        match self.index.get(&breadcrumb) {
            Some(&idx) => self.entries[idx].metadata = metadata,
            None => {
                self.index.insert(breadcrumb.clone(), self.entries.len());
                self.entries.push(MetadataEntry {
                    breadcrumb,
                    metadata,
                });
            }
        }
    }

    pub fn get(&self, breadcrumb: &Breadcrumb) -> Option<&Metadata> {
        self.index
            .get(breadcrumb)
            .map(|&idx| &self.entries[idx].metadata)
    }

    /// Metadata of a node, created empty if missing
    pub fn entry(&mut self, breadcrumb: &Breadcrumb) -> &mut Metadata {
        let idx = match self.index.get(breadcrumb) {
            Some(&idx) => idx,
            None => {
                self.insert(breadcrumb.clone(), Metadata::default());
                self.entries.len() - 1
            }
        };
        &mut self.entries[idx].metadata
    }

    pub fn root(&self) -> Option<&Metadata> {
        self.get(&Breadcrumb::root())
    }

    pub fn contains(&self, breadcrumb: &Breadcrumb) -> bool {
        self.index.contains_key(breadcrumb)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Breadcrumb, &Metadata)> {
        self.entries.iter().map(|e| (&e.breadcrumb, &e.metadata))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&Breadcrumb, &mut Metadata)> {
        self.entries
            .iter_mut()
            .map(|e| (&e.breadcrumb, &mut e.metadata))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Build the metadata a tap writes for a freshly discovered stream.
///
/// The root records key properties, forced replication method, valid
/// replication keys, `inclusion = available` and the schema name; every
/// first-level property is `automatic` when it is a key property and
/// `available` otherwise.
pub fn standard_metadata(
    schema: Option<&Value>,
    schema_name: Option<&str>,
    key_properties: Option<&[String]>,
    valid_replication_keys: Option<&[String]>,
    replication_method: Option<ReplicationMethod>,
) -> MetadataTree {
    let mut tree = MetadataTree::new();
    let root = tree.entry(&Breadcrumb::root());
    root.table_key_properties = key_properties.map(|k| k.to_vec());
    root.forced_replication_method = replication_method.map(|m| m.to_string());
    root.valid_replication_keys = valid_replication_keys.map(|k| k.to_vec());
    if schema.is_some() {
        root.inclusion = Some(Inclusion::Available);
        root.schema_name = schema_name.map(|s| s.to_string());
    }

    if let Some(properties) = schema
        .and_then(|s| s.get("properties"))
        .and_then(Value::as_object)
    {
        for name in properties.keys() {
            let is_key = key_properties.is_some_and(|keys| keys.iter().any(|k| k == name));
            tree.entry(&Breadcrumb::property(name)).inclusion = Some(if is_key {
                Inclusion::Automatic
            } else {
                Inclusion::Available
            });
        }
    }

    tree
}
