//! Selection tree: decides which properties of a stream become columns
//!
//! Two read modes exist:
//!
//! - **Explicit**: the caller passed a property set, or the stream carries an
//!   explicit `selected` flag (legacy schema flag or root metadata). A property
//!   is materialized when its node is selected.
//! - **Default**: nothing was selected explicitly. A property is materialized
//!   when its inclusion is `automatic` or it is `selected-by-default`.
//!
//! Key properties are always materialized and `unsupported` nodes never are.
//! Requested names address first-level properties and are compared as
//! breadcrumbs, so a property literally named `a.b` never matches `b` nested in `a`.
//! Legacy `selected` flags inside the JSON Schema win over metadata when
//! reading; every write goes to the metadata tree and clears those flags, so a
//! newly marked catalog has a single source of truth.

use super::metadata::{Breadcrumb, Metadata, MetadataTree};
use serde_json::Value;
use tracing::debug;

/// Read-only view answering selection questions for one stream
pub struct SelectionTree<'a> {
    schema: &'a Value,
    metadata: &'a MetadataTree,
    key_properties: &'a [String],
    requested: Option<&'a [String]>,
}

impl<'a> SelectionTree<'a> {
    pub fn new(schema: &'a Value, metadata: &'a MetadataTree) -> Self {
        Self {
            schema,
            metadata,
            key_properties: &[],
            requested: None,
        }
    }

    /// Properties that are materialized regardless of selection
    pub fn with_key_properties(mut self, key_properties: &'a [String]) -> Self {
        self.key_properties = key_properties;
        self
    }

    /// Caller-supplied property set; switches to explicit mode
    pub fn with_requested(mut self, properties: &'a [String]) -> Self {
        self.requested = Some(properties);
        self
    }

    pub fn is_explicit(&self) -> bool {
        self.requested.is_some()
            || schema_flag(self.schema, &Breadcrumb::root()).is_some()
            || self.metadata.root().and_then(|m| m.selected).is_some()
    }

    pub fn is_stream_selected(&self) -> bool {
        schema_flag(self.schema, &Breadcrumb::root())
            .or_else(|| self.metadata.root().and_then(|m| m.selected))
            .unwrap_or(false)
    }

    pub fn is_property_selected(&self, name: &str) -> bool {
        self.is_selected(&Breadcrumb::property(name))
    }

    pub fn is_selected(&self, breadcrumb: &Breadcrumb) -> bool {
        if breadcrumb.is_root() {
            return self.is_stream_selected();
        }

        if breadcrumb.is_top_level_property()
            && let Some(name) = breadcrumb.top_level_property()
            && self.key_properties.iter().any(|k| k == name)
        {
            return true;
        }

        let metadata = self.metadata.get(breadcrumb);
        if metadata.is_some_and(Metadata::is_unsupported) {
            return false;
        }
        let automatic = metadata.is_some_and(Metadata::is_automatic);

        if let Some(requested) = self.requested {
            return automatic || is_requested(requested, breadcrumb);
        }

        if let Some(flag) = schema_flag(self.schema, breadcrumb) {
            return flag;
        }

        if self.is_explicit() {
            automatic || metadata.and_then(|m| m.selected) == Some(true)
        } else {
            automatic || metadata.and_then(|m| m.selected_by_default) == Some(true)
        }
    }

    /// Selected first-level properties in schema declaration order
    pub fn selected_properties(&self) -> Vec<&'a str> {
        self.schema
            .get("properties")
            .and_then(Value::as_object)
            .map(|props| {
                props
                    .keys()
                    .map(String::as_str)
                    .filter(|name| self.is_property_selected(name))
                    .collect()
            })
            .unwrap_or_default()
    }
}

fn schema_flag(schema: &Value, breadcrumb: &Breadcrumb) -> Option<bool> {
    breadcrumb
        .resolve(schema)?
        .get("selected")
        .and_then(Value::as_bool)
}

/// A node is requested when it, or the first-level property enclosing it, is
/// named in the set. Names address first-level properties only.
fn is_requested(requested: &[String], breadcrumb: &Breadcrumb) -> bool {
    let targets: Vec<Breadcrumb> = requested
        .iter()
        .map(|name| Breadcrumb::property(name))
        .collect();
    let mut node = Some(breadcrumb.clone());
    while let Some(crumb) = node {
        if crumb.is_root() {
            break;
        }
        if targets.contains(&crumb) {
            return true;
        }
        node = crumb.parent();
    }
    false
}

/// Requested names that match neither a first-level schema property nor a
/// first-level metadata node.
pub fn missing_properties(
    schema: &Value,
    metadata: &MetadataTree,
    requested: &[String],
) -> Vec<String> {
    let props = schema.get("properties").and_then(Value::as_object);
    requested
        .iter()
        .filter(|name| {
            !props.is_some_and(|p| p.contains_key(name.as_str()))
                && !metadata.contains(&Breadcrumb::property(name))
        })
        .cloned()
        .collect()
}

/// Mark a stream selected.
///
/// The root becomes `selected = true` and every node is recomputed:
/// unsupported is never selected, automatic always is, then a requested node
/// is selected, and with no requested set `selected-by-default` decides.
/// Missing first-level property nodes are created so the decision is recorded.
pub fn mark_selected(schema: &mut Value, metadata: &mut MetadataTree, requested: Option<&[String]>) {
    clear_schema_flags(schema);

    if let Some(props) = schema.get("properties").and_then(Value::as_object) {
        for name in props.keys() {
            metadata.entry(&Breadcrumb::property(name));
        }
    }

    metadata.entry(&Breadcrumb::root()).selected = Some(true);
    for (breadcrumb, md) in metadata.iter_mut() {
        if breadcrumb.is_root() {
            continue;
        }
        let selected = if md.is_unsupported() {
            false
        } else if md.is_automatic() {
            true
        } else {
            match requested {
                Some(requested) => is_requested(requested, breadcrumb),
                None => md.selected_by_default == Some(true),
            }
        };
        debug!("Selection of {}: {}", breadcrumb, selected);
        md.selected = Some(selected);
    }
}

/// Mark a stream unselected.
///
/// Only the root and the first-level properties are written; deeper nodes
/// keep whatever they had.
pub fn mark_unselected(schema: &mut Value, metadata: &mut MetadataTree) {
    clear_schema_flags(schema);

    metadata.entry(&Breadcrumb::root()).selected = Some(false);
    for (breadcrumb, md) in metadata.iter_mut() {
        if breadcrumb.is_top_level_property() {
            md.selected = Some(false);
        }
    }
}

fn clear_schema_flags(node: &mut Value) {
    let Some(obj) = node.as_object_mut() else {
        return;
    };
    obj.remove("selected");
    if let Some(props) = obj.get_mut("properties").and_then(Value::as_object_mut) {
        for child in props.values_mut() {
            clear_schema_flags(child);
        }
    }
    if let Some(items) = obj.get_mut("items") {
        clear_schema_flags(items);
    }
}
