//! Catalog module tests

use singer_schema_sdk::catalog::{
    Breadcrumb, Catalog, CatalogEntry, StreamSelection, standard_metadata,
};
use singer_schema_sdk::import::TableBuilder;
use singer_schema_sdk::models::{Inclusion, ReplicationMethod};
use serde_json::json;

const CATALOG: &str = r#"{
  "streams": [
    {
      "tap_stream_id": "crm-contacts",
      "stream": "contacts",
      "schema": {
        "type": ["null", "object"],
        "properties": {
          "id": {"type": ["null", "integer"]},
          "email": {"type": ["null", "string"]},
          "address": {
            "type": ["null", "object"],
            "properties": {
              "street": {"type": ["null", "string"]},
              "zip": {"type": ["null", "string"]}
            }
          },
          "internal_score": {"type": ["null", "number"]}
        }
      },
      "metadata": [
        {"breadcrumb": [], "metadata": {"table-key-properties": ["id"], "forced-replication-method": "INCREMENTAL", "valid-replication-keys": ["updated_at"], "schema-name": "crm"}},
        {"breadcrumb": ["properties", "id"], "metadata": {"inclusion": "automatic"}},
        {"breadcrumb": ["properties", "email"], "metadata": {"inclusion": "available", "selected-by-default": true}},
        {"breadcrumb": ["properties", "address"], "metadata": {"inclusion": "available"}},
        {"breadcrumb": ["properties", "address", "properties", "zip"], "metadata": {"inclusion": "available"}},
        {"breadcrumb": ["properties", "internal_score"], "metadata": {"inclusion": "unsupported"}}
      ]
    },
    {
      "tap_stream_id": "crm-deals",
      "stream": "deals",
      "schema": {"type": "object", "properties": {"deal_id": {"type": "string"}}},
      "key_properties": ["deal_id"]
    }
  ]
}"#;

mod catalog_document_tests {
    use super::*;

    #[test]
    fn test_parse_catalog() {
        let catalog = Catalog::from_json(CATALOG).unwrap();
        assert_eq!(catalog.stream_names(), vec!["contacts", "deals"]);

        let contacts = catalog.stream("crm-contacts").unwrap();
        assert_eq!(contacts.key_properties(), ["id"]);
        assert_eq!(contacts.replication_method(), ReplicationMethod::Incremental);
        assert_eq!(contacts.schema_name(), Some("crm"));
        assert!(!contacts.is_selected());
        assert!(catalog.selected_streams().is_empty());
    }

    #[test]
    fn test_invalid_catalog() {
        assert!(Catalog::from_json("{\"streams\": 3}").is_err());
    }

    #[test]
    fn test_write_then_read_is_stable() -> anyhow::Result<()> {
        let mut catalog = Catalog::from_json(CATALOG)?;
        catalog.apply_selection(&StreamSelection::Streams(vec!["deals".to_string()]))?;

        let written = catalog.to_json()?;
        let reread = Catalog::from_json(&written)?;
        assert_eq!(reread, catalog);
        assert!(reread.stream("deals").unwrap().is_selected());
        Ok(())
    }
}

mod stream_selection_tests {
    use super::*;

    #[test]
    fn test_selection_shapes() {
        let list: StreamSelection = serde_json::from_value(json!(["a", "b"])).unwrap();
        assert_eq!(
            list,
            StreamSelection::Streams(vec!["a".to_string(), "b".to_string()])
        );
        let map: StreamSelection = serde_json::from_value(json!({"a": ["x"]})).unwrap();
        assert!(matches!(map, StreamSelection::Properties(_)));
    }

    #[test]
    fn test_select_properties() -> anyhow::Result<()> {
        let mut catalog = Catalog::from_json(CATALOG)?;
        let selection: StreamSelection =
            serde_json::from_value(json!({"contacts": ["address", "internal_score"]}))?;
        catalog.apply_selection(&selection)?;

        let contacts = catalog.stream("contacts").unwrap();
        let selected = |crumb: Breadcrumb| contacts.metadata.get(&crumb).and_then(|m| m.selected);
        assert_eq!(selected(Breadcrumb::root()), Some(true));
        assert_eq!(selected(Breadcrumb::property("id")), Some(true));
        assert_eq!(selected(Breadcrumb::property("email")), Some(false));
        assert_eq!(selected(Breadcrumb::property("address")), Some(true));
        assert_eq!(
            selected(Breadcrumb::property("address").child("zip")),
            Some(true)
        );
        // unsupported wins over the request
        assert_eq!(selected(Breadcrumb::property("internal_score")), Some(false));

        assert_eq!(
            contacts.selection().selected_properties(),
            vec!["id", "address"]
        );
        Ok(())
    }

    #[test]
    fn test_select_by_default() -> anyhow::Result<()> {
        let mut catalog = Catalog::from_json(CATALOG)?;
        catalog.apply_selection(&StreamSelection::Streams(vec!["contacts".to_string()]))?;

        let contacts = catalog.stream("contacts").unwrap();
        assert_eq!(
            contacts.selection().selected_properties(),
            vec!["id", "email"]
        );
        Ok(())
    }

    #[test]
    fn test_unknown_names_are_collected() {
        let mut catalog = Catalog::from_json(CATALOG).unwrap();
        let selection: StreamSelection = serde_json::from_value(json!({
            "contacts": ["phone", "address.zip", "fax"],
            "leads": []
        }))
        .unwrap();

        let err = catalog.apply_selection(&selection).unwrap_err();
        assert_eq!(err.missing_streams, vec!["leads"]);
        assert_eq!(
            err.missing_properties,
            vec![
                ("contacts".to_string(), "phone".to_string()),
                ("contacts".to_string(), "address.zip".to_string()),
                ("contacts".to_string(), "fax".to_string()),
            ]
        );
        assert!(!catalog.stream("contacts").unwrap().is_selected());
    }

    #[test]
    fn test_unmark_then_mark_all_default() {
        let mut entry = CatalogEntry::new(
            "events",
            json!({
                "type": "object",
                "properties": {"id": {"type": "integer"}, "kind": {"type": "string"}, "raw": {"type": "string"}}
            }),
        );
        entry.metadata.entry(&Breadcrumb::property("id")).inclusion = Some(Inclusion::Automatic);
        entry
            .metadata
            .entry(&Breadcrumb::property("kind"))
            .selected_by_default = Some(true);

        entry.mark_as_unselected();
        entry.mark_as_selected(None).unwrap();

        assert_eq!(entry.selection().selected_properties(), vec!["id", "kind"]);

        let table = TableBuilder::new().build(&entry).unwrap();
        let names: Vec<&str> = table.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["id", "kind"]);
    }

    #[test]
    fn test_dotted_name_selects_the_literal_property() -> anyhow::Result<()> {
        let mut entry = CatalogEntry::new(
            "events",
            json!({
                "type": "object",
                "properties": {
                    "a.b": {"type": "integer"},
                    "a": {"type": "object", "properties": {"b": {"type": "string"}}}
                }
            }),
        );
        entry.metadata.entry(&Breadcrumb::property("a").child("b"));

        entry.mark_as_selected(Some(&["a.b".to_string()]))?;

        let selected = |crumb: Breadcrumb| entry.metadata.get(&crumb).and_then(|m| m.selected);
        assert_eq!(selected(Breadcrumb::property("a.b")), Some(true));
        assert_eq!(selected(Breadcrumb::property("a")), Some(false));
        assert_eq!(selected(Breadcrumb::property("a").child("b")), Some(false));

        let table = TableBuilder::new().build(&entry)?;
        let names: Vec<&str> = table.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["a.b"]);
        Ok(())
    }

    #[test]
    fn test_nested_path_is_reported_missing() {
        let mut entry = CatalogEntry::new(
            "events",
            json!({
                "type": "object",
                "properties": {"a": {"type": "object", "properties": {"b": {"type": "string"}}}}
            }),
        );
        let before = entry.clone();

        let err = entry.mark_as_selected(Some(&["a.b".to_string()])).unwrap_err();
        assert_eq!(
            err.missing_properties,
            vec![("events".to_string(), "a.b".to_string())]
        );
        assert_eq!(entry, before);
    }
}

mod standard_metadata_tests {
    use super::*;

    #[test]
    fn test_standard_metadata_drives_default_selection() {
        let schema = json!({
            "type": "object",
            "properties": {"id": {"type": "integer"}, "name": {"type": "string"}}
        });
        let keys = vec!["id".to_string()];
        let mut entry = CatalogEntry::new("users", schema.clone());
        entry.metadata = standard_metadata(
            Some(&schema),
            Some("app"),
            Some(keys.as_slice()),
            None,
            Some(ReplicationMethod::FullTable),
        );

        assert_eq!(entry.key_properties(), ["id"]);
        assert_eq!(entry.schema_name(), Some("app"));
        assert_eq!(entry.replication_method(), ReplicationMethod::FullTable);
        assert_eq!(entry.selection().selected_properties(), vec!["id"]);
    }
}
