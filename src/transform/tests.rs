//! Transformer tests

use super::*;
use crate::document::{Document, Value};
use crate::schema::{Column, ColumnMode, ColumnType};
use pretty_assertions::assert_eq;
use serde_json::json;

fn doc(json: serde_json::Value) -> Document {
    Value::document_from_extended_json(json).unwrap()
}

fn record_json(record: crate::types::JsonObject) -> serde_json::Value {
    serde_json::Value::Object(record)
}

#[test]
fn test_full_document_scenario() {
    let mut transformer = RecordTransformer::detecting(TransformerConfig::default());
    let record = transformer.transform(doc(json!({
        "_id": "X",
        "name": "a",
        "count": 1,
        "tags": ["x", "y"],
        "meta": {"k": 1}
    })));

    assert_eq!(
        record_json(record),
        json!({
            "id": "X",
            "name": "a",
            "count": 1.0,
            "tags": ["x", "y"],
            "meta": {"k": 1.0}
        })
    );

    let schema = transformer.finish();
    assert_eq!(
        schema,
        vec![
            Column::new("id", ColumnType::String, ColumnMode::Nullable),
            Column::new("count", ColumnType::Float, ColumnMode::Nullable),
            Column::record(
                "meta",
                ColumnMode::Nullable,
                vec![Column::new("k", ColumnType::Float, ColumnMode::Nullable)]
            ),
            Column::new("name", ColumnType::String, ColumnMode::Nullable),
            Column::new("tags", ColumnType::String, ColumnMode::Repeated),
        ]
    );
}

#[test]
fn test_count_serializes_as_float() {
    let mut transformer = RecordTransformer::detecting(TransformerConfig::default());
    let line = transformer
        .transform_line(doc(json!({"count": 1})))
        .unwrap();
    assert_eq!(line, "{\"count\":1.0}\n");
}

#[test]
fn test_null_field_dropped() {
    let mut transformer = RecordTransformer::detecting(TransformerConfig::default());
    let record = transformer.transform(doc(json!({"a": 1, "b": null})));

    assert_eq!(record_json(record), json!({"a": 1.0}));
    let schema = transformer.finish();
    assert_eq!(schema.len(), 1);
    assert_eq!(schema[0].name, "a");
}

#[test]
fn test_empty_array_dropped() {
    let mut transformer = RecordTransformer::detecting(TransformerConfig::default());
    let record = transformer.transform(doc(json!({"tags": [], "n": 1})));

    assert!(!record.contains_key("tags"));
    assert!(transformer.finish().iter().all(|c| c.name != "tags"));
}

#[test]
fn test_array_of_empty_documents_dropped() {
    let mut transformer = RecordTransformer::detecting(TransformerConfig::default());
    let record = transformer.transform(doc(json!({
        "items": [{}, {"gone": null}],
        "n": 1
    })));

    assert_eq!(record_json(record), json!({"n": 1.0}));
    let names: Vec<_> = transformer.finish().into_iter().map(|c| c.name).collect();
    assert_eq!(names, vec!["n"]);
}

#[test]
fn test_identifier_rewritten_and_bookkeeping_dropped() {
    let mut transformer = RecordTransformer::detecting(TransformerConfig::default());
    let record = transformer.transform(doc(json!({
        "_id": {"$oid": "5f1d7a3e9c1b2a0012345678"},
        "id": "shadowed",
        "__v": 3,
        "title": "t"
    })));

    assert_eq!(
        record_json(record),
        json!({"id": "5f1d7a3e9c1b2a0012345678", "title": "t"})
    );
    let names: Vec<_> = transformer.finish().into_iter().map(|c| c.name).collect();
    assert_eq!(names, vec!["id", "title"]);
}

#[test]
fn test_custom_bookkeeping_keys() {
    let config = TransformerConfig::new().with_bookkeeping_keys(vec!["_rev".to_string()]);
    let mut transformer = RecordTransformer::detecting(config);
    let record = transformer.transform(doc(json!({"_rev": "2-abc", "__v": 1})));
    assert_eq!(record_json(record), json!({"v": 1.0}));
}

#[test]
fn test_nested_arrays_of_documents() {
    let mut transformer = RecordTransformer::detecting(TransformerConfig::default());
    let record = transformer.transform(doc(json!({
        "Lines": [
            {"SKU": "a", "qty": 1, "note": null},
            {},
            {"sku": "b", "opts": []}
        ]
    })));

    assert_eq!(
        record_json(record),
        json!({"lines": [{"sku": "a", "qty": 1.0}, {"sku": "b"}]})
    );
    assert_eq!(
        transformer.finish(),
        vec![Column::record(
            "lines",
            ColumnMode::Repeated,
            vec![
                Column::new("qty", ColumnType::Float, ColumnMode::Nullable),
                Column::new("sku", ColumnType::String, ColumnMode::Nullable),
            ]
        )]
    );
}

#[test]
fn test_schema_merges_across_documents() {
    let mut transformer = RecordTransformer::detecting(TransformerConfig::default());
    transformer.transform(doc(json!({"_id": 1, "meta": {"a": 1}})));
    transformer.transform(doc(json!({"_id": 2, "meta": {"b": true}, "extra": "x"})));
    transformer.transform(doc(json!({"_id": 3, "meta": {"a": "conflict"}})));

    assert_eq!(transformer.records(), 3);
    assert_eq!(
        transformer.finish(),
        vec![
            Column::new("id", ColumnType::Float, ColumnMode::Nullable),
            Column::new("extra", ColumnType::String, ColumnMode::Nullable),
            Column::record(
                "meta",
                ColumnMode::Nullable,
                vec![
                    Column::new("a", ColumnType::Float, ColumnMode::Nullable),
                    Column::new("b", ColumnType::Boolean, ColumnMode::Nullable),
                ]
            ),
        ]
    );
}

#[test]
fn test_fixed_schema_used_verbatim() {
    let fixed = vec![
        Column::new("zeta", ColumnType::String, ColumnMode::Nullable),
        Column::new("id", ColumnType::String, ColumnMode::Nullable),
    ];
    let mut transformer =
        RecordTransformer::with_fixed_schema(TransformerConfig::default(), fixed.clone());
    assert!(!transformer.detects_schema());

    let projected = transformer.project(doc(json!({"_id": "X", "other": 1})));
    assert!(projected.schema_delta.is_empty());

    let record = transformer.transform(doc(json!({"_id": "X", "other": 1})));
    assert_eq!(record_json(record), json!({"id": "X", "other": 1.0}));
    assert_eq!(transformer.finish(), fixed);
}

#[test]
fn test_project_does_not_touch_schema() {
    let transformer = RecordTransformer::detecting(TransformerConfig::default());
    let projected = transformer.project(doc(json!({"a": "x"})));
    assert_eq!(projected.schema_delta.len(), 1);
    assert!(transformer.finish().is_empty());
}

#[test]
fn test_identifier_wins_over_colliding_keys() {
    let mut transformer = RecordTransformer::detecting(TransformerConfig::default());
    let record = transformer.transform(doc(json!({
        "_id": {"$oid": "507f1f77bcf86cd799439011"},
        "ID": "other",
        "Id": "another",
        "__id": "yet another"
    })));

    assert_eq!(record_json(record), json!({"id": "507f1f77bcf86cd799439011"}));
    assert_eq!(
        transformer.finish(),
        vec![Column::new("id", ColumnType::String, ColumnMode::Nullable)]
    );
}

#[test]
fn test_array_type_comes_from_first_element() {
    let mut transformer = RecordTransformer::detecting(TransformerConfig::default());
    let record = transformer.transform(doc(json!({"a": [null, 1], "b": [1, "x"]})));

    assert_eq!(record_json(record), json!({"a": [1.0], "b": [1.0, "x"]}));
    assert_eq!(
        transformer.finish(),
        vec![
            Column::new("a", ColumnType::String, ColumnMode::Repeated),
            Column::new("b", ColumnType::Float, ColumnMode::Repeated),
        ]
    );
}
