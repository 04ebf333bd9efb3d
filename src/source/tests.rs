//! Source tests

use super::*;
use crate::document::Value;
use crate::Error;
use futures::StreamExt;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::io::Write;
use test_case::test_case;

fn filter(value: serde_json::Value) -> QueryFilter {
    QueryFilter::parse(value.as_object().unwrap()).unwrap()
}

fn write_collection(dir: &std::path::Path, name: &str, lines: &[&str]) {
    let mut file = std::fs::File::create(dir.join(format!("{name}.json"))).unwrap();
    for line in lines {
        writeln!(file, "{line}").unwrap();
    }
}

async fn collect(stream: DocumentStream) -> Vec<crate::Result<crate::document::Document>> {
    stream.collect().await
}

// ============================================================================
// Filter
// ============================================================================

#[test_case(json!({}), json!({"a": 1}), true ; "empty filter")]
#[test_case(json!({"a": 1}), json!({"a": 1.0}), true ; "numeric equality")]
#[test_case(json!({"a": 1}), json!({"a": 2}), false ; "numeric mismatch")]
#[test_case(json!({"a.b": "x"}), json!({"a": {"b": "x"}}), true ; "dotted path")]
#[test_case(json!({"a": {"$ne": 1}}), json!({"b": 1}), true ; "ne on missing field")]
#[test_case(json!({"a": {"$ne": 1}}), json!({"a": 1}), false ; "ne on equal field")]
#[test_case(json!({"a": {"$in": [1, 2]}}), json!({"a": 2}), true ; "in matches")]
#[test_case(json!({"a": {"$in": [1, 2]}}), json!({"a": 3}), false ; "in misses")]
#[test_case(json!({"a": {"$exists": false}}), json!({"b": 1}), true ; "exists false")]
#[test_case(json!({"a": {"$exists": true}}), json!({"b": 1}), false ; "exists true")]
#[test_case(json!({"_id": {"$oid": "abc"}}), json!({"_id": {"$oid": "abc"}}), true ; "extended json wrapper is a value")]
fn test_filter_matches(query: serde_json::Value, doc: serde_json::Value, expected: bool) {
    assert_eq!(filter(query).matches(&doc), expected);
}

#[test]
fn test_filter_rejects_unsupported_operators() {
    let top_level = json!({"$or": []});
    assert!(matches!(
        QueryFilter::parse(top_level.as_object().unwrap()),
        Err(Error::Config { .. })
    ));

    let bad_in = json!({"a": {"$in": 1}});
    assert!(QueryFilter::parse(bad_in.as_object().unwrap()).is_err());
}

#[test_case(json!({"n": {"$gt": 1}}) ; "comparison operator")]
#[test_case(json!({"n": {"$in": [1], "$regex": "x"}}) ; "mixed with a supported operator")]
fn test_filter_rejects_unknown_field_operators(query: serde_json::Value) {
    match QueryFilter::parse(query.as_object().unwrap()) {
        Err(Error::Config { message }) => assert!(message.contains("Unsupported query operator")),
        other => panic!("expected a config error, got {other:?}"),
    }
}

#[test]
fn test_filter_is_empty() {
    assert!(filter(json!({})).is_empty());
    assert!(!filter(json!({"a": 1})).is_empty());
}

// ============================================================================
// Query
// ============================================================================

#[test]
fn test_source_query_builders() {
    let query = SourceQuery::new("users")
        .with_fields(vec!["name".to_string()])
        .with_batch_size(0);
    assert_eq!(query.collection, "users");
    assert_eq!(query.fields, vec!["name".to_string()]);
    assert_eq!(query.batch_size, 1);
    assert!(query.filter.is_empty());
    assert_eq!(SourceQuery::new("x").batch_size, DEFAULT_BATCH_SIZE);
}

// ============================================================================
// JSON lines source
// ============================================================================

#[tokio::test]
async fn test_reads_collection_in_order_across_batches() {
    let dir = tempfile::tempdir().unwrap();
    write_collection(
        dir.path(),
        "users",
        &[
            r#"{"_id": {"$oid": "507f1f77bcf86cd799439011"}, "n": 1}"#,
            "",
            r#"{"_id": {"$oid": "507f1f77bcf86cd799439012"}, "n": 2}"#,
            r#"{"_id": {"$oid": "507f1f77bcf86cd799439013"}, "n": 3}"#,
        ],
    );

    let source = JsonLinesSource::new(dir.path());
    let stream = source
        .open(&SourceQuery::new("users").with_batch_size(2))
        .await
        .unwrap();
    let docs: Vec<_> = collect(stream)
        .await
        .into_iter()
        .map(|r| r.unwrap())
        .collect();

    assert_eq!(docs.len(), 3);
    assert_eq!(
        docs[0].get("_id"),
        Some(&Value::identifier("507f1f77bcf86cd799439011"))
    );
    let numbers: Vec<_> = docs.iter().map(|d| d.get("n").cloned()).collect();
    assert_eq!(
        numbers,
        vec![
            Some(Value::Number(1.0)),
            Some(Value::Number(2.0)),
            Some(Value::Number(3.0))
        ]
    );
}

#[tokio::test]
async fn test_applies_filter_and_projection() {
    let dir = tempfile::tempdir().unwrap();
    write_collection(
        dir.path(),
        "events",
        &[
            r#"{"_id": 1, "kind": "click", "meta": {"x": 1}, "extra": true}"#,
            r#"{"_id": 2, "kind": "view", "meta": {"x": 2}, "extra": true}"#,
        ],
    );

    let query = SourceQuery::new("events")
        .with_filter(json!({"kind": "click"}).as_object().unwrap().clone())
        .with_fields(vec!["meta.x".to_string()]);
    let stream = JsonLinesSource::new(dir.path()).open(&query).await.unwrap();
    let docs = collect(stream).await;

    assert_eq!(docs.len(), 1);
    let doc = docs[0].as_ref().unwrap();
    let keys: Vec<_> = doc.keys().cloned().collect();
    assert_eq!(keys, vec!["_id".to_string(), "meta".to_string()]);
}

#[tokio::test]
async fn test_root_may_be_a_file() {
    let dir = tempfile::tempdir().unwrap();
    write_collection(dir.path(), "dump", &[r#"{"a": "b"}"#]);

    let source = JsonLinesSource::new(dir.path().join("dump.json"));
    let docs = collect(source.open(&SourceQuery::new("anything")).await.unwrap()).await;
    assert_eq!(docs.len(), 1);
}

#[tokio::test]
async fn test_missing_collection_is_a_connection_error() {
    let dir = tempfile::tempdir().unwrap();
    let source = JsonLinesSource::new(dir.path());
    let result = source.open(&SourceQuery::new("missing")).await;
    assert!(matches!(result, Err(Error::SourceConnection { .. })));
}

#[tokio::test]
async fn test_invalid_line_reports_line_number() {
    let dir = tempfile::tempdir().unwrap();
    write_collection(dir.path(), "bad", &[r#"{"a": 1}"#, "not json", r#"{"a": 2}"#]);

    let stream = JsonLinesSource::new(dir.path())
        .open(&SourceQuery::new("bad"))
        .await
        .unwrap();
    let results = collect(stream).await;

    assert!(results[0].is_ok());
    assert!(matches!(results[1], Err(Error::InvalidDocument { line: 2, .. })));
    // try_unfold ends the stream after the first error
    assert_eq!(results.len(), 2);
}

#[tokio::test]
async fn test_documents_before_a_bad_line_come_first() {
    let dir = tempfile::tempdir().unwrap();
    write_collection(
        dir.path(),
        "mixed",
        &[r#"{"a": 1}"#, r#"{"a": 2}"#, "{broken", r#"{"a": 3}"#],
    );

    let stream = JsonLinesSource::new(dir.path())
        .open(&SourceQuery::new("mixed").with_batch_size(10))
        .await
        .unwrap();
    let results = collect(stream).await;

    assert_eq!(results.len(), 3);
    let values: Vec<_> = results[..2]
        .iter()
        .map(|r| r.as_ref().unwrap().get("a").cloned())
        .collect();
    assert_eq!(values, vec![Some(Value::Number(1.0)), Some(Value::Number(2.0))]);
    assert!(matches!(results[2], Err(Error::InvalidDocument { line: 3, .. })));
}

#[tokio::test]
async fn test_non_object_line_is_invalid() {
    let dir = tempfile::tempdir().unwrap();
    write_collection(dir.path(), "scalars", &["[1, 2]"]);

    let stream = JsonLinesSource::new(dir.path())
        .open(&SourceQuery::new("scalars"))
        .await
        .unwrap();
    let results = collect(stream).await;
    assert!(matches!(results[0], Err(Error::InvalidDocument { line: 1, .. })));
}

#[test]
fn test_describe() {
    let source = JsonLinesSource::new("/data/export");
    assert_eq!(source.describe(), "file:///data/export");
}
