//! Integration tests using a mock warehouse API
//!
//! Tests the full end-to-end flow: collection export → schema inference →
//! local staging → load job submission and polling

use clap::Parser;
use doc2table::cli::{Cli, Runner};
use doc2table::load::{CleanupStatus, LoadOutcome, LoadState};
use doc2table::schema::{Column, ColumnMode, ColumnType};
use doc2table::Error;
use serde_json::json;
use std::io::Write;
use std::path::Path;
use tempfile::TempDir;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const USERS: &[&str] = &[
    r#"{"_id": {"$oid": "507f1f77bcf86cd799439011"}, "Name": "Alice", "age": {"$numberInt": "31"}, "joined": {"$date": "2014-12-21T01:02:03Z"}, "tags": ["a", "b"], "address": {"city": "Oslo", "zip": null}, "__v": 0}"#,
    r#"{"_id": {"$oid": "507f1f77bcf86cd799439012"}, "Name": "Bob", "active": true, "tags": [], "address": {"city": "Rome", "geo": {"lat": 41.9}}}"#,
    r#"{"_id": {"$oid": "507f1f77bcf86cd799439013"}, "Name": "Carol", "orders": [{"sku": "x1", "qty": 2}, {"sku": "y2", "note": "gift"}]}"#,
];

struct Workspace {
    source: TempDir,
    staging: TempDir,
    config: tempfile::NamedTempFile,
}

impl Workspace {
    fn new(server: &MockServer, extra: &str) -> Self {
        let source = tempfile::tempdir().unwrap();
        write_lines(&source.path().join("users.json"), USERS);
        let staging = tempfile::tempdir().unwrap();

        let mut config = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            config,
            "project: proj\n\
             dataset: ds\n\
             bucket: staging\n\
             path: exports\n\
             collection: users\n\
             source: {}\n\
             staging_root: {}\n\
             warehouse_endpoint: {}\n\
             access_token: secret\n\
             {extra}",
            source.path().display(),
            staging.path().display(),
            server.uri(),
        )
        .unwrap();

        Self {
            source,
            staging,
            config,
        }
    }

    fn runner(&self, flags: &[&str]) -> Runner {
        let config = self.config.path().to_str().unwrap();
        let args = ["doc2table", "--config", config]
            .into_iter()
            .chain(flags.iter().copied());
        Runner::new(Cli::try_parse_from(args).unwrap())
    }

    fn staged_files(&self) -> Vec<std::path::PathBuf> {
        let dir = self.staging.path().join("staging/exports");
        match std::fs::read_dir(dir) {
            Ok(entries) => entries.map(|e| e.unwrap().path()).collect(),
            Err(_) => Vec::new(),
        }
    }
}

fn write_lines(path: &Path, lines: &[&str]) {
    let mut file = std::fs::File::create(path).unwrap();
    for line in lines {
        writeln!(file, "{line}").unwrap();
    }
}

async fn mount_submit(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/projects/proj/jobs"))
        .and(header("authorization", "Bearer secret"))
        .and(body_partial_json(json!({
            "configuration": {"load": {
                "sourceFormat": "NEWLINE_DELIMITED_JSON",
                "writeDisposition": "WRITE_TRUNCATE",
                "ignoreUnknownValues": true,
                "destinationTable": {"projectId": "proj", "datasetId": "ds", "tableId": "users"}
            }}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jobReference": {"projectId": "proj", "jobId": "job_abc", "location": "US"},
            "status": {"state": "RUNNING"}
        })))
        .mount(server)
        .await;
}

async fn mount_status(server: &MockServer, status: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/projects/proj/jobs/job_abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jobReference": {"jobId": "job_abc"},
            "status": status
        })))
        .mount(server)
        .await;
}

// ============================================================================
// End-to-end Tests
// ============================================================================

#[tokio::test]
async fn test_end_to_end_success() {
    let server = MockServer::start().await;
    mount_submit(&server).await;
    mount_status(&server, json!({"state": "DONE"})).await;

    let workspace = Workspace::new(&server, "");
    let report = workspace.runner(&[]).run().await.unwrap();

    assert_eq!(report.records, 3);
    assert_eq!(report.outcome(), Some(&LoadOutcome::Success));
    assert_eq!(report.cleanup(), &CleanupStatus::Skipped);

    let float = |name: &str| Column::new(name, ColumnType::Float, ColumnMode::Nullable);
    let string = |name: &str| Column::new(name, ColumnType::String, ColumnMode::Nullable);
    assert_eq!(
        report.schema,
        vec![
            string("id"),
            Column::new("active", ColumnType::Boolean, ColumnMode::Nullable),
            Column::record(
                "address",
                ColumnMode::Nullable,
                vec![
                    string("city"),
                    Column::record("geo", ColumnMode::Nullable, vec![float("lat")]),
                ]
            ),
            float("age"),
            Column::new("joined", ColumnType::Timestamp, ColumnMode::Nullable),
            string("name"),
            Column::record(
                "orders",
                ColumnMode::Repeated,
                vec![string("note"), float("qty"), string("sku")]
            ),
            Column::new("tags", ColumnType::String, ColumnMode::Repeated),
        ]
    );

    let staged = workspace.staged_files();
    assert_eq!(staged.len(), 1);
    let name = staged[0].file_name().unwrap().to_string_lossy().to_string();
    assert!(name.starts_with("users_") && name.ends_with(".json"));

    let lines: Vec<serde_json::Value> = std::fs::read_to_string(&staged[0])
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(
        lines[0],
        json!({
            "id": "507f1f77bcf86cd799439011",
            "name": "Alice",
            "age": 31.0,
            "joined": "2014-12-21 01:02:03",
            "tags": ["a", "b"],
            "address": {"city": "Oslo"}
        })
    );
    assert_eq!(lines[1].get("tags"), None);
    assert_eq!(lines[1]["active"], json!(true));
}

#[tokio::test]
async fn test_end_to_end_job_failure() {
    let server = MockServer::start().await;
    mount_submit(&server).await;
    mount_status(
        &server,
        json!({
            "state": "DONE",
            "errorResult": {"reason": "invalid", "location": "L", "message": "M"},
            "errors": [{"reason": "invalid", "location": "L", "message": "M"}]
        }),
    )
    .await;

    let workspace = Workspace::new(&server, "autoclean: true");
    let err = workspace.runner(&[]).run().await.unwrap_err();

    match &err {
        Error::JobFailure { job_id, errors } => {
            assert_eq!(job_id, "job_abc");
            assert_eq!(errors.len(), 1);
            assert_eq!(errors[0].location.as_deref(), Some("L"));
            assert_eq!(errors[0].message, "M");
        }
        other => panic!("expected JobFailure, got {other:?}"),
    }
    assert_ne!(err.exit_code(), 0);
    // Failed loads keep the staged file
    assert_eq!(workspace.staged_files().len(), 1);
}

#[tokio::test]
async fn test_end_to_end_autoclean_and_gzip() {
    let server = MockServer::start().await;
    mount_submit(&server).await;
    mount_status(&server, json!({"state": "DONE"})).await;

    let workspace = Workspace::new(&server, "");
    let report = workspace
        .runner(&["--compress", "--autoclean"])
        .run()
        .await
        .unwrap();

    assert!(report.staged.path.ends_with(".json.gz"));
    assert_eq!(report.cleanup(), &CleanupStatus::Deleted);
    assert!(workspace.staged_files().is_empty());
}

#[tokio::test]
async fn test_end_to_end_async_mode() {
    let server = MockServer::start().await;
    mount_submit(&server).await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let workspace = Workspace::new(&server, "");
    let report = workspace.runner(&["--async"]).run().await.unwrap();

    match &report.load.state {
        LoadState::Submitted(job) => assert_eq!(job.id, "job_abc"),
        other => panic!("expected Submitted, got {other:?}"),
    }
}

#[tokio::test]
async fn test_end_to_end_dry_run() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let workspace = Workspace::new(&server, "");
    let report = workspace.runner(&["--dryrun"]).run().await.unwrap();

    assert_eq!(report.records, 3);
    assert_eq!(report.load.state, LoadState::DryRun);
    assert_eq!(report.schema[0].name, "id");
    assert!(!workspace.staging.path().join("staging").exists());
}

#[tokio::test]
async fn test_end_to_end_query_and_projection() {
    let server = MockServer::start().await;
    mount_submit(&server).await;
    mount_status(&server, json!({"state": "DONE"})).await;

    let workspace = Workspace::new(&server, "");
    let report = workspace
        .runner(&["--query", r#"{"Name": {"$in": ["Alice", "Carol"]}}"#, "--fields", "Name"])
        .run()
        .await
        .unwrap();

    assert_eq!(report.records, 2);
    let names: Vec<_> = report.schema.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["id", "name"]);
}

#[tokio::test]
async fn test_end_to_end_empty_collection() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let workspace = Workspace::new(&server, "");
    write_lines(&workspace.source.path().join("users.json"), &[]);

    let err = workspace.runner(&[]).run().await.unwrap_err();
    assert!(matches!(err, Error::EmptyCollection { .. }));
    assert!(workspace.staged_files().is_empty());
}

#[tokio::test]
async fn test_end_to_end_submission_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/projects/proj/jobs"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {"code": 400, "message": "Invalid schema"}
        })))
        .mount(&server)
        .await;

    let workspace = Workspace::new(&server, "");
    let err = workspace.runner(&[]).run().await.unwrap_err();
    assert!(matches!(err, Error::JobSubmission { .. }));
}
