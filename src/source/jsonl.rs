//! Extended-JSON file source

use super::filter::QueryFilter;
use super::{DocumentSource, DocumentStream, SourceQuery};
use crate::document::{Document, Value};
use crate::error::{Error, Result};
use crate::transform::DEFAULT_ID_FIELD;
use crate::types::JsonValue;
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader, Lines};
use tracing::debug;

/// Reads a collection from a newline-delimited extended-JSON file.
///
/// When the root is a directory the collection is read from
/// `{root}/{collection}.json`; when it is a file, that file is the
/// collection.
#[derive(Debug, Clone)]
pub struct JsonLinesSource {
    root: PathBuf,
}

impl JsonLinesSource {
    /// Create a source rooted at a directory or file
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root the source reads from
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path the collection is read from
    pub async fn collection_path(&self, collection: &str) -> PathBuf {
        match tokio::fs::metadata(&self.root).await {
            Ok(meta) if meta.is_dir() => self.root.join(format!("{collection}.json")),
            _ => self.root.clone(),
        }
    }
}

#[async_trait]
impl DocumentSource for JsonLinesSource {
    fn describe(&self) -> String {
        format!("file://{}", self.root.display())
    }

    async fn open(&self, query: &SourceQuery) -> Result<DocumentStream> {
        let filter = QueryFilter::parse(&query.filter)?;
        let path = self.collection_path(&query.collection).await;
        let file = File::open(&path)
            .await
            .map_err(|e| Error::source(format!("Failed to open {}: {e}", path.display())))?;
        debug!("Reading collection '{}' from {}", query.collection, path.display());

        let cursor = Cursor {
            lines: BufReader::new(file).lines(),
            path,
            filter,
            fields: query.fields.clone(),
            batch_size: query.batch_size.max(1),
            buffer: VecDeque::new(),
            line_no: 0,
            exhausted: false,
            failed: None,
        };

        Ok(stream::try_unfold(cursor, |mut cursor| async move {
            loop {
                if let Some(doc) = cursor.buffer.pop_front() {
                    return Ok(Some((doc, cursor)));
                }
                if let Some(err) = cursor.failed.take() {
                    return Err(err);
                }
                if cursor.exhausted {
                    return Ok(None);
                }
                cursor.fill().await;
            }
        })
        .boxed())
    }
}

/// Read position in a collection file
struct Cursor {
    lines: Lines<BufReader<File>>,
    path: PathBuf,
    filter: QueryFilter,
    fields: Vec<String>,
    batch_size: usize,
    buffer: VecDeque<Document>,
    line_no: usize,
    exhausted: bool,
    /// First bad line, yielded once the documents read before it are drained
    failed: Option<Error>,
}

impl Cursor {
    /// Read up to one batch of lines into the buffer.
    ///
    /// Stops at the first unreadable or invalid line; the error is held
    /// back until the documents read before it have been yielded.
    async fn fill(&mut self) {
        let mut read = 0;
        while read < self.batch_size {
            let line = match self.lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => {
                    self.exhausted = true;
                    break;
                }
                Err(e) => {
                    let message = format!("Failed to read {}: {e}", self.path.display());
                    self.fail(Error::source(message));
                    break;
                }
            };
            self.line_no += 1;
            read += 1;

            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match self.decode(line) {
                Ok(Some(doc)) => self.buffer.push_back(doc),
                Ok(None) => {}
                Err(e) => {
                    self.fail(e);
                    break;
                }
            }
        }
    }

    fn fail(&mut self, err: Error) {
        self.failed = Some(err);
        self.exhausted = true;
    }

    fn decode(&self, line: &str) -> Result<Option<Document>> {
        let json: JsonValue = serde_json::from_str(line).map_err(|e| Error::InvalidDocument {
            line: self.line_no,
            message: e.to_string(),
        })?;
        if !json.is_object() {
            return Err(Error::InvalidDocument {
                line: self.line_no,
                message: "expected a JSON object".to_string(),
            });
        }
        if !self.filter.matches(&json) {
            return Ok(None);
        }
        Value::document_from_extended_json(project(json, &self.fields))
            .map(Some)
            .ok_or_else(|| Error::InvalidDocument {
                line: self.line_no,
                message: "document decodes to a scalar".to_string(),
            })
    }
}

/// Keep the identifier and the top-level fields named by the projection
fn project(json: JsonValue, fields: &[String]) -> JsonValue {
    if fields.is_empty() {
        return json;
    }
    match json {
        JsonValue::Object(map) => JsonValue::Object(
            map.into_iter()
                .filter(|(key, _)| {
                    key == DEFAULT_ID_FIELD
                        || fields
                            .iter()
                            .any(|f| f.split('.').next().is_some_and(|head| head == key))
                })
                .collect(),
        ),
        other => other,
    }
}
