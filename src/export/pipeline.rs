//! Export pipeline

use crate::document::Document;
use crate::error::{Error, Result};
use crate::schema::Column;
use crate::transform::RecordTransformer;
use crate::types::Compression;
use flate2::write::GzEncoder;
use futures::{Stream, StreamExt};
use std::io::Write;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{debug, info};

/// Records between progress log lines
const PROGRESS_EVERY: u64 = 10_000;

/// Result of a completed export
#[derive(Debug, Clone, PartialEq)]
pub struct ExportSummary {
    /// Number of records written
    pub records: u64,
    /// Bytes written to the sink (after compression)
    pub bytes_written: u64,
    /// Final schema: detected and finalized, or the fixed schema
    pub schema: Vec<Column>,
}

/// Encodes lines before they reach the sink
enum LineEncoder {
    Plain,
    Gzip(GzEncoder<Vec<u8>>),
}

impl LineEncoder {
    fn new(compression: Compression) -> Self {
        match compression {
            Compression::None => LineEncoder::Plain,
            Compression::Gzip => {
                LineEncoder::Gzip(GzEncoder::new(Vec::new(), flate2::Compression::default()))
            }
        }
    }

    /// Encode one line, returning the bytes ready for the sink
    fn encode(&mut self, line: String) -> std::io::Result<Vec<u8>> {
        match self {
            LineEncoder::Plain => Ok(line.into_bytes()),
            LineEncoder::Gzip(encoder) => {
                encoder.write_all(line.as_bytes())?;
                Ok(std::mem::take(encoder.get_mut()))
            }
        }
    }

    /// Flush the trailing bytes of the encoding
    fn finish(self) -> std::io::Result<Vec<u8>> {
        match self {
            LineEncoder::Plain => Ok(Vec::new()),
            LineEncoder::Gzip(encoder) => encoder.finish(),
        }
    }
}

/// Moves one collection from a document stream into a sink
pub struct ExportPipeline {
    transformer: RecordTransformer,
    compression: Compression,
    collection: String,
    target: String,
}

impl ExportPipeline {
    /// Create a pipeline
    pub fn new(transformer: RecordTransformer, compression: Compression) -> Self {
        Self {
            transformer,
            compression,
            collection: String::new(),
            target: "sink".to_string(),
        }
    }

    /// Name the collection being exported
    #[must_use]
    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = collection.into();
        self
    }

    /// Name the target in logs and errors (usually the staged object URI)
    #[must_use]
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = target.into();
        self
    }

    /// Drain the documents into the sink.
    ///
    /// The sink is shut down only after every record is written. A source
    /// error or a zero-record collection aborts before shutdown, so nothing
    /// is committed to a staging store.
    pub async fn run<S, W>(mut self, mut docs: S, sink: &mut W) -> Result<ExportSummary>
    where
        S: Stream<Item = Result<Document>> + Unpin,
        W: AsyncWrite + Unpin + ?Sized,
    {
        let mut encoder = LineEncoder::new(self.compression);
        let mut bytes_written = 0u64;

        while let Some(doc) = docs.next().await {
            let line = self.transformer.transform_line(doc?)?;
            let chunk = encoder
                .encode(line)
                .map_err(|e| Error::sink_write(&self.target, e.to_string()))?;
            bytes_written += self.write(sink, &chunk).await?;

            let records = self.transformer.records();
            if records % PROGRESS_EVERY == 0 {
                info!("Exported {records} records to {}", self.target);
            }
        }

        let records = self.transformer.records();
        if records == 0 {
            return Err(Error::EmptyCollection {
                collection: self.collection,
            });
        }

        let tail = encoder
            .finish()
            .map_err(|e| Error::sink_write(&self.target, e.to_string()))?;
        bytes_written += self.write(sink, &tail).await?;
        sink.shutdown()
            .await
            .map_err(|e| Error::sink_write(&self.target, e.to_string()))?;

        debug!("Closed {} after {bytes_written} bytes", self.target);
        Ok(ExportSummary {
            records,
            bytes_written,
            schema: self.transformer.finish(),
        })
    }

    async fn write<W>(&self, sink: &mut W, chunk: &[u8]) -> Result<u64>
    where
        W: AsyncWrite + Unpin + ?Sized,
    {
        if chunk.is_empty() {
            return Ok(0);
        }
        sink.write_all(chunk)
            .await
            .map_err(|e| Error::sink_write(&self.target, e.to_string()))?;
        Ok(chunk.len() as u64)
    }
}
