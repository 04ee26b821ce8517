//! Parquet decoder
//!
//! Resolves a read handle to bytes (fetching presigned URLs over HTTP) and
//! decodes them with the parquet crate's Arrow reader.

use super::types::{DecodedTable, TableDecoder};
use crate::error::{Error, Result};
use crate::store::ReadHandle;
use async_trait::async_trait;
use bytes::Bytes;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use std::time::Duration;
use tracing::debug;

/// Default rows per decoded batch
const DEFAULT_BATCH_SIZE: usize = 8192;

/// Parquet decoder over presigned URLs or inline bytes
#[derive(Debug, Clone)]
pub struct ParquetDecoder {
    http: reqwest::Client,
    batch_size: usize,
}

impl ParquetDecoder {
    /// Create a decoder whose URL fetches time out after `timeout`
    pub fn new(timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(format!("taxi-ingest/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            http,
            batch_size: DEFAULT_BATCH_SIZE,
        })
    }

    /// Set rows per decoded batch
    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Resolve a read handle to the object's bytes
    pub async fn fetch(&self, object: &str, handle: ReadHandle) -> Result<Bytes> {
        match handle {
            ReadHandle::Inline(bytes) => Ok(bytes),
            ReadHandle::Presigned(url) => {
                let response = self
                    .http
                    .get(url)
                    .send()
                    .await
                    .map_err(|e| Error::decode(object, format!("Failed to fetch: {e}")))?;

                let status = response.status();
                if !status.is_success() {
                    return Err(Error::decode(object, format!("Fetch returned HTTP {status}")));
                }

                response
                    .bytes()
                    .await
                    .map_err(|e| Error::decode(object, format!("Failed to read body: {e}")))
            }
        }
    }

    /// Decode parquet bytes into a table
    pub fn decode_bytes(&self, object: &str, data: Bytes) -> Result<DecodedTable> {
        let builder = ParquetRecordBatchReaderBuilder::try_new(data)
            .map_err(|e| Error::decode(object, e.to_string()))?;
        let schema = builder.schema().clone();
        let reader = builder
            .with_batch_size(self.batch_size)
            .build()
            .map_err(|e| Error::decode(object, e.to_string()))?;

        let batches = reader
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| Error::decode(object, e.to_string()))?;

        Ok(DecodedTable::new(object, schema, batches))
    }
}

#[async_trait]
impl TableDecoder for ParquetDecoder {
    async fn decode(&self, object: &str, handle: ReadHandle) -> Result<DecodedTable> {
        debug!(object, handle = %handle.describe(), "Reading parquet");
        let data = self.fetch(object, handle).await?;
        self.decode_bytes(object, data)
    }
}
