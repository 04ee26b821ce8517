//! Execution engine module
//!
//! The ingestion driver: the only place with control flow.
//!
//! # Overview
//!
//! The engine module provides:
//! - `IngestionDriver` - Prepare, list, filter, decode, upload, verify
//! - `RunSummary` - Per-object and per-row outcomes plus counters
//!
//! Store failures while preparing the destination bucket, listing the source
//! bucket, or producing a read handle abort the run. Decode, transform,
//! write, and verification failures are recorded and the run moves on.

mod types;

pub use types::{
    ObjectOutcome, ObjectStatus, RowOutcome, RowStatus, RunStats, RunSummary, SkipReason, Stage,
};

use crate::config::{PipelineConfig, RowErrorPolicy, VerifyMode, JSON_CONTENT_TYPE};
use crate::decode::{ParquetDecoder, SourceRecord, TableDecoder};
use crate::error::{Error, Result};
use crate::store::{ObjectInfo, ObjectStoreClient};
use crate::transform::RecordTransformer;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Ingestion driver
pub struct IngestionDriver {
    /// Object store holding both buckets
    store: Arc<dyn ObjectStoreClient>,
    /// Source object decoder
    decoder: Box<dyn TableDecoder>,
    /// Row transformer
    transformer: RecordTransformer,
    /// Pipeline configuration
    config: PipelineConfig,
}

impl IngestionDriver {
    /// Create a driver with the default parquet decoder
    pub fn new(store: Arc<dyn ObjectStoreClient>, config: PipelineConfig) -> Result<Self> {
        let decoder = ParquetDecoder::new(config.http_timeout())?;
        Ok(Self {
            store,
            decoder: Box::new(decoder),
            transformer: RecordTransformer::new(config.naming.clone()),
            config,
        })
    }

    /// Replace the decoder
    #[must_use]
    pub fn with_decoder(mut self, decoder: Box<dyn TableDecoder>) -> Self {
        self.decoder = decoder;
        self
    }

    /// Get the configuration
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run the pipeline once over the whole source bucket
    pub async fn run(&self) -> Result<RunSummary> {
        let start = Instant::now();
        let source = self.config.source_bucket.as_str();
        let destination = self.config.destination_bucket.as_str();
        let mut summary = RunSummary::new(source, destination);

        info!(stage = %Stage::Preparing, bucket = destination, "Checking destination bucket");
        summary.destination_created = self.store.ensure_bucket(destination).await?;

        info!(stage = %Stage::Listing, bucket = source, "Listing objects");
        let objects = self.store.list_objects(source).await?;

        if objects.is_empty() {
            info!(bucket = source, "No objects found in the bucket");
            summary.no_objects_found = true;
        }

        for object in &objects {
            info!(object = %object.name, size = object.size, "Found object");
            let outcome = self.process_object(object).await?;
            summary.push(outcome);
        }

        summary
            .stats
            .set_duration(start.elapsed().as_millis() as u64);

        info!(
            objects = summary.stats.objects_listed,
            selected = summary.stats.objects_selected,
            uploaded = summary.stats.rows_uploaded,
            verified = summary.stats.rows_verified,
            skipped = summary.stats.rows_skipped,
            duration_ms = summary.stats.duration_ms,
            "Run complete"
        );

        Ok(summary)
    }

    /// Filter, decode and upload one source object
    async fn process_object(&self, object: &ObjectInfo) -> Result<ObjectOutcome> {
        if !self.config.selection.matches(&object.name) {
            debug!(
                stage = %Stage::Filtering,
                object = %object.name,
                rule = %self.config.selection,
                "Object not selected"
            );
            return Ok(ObjectOutcome::ignored(&object.name));
        }

        info!(stage = %Stage::Decoding, object = %object.name, "Processing object");

        let handle = self
            .store
            .read_handle(
                &self.config.source_bucket,
                &object.name,
                self.config.presign_expiry(),
            )
            .await?;
        debug!(object = %object.name, handle = %handle.describe(), "Generated read handle");

        let table = match self.decoder.decode(&object.name, handle).await {
            Ok(table) => table,
            Err(e) => {
                warn!(object = %object.name, error = %e, "Failed to read parquet file");
                return Ok(ObjectOutcome::skipped(&object.name, SkipReason::from(&e)));
            }
        };

        info!(
            object = %object.name,
            rows = table.num_rows(),
            columns = ?table.column_names(),
            "Read parquet file"
        );

        let mut rows = Vec::with_capacity(table.num_rows());
        for record in table.rows() {
            rows.push(self.process_row(&record).await?);
        }

        Ok(ObjectOutcome {
            name: object.name.clone(),
            status: ObjectStatus::Decoded {
                rows: table.num_rows(),
            },
            rows,
        })
    }

    /// Transform, upload and verify one row
    ///
    /// Only returns `Err` when the row error policy is `abort`.
    async fn process_row(&self, record: &SourceRecord<'_>) -> Result<RowOutcome> {
        let index = record.index();

        let document = match self.transformer.transform(record) {
            Ok(document) => document,
            Err(e) => {
                if self.config.row_errors == RowErrorPolicy::Abort {
                    return Err(e);
                }
                warn!(stage = %Stage::PerRowUpload, row = index, error = %e, "Skipping row");
                return Ok(RowOutcome {
                    index,
                    key: self.transformer.key_for(record).ok(),
                    status: RowStatus::Skipped(SkipReason::from(&e)),
                });
            }
        };

        debug!(key = %document.key, bytes = document.payload.len(), "Generated JSON");

        let key = document.key;
        let written = self
            .store
            .put_object(
                &self.config.destination_bucket,
                &key,
                document.payload,
                JSON_CONTENT_TYPE,
            )
            .await;

        if let Err(e) = written {
            let e = Error::write(&key, e.to_string());
            warn!(stage = %Stage::PerRowUpload, key = %key, error = %e, "Failed to upload");
            return Ok(RowOutcome {
                index,
                key: Some(key),
                status: RowStatus::Skipped(SkipReason::from(&e)),
            });
        }

        info!(stage = %Stage::PerRowUpload, key = %key, "Uploaded");

        let status = self.verify(&key).await;
        Ok(RowOutcome {
            index,
            key: Some(key),
            status,
        })
    }

    /// Confirm a written key is present
    async fn verify(&self, key: &str) -> RowStatus {
        let bucket = &self.config.destination_bucket;
        let found = match self.config.verify {
            VerifyMode::Off => return RowStatus::Uploaded,
            VerifyMode::Head => self.store.object_exists(bucket, key).await,
            VerifyMode::List => self
                .store
                .list_objects(bucket)
                .await
                .map(|objects| objects.iter().any(|o| o.name == key)),
        };

        match found {
            Ok(true) => {
                info!(stage = %Stage::Verifying, key, "Successfully verified");
                RowStatus::Verified
            }
            Ok(false) => {
                warn!(stage = %Stage::Verifying, key, "Failed to verify");
                RowStatus::Unverified {
                    detail: "object not found after write".to_string(),
                }
            }
            Err(e) => {
                warn!(stage = %Stage::Verifying, key, error = %e, "Verification check failed");
                RowStatus::Unverified {
                    detail: e.to_string(),
                }
            }
        }
    }
}
