//! Store types and traits
//!
//! Defines the object store contract used by the ingestion driver.

use crate::error::Result;
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;
use tracing::info;
use url::Url;

/// An object found while listing a bucket
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObjectInfo {
    /// Full object key within the bucket
    pub name: String,
    /// Size in bytes
    pub size: u64,
    /// Last modification time, when the store reports one
    pub last_modified: Option<DateTime<Utc>>,
}

/// How the decoder gets at an object's bytes
#[derive(Debug, Clone)]
pub enum ReadHandle {
    /// Time-limited URL that embeds its own credentials
    Presigned(Url),
    /// Bytes already read by the store
    Inline(Bytes),
}

impl ReadHandle {
    /// Short description for logs (never prints the signature)
    pub fn describe(&self) -> String {
        match self {
            Self::Presigned(url) => format!(
                "presigned {}://{}{}",
                url.scheme(),
                url.host_str().unwrap_or_default(),
                url.path()
            ),
            Self::Inline(bytes) => format!("inline ({} bytes)", bytes.len()),
        }
    }
}

/// Bucket-level object store contract
#[async_trait]
pub trait ObjectStoreClient: Send + Sync {
    /// Short backend name (s3, file, memory)
    fn backend(&self) -> &'static str;

    /// Check whether a bucket exists
    async fn bucket_exists(&self, bucket: &str) -> Result<bool>;

    /// Create a bucket
    async fn make_bucket(&self, bucket: &str) -> Result<()>;

    /// List every object in a bucket, recursively
    async fn list_objects(&self, bucket: &str) -> Result<Vec<ObjectInfo>>;

    /// Produce a handle the decoder can read the object through
    async fn read_handle(&self, bucket: &str, name: &str, expires_in: Duration)
        -> Result<ReadHandle>;

    /// Read a whole object
    async fn get_object(&self, bucket: &str, name: &str) -> Result<Bytes>;

    /// Write an object, replacing any existing one
    async fn put_object(
        &self,
        bucket: &str,
        name: &str,
        data: Bytes,
        content_type: &str,
    ) -> Result<()>;

    /// Check whether a single object exists
    async fn object_exists(&self, bucket: &str, name: &str) -> Result<bool>;

    /// Create the bucket if it is absent
    ///
    /// Returns `true` when the bucket was created.
    async fn ensure_bucket(&self, bucket: &str) -> Result<bool> {
        if self.bucket_exists(bucket).await? {
            info!(bucket, "Bucket already exists");
            Ok(false)
        } else {
            info!(bucket, "Creating bucket");
            self.make_bucket(bucket).await?;
            Ok(true)
        }
    }
}
