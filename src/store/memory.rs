//! In-memory object store
//!
//! Each bucket is an `object_store::memory::InMemory` instance. Used by tests
//! and by `memory://` dry runs.

use super::types::{ObjectInfo, ObjectStoreClient, ReadHandle};
use crate::error::{Error, Result};
use async_trait::async_trait;
use bytes::Bytes;
use object_store::memory::InMemory;
use object_store::path::Path as ObjectPath;
use object_store::{Attribute, Attributes, GetOptions, ObjectStore, PutOptions};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// In-memory buckets
#[derive(Debug, Default)]
pub struct MemoryStore {
    buckets: RwLock<HashMap<String, Arc<InMemory>>>,
}

impl MemoryStore {
    /// Create an empty store with no buckets
    pub fn new() -> Self {
        Self::default()
    }

    async fn bucket(&self, bucket: &str) -> Result<Arc<InMemory>> {
        self.buckets
            .read()
            .await
            .get(bucket)
            .cloned()
            .ok_or_else(|| Error::BucketNotFound {
                bucket: bucket.to_string(),
            })
    }

    /// Names of all buckets, sorted
    pub async fn bucket_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.buckets.read().await.keys().cloned().collect();
        names.sort();
        names
    }

    /// Content type an object was written with
    pub async fn content_type(&self, bucket: &str, name: &str) -> Result<Option<String>> {
        let store = self.bucket(bucket).await?;
        let result = store
            .get_opts(&ObjectPath::from(name), GetOptions::default())
            .await?;
        Ok(result
            .attributes
            .get(&Attribute::ContentType)
            .map(|value| value.to_string()))
    }
}

#[async_trait]
impl ObjectStoreClient for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn bucket_exists(&self, bucket: &str) -> Result<bool> {
        Ok(self.buckets.read().await.contains_key(bucket))
    }

    async fn make_bucket(&self, bucket: &str) -> Result<()> {
        self.buckets
            .write()
            .await
            .entry(bucket.to_string())
            .or_insert_with(|| Arc::new(InMemory::new()));
        Ok(())
    }

    async fn list_objects(&self, bucket: &str) -> Result<Vec<ObjectInfo>> {
        let store = self.bucket(bucket).await?;
        super::list_all(store.as_ref()).await
    }

    async fn read_handle(
        &self,
        bucket: &str,
        name: &str,
        _expires_in: Duration,
    ) -> Result<ReadHandle> {
        Ok(ReadHandle::Inline(self.get_object(bucket, name).await?))
    }

    async fn get_object(&self, bucket: &str, name: &str) -> Result<Bytes> {
        let store = self.bucket(bucket).await?;
        super::read_all(store.as_ref(), name).await
    }

    async fn put_object(
        &self,
        bucket: &str,
        name: &str,
        data: Bytes,
        content_type: &str,
    ) -> Result<()> {
        let store = self.bucket(bucket).await?;
        let mut attributes = Attributes::new();
        attributes.insert(Attribute::ContentType, content_type.to_string().into());
        store
            .put_opts(
                &ObjectPath::from(name),
                data.into(),
                PutOptions::from(attributes),
            )
            .await?;
        Ok(())
    }

    async fn object_exists(&self, bucket: &str, name: &str) -> Result<bool> {
        let store = self.bucket(bucket).await?;
        super::head_exists(store.as_ref(), name).await
    }
}
