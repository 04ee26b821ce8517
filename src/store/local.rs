//! Local filesystem object store
//!
//! Buckets are directories under a root; objects are files inside them,
//! managed through `object_store::local::LocalFileSystem`.

use super::types::{ObjectInfo, ObjectStoreClient, ReadHandle};
use crate::error::{Error, Result};
use async_trait::async_trait;
use bytes::Bytes;
use object_store::local::LocalFileSystem;
use object_store::path::Path as ObjectPath;
use object_store::ObjectStore;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Directory-per-bucket store
#[derive(Debug, Clone)]
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    /// Open a store rooted at `root`, creating the directory if needed
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        std::fs::create_dir_all(&root).map_err(|e| {
            Error::connection(format!("Failed to create directory {}: {e}", root.display()))
        })?;
        Ok(Self { root })
    }

    /// Root directory holding the buckets
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn bucket_dir(&self, bucket: &str) -> PathBuf {
        self.root.join(bucket)
    }

    fn bucket(&self, bucket: &str) -> Result<LocalFileSystem> {
        let dir = self.bucket_dir(bucket);
        if !dir.is_dir() {
            return Err(Error::BucketNotFound {
                bucket: bucket.to_string(),
            });
        }
        Ok(LocalFileSystem::new_with_prefix(dir)?)
    }
}

#[async_trait]
impl ObjectStoreClient for LocalStore {
    fn backend(&self) -> &'static str {
        "file"
    }

    async fn bucket_exists(&self, bucket: &str) -> Result<bool> {
        Ok(self.bucket_dir(bucket).is_dir())
    }

    async fn make_bucket(&self, bucket: &str) -> Result<()> {
        tokio::fs::create_dir_all(self.bucket_dir(bucket)).await?;
        Ok(())
    }

    async fn list_objects(&self, bucket: &str) -> Result<Vec<ObjectInfo>> {
        let store = self.bucket(bucket)?;
        super::list_all(&store).await
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
        let store = self.bucket(bucket)?;
        super::read_all(&store, name).await
    }

    // The filesystem has nowhere to keep a content type, so it is dropped.
    async fn put_object(
        &self,
        bucket: &str,
        name: &str,
        data: Bytes,
        _content_type: &str,
    ) -> Result<()> {
        let store = self.bucket(bucket)?;
        store.put(&ObjectPath::from(name), data.into()).await?;
        Ok(())
    }

    async fn object_exists(&self, bucket: &str, name: &str) -> Result<bool> {
        let store = self.bucket(bucket)?;
        super::head_exists(&store, name).await
    }
}
