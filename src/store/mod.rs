//! Object store module
//!
//! Bucket-level access to the object store the pipeline reads from and
//! writes to.
//!
//! # Overview
//!
//! The store module provides:
//! - `ObjectStoreClient` - The contract the driver talks to
//! - `S3Store` - S3 / MinIO through `object_store::aws`
//! - `LocalStore` - One directory per bucket on the local filesystem
//! - `MemoryStore` - In-memory buckets for tests and dry runs

mod local;
mod memory;
mod s3;
mod types;

pub use local::LocalStore;
pub use memory::MemoryStore;
pub use s3::S3Store;
pub use types::{ObjectInfo, ObjectStoreClient, ReadHandle};

use crate::config::{StoreBackend, StoreConfig};
use crate::error::{Error, Result};
use futures::TryStreamExt;
use object_store::path::Path as ObjectPath;
use object_store::ObjectStore;
use std::sync::Arc;

/// Build the store client selected by the configured endpoint
pub fn connect(config: &StoreConfig) -> Result<Arc<dyn ObjectStoreClient>> {
    match config.backend() {
        StoreBackend::S3 { .. } => Ok(Arc::new(S3Store::new(config)?)),
        StoreBackend::Local { root } => Ok(Arc::new(LocalStore::new(root)?)),
        StoreBackend::Memory => Ok(Arc::new(MemoryStore::new())),
    }
}

/// List every object of one bucket-scoped store
pub(crate) async fn list_all(store: &dyn ObjectStore) -> Result<Vec<ObjectInfo>> {
    let metas: Vec<_> = store.list(None).try_collect().await?;
    Ok(metas
        .into_iter()
        .map(|meta| ObjectInfo {
            name: meta.location.to_string(),
            size: meta.size as u64,
            last_modified: Some(meta.last_modified),
        })
        .collect())
}

/// Check a single key with a HEAD request
pub(crate) async fn head_exists(store: &dyn ObjectStore, name: &str) -> Result<bool> {
    match store.head(&ObjectPath::from(name)).await {
        Ok(_) => Ok(true),
        Err(object_store::Error::NotFound { .. }) => Ok(false),
        Err(e) => Err(Error::ObjectStore(e)),
    }
}

/// Read a whole object into memory
pub(crate) async fn read_all(store: &dyn ObjectStore, name: &str) -> Result<bytes::Bytes> {
    let result = store.get(&ObjectPath::from(name)).await?;
    Ok(result.bytes().await?)
}
