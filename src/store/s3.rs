//! S3 / MinIO object store
//!
//! Object operations go through `object_store::aws::AmazonS3`, one client per
//! bucket. Bucket-level operations (HEAD / PUT on the bucket itself) are not
//! part of the `ObjectStore` API, so they are sent over `reqwest` as
//! presigned requests on the bucket root.

use super::types::{ObjectInfo, ObjectStoreClient, ReadHandle};
use crate::config::{StoreBackend, StoreConfig};
use crate::error::{Error, Result};
use async_trait::async_trait;
use bytes::Bytes;
use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::path::Path as ObjectPath;
use object_store::signer::Signer;
use object_store::{Attribute, Attributes, ObjectStore, PutOptions};
use reqwest::{Method, StatusCode};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::debug;

/// Lifetime of the presigned bucket-level requests
const BUCKET_REQUEST_EXPIRY: Duration = Duration::from_secs(60);

/// S3-compatible store
pub struct S3Store {
    /// Base endpoint URL (scheme + host + port)
    endpoint: String,
    region: String,
    access_key: String,
    secret_key: String,
    /// Client for bucket-level requests
    http: reqwest::Client,
    /// Bucket-scoped clients, built on first use
    buckets: Mutex<HashMap<String, Arc<AmazonS3>>>,
}

impl std::fmt::Debug for S3Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3Store")
            .field("endpoint", &self.endpoint)
            .field("region", &self.region)
            .finish_non_exhaustive()
    }
}

impl S3Store {
    /// Create a store from connection settings
    pub fn new(config: &StoreConfig) -> Result<Self> {
        let StoreBackend::S3 { url } = config.backend() else {
            return Err(Error::invalid_config(
                "store.endpoint",
                format!("'{}' is not an S3 endpoint", config.endpoint),
            ));
        };
        let access_key = config
            .access_key
            .clone()
            .ok_or_else(|| Error::missing_config_field("store.access_key"))?;
        let secret_key = config
            .secret_key
            .clone()
            .ok_or_else(|| Error::missing_config_field("store.secret_key"))?;

        let http = reqwest::Client::builder()
            .user_agent(format!("taxi-ingest/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::connection(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            endpoint: url,
            region: config.region.clone(),
            access_key,
            secret_key,
            http,
            buckets: Mutex::new(HashMap::new()),
        })
    }

    /// Base endpoint URL
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn bucket(&self, bucket: &str) -> Result<Arc<AmazonS3>> {
        let mut buckets = self
            .buckets
            .lock()
            .map_err(|_| Error::Other("S3 client cache poisoned".to_string()))?;

        if let Some(store) = buckets.get(bucket) {
            return Ok(Arc::clone(store));
        }

        let store = AmazonS3Builder::new()
            .with_endpoint(&self.endpoint)
            .with_region(&self.region)
            .with_bucket_name(bucket)
            .with_access_key_id(&self.access_key)
            .with_secret_access_key(&self.secret_key)
            .with_virtual_hosted_style_request(false)
            .with_allow_http(true)
            .build()
            .map_err(|e| Error::connection(format!("Failed to create S3 client: {e}")))?;

        let store = Arc::new(store);
        buckets.insert(bucket.to_string(), Arc::clone(&store));
        Ok(store)
    }

    /// Send a presigned request against the bucket root
    async fn bucket_request(&self, bucket: &str, method: Method) -> Result<reqwest::Response> {
        let store = self.bucket(bucket)?;
        let url = store
            .signed_url(method.clone(), &ObjectPath::from(""), BUCKET_REQUEST_EXPIRY)
            .await?;

        debug!(bucket, %method, "Sending bucket request");

        self.http
            .request(method, url)
            .send()
            .await
            .map_err(|e| Error::connection(format!("{}: {e}", self.endpoint)))
    }
}

#[async_trait]
impl ObjectStoreClient for S3Store {
    fn backend(&self) -> &'static str {
        "s3"
    }

    async fn bucket_exists(&self, bucket: &str) -> Result<bool> {
        let response = self.bucket_request(bucket, Method::HEAD).await?;
        match response.status() {
            status if status.is_success() => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            status => Err(Error::http_status(status.as_u16(), format!("HEAD bucket {bucket}"))),
        }
    }

    async fn make_bucket(&self, bucket: &str) -> Result<()> {
        let response = self.bucket_request(bucket, Method::PUT).await?;
        let status = response.status();
        // 409 BucketAlreadyOwnedByYou: someone created it between check and create
        if status.is_success() || status == StatusCode::CONFLICT {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(Error::http_status(status.as_u16(), body))
    }

    async fn list_objects(&self, bucket: &str) -> Result<Vec<ObjectInfo>> {
        let store = self.bucket(bucket)?;
        super::list_all(store.as_ref()).await
    }

    async fn read_handle(
        &self,
        bucket: &str,
        name: &str,
        expires_in: Duration,
    ) -> Result<ReadHandle> {
        let store = self.bucket(bucket)?;
        let url = store
            .signed_url(Method::GET, &ObjectPath::from(name), expires_in)
            .await?;
        Ok(ReadHandle::Presigned(url))
    }

    async fn get_object(&self, bucket: &str, name: &str) -> Result<Bytes> {
        let store = self.bucket(bucket)?;
        super::read_all(store.as_ref(), name).await
    }

    async fn put_object(
        &self,
        bucket: &str,
        name: &str,
        data: Bytes,
        content_type: &str,
    ) -> Result<()> {
        let store = self.bucket(bucket)?;
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
        let store = self.bucket(bucket)?;
        super::head_exists(store.as_ref(), name).await
    }
}
