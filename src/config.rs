//! Pipeline configuration
//!
//! Everything the driver needs is carried in an explicit [`PipelineConfig`]
//! passed in at construction. Configuration is layered: built-in defaults,
//! then a JSON document (file or inline), then `MINIO_*` environment
//! overrides for the store connection.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

// ============================================================================
// Defaults
// ============================================================================

/// Default source bucket
pub const DEFAULT_SOURCE_BUCKET: &str = "bronze";

/// Default destination bucket
pub const DEFAULT_DESTINATION_BUCKET: &str = "nyc-taxi-records";

/// Default marker that selects dataset files in the source bucket
pub const DEFAULT_MARKER: &str = "nyc_taxi_files";

/// Default key prefix for emitted documents
pub const DEFAULT_KEY_PREFIX: &str = "nyc_taxi_record/";

/// Content type of every emitted document
pub const JSON_CONTENT_TYPE: &str = "application/json";

// ============================================================================
// Top-Level Pipeline Config
// ============================================================================

/// Complete pipeline configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Object store connection
    pub store: StoreConfig,

    /// Bucket holding the parquet files
    pub source_bucket: String,

    /// Bucket receiving one JSON object per row
    pub destination_bucket: String,

    /// Which source objects are processed
    pub selection: SelectionRule,

    /// Object key naming
    pub naming: NamingConfig,

    /// Lifetime of the presigned read URL, in seconds
    pub presign_expiry_secs: u64,

    /// Timeout for fetching a presigned URL, in seconds
    pub http_timeout_secs: u64,

    /// How uploads are verified
    pub verify: VerifyMode,

    /// What happens when a single row cannot be transformed
    pub row_errors: RowErrorPolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            store: StoreConfig::default(),
            source_bucket: DEFAULT_SOURCE_BUCKET.to_string(),
            destination_bucket: DEFAULT_DESTINATION_BUCKET.to_string(),
            selection: SelectionRule::default(),
            naming: NamingConfig::default(),
            presign_expiry_secs: 3600,
            http_timeout_secs: 300,
            verify: VerifyMode::default(),
            row_errors: RowErrorPolicy::default(),
        }
    }
}

impl PipelineConfig {
    /// Create a config with default settings
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a config from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("Failed to read config file {}: {e}", path.display()))
        })?;
        Self::from_json_str(&content)
    }

    /// Parse a config from a JSON string
    ///
    /// Missing fields take their default values.
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::config(format!("Invalid config JSON: {e}")))
    }

    /// Apply `MINIO_*` overrides from the process environment
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply `MINIO_*` overrides from an arbitrary lookup
    #[must_use]
    pub fn with_overrides_from<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(endpoint) = lookup("MINIO_ENDPOINT") {
            self.store.endpoint = endpoint;
        }
        if let Some(access_key) = lookup("MINIO_ACCESS_KEY") {
            self.store.access_key = Some(access_key);
        }
        if let Some(secret_key) = lookup("MINIO_SECRET_KEY") {
            self.store.secret_key = Some(secret_key);
        }
        if let Some(region) = lookup("MINIO_REGION") {
            self.store.region = region;
        }
        if let Some(secure) = lookup("MINIO_SECURE") {
            self.store.secure = matches!(secure.to_lowercase().as_str(), "1" | "true" | "yes");
        }
        self
    }

    /// Set the store connection
    #[must_use]
    pub fn with_store(mut self, store: StoreConfig) -> Self {
        self.store = store;
        self
    }

    /// Set the source bucket
    #[must_use]
    pub fn with_source_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.source_bucket = bucket.into();
        self
    }

    /// Set the destination bucket
    #[must_use]
    pub fn with_destination_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.destination_bucket = bucket.into();
        self
    }

    /// Set the selection rule
    #[must_use]
    pub fn with_selection(mut self, selection: SelectionRule) -> Self {
        self.selection = selection;
        self
    }

    /// Set the verification mode
    #[must_use]
    pub fn with_verify(mut self, verify: VerifyMode) -> Self {
        self.verify = verify;
        self
    }

    /// Set the row error policy
    #[must_use]
    pub fn with_row_errors(mut self, policy: RowErrorPolicy) -> Self {
        self.row_errors = policy;
        self
    }

    /// Presigned URL lifetime
    pub fn presign_expiry(&self) -> Duration {
        Duration::from_secs(self.presign_expiry_secs)
    }

    /// HTTP fetch timeout
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    /// Check that required values are present
    pub fn validate(&self) -> Result<()> {
        if self.source_bucket.trim().is_empty() {
            return Err(Error::missing_config_field("source_bucket"));
        }
        if self.destination_bucket.trim().is_empty() {
            return Err(Error::missing_config_field("destination_bucket"));
        }
        if self.naming.vendor_field.is_empty() {
            return Err(Error::missing_config_field("naming.vendor_field"));
        }
        if self.naming.pickup_field.is_empty() {
            return Err(Error::missing_config_field("naming.pickup_field"));
        }
        if self.presign_expiry_secs == 0 || self.presign_expiry_secs > 7 * 24 * 3600 {
            return Err(Error::invalid_config(
                "presign_expiry_secs",
                "must be between 1 second and 7 days",
            ));
        }
        self.store.validate()
    }
}

// ============================================================================
// Store Connection
// ============================================================================

/// Object store connection settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// `host:port`, a full `http(s)://` URL, `file:///dir` or `memory://`
    pub endpoint: String,

    /// Access key
    pub access_key: Option<String>,

    /// Secret key
    pub secret_key: Option<String>,

    /// Use TLS for a bare `host:port` endpoint
    pub secure: bool,

    /// Signing region
    pub region: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            endpoint: "localhost:9000".to_string(),
            access_key: None,
            secret_key: None,
            secure: false,
            region: "us-east-1".to_string(),
        }
    }
}

/// Which store implementation an endpoint selects
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    /// S3-compatible service at the given base URL
    S3 { url: String },
    /// One directory per bucket under the given root
    Local { root: PathBuf },
    /// Process-local in-memory buckets
    Memory,
}

impl StoreConfig {
    /// S3-compatible connection with credentials
    pub fn s3(
        endpoint: impl Into<String>,
        access_key: impl Into<String>,
        secret_key: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            access_key: Some(access_key.into()),
            secret_key: Some(secret_key.into()),
            ..Self::default()
        }
    }

    /// Local directory store
    pub fn local(root: impl AsRef<Path>) -> Self {
        Self {
            endpoint: format!("file://{}", root.as_ref().display()),
            ..Self::default()
        }
    }

    /// In-memory store
    pub fn memory() -> Self {
        Self {
            endpoint: "memory://".to_string(),
            ..Self::default()
        }
    }

    /// Resolve the endpoint to a backend
    pub fn backend(&self) -> StoreBackend {
        let endpoint = self.endpoint.trim();
        if endpoint.starts_with("memory://") {
            StoreBackend::Memory
        } else if let Some(root) = endpoint.strip_prefix("file://") {
            StoreBackend::Local {
                root: PathBuf::from(root),
            }
        } else if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
            StoreBackend::S3 {
                url: endpoint.trim_end_matches('/').to_string(),
            }
        } else {
            let scheme = if self.secure { "https" } else { "http" };
            StoreBackend::S3 {
                url: format!("{scheme}://{}", endpoint.trim_end_matches('/')),
            }
        }
    }

    /// Credentials are only required for S3 endpoints
    pub fn validate(&self) -> Result<()> {
        if self.endpoint.trim().is_empty() {
            return Err(Error::missing_config_field("store.endpoint"));
        }
        if let StoreBackend::S3 { .. } = self.backend() {
            if self.access_key.as_deref().unwrap_or_default().is_empty() {
                return Err(Error::missing_config_field("store.access_key"));
            }
            if self.secret_key.as_deref().unwrap_or_default().is_empty() {
                return Err(Error::missing_config_field("store.secret_key"));
            }
        }
        Ok(())
    }
}

// ============================================================================
// Selection
// ============================================================================

/// Predicate deciding which source objects are dataset files
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum SelectionRule {
    /// Object name contains the marker
    Contains(String),
    /// Object name starts with the prefix
    Prefix(String),
    /// Object name ends with the suffix
    Suffix(String),
    /// Object name is one of the listed names
    Manifest(Vec<String>),
    /// Every object
    All,
}

impl Default for SelectionRule {
    fn default() -> Self {
        Self::Contains(DEFAULT_MARKER.to_string())
    }
}

impl SelectionRule {
    /// Check whether an object name is selected
    pub fn matches(&self, name: &str) -> bool {
        match self {
            Self::Contains(marker) => name.contains(marker.as_str()),
            Self::Prefix(prefix) => name.starts_with(prefix.as_str()),
            Self::Suffix(suffix) => name.ends_with(suffix.as_str()),
            Self::Manifest(names) => names.iter().any(|n| n == name),
            Self::All => true,
        }
    }
}

impl std::fmt::Display for SelectionRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Contains(marker) => write!(f, "contains '{marker}'"),
            Self::Prefix(prefix) => write!(f, "prefix '{prefix}'"),
            Self::Suffix(suffix) => write!(f, "suffix '{suffix}'"),
            Self::Manifest(names) => write!(f, "manifest of {} names", names.len()),
            Self::All => write!(f, "all objects"),
        }
    }
}

// ============================================================================
// Naming
// ============================================================================

/// Object key naming rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NamingConfig {
    /// Key prefix (including trailing slash)
    pub prefix: String,

    /// Column holding the vendor identifier
    pub vendor_field: String,

    /// Column holding the pickup timestamp
    pub pickup_field: String,
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_KEY_PREFIX.to_string(),
            vendor_field: "VendorID".to_string(),
            pickup_field: "tpep_pickup_datetime".to_string(),
        }
    }
}

// ============================================================================
// Policies
// ============================================================================

/// How an upload is confirmed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerifyMode {
    /// Re-list the destination bucket and look for the key
    List,
    /// Query the key directly
    #[default]
    Head,
    /// No verification
    Off,
}

/// What happens when a row cannot be transformed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowErrorPolicy {
    /// Record the row as skipped and continue
    #[default]
    Skip,
    /// Abort the run with the row's error
    Abort,
}
