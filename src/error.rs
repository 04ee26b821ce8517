//! Error types for taxi-ingest
//!
//! This module defines the error hierarchy for the whole pipeline.
//! All public APIs return `Result<T, Error>` where Error is defined here.
//!
//! Errors fall in two classes: fatal ones (the object store is unreachable or
//! answers with a protocol error while preparing, listing, or signing) abort
//! the run; everything else is recovered by the driver and recorded in the
//! run summary.

use thiserror::Error;

/// The main error type for taxi-ingest
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Missing required config field: {field}")]
    MissingConfigField { field: String },

    #[error("Invalid config value for '{field}': {message}")]
    InvalidConfigValue { field: String, message: String },

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    // ============================================================================
    // Object Store Errors
    // ============================================================================
    #[error("Object store connection failed: {message}")]
    Connection { message: String },

    #[error("Object store error: {0}")]
    ObjectStore(#[from] object_store::Error),

    #[error("Bucket '{bucket}' not found")]
    BucketNotFound { bucket: String },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    // ============================================================================
    // Decode Errors
    // ============================================================================
    #[error("Failed to decode '{object}': {message}")]
    Decode { object: String, message: String },

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    // ============================================================================
    // Record Errors
    // ============================================================================
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Serialization error: {message}")]
    Serialization { message: String },

    #[error("Failed to write '{key}': {message}")]
    Write { key: String, message: String },

    // ============================================================================
    // I/O Errors
    // ============================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ============================================================================
    // Generic Errors
    // ============================================================================
    #[error("{0}")]
    Other(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a missing config field error
    pub fn missing_config_field(field: impl Into<String>) -> Self {
        Self::MissingConfigField {
            field: field.into(),
        }
    }

    /// Create an invalid config value error
    pub fn invalid_config(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfigValue {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a connection error
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Create an HTTP status error
    pub fn http_status(status: u16, body: impl Into<String>) -> Self {
        Self::HttpStatus {
            status,
            body: body.into(),
        }
    }

    /// Create a decode error
    pub fn decode(object: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            object: object.into(),
            message: message.into(),
        }
    }

    /// Create a missing field error
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingField {
            field: field.into(),
        }
    }

    /// Create a serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// Create a write error
    pub fn write(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Write {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Whether this error aborts the whole run
    ///
    /// Only store-level failures are fatal. Decode, record and write errors
    /// are recovered by the driver.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::Connection { .. }
                | Error::ObjectStore(_)
                | Error::BucketNotFound { .. }
                | Error::HttpStatus { .. }
                | Error::Config { .. }
                | Error::MissingConfigField { .. }
                | Error::InvalidConfigValue { .. }
        )
    }
}

/// Result type alias for taxi-ingest
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, message: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", message.into(), inner))
        })
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", f(), inner))
        })
    }
}
