// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::unused_self)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # taxi-ingest
//!
//! Fans out the rows of parquet files held in an object-store bucket into
//! one JSON object per row in a second bucket.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use taxi_ingest::{store, IngestionDriver, PipelineConfig, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = PipelineConfig::default().with_env_overrides();
//!     let store = store::connect(&config.store)?;
//!
//!     let summary = IngestionDriver::new(store, config)?.run().await?;
//!     for key in summary.uploaded_keys() {
//!         println!("{key}");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                       IngestionDriver                         │
//! │  ensure bucket → list → select → decode → transform → put     │
//! │                                              → verify         │
//! └──────────────────────────────────────────────────────────────┘
//!                                │
//! ┌───────────────┬──────────────┴─────┬────────────────────────┐
//! │     Store     │       Decode       │       Transform        │
//! ├───────────────┼────────────────────┼────────────────────────┤
//! │ S3 / MinIO    │ Presigned fetch    │ Key naming             │
//! │ Local dir     │ Parquet → Arrow    │ Arrow → JSON document  │
//! │ In-memory     │ Row views          │                        │
//! └───────────────┴────────────────────┴────────────────────────┘
//! ```

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Pipeline configuration
pub mod config;

/// Object store backends
pub mod store;

/// Parquet decoding and Arrow to JSON conversion
pub mod decode;

/// Row to document transformation
pub mod transform;

/// Ingestion driver and run summary
pub mod engine;

/// Command-line interface
pub mod cli;

#[cfg(test)]
mod test_support;

// ============================================================================
// Re-exports
// ============================================================================

pub use config::{PipelineConfig, SelectionRule, StoreConfig};
pub use engine::{IngestionDriver, RunSummary};
pub use error::{Error, Result};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
