//! Tabular decoder module
//!
//! Turns a source object into an ordered sequence of row records.
//!
//! # Overview
//!
//! The decode module provides:
//! - `TableDecoder` - Decoder contract used by the ingestion driver
//! - `ParquetDecoder` - Fetches a read handle and decodes parquet into Arrow
//! - `DecodedTable` / `SourceRecord` - Decoded batches and per-row views
//! - Arrow to JSON value conversion

mod convert;
mod reader;
mod types;

pub use convert::{array_value_to_json, json_to_text};
pub use reader::ParquetDecoder;
pub use types::{DecodedTable, SourceRecord, TableDecoder};

#[cfg(test)]
mod tests;
