//! Decoder types and traits
//!
//! Defines the decoder contract and the row view handed to the transformer.

use super::convert::{array_value_to_json, json_to_text};
use crate::error::{Error, Result};
use crate::store::ReadHandle;
use arrow::datatypes::SchemaRef;
use arrow::record_batch::RecordBatch;
use async_trait::async_trait;
use serde_json::{Map, Value};

/// Decodes a source object into rows
#[async_trait]
pub trait TableDecoder: Send + Sync {
    /// Read the object behind `handle` and decode it
    ///
    /// Every failure is reported as [`Error::Decode`] naming `object`.
    async fn decode(&self, object: &str, handle: ReadHandle) -> Result<DecodedTable>;
}

/// A fully decoded source object
#[derive(Debug, Clone)]
pub struct DecodedTable {
    object: String,
    schema: SchemaRef,
    batches: Vec<RecordBatch>,
}

impl DecodedTable {
    /// Create a table from decoded batches
    pub fn new(object: impl Into<String>, schema: SchemaRef, batches: Vec<RecordBatch>) -> Self {
        Self {
            object: object.into(),
            schema,
            batches,
        }
    }

    /// Name of the object this table was decoded from
    pub fn object(&self) -> &str {
        &self.object
    }

    /// Arrow schema of the table
    pub fn schema(&self) -> SchemaRef {
        self.schema.clone()
    }

    /// Column names, in file order
    pub fn column_names(&self) -> Vec<&str> {
        self.schema.fields().iter().map(|f| f.name().as_str()).collect()
    }

    /// Total number of rows
    pub fn num_rows(&self) -> usize {
        self.batches.iter().map(RecordBatch::num_rows).sum()
    }

    /// Whether the table has no rows
    pub fn is_empty(&self) -> bool {
        self.num_rows() == 0
    }

    /// Rows in file order
    pub fn rows(&self) -> impl Iterator<Item = SourceRecord<'_>> {
        self.batches
            .iter()
            .flat_map(|batch| (0..batch.num_rows()).map(move |row| (batch, row)))
            .enumerate()
            .map(|(index, (batch, row))| SourceRecord { batch, row, index })
    }
}

/// One decoded row
///
/// A view into a decoded batch; values are converted on access.
#[derive(Debug, Clone, Copy)]
pub struct SourceRecord<'a> {
    batch: &'a RecordBatch,
    row: usize,
    index: usize,
}

impl<'a> SourceRecord<'a> {
    /// Position of the row within its source object
    pub fn index(&self) -> usize {
        self.index
    }

    /// Whether the row has a column with this name
    pub fn has_field(&self, name: &str) -> bool {
        self.batch.schema().index_of(name).is_ok()
    }

    /// JSON value of a column, `None` when the column does not exist
    pub fn value(&self, name: &str) -> Result<Option<Value>> {
        match self.batch.schema().index_of(name) {
            Ok(idx) => array_value_to_json(self.batch.column(idx).as_ref(), self.row).map(Some),
            Err(_) => Ok(None),
        }
    }

    /// Text of a required column
    ///
    /// Fails with [`Error::MissingField`] when the column is absent or null.
    pub fn text(&self, name: &str) -> Result<String> {
        self.value(name)?
            .as_ref()
            .and_then(json_to_text)
            .ok_or_else(|| Error::missing_field(name))
    }

    /// The whole row as a JSON object keyed by column name, in column order
    pub fn to_document(&self) -> Result<Map<String, Value>> {
        let schema = self.batch.schema();
        let mut document = Map::with_capacity(schema.fields().len());
        for (idx, field) in schema.fields().iter().enumerate() {
            let value = array_value_to_json(self.batch.column(idx).as_ref(), self.row)?;
            document.insert(field.name().clone(), value);
        }
        Ok(document)
    }
}
