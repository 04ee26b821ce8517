//! Record transformer
//!
//! Maps one decoded row to the JSON document written to the destination
//! bucket and the object key it is written under.
//!
//! Key format: `{prefix}trip_{vendor}_{pickup}.json`, where the pickup text
//! has `:` replaced by `-` and spaces by `_`. The key depends only on the two
//! structural fields, so rows sharing both overwrite each other.

use crate::config::NamingConfig;
use crate::decode::SourceRecord;
use crate::error::{Error, Result};
use bytes::Bytes;
use serde_json::Value;

/// A document ready for upload
#[derive(Debug, Clone, PartialEq)]
pub struct OutputDocument {
    /// Destination object key
    pub key: String,
    /// UTF-8 JSON object
    pub payload: Bytes,
}

/// Make a timestamp safe for use in an object key
pub fn sanitize_timestamp(timestamp: &str) -> String {
    timestamp.replace(':', "-").replace(' ', "_")
}

/// Row to document transformer
#[derive(Debug, Clone, Default)]
pub struct RecordTransformer {
    naming: NamingConfig,
}

impl RecordTransformer {
    /// Create a transformer with the given naming rule
    pub fn new(naming: NamingConfig) -> Self {
        Self { naming }
    }

    /// Naming rule in use
    pub fn naming(&self) -> &NamingConfig {
        &self.naming
    }

    /// Object key for a vendor id and pickup timestamp
    pub fn object_key(&self, vendor_id: &str, pickup: &str) -> String {
        format!(
            "{}trip_{vendor_id}_{}.json",
            self.naming.prefix,
            sanitize_timestamp(pickup)
        )
    }

    /// Object key for a row
    pub fn key_for(&self, record: &SourceRecord<'_>) -> Result<String> {
        let vendor_id = record.text(&self.naming.vendor_field)?;
        let pickup = record.text(&self.naming.pickup_field)?;
        Ok(self.object_key(&vendor_id, &pickup))
    }

    /// Build the key and JSON payload for a row
    pub fn transform(&self, record: &SourceRecord<'_>) -> Result<OutputDocument> {
        let key = self.key_for(record)?;
        let document = record.to_document()?;
        let payload = serde_json::to_vec(&Value::Object(document))
            .map_err(|e| Error::serialization(e.to_string()))?;
        Ok(OutputDocument {
            key,
            payload: Bytes::from(payload),
        })
    }
}

#[cfg(test)]
mod tests;
