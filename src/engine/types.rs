//! Engine types
//!
//! Per-item outcomes and run statistics produced by the ingestion driver.

use crate::error::Error;
use serde::Serialize;
use std::fmt;

/// Driver stage, attached to log events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Ensuring the destination bucket exists
    Preparing,
    /// Listing the source bucket
    Listing,
    /// Applying the selection rule
    Filtering,
    /// Reading and decoding a source object
    Decoding,
    /// Transforming and writing rows
    PerRowUpload,
    /// Confirming a write
    Verifying,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Preparing => "preparing",
            Self::Listing => "listing",
            Self::Filtering => "filtering",
            Self::Decoding => "decoding",
            Self::PerRowUpload => "per_row_upload",
            Self::Verifying => "verifying",
        };
        f.write_str(name)
    }
}

/// Why an object or row was skipped
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", content = "message", rename_all = "snake_case")]
pub enum SkipReason {
    /// The source object could not be read or decoded
    Decode(String),
    /// A structural field was absent or null
    MissingField(String),
    /// A value could not be represented as JSON
    Serialization(String),
    /// The destination write failed
    Write(String),
    /// Anything else
    Other(String),
}

impl From<&Error> for SkipReason {
    fn from(err: &Error) -> Self {
        match err {
            Error::Decode { .. } | Error::Arrow(_) | Error::Parquet(_) => {
                Self::Decode(err.to_string())
            }
            Error::MissingField { field } => Self::MissingField(field.clone()),
            Error::Serialization { .. } | Error::JsonParse(_) => {
                Self::Serialization(err.to_string())
            }
            Error::Write { .. } => Self::Write(err.to_string()),
            other => Self::Other(other.to_string()),
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Decode(message) => write!(f, "decode failed: {message}"),
            Self::MissingField(field) => write!(f, "missing field {field}"),
            Self::Serialization(message) => write!(f, "serialization failed: {message}"),
            Self::Write(message) => write!(f, "write failed: {message}"),
            Self::Other(message) => f.write_str(message),
        }
    }
}

/// What happened to one source object
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ObjectStatus {
    /// Not selected by the selection rule
    Ignored,
    /// Decoded; its rows were processed
    Decoded {
        /// Rows in the object
        rows: usize,
    },
    /// Abandoned before any row was processed
    Skipped(SkipReason),
}

/// Outcome for one source object
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObjectOutcome {
    /// Object name in the source bucket
    pub name: String,
    /// Object status
    #[serde(flatten)]
    pub status: ObjectStatus,
    /// Row outcomes, in row order
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub rows: Vec<RowOutcome>,
}

impl ObjectOutcome {
    /// Outcome for an object the selection rule did not match
    pub fn ignored(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: ObjectStatus::Ignored,
            rows: Vec::new(),
        }
    }

    /// Outcome for an object that could not be decoded
    pub fn skipped(name: impl Into<String>, reason: SkipReason) -> Self {
        Self {
            name: name.into(),
            status: ObjectStatus::Skipped(reason),
            rows: Vec::new(),
        }
    }

    /// Whether the object passed the selection rule
    pub fn is_selected(&self) -> bool {
        !matches!(self.status, ObjectStatus::Ignored)
    }
}

/// What happened to one row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RowStatus {
    /// Written and confirmed present
    Verified,
    /// Written, but the verification check did not find it (or failed)
    Unverified {
        /// What the check reported
        detail: String,
    },
    /// Written, verification disabled
    Uploaded,
    /// Not written
    Skipped(SkipReason),
}

impl RowStatus {
    /// Whether the write itself succeeded
    pub fn is_written(&self) -> bool {
        !matches!(self, Self::Skipped(_))
    }
}

/// Outcome for one row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowOutcome {
    /// Row position within its source object
    pub index: usize,
    /// Destination key, when one could be derived
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    /// Row status
    #[serde(flatten)]
    pub status: RowStatus,
}

/// Counters for a run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    /// Objects found in the source bucket
    pub objects_listed: usize,
    /// Objects matching the selection rule
    pub objects_selected: usize,
    /// Selected objects that decoded
    pub objects_decoded: usize,
    /// Selected objects abandoned on decode failure
    pub objects_skipped: usize,
    /// Rows seen in decoded objects
    pub rows_seen: usize,
    /// Rows written
    pub rows_uploaded: usize,
    /// Written rows confirmed present
    pub rows_verified: usize,
    /// Written rows not confirmed
    pub rows_unverified: usize,
    /// Rows not written
    pub rows_skipped: usize,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl RunStats {
    /// Create new stats
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an object outcome and its rows
    pub fn record_object(&mut self, outcome: &ObjectOutcome) {
        self.objects_listed += 1;
        match &outcome.status {
            ObjectStatus::Ignored => return,
            ObjectStatus::Decoded { .. } => self.objects_decoded += 1,
            ObjectStatus::Skipped(_) => self.objects_skipped += 1,
        }
        self.objects_selected += 1;

        for row in &outcome.rows {
            self.record_row(&row.status);
        }
    }

    /// Record a row outcome
    pub fn record_row(&mut self, status: &RowStatus) {
        self.rows_seen += 1;
        match status {
            RowStatus::Verified => {
                self.rows_uploaded += 1;
                self.rows_verified += 1;
            }
            RowStatus::Unverified { .. } => {
                self.rows_uploaded += 1;
                self.rows_unverified += 1;
            }
            RowStatus::Uploaded => self.rows_uploaded += 1,
            RowStatus::Skipped(_) => self.rows_skipped += 1,
        }
    }

    /// Set duration
    pub fn set_duration(&mut self, ms: u64) {
        self.duration_ms = ms;
    }
}

/// Result of a full run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Bucket the parquet files were read from
    pub source_bucket: String,
    /// Bucket the documents were written to
    pub destination_bucket: String,
    /// Whether the destination bucket was created by this run
    pub destination_created: bool,
    /// The source bucket was empty
    pub no_objects_found: bool,
    /// Per-object outcomes, in listing order
    pub objects: Vec<ObjectOutcome>,
    /// Counters
    pub stats: RunStats,
}

impl RunSummary {
    /// Start an empty summary
    pub fn new(source_bucket: impl Into<String>, destination_bucket: impl Into<String>) -> Self {
        Self {
            source_bucket: source_bucket.into(),
            destination_bucket: destination_bucket.into(),
            destination_created: false,
            no_objects_found: false,
            objects: Vec::new(),
            stats: RunStats::new(),
        }
    }

    /// Add an object outcome
    pub fn push(&mut self, outcome: ObjectOutcome) {
        self.stats.record_object(&outcome);
        self.objects.push(outcome);
    }

    /// Keys written by this run, in write order
    pub fn uploaded_keys(&self) -> Vec<&str> {
        self.objects
            .iter()
            .flat_map(|o| &o.rows)
            .filter(|r| r.status.is_written())
            .filter_map(|r| r.key.as_deref())
            .collect()
    }

    /// Every object or row that was skipped, with its reason
    pub fn skipped(&self) -> Vec<(&str, Option<usize>, &SkipReason)> {
        let mut skipped = Vec::new();
        for object in &self.objects {
            if let ObjectStatus::Skipped(reason) = &object.status {
                skipped.push((object.name.as_str(), None, reason));
            }
            for row in &object.rows {
                if let RowStatus::Skipped(reason) = &row.status {
                    skipped.push((object.name.as_str(), Some(row.index), reason));
                }
            }
        }
        skipped
    }
}
