//! Core domain types for bucketsync

use serde::{Deserialize, Serialize};

/// Metadata for one remote object, as seen at listing time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectRecord {
    /// Object key (unique within a bucket)
    pub key: String,

    /// Opaque content version token (ETag without quotes)
    pub checksum_tag: String,

    /// Object size in bytes
    pub size: u64,
}

impl ObjectRecord {
    /// Create a new object record
    pub fn new(key: impl Into<String>, checksum_tag: impl Into<String>, size: u64) -> Self {
        Self {
            key: key.into(),
            checksum_tag: checksum_tag.into(),
            size,
        }
    }

    /// Check whether `other` holds the same content version.
    ///
    /// An empty tag is unknown and never matches.
    pub fn same_content(&self, other: &ObjectRecord) -> bool {
        !self.checksum_tag.is_empty() && self.checksum_tag == other.checksum_tag
    }
}

/// Work sizing computed before any transfer starts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Number of objects to copy
    pub object_count: usize,

    /// Sum of the sizes of those objects
    pub total_bytes: u64,
}

impl RunSummary {
    /// Build a summary from diffed records
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a ObjectRecord>) -> Self {
        records.into_iter().fold(Self::default(), |mut acc, r| {
            acc.object_count += 1;
            acc.total_bytes += r.size;
            acc
        })
    }

    /// Whether there is anything to transfer
    pub fn has_work(&self) -> bool {
        self.total_bytes > 0
    }
}

/// Completion report for one copy attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferResult {
    /// Key of the copied object
    pub key: String,

    /// Declared size of the object (reported even on failure)
    pub bytes: u64,

    /// Whether the copy succeeded
    pub succeeded: bool,
}

/// Statistics for a sync run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncStats {
    /// Objects that differed or were missing at the destination
    pub object_count: usize,

    /// Bytes those objects add up to
    pub total_bytes: u64,

    /// Objects copied successfully
    pub objects_copied: usize,

    /// Bytes reported by the pipeline
    pub bytes_transferred: u64,

    /// Whether this was a dry run
    pub dry_run: bool,

    /// Duration in seconds
    pub duration_secs: f64,
}

impl SyncStats {
    /// Start stats from a run summary
    pub fn from_summary(summary: RunSummary, dry_run: bool) -> Self {
        Self {
            object_count: summary.object_count,
            total_bytes: summary.total_bytes,
            dry_run,
            ..Default::default()
        }
    }

    /// Calculate transfer rate in bytes per second
    pub fn transfer_rate(&self) -> f64 {
        if self.duration_secs == 0.0 {
            0.0
        } else {
            self.bytes_transferred as f64 / self.duration_secs
        }
    }
}
