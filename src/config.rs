//! Configuration management for bucketsync

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default number of concurrent copy workers
pub const DEFAULT_WORKERS: usize = 50;

/// Main configuration struct
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    // ==================== Buckets ====================

    /// Bucket to copy from
    pub source_bucket: String,

    /// Bucket to copy into
    pub dest_bucket: String,

    /// Key prefix limiting the sync on both sides
    pub prefix: String,

    // ==================== Credentials ====================

    /// Named AWS profile for the source bucket
    pub source_profile: Option<String>,

    /// Named AWS profile for the destination bucket
    pub dest_profile: Option<String>,

    /// Custom S3-compatible endpoint for the source
    pub source_endpoint: Option<String>,

    /// Custom S3-compatible endpoint for the destination
    pub dest_endpoint: Option<String>,

    // ==================== Transfer ====================

    /// Report the diff without copying anything
    pub dry_run: bool,

    /// Number of concurrent copy workers
    pub workers: usize,

    /// Show progress bar
    pub progress: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source_bucket: String::new(),
            dest_bucket: String::new(),
            prefix: String::new(),
            source_profile: None,
            dest_profile: None,
            source_endpoint: None,
            dest_endpoint: None,
            dry_run: false,
            workers: DEFAULT_WORKERS,
            progress: true,
        }
    }
}

impl Config {
    /// Load configuration from the default config file, if present
    pub fn load() -> Result<Self> {
        match Self::default_config_path() {
            Ok(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Load configuration from a specific file
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::io(format!("reading config {}", path.display()), e))?;
        let config: Self = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Get the default configuration file path
    pub fn default_config_path() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|p| p.join("bucketsync").join("config.toml"))
            .ok_or_else(|| Error::config("could not determine config directory"))
    }

    /// Check that the configuration describes a runnable sync
    pub fn validate(&self) -> Result<()> {
        if self.source_bucket.trim().is_empty() {
            return Err(Error::config("source bucket is required (--source-bucket)"));
        }
        if self.dest_bucket.trim().is_empty() {
            return Err(Error::config("destination bucket is required (--dest-bucket)"));
        }
        if self.workers == 0 {
            return Err(Error::config("workers must be at least 1"));
        }
        Ok(())
    }

    /// Display URI of the source scope
    pub fn source_uri(&self) -> String {
        format!("s3://{}/{}", self.source_bucket, self.prefix)
    }

    /// Display URI of the destination scope
    pub fn dest_uri(&self) -> String {
        format!("s3://{}/{}", self.dest_bucket, self.prefix)
    }
}
