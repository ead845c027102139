//! CLI argument parsing for bucketsync
//!
//! Every option can also come from a `BUCKETSYNC_*` environment variable or
//! the TOML config file. Command line wins over environment, environment over
//! the file, and the file over built-in defaults.

use crate::config::Config;
use crate::error::Result;
use clap::Parser;
use std::path::PathBuf;

/// bucketsync - one-way object storage bucket synchronization
#[derive(Parser, Debug, Default)]
#[command(name = "bucketsync")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Source bucket
    #[arg(long, env = "BUCKETSYNC_SOURCE_BUCKET")]
    pub source_bucket: Option<String>,

    /// Destination bucket
    #[arg(long, env = "BUCKETSYNC_DEST_BUCKET")]
    pub dest_bucket: Option<String>,

    /// AWS profile for the source bucket
    #[arg(long, env = "BUCKETSYNC_SOURCE_PROFILE")]
    pub source_profile: Option<String>,

    /// AWS profile for the destination bucket
    #[arg(long, env = "BUCKETSYNC_DEST_PROFILE")]
    pub dest_profile: Option<String>,

    /// Key prefix to sync
    #[arg(long, env = "BUCKETSYNC_PREFIX")]
    pub prefix: Option<String>,

    /// Report what would be copied without copying
    #[arg(
        long = "dryrun",
        env = "BUCKETSYNC_DRYRUN",
        value_parser = clap::builder::BoolishValueParser::new()
    )]
    pub dry_run: bool,

    /// Configuration file path
    #[arg(long, env = "BUCKETSYNC_CONFIG")]
    pub config: Option<PathBuf>,

    /// Number of concurrent copy workers [default: 50]
    #[arg(long, env = "BUCKETSYNC_WORKERS", value_parser = clap::value_parser!(u64).range(1..))]
    pub workers: Option<u64>,

    /// Custom S3-compatible endpoint for the source
    #[arg(long, env = "BUCKETSYNC_SOURCE_ENDPOINT")]
    pub source_endpoint: Option<String>,

    /// Custom S3-compatible endpoint for the destination
    #[arg(long, env = "BUCKETSYNC_DEST_ENDPOINT")]
    pub dest_endpoint: Option<String>,

    /// Hide the progress bar
    #[arg(long)]
    pub no_progress: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Output logs as JSON
    #[arg(long)]
    pub json: bool,
}

impl Cli {
    /// Merge arguments over the config file.
    ///
    /// An explicit `--config` path must exist and parse; the default path is
    /// only read when present.
    pub fn to_config(&self) -> Result<Config> {
        let mut config = match self.config {
            Some(ref path) => Config::load_from(path)?,
            None => Config::load()?,
        };

        if let Some(ref bucket) = self.source_bucket {
            config.source_bucket = bucket.clone();
        }
        if let Some(ref bucket) = self.dest_bucket {
            config.dest_bucket = bucket.clone();
        }
        if let Some(ref profile) = self.source_profile {
            config.source_profile = Some(profile.clone());
        }
        if let Some(ref profile) = self.dest_profile {
            config.dest_profile = Some(profile.clone());
        }
        if let Some(ref prefix) = self.prefix {
            config.prefix = prefix.clone();
        }
        if let Some(ref endpoint) = self.source_endpoint {
            config.source_endpoint = Some(endpoint.clone());
        }
        if let Some(ref endpoint) = self.dest_endpoint {
            config.dest_endpoint = Some(endpoint.clone());
        }
        if let Some(workers) = self.workers {
            config.workers = workers as usize;
        }
        if self.dry_run {
            config.dry_run = true;
        }
        if self.no_progress {
            config.progress = false;
        }

        Ok(config)
    }
}
