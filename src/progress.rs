//! Progress tracking and display for bucketsync

use crate::error::{Error, Result};
use crate::types::{RunSummary, SyncStats};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Receives byte counts as objects finish transferring
pub trait ProgressSink: Send + Sync {
    /// Begin tracking a run of `total_bytes`
    fn start(&self, total_bytes: u64);

    /// Record `bytes` more as transferred
    fn advance(&self, bytes: u64) -> Result<()>;

    /// Stop tracking
    fn finish(&self);
}

/// Byte progress bar for sync runs.
///
/// Nothing is drawn until `start`, so runs that never transfer leave the
/// terminal untouched.
pub struct ProgressTracker {
    bar: ProgressBar,
    enabled: bool,
}

impl ProgressTracker {
    /// Create a new progress tracker
    pub fn new(enabled: bool) -> Self {
        Self {
            bar: ProgressBar::hidden(),
            enabled,
        }
    }

    /// Bytes recorded so far
    pub fn position(&self) -> u64 {
        self.bar.position()
    }

    /// Whether the bar is currently hidden
    pub fn is_hidden(&self) -> bool {
        self.bar.is_hidden()
    }
}

impl ProgressSink for ProgressTracker {
    fn start(&self, total_bytes: u64) {
        self.bar.set_length(total_bytes);
        self.bar.set_position(0);
        if self.enabled {
            self.bar.set_style(
                ProgressStyle::default_bar()
                    .template("{msg} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec}, {eta})")
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("=>-"),
            );
            self.bar.set_message("uploading");
            self.bar.set_draw_target(ProgressDrawTarget::stderr());
            self.bar.enable_steady_tick(Duration::from_millis(100));
        }
    }

    fn advance(&self, bytes: u64) -> Result<()> {
        let next = self.bar.position() + bytes;
        if let Some(total) = self.bar.length() {
            if next > total {
                return Err(Error::Progress {
                    message: format!("position {} exceeds total {}", next, total),
                });
            }
        }
        self.bar.inc(bytes);
        Ok(())
    }

    fn finish(&self) {
        self.bar.finish();
    }
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new(true)
    }
}

/// Headless sink that keeps every update in memory
#[derive(Default)]
pub struct RecordingSink {
    total: AtomicU64,
    updates: Mutex<Vec<u64>>,
}

impl RecordingSink {
    /// Create an empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// Total passed to `start`
    pub fn total(&self) -> u64 {
        self.total.load(Ordering::SeqCst)
    }

    /// Every `advance` call, in arrival order
    pub fn updates(&self) -> Vec<u64> {
        self.updates.lock().map(|u| u.clone()).unwrap_or_default()
    }

    /// Sum of all updates
    pub fn transferred(&self) -> u64 {
        self.updates().iter().sum()
    }
}

impl ProgressSink for RecordingSink {
    fn start(&self, total_bytes: u64) {
        self.total.store(total_bytes, Ordering::SeqCst);
    }

    fn advance(&self, bytes: u64) -> Result<()> {
        self.updates
            .lock()
            .map_err(|e| Error::Progress {
                message: e.to_string(),
            })?
            .push(bytes);
        Ok(())
    }

    fn finish(&self) {}
}

/// Format a size for display
pub fn format_size(bytes: u64) -> String {
    human_bytes::human_bytes(bytes as f64)
}

/// Format a duration for display
pub fn format_duration(secs: f64) -> String {
    if secs < 60.0 {
        format!("{:.1}s", secs)
    } else if secs < 3600.0 {
        format!("{:.1}m", secs / 60.0)
    } else {
        format!("{:.1}h", secs / 3600.0)
    }
}

/// Format transfer rate for display
pub fn format_rate(bytes_per_sec: f64) -> String {
    format!("{}/s", human_bytes::human_bytes(bytes_per_sec))
}

/// Print the work found by the diff
pub fn print_plan(summary: &RunSummary) {
    println!("{} objects to copy", summary.object_count);
    println!("{} KiB ({})", summary.total_bytes / 1024, format_size(summary.total_bytes));
}

/// Print a dry-run summary
pub fn print_dry_run_summary(stats: &SyncStats) {
    println!("\n=== Dry Run Summary ===");
    println!("Objects to copy:    {}", stats.object_count);
    println!("Estimated transfer: {}", format_size(stats.total_bytes));
}

/// Print a final summary after sync
pub fn print_summary(stats: &SyncStats) {
    println!("\n=== Sync Complete ===");
    println!("Duration:          {}", format_duration(stats.duration_secs));
    println!("Objects copied:    {}", stats.objects_copied);
    println!("Bytes transferred: {}", format_size(stats.bytes_transferred));
    println!("Transfer rate:     {}", format_rate(stats.transfer_rate()));
}
