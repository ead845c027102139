//! Sync engine and orchestration

pub mod diff;
pub mod execute;
pub mod list;

use crate::config::Config;
use crate::error::Result;
use crate::progress::{ProgressSink, ProgressTracker};
use crate::storage::StorageBackend;
use crate::types::{ObjectRecord, RunSummary, SyncStats};
use diff::DestinationIndex;
use execute::WorkItem;
use futures::TryStreamExt;
use std::sync::Arc;

/// The main sync engine
pub struct SyncEngine {
    /// Configuration
    config: Config,
    /// Source storage backend
    source: StorageBackend,
    /// Destination storage backend
    dest: StorageBackend,
    /// Progress sink
    progress: Arc<dyn ProgressSink>,
}

impl SyncEngine {
    /// Create a new sync engine
    pub fn new(config: Config, source: StorageBackend, dest: StorageBackend) -> Self {
        let progress = Arc::new(ProgressTracker::new(config.progress));
        Self {
            config,
            source,
            dest,
            progress,
        }
    }

    /// Replace the progress sink
    pub fn with_progress(mut self, progress: Arc<dyn ProgressSink>) -> Self {
        self.progress = progress;
        self
    }

    /// Compute the objects that are missing or changed at the destination.
    ///
    /// The destination is indexed in full before the source listing is
    /// streamed through the diff.
    pub async fn plan(&self) -> Result<Vec<ObjectRecord>> {
        let prefix = self.config.prefix.as_str();

        tracing::info!(
            backend = self.dest.name(),
            bucket = %self.dest.bucket(),
            prefix = %prefix,
            "Indexing destination"
        );
        let index = DestinationIndex::build(list::list_objects(self.dest.clone(), prefix)).await?;
        tracing::info!(objects = index.len(), "Destination indexed");

        tracing::info!(
            backend = self.source.name(),
            bucket = %self.source.bucket(),
            prefix = %prefix,
            "Computing differences"
        );
        let source = list::list_objects(self.source.clone(), prefix);
        let work: Vec<ObjectRecord> = diff::diff_stream(&index, source).try_collect().await?;

        Ok(work)
    }

    /// Run the sync operation
    pub async fn sync(&self) -> Result<SyncStats> {
        let start = std::time::Instant::now();

        // Step 1: Diff
        let work = self.plan().await?;
        let summary = RunSummary::from_records(&work);

        tracing::info!(
            objects = summary.object_count,
            bytes = summary.total_bytes,
            "Diff complete"
        );
        crate::progress::print_plan(&summary);

        let mut stats = SyncStats::from_summary(summary, self.config.dry_run);

        // Step 2: Stop early on dry run or empty work
        if self.config.dry_run {
            tracing::info!("Dry run mode - no changes will be made");
            stats.duration_secs = start.elapsed().as_secs_f64();
            crate::progress::print_dry_run_summary(&stats);
            return Ok(stats);
        }
        if !summary.has_work() {
            tracing::info!("Nothing to transfer");
            stats.duration_secs = start.elapsed().as_secs_f64();
            return Ok(stats);
        }

        // Step 3: Transfer
        let items: Vec<WorkItem> = work
            .into_iter()
            .map(|record| WorkItem::new(record, self.source.clone(), self.dest.clone()))
            .collect();

        self.progress.start(summary.total_bytes);
        let outcome = execute::execute_plan(items, self.config.workers, self.progress.as_ref()).await;
        self.progress.finish();
        let outcome = outcome?;

        stats.objects_copied = outcome.objects_copied;
        stats.bytes_transferred = outcome.bytes_transferred;
        stats.duration_secs = start.elapsed().as_secs_f64();

        tracing::info!(
            copied = stats.objects_copied,
            bytes = stats.bytes_transferred,
            "Sync completed successfully"
        );
        crate::progress::print_summary(&stats);

        Ok(stats)
    }
}

/// Create the source and destination S3 backends from configuration
pub async fn create_backends(config: &Config) -> Result<(StorageBackend, StorageBackend)> {
    let source_backend = StorageBackend::s3(
        config.source_bucket.clone(),
        config.source_profile.clone(),
        config.source_endpoint.clone(),
    )
    .await?;

    let dest_backend = StorageBackend::s3(
        config.dest_bucket.clone(),
        config.dest_profile.clone(),
        config.dest_endpoint.clone(),
    )
    .await?;

    Ok((source_backend, dest_backend))
}
