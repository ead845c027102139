//! Transfer pipeline
//!
//! A producer task feeds work items into a queue of capacity one. A fixed pool
//! of workers drains the queue, copying one object at a time, and reports each
//! attempt on a results channel. The caller drains the results into a
//! [`ProgressSink`] while watching the pool, so the first failed copy ends the
//! run: the pool and producer are aborted and the error is returned.

use crate::error::{CopyStep, Error, Result};
use crate::progress::ProgressSink;
use crate::storage::{ObjectBody, StorageBackend};
use crate::types::{ObjectRecord, TransferResult};
use bytes::BytesMut;
use futures::StreamExt;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::{JoinError, JoinSet};

/// Items that may wait in the queue ahead of the workers
const QUEUE_CAPACITY: usize = 1;

/// One object to copy between two backends
#[derive(Clone)]
pub struct WorkItem {
    pub record: ObjectRecord,
    pub source: StorageBackend,
    pub dest: StorageBackend,
}

impl WorkItem {
    /// Bind a diffed record to its endpoints
    pub fn new(record: ObjectRecord, source: StorageBackend, dest: StorageBackend) -> Self {
        Self {
            record,
            source,
            dest,
        }
    }

    /// Object key (same at source and destination)
    pub fn key(&self) -> &str {
        &self.record.key
    }

    /// Declared size from the source listing
    pub fn size(&self) -> u64 {
        self.record.size
    }
}

/// Aggregate of the results drained from the pipeline
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransferOutcome {
    /// Copy attempts reported
    pub results: usize,
    /// Attempts that succeeded
    pub objects_copied: usize,
    /// Bytes of the successful copies
    pub bytes_transferred: u64,
}

impl TransferOutcome {
    fn record(&mut self, result: &TransferResult) {
        self.results += 1;
        if result.succeeded {
            self.objects_copied += 1;
            self.bytes_transferred += result.bytes;
        }
    }
}

/// Copy every work item with at most `workers` copies in flight.
///
/// Each attempt advances `sink` by the object's declared size, whether or not
/// it succeeded. Returns the first copy error encountered.
pub async fn execute_plan(
    items: Vec<WorkItem>,
    workers: usize,
    sink: &dyn ProgressSink,
) -> Result<TransferOutcome> {
    let mut outcome = TransferOutcome::default();
    let worker_count = workers.max(1).min(items.len());
    if worker_count == 0 {
        return Ok(outcome);
    }

    tracing::debug!(items = items.len(), workers = worker_count, "Starting transfer pipeline");

    let (job_tx, job_rx) = mpsc::channel::<WorkItem>(QUEUE_CAPACITY);
    let job_rx = Arc::new(Mutex::new(job_rx));
    let (result_tx, mut result_rx) = mpsc::channel::<TransferResult>(worker_count);

    let mut pool = JoinSet::new();
    for id in 0..worker_count {
        pool.spawn(worker(id, Arc::clone(&job_rx), result_tx.clone()));
    }
    drop(result_tx);

    let producer = tokio::spawn(async move {
        for item in items {
            if job_tx.send(item).await.is_err() {
                // every worker has exited
                break;
            }
        }
    });

    let mut failure: Option<Error> = None;
    let mut pool_drained = false;

    loop {
        tokio::select! {
            result = result_rx.recv() => match result {
                Some(result) => report(&mut outcome, &result, sink),
                None => break,
            },
            joined = pool.join_next(), if !pool_drained => match joined {
                Some(joined) => {
                    if let Err(e) = flatten(joined) {
                        failure = Some(e);
                        break;
                    }
                }
                None => pool_drained = true,
            },
        }
    }

    if failure.is_none() {
        // the results channel can close before the last worker is joined
        while let Some(joined) = pool.join_next().await {
            if let Err(e) = flatten(joined) {
                failure = Some(e);
                break;
            }
        }
    }

    if let Some(err) = failure {
        pool.abort_all();
        producer.abort();
        while let Ok(result) = result_rx.try_recv() {
            report(&mut outcome, &result, sink);
        }
        tracing::error!(
            error = %err,
            reported = outcome.results,
            copied = outcome.objects_copied,
            "Transfer pipeline failed"
        );
        return Err(err);
    }

    producer.await.map_err(pipeline_error)?;

    tracing::debug!(
        copied = outcome.objects_copied,
        bytes = outcome.bytes_transferred,
        "Transfer pipeline finished"
    );
    Ok(outcome)
}

/// Pull items until the queue is closed and drained.
async fn worker(
    id: usize,
    jobs: Arc<Mutex<mpsc::Receiver<WorkItem>>>,
    results: mpsc::Sender<TransferResult>,
) -> Result<()> {
    loop {
        let next = jobs.lock().await.recv().await;
        let Some(item) = next else {
            break;
        };

        let copied = copy_object(&item).await;
        let result = TransferResult {
            key: item.record.key,
            bytes: item.record.size,
            succeeded: copied.is_ok(),
        };
        if results.send(result).await.is_err() {
            tracing::debug!(worker = id, "Result receiver closed");
        }
        copied?;
    }

    tracing::trace!(worker = id, "Worker finished");
    Ok(())
}

/// Copy one object: get, read fully into memory, put.
///
/// Returns the number of bytes written.
pub async fn copy_object(item: &WorkItem) -> Result<u64> {
    let key = item.key();

    let ObjectBody {
        content_type,
        mut body,
    } = item
        .source
        .get(key)
        .await
        .map_err(|e| Error::copy(CopyStep::Get, key, e))?;

    let mut buffer = BytesMut::with_capacity(usize::try_from(item.size()).unwrap_or(0));
    while let Some(chunk) = body.next().await {
        let chunk = chunk.map_err(|e| Error::copy(CopyStep::Read, key, e))?;
        buffer.extend_from_slice(&chunk);
    }
    // release the source read before writing
    drop(body);

    let data = buffer.freeze();
    let written = data.len() as u64;
    item.dest
        .put(key, data, content_type)
        .await
        .map_err(|e| Error::copy(CopyStep::Put, key, e))?;

    tracing::debug!(key = %key, bytes = written, "Copied object");
    Ok(written)
}

fn report(outcome: &mut TransferOutcome, result: &TransferResult, sink: &dyn ProgressSink) {
    outcome.record(result);
    if let Err(e) = sink.advance(result.bytes) {
        tracing::warn!(error = %e, key = %result.key, "Progress update failed");
    }
}

fn flatten(joined: std::result::Result<Result<()>, JoinError>) -> Result<()> {
    joined.map_err(pipeline_error)?
}

fn pipeline_error(err: JoinError) -> Error {
    Error::Pipeline {
        message: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::RecordingSink;
    use crate::storage::MemoryBackend;
    use std::time::Duration;

    struct Fixture {
        source: MemoryBackend,
        dest: MemoryBackend,
        items: Vec<WorkItem>,
    }

    fn fixture(count: usize) -> Fixture {
        let source = MemoryBackend::new("src");
        let dest = MemoryBackend::new("dst");
        let mut items = Vec::new();
        for i in 0..count {
            let key = format!("obj/{:03}", i);
            let data = vec![b'x'; i + 1];
            source.insert(key.clone(), data.clone());
            let record = ObjectRecord::new(key, "tag", data.len() as u64);
            items.push(WorkItem::new(
                record,
                StorageBackend::Memory(source.clone()),
                StorageBackend::Memory(dest.clone()),
            ));
        }
        Fixture { source, dest, items }
    }

    #[tokio::test]
    async fn test_every_item_reports_once() {
        let f = fixture(25);
        let sink = RecordingSink::new();

        let outcome = execute_plan(f.items, 4, &sink).await.unwrap();

        assert_eq!(outcome.results, 25);
        assert_eq!(outcome.objects_copied, 25);
        assert_eq!(outcome.bytes_transferred, (1..=25).sum::<u64>());
        assert_eq!(sink.updates().len(), 25);
        assert_eq!(f.dest.len(), 25);
        assert_eq!(f.dest.object("obj/007").unwrap().data.len(), 8);
    }

    #[tokio::test]
    async fn test_no_items_spawns_nothing() {
        let sink = RecordingSink::new();
        let outcome = execute_plan(Vec::new(), 50, &sink).await.unwrap();
        assert_eq!(outcome, TransferOutcome::default());
        assert!(sink.updates().is_empty());
    }

    #[tokio::test]
    async fn test_in_flight_bounded_by_workers() {
        let f = fixture(20);
        let source = f.source.clone().with_latency(Duration::from_millis(20));
        let items = f
            .items
            .into_iter()
            .map(|item| WorkItem::new(item.record, StorageBackend::Memory(source.clone()), item.dest))
            .collect();
        let sink = RecordingSink::new();

        execute_plan(items, 3, &sink).await.unwrap();

        assert_eq!(source.max_in_flight(), 3);
        assert_eq!(source.get_requests(), 20);
    }

    #[tokio::test]
    async fn test_more_workers_than_items() {
        let f = fixture(2);
        let sink = RecordingSink::new();
        let outcome = execute_plan(f.items, 50, &sink).await.unwrap();
        assert_eq!(outcome.results, 2);
    }

    #[tokio::test]
    async fn test_content_type_is_carried_over() {
        let source = MemoryBackend::new("src");
        let dest = MemoryBackend::new("dst");
        source.insert_object("page.html", "<p>hi</p>", Some("text/html".to_string()), "e1");
        let item = WorkItem::new(
            ObjectRecord::new("page.html", "e1", 9),
            StorageBackend::Memory(source),
            StorageBackend::Memory(dest.clone()),
        );

        let written = copy_object(&item).await.unwrap();

        assert_eq!(written, 9);
        let stored = dest.object("page.html").unwrap();
        assert_eq!(stored.content_type.as_deref(), Some("text/html"));
        assert_eq!(&stored.data[..], b"<p>hi</p>");
    }

    #[tokio::test]
    async fn test_copy_errors_name_step_and_key() {
        let f = fixture(3);
        f.source.fail_on("obj/000", CopyStep::Get);
        f.source.fail_on("obj/001", CopyStep::Read);
        f.dest.fail_on("obj/002", CopyStep::Put);

        for (item, step) in f.items.iter().zip([CopyStep::Get, CopyStep::Read, CopyStep::Put]) {
            let err = copy_object(item).await.unwrap_err();
            assert_eq!(err.copy_step(), Some(step));
            assert!(err.to_string().contains(item.key()));
        }
        assert!(f.dest.is_empty());
    }

    #[tokio::test]
    async fn test_failure_ends_run() {
        let f = fixture(10);
        f.dest.fail_on("obj/004", CopyStep::Put);
        let sink = RecordingSink::new();

        let err = execute_plan(f.items, 2, &sink).await.unwrap_err();

        assert_eq!(err.copy_step(), Some(CopyStep::Put));
        assert!(err.to_string().contains("obj/004"));
        assert!(f.dest.object("obj/004").is_none());
        assert!(f.dest.len() <= 9);
        // the failed attempt still advanced progress by its declared size
        assert!(sink.updates().contains(&5));
    }

    #[tokio::test]
    async fn test_single_worker_stops_at_first_failure() {
        let f = fixture(6);
        f.source.fail_on("obj/002", CopyStep::Get);
        let sink = RecordingSink::new();

        assert!(execute_plan(f.items, 1, &sink).await.is_err());

        assert_eq!(f.dest.keys(), vec!["obj/000", "obj/001"]);
        assert_eq!(f.source.get_requests(), 3);
        assert_eq!(sink.updates(), vec![1, 2, 3]);
    }
}
