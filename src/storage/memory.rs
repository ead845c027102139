//! In-memory storage backend
//!
//! Objects live in a sorted map, so listings come back in lexicographic key
//! order like S3. Request counters and failure injection make it suitable for
//! exercising the lister and the transfer pipeline without a network.

use crate::error::{CopyStep, Error, Result};
use crate::storage::{ListPage, ObjectBody};
use crate::types::ObjectRecord;
use bytes::Bytes;
use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

/// Default number of records per listing page (same as S3)
pub const DEFAULT_PAGE_SIZE: usize = 1000;

/// A stored object
#[derive(Debug, Clone)]
pub struct StoredObject {
    pub data: Bytes,
    pub content_type: Option<String>,
    pub etag: String,
}

#[derive(Default)]
struct Inner {
    objects: RwLock<BTreeMap<String, StoredObject>>,
    failures: Mutex<HashMap<String, CopyStep>>,
    list_requests: AtomicUsize,
    get_requests: AtomicUsize,
    put_requests: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

/// In-memory storage backend
#[derive(Clone)]
pub struct MemoryBackend {
    bucket: String,
    page_size: usize,
    /// Listing requests past this count fail
    list_limit: Option<usize>,
    /// Simulated latency of each get
    latency: Duration,
    inner: Arc<Inner>,
}

impl MemoryBackend {
    /// Create an empty backend
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            page_size: DEFAULT_PAGE_SIZE,
            list_limit: None,
            latency: Duration::ZERO,
            inner: Arc::new(Inner::default()),
        }
    }

    /// Set the listing page size
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Make every listing request after the first `requests` fail
    pub fn with_list_limit(mut self, requests: usize) -> Self {
        self.list_limit = Some(requests);
        self
    }

    /// Delay each get by `latency`
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Bucket name
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Store an object with a content-derived ETag
    pub fn insert(&self, key: impl Into<String>, data: impl Into<Bytes>) {
        let data = data.into();
        let etag = content_etag(&data);
        self.insert_object(key, data, None, etag);
    }

    /// Store an object with explicit metadata
    pub fn insert_object(
        &self,
        key: impl Into<String>,
        data: impl Into<Bytes>,
        content_type: Option<String>,
        etag: impl Into<String>,
    ) {
        let object = StoredObject {
            data: data.into(),
            content_type,
            etag: etag.into(),
        };
        self.write_objects().insert(key.into(), object);
    }

    /// Fail the given step whenever `key` is copied through this backend
    pub fn fail_on(&self, key: impl Into<String>, step: CopyStep) {
        if let Ok(mut failures) = self.inner.failures.lock() {
            failures.insert(key.into(), step);
        }
    }

    /// Look up a stored object
    pub fn object(&self, key: &str) -> Option<StoredObject> {
        self.read_objects().get(key).cloned()
    }

    /// All stored keys, sorted
    pub fn keys(&self) -> Vec<String> {
        self.read_objects().keys().cloned().collect()
    }

    /// Number of stored objects
    pub fn len(&self) -> usize {
        self.read_objects().len()
    }

    /// Whether the backend holds no objects
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Listing requests served so far
    pub fn list_requests(&self) -> usize {
        self.inner.list_requests.load(Ordering::SeqCst)
    }

    /// Get requests served so far
    pub fn get_requests(&self) -> usize {
        self.inner.get_requests.load(Ordering::SeqCst)
    }

    /// Put requests served so far
    pub fn put_requests(&self) -> usize {
        self.inner.put_requests.load(Ordering::SeqCst)
    }

    /// Highest number of gets observed in progress at once
    pub fn max_in_flight(&self) -> usize {
        self.inner.max_in_flight.load(Ordering::SeqCst)
    }

    /// Fetch one listing page. The token is the last key of the previous page.
    pub async fn list_page(&self, prefix: &str, token: Option<&str>) -> Result<ListPage> {
        let request = self.inner.list_requests.fetch_add(1, Ordering::SeqCst) + 1;
        if self.list_limit.is_some_and(|limit| request > limit) {
            return Err(Error::listing(
                &self.bucket,
                format!("listing request {} rejected", request),
            ));
        }

        let objects = self.read_objects();
        let start = match token {
            Some(t) => Bound::Excluded(t.to_string()),
            None => Bound::Included(prefix.to_string()),
        };

        let mut page: Vec<ObjectRecord> = objects
            .range((start, Bound::Unbounded))
            .take_while(|(key, _)| key.starts_with(prefix))
            .take(self.page_size + 1)
            .map(|(key, obj)| ObjectRecord::new(key.clone(), obj.etag.clone(), obj.data.len() as u64))
            .collect();

        let next_token = if page.len() > self.page_size {
            page.truncate(self.page_size);
            page.last().map(|r| r.key.clone())
        } else {
            None
        };

        Ok(ListPage {
            objects: page,
            next_token,
        })
    }

    /// Open an object for reading
    pub async fn get(&self, key: &str) -> Result<ObjectBody> {
        self.inner.get_requests.fetch_add(1, Ordering::SeqCst);
        let now = self.inner.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.inner.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        self.inner.in_flight.fetch_sub(1, Ordering::SeqCst);

        let failure = self.failure_for(key);
        if failure == Some(CopyStep::Get) {
            return Err(Error::storage(format!("injected get failure for {}", key)));
        }

        let object = self
            .object(key)
            .ok_or_else(|| Error::storage(format!("no such key: {}", key)))?;

        let chunks: Vec<Result<Bytes>> = if failure == Some(CopyStep::Read) {
            let half = object.data.len() / 2;
            vec![
                Ok(object.data.slice(..half)),
                Err(Error::storage(format!("injected read failure for {}", key))),
            ]
        } else {
            vec![Ok(object.data.clone())]
        };

        Ok(ObjectBody {
            content_type: object.content_type,
            body: Box::pin(futures::stream::iter(chunks)),
        })
    }

    /// Write an object's contents
    pub async fn put(&self, key: &str, data: Bytes, content_type: Option<String>) -> Result<()> {
        self.inner.put_requests.fetch_add(1, Ordering::SeqCst);
        if self.failure_for(key) == Some(CopyStep::Put) {
            return Err(Error::storage(format!("injected put failure for {}", key)));
        }

        let etag = content_etag(&data);
        self.insert_object(key, data, content_type, etag);
        Ok(())
    }

    fn failure_for(&self, key: &str) -> Option<CopyStep> {
        self.inner
            .failures
            .lock()
            .ok()
            .and_then(|f| f.get(key).copied())
    }

    fn read_objects(&self) -> std::sync::RwLockReadGuard<'_, BTreeMap<String, StoredObject>> {
        self.inner
            .objects
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write_objects(&self) -> std::sync::RwLockWriteGuard<'_, BTreeMap<String, StoredObject>> {
        self.inner
            .objects
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Content-derived ETag (hex BLAKE3, truncated to the length of an MD5 ETag)
pub fn content_etag(data: &[u8]) -> String {
    blake3::hash(data).to_hex().as_str()[..32].to_string()
}
