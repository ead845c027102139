//! Storage backends for bucketsync

pub mod memory;
pub mod s3;

use crate::error::Result;
use crate::types::ObjectRecord;
use bytes::Bytes;
use futures::Stream;
use std::pin::Pin;

pub use memory::MemoryBackend;
pub use s3::S3Backend;

/// A stream of body chunks read from an object
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes>> + Send>>;

/// One page of a cursor-based listing
#[derive(Debug, Clone, Default)]
pub struct ListPage {
    /// Records in this page, in listing order
    pub objects: Vec<ObjectRecord>,
    /// Cursor for the next page, `None` on the last page
    pub next_token: Option<String>,
}

/// An open object read
pub struct ObjectBody {
    /// Declared content type of the object
    pub content_type: Option<String>,
    /// Body chunks
    pub body: ByteStream,
}

/// Storage backend enum for unified access to different storage systems
#[derive(Clone)]
pub enum StorageBackend {
    S3(S3Backend),
    Memory(MemoryBackend),
}

impl StorageBackend {
    /// Create an S3 backend for a bucket using a named profile
    pub async fn s3(
        bucket: String,
        profile: Option<String>,
        endpoint: Option<String>,
    ) -> Result<Self> {
        Ok(StorageBackend::S3(S3Backend::new(bucket, profile, endpoint).await?))
    }

    /// Get the name of this backend (for logging)
    pub fn name(&self) -> &'static str {
        match self {
            StorageBackend::S3(_) => "s3",
            StorageBackend::Memory(_) => "memory",
        }
    }

    /// Bucket this backend is bound to
    pub fn bucket(&self) -> &str {
        match self {
            StorageBackend::S3(b) => b.bucket(),
            StorageBackend::Memory(b) => b.bucket(),
        }
    }

    /// Fetch one listing page under `prefix`, continuing from `token`
    pub async fn list_page(&self, prefix: &str, token: Option<&str>) -> Result<ListPage> {
        match self {
            StorageBackend::S3(b) => b.list_page(prefix, token).await,
            StorageBackend::Memory(b) => b.list_page(prefix, token).await,
        }
    }

    /// Open an object for reading
    pub async fn get(&self, key: &str) -> Result<ObjectBody> {
        match self {
            StorageBackend::S3(b) => b.get(key).await,
            StorageBackend::Memory(b) => b.get(key).await,
        }
    }

    /// Write an object's contents
    pub async fn put(&self, key: &str, data: Bytes, content_type: Option<String>) -> Result<()> {
        match self {
            StorageBackend::S3(b) => b.put(key, data, content_type).await,
            StorageBackend::Memory(b) => b.put(key, data, content_type).await,
        }
    }
}
