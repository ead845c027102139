//! Diff computation between source and destination listings
//!
//! A source object needs copying when the destination has no object under the
//! same key, or has one whose checksum tag differs. Sizes are not compared and
//! no content is read. Output keeps the source listing order.

use crate::error::Result;
use crate::types::ObjectRecord;
use futures::{future, Stream, TryStreamExt};
use std::collections::HashMap;

/// Destination objects keyed by object key
#[derive(Debug, Clone, Default)]
pub struct DestinationIndex {
    objects: HashMap<String, ObjectRecord>,
}

impl DestinationIndex {
    /// Create an empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Drain a destination listing into an index.
    ///
    /// The first listing error aborts the build; a partial index would make
    /// the diff copy objects that are already in sync.
    pub async fn build<S>(listing: S) -> Result<Self>
    where
        S: Stream<Item = Result<ObjectRecord>>,
    {
        listing
            .try_fold(Self::new(), |mut index, record| {
                index.insert(record);
                future::ready(Ok(index))
            })
            .await
    }

    /// Add a record. A repeated key replaces the earlier record.
    pub fn insert(&mut self, record: ObjectRecord) {
        self.objects.insert(record.key.clone(), record);
    }

    /// Look up a destination record by key
    pub fn get(&self, key: &str) -> Option<&ObjectRecord> {
        self.objects.get(key)
    }

    /// Number of indexed objects
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Whether the index is empty
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

impl FromIterator<ObjectRecord> for DestinationIndex {
    fn from_iter<I: IntoIterator<Item = ObjectRecord>>(iter: I) -> Self {
        let mut index = Self::new();
        for record in iter {
            index.insert(record);
        }
        index
    }
}

/// Whether `source` is missing or changed at the destination
#[inline]
pub fn needs_copy(index: &DestinationIndex, source: &ObjectRecord) -> bool {
    match index.get(&source.key) {
        None => true,
        Some(dest) => !source.same_content(dest),
    }
}

/// Filter a source listing down to the records that need copying
pub fn diff<'a, I>(index: &'a DestinationIndex, source: I) -> impl Iterator<Item = ObjectRecord> + 'a
where
    I: IntoIterator<Item = ObjectRecord>,
    I::IntoIter: 'a,
{
    source
        .into_iter()
        .filter(move |record| needs_copy(index, record))
}

/// Streaming form of [`diff`] over a lazily listed source
pub fn diff_stream<'a, S>(
    index: &'a DestinationIndex,
    source: S,
) -> impl Stream<Item = Result<ObjectRecord>> + 'a
where
    S: Stream<Item = Result<ObjectRecord>> + 'a,
{
    source.try_filter(move |record| {
        let copy = needs_copy(index, record);
        if !copy {
            tracing::trace!(key = %record.key, "Skipping unchanged object");
        }
        future::ready(copy)
    })
}
