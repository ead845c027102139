//! Lazy, paginated object listing

use crate::error::{Error, Result};
use crate::storage::StorageBackend;
use crate::types::ObjectRecord;
use futures::{stream, Stream, TryStreamExt};

/// Where the next listing request resumes
enum Cursor {
    Start,
    Token(String),
    Exhausted,
}

/// List every object under `prefix` as a lazy stream.
///
/// Pages are requested on demand: page N+1 is only fetched once the consumer
/// has drained page N and polls again, so dropping the stream early stops
/// further requests. The first failed request is yielded as an error and ends
/// the stream. Each call starts a fresh traversal.
pub fn list_objects(
    backend: StorageBackend,
    prefix: impl Into<String>,
) -> impl Stream<Item = Result<ObjectRecord>> + Send + 'static {
    let prefix = prefix.into();

    let pages = stream::try_unfold((Cursor::Start, 0usize), move |(cursor, fetched)| {
        let backend = backend.clone();
        let prefix = prefix.clone();
        async move {
            let token = match cursor {
                Cursor::Start => None,
                Cursor::Token(token) => Some(token),
                Cursor::Exhausted => return Ok::<_, Error>(None),
            };

            let page = backend.list_page(&prefix, token.as_deref()).await?;
            tracing::debug!(
                bucket = %backend.bucket(),
                prefix = %prefix,
                page = fetched + 1,
                objects = page.objects.len(),
                "Fetched listing page"
            );

            let next = match page.next_token {
                Some(token) => Cursor::Token(token),
                None => Cursor::Exhausted,
            };
            Ok(Some((page.objects, (next, fetched + 1))))
        }
    });

    pages
        .map_ok(|objects| stream::iter(objects.into_iter().map(Ok::<_, Error>)))
        .try_flatten()
}
