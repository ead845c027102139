//! AWS S3 Integration Tests
//!
//! These tests are marked with #[ignore] and require real AWS credentials and
//! two scratch buckets. They will NOT run with normal `cargo test`.
//!
//! To run these tests manually:
//!   export BUCKETSYNC_TEST_SOURCE_BUCKET="source-scratch"
//!   export BUCKETSYNC_TEST_DEST_BUCKET="dest-scratch"
//!   export AWS_REGION="eu-central-1"
//!   cargo test --test integration_s3 -- --ignored --nocapture

use bucketsync::config::Config;
use bucketsync::storage::StorageBackend;
use bucketsync::sync::{create_backends, SyncEngine};
use bytes::Bytes;

fn test_buckets() -> (String, String) {
    let source = std::env::var("BUCKETSYNC_TEST_SOURCE_BUCKET")
        .expect("BUCKETSYNC_TEST_SOURCE_BUCKET must be set");
    let dest = std::env::var("BUCKETSYNC_TEST_DEST_BUCKET")
        .expect("BUCKETSYNC_TEST_DEST_BUCKET must be set");
    (source, dest)
}

/// Unique prefix so concurrent runs don't collide
fn test_prefix() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};

    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    format!("bucketsync-test-{}-{}/", timestamp, std::process::id())
}

fn test_config(prefix: &str) -> Config {
    let (source_bucket, dest_bucket) = test_buckets();
    Config {
        source_bucket,
        dest_bucket,
        prefix: prefix.to_string(),
        progress: false,
        ..Default::default()
    }
}

#[tokio::test]
#[ignore]
async fn test_s3_sync_then_resync() {
    let prefix = test_prefix();
    let config = test_config(&prefix);
    let (source, dest) = create_backends(&config).await.expect("Failed to create S3 backends");

    for i in 0..5 {
        source
            .put(
                &format!("{}file-{}.txt", prefix, i),
                Bytes::from(format!("contents {}", i)),
                Some("text/plain".to_string()),
            )
            .await
            .expect("Failed to seed source object");
    }

    let engine = SyncEngine::new(config.clone(), source.clone(), dest.clone());
    let stats = engine.sync().await.expect("First sync failed");
    assert_eq!(stats.objects_copied, 5);

    let engine = SyncEngine::new(config, source, dest);
    let pending = engine.plan().await.expect("Second diff failed");
    assert!(pending.is_empty(), "Re-sync should find nothing to copy");
}

#[tokio::test]
#[ignore]
async fn test_s3_dry_run_copies_nothing() {
    let prefix = test_prefix();
    let mut config = test_config(&prefix);
    config.dry_run = true;
    let (source, dest) = create_backends(&config).await.expect("Failed to create S3 backends");

    source
        .put(&format!("{}only.txt", prefix), Bytes::from_static(b"x"), None)
        .await
        .expect("Failed to seed source object");

    let stats = SyncEngine::new(config, source, dest.clone())
        .sync()
        .await
        .expect("Dry run failed");
    assert_eq!(stats.object_count, 1);
    assert_eq!(stats.objects_copied, 0);

    let page = dest.list_page(&prefix, None).await.expect("Failed to list destination");
    assert!(page.objects.is_empty());
}

#[tokio::test]
#[ignore]
async fn test_s3_unknown_profile_fails_with_hint() {
    let (bucket, _) = test_buckets();
    let result = StorageBackend::s3(bucket, Some("bucketsync-no-such-profile".to_string()), None).await;
    let err = result.err().expect("Unknown profile should fail");
    assert!(err.to_string().contains("Have you set up your AWS account"));
}
