//! Environment variable layering tests
//!
//! Kept in their own test binary because they mutate the process environment.

use bucketsync::cli::Cli;
use clap::Parser;
use std::fs;
use tempfile::TempDir;

#[test]
fn test_env_layer_precedence() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "source_bucket = \"file-src\"\ndest_bucket = \"file-dst\"\n").unwrap();
    let path = path.to_string_lossy().to_string();

    std::env::set_var("BUCKETSYNC_SOURCE_BUCKET", "env-src");

    let cli = Cli::try_parse_from(["bucketsync", "--config", path.as_str()]).unwrap();
    let config = cli.to_config().unwrap();
    assert_eq!(config.source_bucket, "env-src");
    assert_eq!(config.dest_bucket, "file-dst");

    let cli = Cli::try_parse_from([
        "bucketsync",
        "--config",
        path.as_str(),
        "--source-bucket",
        "flag-src",
    ])
    .unwrap();
    let config = cli.to_config().unwrap();
    assert_eq!(config.source_bucket, "flag-src");

    std::env::remove_var("BUCKETSYNC_SOURCE_BUCKET");

    for (value, expected) in [("1", true), ("true", true), ("0", false), ("no", false)] {
        std::env::set_var("BUCKETSYNC_DRYRUN", value);
        let cli = Cli::try_parse_from(["bucketsync", "--config", path.as_str()]).unwrap();
        assert_eq!(cli.to_config().unwrap().dry_run, expected, "BUCKETSYNC_DRYRUN={}", value);
    }
    std::env::remove_var("BUCKETSYNC_DRYRUN");
}
