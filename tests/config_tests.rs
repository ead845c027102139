//! Configuration layering tests

use bucketsync::cli::Cli;
use bucketsync::config::{Config, DEFAULT_WORKERS};
use clap::Parser;
use std::fs;
use tempfile::TempDir;

/// Write a config file and return its directory guard and path string
fn write_config(contents: &str) -> (TempDir, String) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, contents).unwrap();
    let path = path.to_string_lossy().to_string();
    (dir, path)
}

#[test]
fn test_file_values_used_when_flags_absent() {
    let (_dir, path) = write_config(
        r#"
source_bucket = "file-src"
dest_bucket = "file-dst"
prefix = "backups/"
source_profile = "prod"
workers = 8
"#,
    );

    let cli = Cli::try_parse_from(["bucketsync", "--config", path.as_str()]).unwrap();
    let config = cli.to_config().unwrap();

    assert_eq!(config.source_bucket, "file-src");
    assert_eq!(config.dest_bucket, "file-dst");
    assert_eq!(config.prefix, "backups/");
    assert_eq!(config.source_profile.as_deref(), Some("prod"));
    assert_eq!(config.dest_profile, None);
    assert_eq!(config.workers, 8);
    assert!(config.validate().is_ok());
}

#[test]
fn test_flags_override_file() {
    let (_dir, path) = write_config(
        r#"
source_bucket = "file-src"
dest_bucket = "file-dst"
dry_run = false
"#,
    );

    let cli = Cli::try_parse_from([
        "bucketsync",
        "--config",
        path.as_str(),
        "--source-bucket",
        "cli-src",
        "--dest-profile",
        "archive",
        "--dryrun",
        "--workers",
        "3",
        "--no-progress",
    ])
    .unwrap();
    let config = cli.to_config().unwrap();

    assert_eq!(config.source_bucket, "cli-src");
    assert_eq!(config.dest_bucket, "file-dst");
    assert_eq!(config.dest_profile.as_deref(), Some("archive"));
    assert!(config.dry_run);
    assert_eq!(config.workers, 3);
    assert!(!config.progress);
}

#[test]
fn test_missing_explicit_config_is_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("absent.toml");

    let cli = Cli {
        config: Some(path),
        ..Default::default()
    };
    assert!(matches!(cli.to_config(), Err(bucketsync::Error::Io { .. })));
}

#[test]
fn test_invalid_toml_is_config_error() {
    let (_dir, path) = write_config("workers = \"many\"");

    let cli = Cli::try_parse_from(["bucketsync", "--config", path.as_str()]).unwrap();
    assert!(matches!(cli.to_config(), Err(bucketsync::Error::Config { .. })));
}

#[test]
fn test_zero_workers_rejected_by_parser() {
    assert!(Cli::try_parse_from(["bucketsync", "--workers", "0"]).is_err());
}

#[test]
fn test_unknown_flag_is_parse_error() {
    assert!(Cli::try_parse_from(["bucketsync", "--delete"]).is_err());
}

#[test]
fn test_defaults_without_file() {
    let (_dir, path) = write_config("");
    let cli = Cli::try_parse_from(["bucketsync", "--config", path.as_str()]).unwrap();
    let config = cli.to_config().unwrap();

    assert_eq!(config.workers, DEFAULT_WORKERS);
    assert!(config.progress);
    assert!(!config.dry_run);
    assert!(config.validate().is_err());
    assert_eq!(config, Config::default());
}
