//! bucketsync - one-way object storage bucket synchronization

use bucketsync::cli::Cli;
use bucketsync::sync::{create_backends, SyncEngine};
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // usage errors print help and exit like a normal run
            let _ = e.print();
            return Ok(());
        }
    };

    init_tracing(cli.verbose, cli.json);
    setup_shutdown_handler();

    let config = cli.to_config()?;
    config.validate()?;

    println!("Copy from {} to {}", config.source_uri(), config.dest_uri());
    tracing::info!(
        source = %config.source_uri(),
        destination = %config.dest_uri(),
        dry_run = config.dry_run,
        workers = config.workers,
        "Starting sync"
    );

    let (source, dest) = create_backends(&config).await.inspect_err(|e| {
        tracing::error!(error = %e, "Couldn't create storage clients");
    })?;

    let engine = SyncEngine::new(config, source, dest);
    if let Err(e) = engine.sync().await {
        tracing::error!(error = %e, "Sync failed");
        return Err(e.into());
    }

    Ok(())
}

fn init_tracing(verbose: u8, json: bool) {
    let filter = match verbose {
        0 => EnvFilter::new("bucketsync=info"),
        1 => EnvFilter::new("bucketsync=debug"),
        2 => EnvFilter::new("bucketsync=trace"),
        _ => EnvFilter::new("trace"),
    };

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().pretty())
            .init();
    }
}

fn setup_shutdown_handler() {
    tokio::spawn(async {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Received Ctrl+C, shutting down...");
            std::process::exit(130);
        }
    });
}
