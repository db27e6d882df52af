//! media-sync CLI - Bulk media upload and reconciliation.
//!
//! # Usage
//!
//! ```bash
//! # Upload every media file in a directory, matching by custom ID then SKU
//! media-sync sync ./photos
//!
//! # Match by SKU only, 8 parallel uploads
//! media-sync sync ./photos --mode sku --concurrency 8
//!
//! # Resolve and report matches without mutating anything
//! media-sync sync ./photos --dry-run
//! ```
//!
//! # Commands
//!
//! - `sync` - Reconcile a directory of media files against the catalog
//!
//! Credentials come from the environment (`SHOPIFY_STORE`,
//! `SHOPIFY_ACCESS_TOKEN`), loaded via `.env` when present.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use media_sync::config::SyncConfig;
use media_sync::files;
use media_sync::pipeline::{BatchRunner, RunOptions};
use media_sync::shopify::ShopifyClient;
use media_sync_core::ResolutionMode;

#[derive(Parser)]
#[command(name = "media-sync")]
#[command(author, version, about = "Bulk media upload for Shopify catalogs")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconcile a directory of media files against the catalog
    Sync {
        /// Directory of media files named `<key>.<ext>` or `<key>_<n>.<ext>`
        dir: PathBuf,

        /// Matching mode: custom-id, sku, or auto
        #[arg(short, long, default_value = "auto")]
        mode: ResolutionMode,

        /// Parallel upload units (defaults from MEDIA_SYNC_CONCURRENCY)
        #[arg(short, long)]
        concurrency: Option<usize>,

        /// Process at most this many files
        #[arg(short, long)]
        limit: Option<usize>,

        /// Resolve and report matches only; perform no remote mutation
        #[arg(long)]
        dry_run: bool,

        /// Media readiness poll interval in seconds
        #[arg(long)]
        poll_interval: Option<u64>,

        /// Media readiness poll timeout in seconds
        #[arg(long)]
        poll_timeout: Option<u64>,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Sync {
            dir,
            mode,
            concurrency,
            limit,
            dry_run,
            poll_interval,
            poll_timeout,
        } => {
            let config = SyncConfig::from_env()?;
            let batch = files::scan_dir(&dir, limit)?;
            if batch.is_empty() {
                tracing::warn!(dir = %dir.display(), "no media files found");
            }

            let client = ShopifyClient::new(&config.shopify);
            let runner = BatchRunner::new(config, client);
            let opts = RunOptions {
                mode,
                concurrency,
                dry_run,
                poll_interval: poll_interval.map(Duration::from_secs),
                poll_timeout: poll_timeout.map(Duration::from_secs),
                deadline: None,
            };

            let summary = runner.run(batch, opts).await;
            report(&summary);
        }
    }
    Ok(())
}

#[allow(clippy::print_stdout)]
fn report(summary: &media_sync_core::BatchSummary) {
    for result in &summary.results {
        match &result.detail {
            Some(detail) => println!("{}: {} ({detail})", result.filename, result.status),
            None => println!("{}: {}", result.filename, result.status),
        }
    }
    println!("ok={}, failed={}", summary.ok, summary.failed);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_sync_arguments() {
        let cli = Cli::try_parse_from([
            "media-sync",
            "sync",
            "./photos",
            "--mode",
            "sku",
            "--concurrency",
            "8",
            "--dry-run",
            "--poll-timeout",
            "120",
        ])
        .expect("arguments should parse");

        let Commands::Sync {
            dir,
            mode,
            concurrency,
            dry_run,
            poll_timeout,
            ..
        } = cli.command;
        assert_eq!(dir, PathBuf::from("./photos"));
        assert_eq!(mode, ResolutionMode::SecondaryOnly);
        assert_eq!(concurrency, Some(8));
        assert!(dry_run);
        assert_eq!(poll_timeout, Some(120));
    }

    #[test]
    fn rejects_unknown_mode() {
        let err = Cli::try_parse_from(["media-sync", "sync", "./photos", "--mode", "fuzzy"]);
        assert!(err.is_err());
    }
}
