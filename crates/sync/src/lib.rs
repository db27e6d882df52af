//! Media reconciliation and upload pipeline for a Shopify catalog.
//!
//! Bulk-associates local media files with products (and optionally variants)
//! by filename convention, keeping the remote display state convergent across
//! repeated runs.
//!
//! # Architecture
//!
//! - [`config`] - Immutable run configuration loaded from environment
//! - [`catalog`] - The [`catalog::Catalog`] trait: every remote operation the
//!   pipeline consumes, plus [`catalog::CatalogError`]
//! - [`shopify`] - [`shopify::ShopifyClient`], the Admin API implementation
//!   of the catalog trait (GraphQL over HTTPS)
//! - [`files`] - Local directory scanning
//! - [`pipeline`] - Resolver, readiness poller, media reconciler, and the
//!   bounded-concurrency batch orchestrator
//!
//! # Example
//!
//! ```rust,ignore
//! use media_sync::config::SyncConfig;
//! use media_sync::pipeline::{BatchRunner, RunOptions};
//! use media_sync::shopify::ShopifyClient;
//!
//! let config = SyncConfig::from_env()?;
//! let client = ShopifyClient::new(&config.shopify);
//! let files = media_sync::files::scan_dir("./photos", None)?;
//!
//! let runner = BatchRunner::new(config, client);
//! let summary = runner.run(files, RunOptions::default()).await;
//! println!("ok={}, failed={}", summary.ok, summary.failed);
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod catalog;
pub mod config;
pub mod files;
pub mod pipeline;
pub mod shopify;

pub use catalog::{Catalog, CatalogError};
pub use config::SyncConfig;
pub use pipeline::{BatchRunner, RunOptions};
pub use shopify::ShopifyClient;
