//! Media Sync Core - Shared types library.
//!
//! This crate provides common types used across all media-sync components:
//! - `sync` - The reconciliation and upload pipeline
//! - `cli` - Command-line entry point
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Slot labels, entity references, media snapshots, and
//!   per-file batch results

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
