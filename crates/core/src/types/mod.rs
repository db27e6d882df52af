//! Core types for media-sync.
//!
//! This module provides the domain vocabulary shared by the pipeline and CLI.

pub mod batch;
pub mod media;
pub mod slot;

pub use batch::{BatchResult, BatchSummary, ResolutionMode, ResolutionModeError, SyncStatus};
pub use media::{EntityRef, LocalFile, MediaAsset, MediaKind, MediaStatus};
pub use slot::SlotLabel;
