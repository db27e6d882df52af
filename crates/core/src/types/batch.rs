//! Per-file batch outcomes and run-level summary.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// How a filename-derived key is resolved to a catalog entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResolutionMode {
    /// Exact custom-identifier lookup only.
    PrimaryOnly,
    /// Variant SKU lookup only.
    SecondaryOnly,
    /// Primary first, then SKU fallback.
    Auto,
}

/// Error parsing a [`ResolutionMode`] from a CLI value.
#[derive(Debug, Error)]
#[error("unknown matching mode '{0}' (expected custom-id, sku, or auto)")]
pub struct ResolutionModeError(String);

impl std::str::FromStr for ResolutionMode {
    type Err = ResolutionModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "custom-id" | "primary" => Ok(Self::PrimaryOnly),
            "sku" | "secondary" => Ok(Self::SecondaryOnly),
            "auto" => Ok(Self::Auto),
            other => Err(ResolutionModeError(other.to_string())),
        }
    }
}

/// Terminal status of one file's trip through the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    /// Uploaded and attached to a fresh slot.
    Ok,
    /// Uploaded and attached after deleting a prior occupant of the slot.
    Replaced,
    /// Dry run: entity resolved, no mutation performed.
    Matched,
    /// No entity resolved for the filename key.
    NoMatch,
    /// Remote rejected staged target creation.
    StagedUploadError,
    /// Byte transfer to the staged target returned non-2xx.
    TransferError,
    /// Remote rejected resource registration.
    RegistrationError,
    /// Every attach path was exhausted.
    AttachFailed,
    /// Failure outside the named steps (lookup transport, file read).
    Failed,
}

impl SyncStatus {
    /// Whether this outcome counts toward the run's `ok` tally.
    #[must_use]
    pub const fn is_ok(self) -> bool {
        matches!(self, Self::Ok | Self::Replaced | Self::Matched)
    }
}

impl std::fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let tag = match self {
            Self::Ok => "ok",
            Self::Replaced => "replaced",
            Self::Matched => "matched",
            Self::NoMatch => "no_match",
            Self::StagedUploadError => "staged_upload_error",
            Self::TransferError => "transfer_error",
            Self::RegistrationError => "registration_error",
            Self::AttachFailed => "attach_failed",
            Self::Failed => "failed",
        };
        write!(f, "{tag}")
    }
}

/// Outcome record for one input file. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchResult {
    /// Input file basename.
    pub filename: String,
    /// Resolved entity, when resolution succeeded.
    pub entity_id: Option<String>,
    /// Terminal status tag.
    pub status: SyncStatus,
    /// Free-form detail (error text, timeout notes, skipped links).
    pub detail: Option<String>,
}

/// Ordered per-file results plus summary counts for one run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchSummary {
    /// One entry per input file, in input order.
    pub results: Vec<BatchResult>,
    /// Files that ended `ok`, `replaced`, or `matched`.
    pub ok: usize,
    /// Everything else.
    pub failed: usize,
}

impl BatchSummary {
    /// Build a summary from ordered per-file results.
    #[must_use]
    pub fn from_results(results: Vec<BatchResult>) -> Self {
        let ok = results.iter().filter(|r| r.status.is_ok()).count();
        let failed = results.len() - ok;
        Self {
            results,
            ok,
            failed,
        }
    }
}
