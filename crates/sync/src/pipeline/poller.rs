//! Asynchronous readiness polling for registered media assets.

use std::time::Duration;

use tokio::time::Instant;

use media_sync_core::MediaStatus;

use crate::catalog::Catalog;

/// Outcome of waiting for a remote asset to finish processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    /// Terminal: asset is safe to attach and display.
    Ready,
    /// Terminal: remote processing failed.
    Failed,
    /// Local deadline elapsed; remote processing continues regardless.
    TimedOut,
}

impl Readiness {
    /// Whether the asset was confirmed ready.
    #[must_use]
    pub const fn is_ready(self) -> bool {
        matches!(self, Self::Ready)
    }
}

/// Poll an asset's status until a terminal state or `timeout` elapses.
///
/// `TimedOut` is a local decision, not a remote state - it does not cancel
/// remote processing, and the caller decides whether to proceed
/// optimistically. Transient status-query failures are logged and absorbed;
/// a deadline with no terminal observation reports `TimedOut`.
pub async fn poll_readiness<C: Catalog + ?Sized>(
    catalog: &C,
    asset_id: &str,
    interval: Duration,
    timeout: Duration,
) -> Readiness {
    let deadline = Instant::now() + timeout;

    loop {
        match catalog.get_status(asset_id).await {
            Ok(MediaStatus::Ready) => return Readiness::Ready,
            Ok(MediaStatus::Failed) => return Readiness::Failed,
            Ok(MediaStatus::Pending) => {}
            Err(e) => {
                tracing::warn!(asset_id, error = %e, "status poll failed, will retry");
            }
        }

        if Instant::now() + interval > deadline {
            tracing::debug!(asset_id, ?timeout, "readiness poll timed out");
            return Readiness::TimedOut;
        }
        tokio::time::sleep(interval).await;
    }
}
