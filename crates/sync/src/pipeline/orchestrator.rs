//! Bounded-concurrency batch orchestration.
//!
//! Every file runs as an independent unit behind a semaphore of size N; one
//! unit's failure never cancels another. All remote mutations touching one
//! entity are serialized through a per-entity lock, because the remote's
//! list/delete/create calls have no transactional grouping and concurrent
//! units on the same slot would otherwise race. A bounded retry wraps the
//! whole unit, never an individual sub-step: a stale staged target cannot be
//! reused, so every attempt re-resolves and re-stages from scratch.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, Semaphore};
use tokio::task::JoinSet;
use tokio::time::Instant;

use media_sync_core::{
    BatchResult, BatchSummary, EntityRef, LocalFile, MediaKind, ResolutionMode, SlotLabel,
    SyncStatus,
};

use crate::catalog::{Catalog, CatalogError};
use crate::config::SyncConfig;
use crate::pipeline::poller::{Readiness, poll_readiness};
use crate::pipeline::reconcile;
use crate::pipeline::resolver::resolve;

/// Extra attempts after the first failure of a unit, for transient errors.
const MAX_EXTRA_ATTEMPTS: usize = 2;

/// Per-run options layered over [`SyncConfig`] defaults.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Identifier resolution policy.
    pub mode: ResolutionMode,
    /// Worker pool size override.
    pub concurrency: Option<usize>,
    /// Resolve and report matches only; no remote mutation.
    pub dry_run: bool,
    /// Readiness poll interval override.
    pub poll_interval: Option<Duration>,
    /// Readiness poll timeout override.
    pub poll_timeout: Option<Duration>,
    /// Past this instant no new unit starts; in-flight units finish.
    pub deadline: Option<Instant>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            mode: ResolutionMode::Auto,
            concurrency: None,
            dry_run: false,
            poll_interval: None,
            poll_timeout: None,
            deadline: None,
        }
    }
}

/// Outcome of one unit attempt, before retry bookkeeping.
struct UnitReport {
    result: BatchResult,
    /// Entity plus created media ID, when the unit attached something.
    touched: Option<(EntityRef, String)>,
    /// Whether re-running the whole unit could plausibly succeed.
    retryable: bool,
}

impl UnitReport {
    fn terminal(result: BatchResult) -> Self {
        Self {
            result,
            touched: None,
            retryable: false,
        }
    }
}

/// Runs a file batch through the pipeline against a catalog.
pub struct BatchRunner<C> {
    inner: Arc<RunnerInner<C>>,
}

struct RunnerInner<C> {
    config: SyncConfig,
    catalog: C,
    /// One lock per entity ID; taken around the whole
    /// pre-check/delete/attach sequence of a unit.
    entity_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl<C> Clone for BatchRunner<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C: Catalog + 'static> BatchRunner<C> {
    /// Create a runner over a catalog implementation.
    #[must_use]
    pub fn new(config: SyncConfig, catalog: C) -> Self {
        Self {
            inner: Arc::new(RunnerInner {
                config,
                catalog,
                entity_locks: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Run the batch: every file through the per-file pipeline under the
    /// concurrency bound, then one reorder per touched entity.
    ///
    /// Results come back in input order regardless of completion order.
    pub async fn run(&self, files: Vec<LocalFile>, opts: RunOptions) -> BatchSummary {
        let concurrency = opts
            .concurrency
            .unwrap_or(self.inner.config.concurrency)
            .max(1);
        let semaphore = Arc::new(Semaphore::new(concurrency));
        let total = files.len();
        tracing::info!(total, concurrency, dry_run = opts.dry_run, "starting batch");

        let names: Vec<String> = files.iter().map(|f| f.basename.clone()).collect();
        let mut join_set: JoinSet<(usize, UnitReport)> = JoinSet::new();
        for (index, file) in files.into_iter().enumerate() {
            let runner = self.clone();
            let opts = opts.clone();
            let semaphore = Arc::clone(&semaphore);
            join_set.spawn(async move {
                // Closing the semaphore is not part of this design; acquire
                // only fails on close, so a failure here is unreachable.
                let Ok(_permit) = semaphore.acquire().await else {
                    return (index, UnitReport::terminal(failed_result(&file, "worker pool closed")));
                };
                if let Some(deadline) = opts.deadline
                    && Instant::now() >= deadline
                {
                    tracing::warn!(file = %file.basename, "run deadline reached, unit not started");
                    return (
                        index,
                        UnitReport::terminal(failed_result(&file, "run deadline exceeded before start")),
                    );
                }
                let report = runner.run_unit_with_retry(&file, &opts).await;
                (index, report)
            });
        }

        let mut ordered: Vec<Option<BatchResult>> = (0..total).map(|_| None).collect();
        let mut touched: HashMap<String, (EntityRef, Vec<String>)> = HashMap::new();
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((index, report)) => {
                    if let Some((entity, media_id)) = report.touched {
                        touched
                            .entry(entity.entity_id.clone())
                            .or_insert_with(|| (entity, Vec::new()))
                            .1
                            .push(media_id);
                    }
                    if let Some(slot) = ordered.get_mut(index) {
                        *slot = Some(report.result);
                    }
                }
                Err(e) => {
                    // The batch continues; the unit's slot is filled with a
                    // failed result when the output is collected.
                    tracing::error!(error = %e, "upload unit panicked");
                }
            }
        }

        if !opts.dry_run {
            self.reorder_touched(&touched, &opts).await;
        }

        let results: Vec<BatchResult> = ordered
            .into_iter()
            .zip(names)
            .map(|(slot, filename)| {
                slot.unwrap_or_else(|| BatchResult {
                    filename,
                    entity_id: None,
                    status: SyncStatus::Failed,
                    detail: Some("upload unit panicked".to_string()),
                })
            })
            .collect();
        let summary = BatchSummary::from_results(results);
        tracing::info!(ok = summary.ok, failed = summary.failed, "batch complete");
        summary
    }

    async fn run_unit_with_retry(&self, file: &LocalFile, opts: &RunOptions) -> UnitReport {
        let mut attempt = 0;
        loop {
            let report = self.run_unit(file, opts).await;
            if report.retryable && attempt < MAX_EXTRA_ATTEMPTS {
                attempt += 1;
                tracing::warn!(
                    file = %file.basename,
                    attempt,
                    status = %report.result.status,
                    "unit failed, retrying from scratch"
                );
                continue;
            }
            return report;
        }
    }

    /// One file's full trip: resolve, sweep, stage, transfer, register,
    /// poll, attach, link. Returns a terminal report; the retry wrapper
    /// decides whether to re-run it.
    async fn run_unit(&self, file: &LocalFile, opts: &RunOptions) -> UnitReport {
        let catalog = &self.inner.catalog;
        let label = SlotLabel::parse(&file.basename);
        let kind = file.kind();

        // 1. Resolve the filename key to an entity.
        let entity = match resolve(catalog, opts.mode, &label.key).await {
            Ok(Some(entity)) => entity,
            Ok(None) => {
                return UnitReport::terminal(BatchResult {
                    filename: file.basename.clone(),
                    entity_id: None,
                    status: SyncStatus::NoMatch,
                    detail: Some(format!("no entity for key '{}'", label.key)),
                });
            }
            Err(e) => return error_report(file, None, SyncStatus::Failed, &e),
        };

        if opts.dry_run {
            return UnitReport::terminal(BatchResult {
                filename: file.basename.clone(),
                entity_id: Some(entity.entity_id.clone()),
                status: SyncStatus::Matched,
                detail: Some(entity.entity_title.clone()),
            });
        }

        let alt = reconcile::assign_alt(&entity, &label);
        let poll_interval = opts.poll_interval.unwrap_or(self.inner.config.poll_interval);
        let poll_timeout = opts.poll_timeout.unwrap_or(self.inner.config.poll_timeout);

        // Serialize the whole mutation sequence for this entity.
        let lock = self.entity_lock(&entity.entity_id).await;
        let _guard = lock.lock().await;

        // 2. Idempotent replace: sweep prior occupants of this slot.
        let existing = match catalog.list_media(&entity.entity_id).await {
            Ok(media) => media,
            Err(e) => return error_report(file, Some(&entity), SyncStatus::Failed, &e),
        };
        let occupants: Vec<String> = existing
            .iter()
            .filter(|a| reconcile::occupies(a, &alt, &file.basename))
            .map(|a| a.id.clone())
            .collect();
        let replaced = !occupants.is_empty();
        if replaced {
            tracing::info!(
                file = %file.basename,
                entity_id = %entity.entity_id,
                count = occupants.len(),
                "deleting prior occupants of slot"
            );
            if let Err(e) = catalog.delete_media(&entity.entity_id, &occupants).await {
                return error_report(file, Some(&entity), SyncStatus::Failed, &e);
            }
        }

        // 3. Staged transfer handshake.
        let target = match catalog
            .create_staged_target(&file.basename, &file.mime_type, file.size, kind)
            .await
        {
            Ok(target) => target,
            Err(e) => {
                return error_report(file, Some(&entity), SyncStatus::StagedUploadError, &e);
            }
        };
        if let Err(e) = catalog.transfer(&target, file).await {
            // The target is spent either way (I3); a retry restages.
            return error_report(file, Some(&entity), SyncStatus::TransferError, &e);
        }

        // 4. Register and await processing. Mandatory for videos; images
        // attach straight from the staged source.
        let mut details: Vec<String> = Vec::new();
        let registered = if kind == MediaKind::Video {
            match catalog
                .register_resource(&target.resource_url, kind, &alt)
                .await
            {
                Ok(asset) => {
                    match poll_readiness(catalog, &asset.id, poll_interval, poll_timeout).await {
                        Readiness::Ready => {}
                        Readiness::Failed => {
                            details.push("remote processing failed; attaching anyway".to_string());
                        }
                        Readiness::TimedOut => {
                            details.push(format!(
                                "readiness timeout after {}s; attaching anyway",
                                poll_timeout.as_secs()
                            ));
                        }
                    }
                    Some(asset)
                }
                Err(e) => {
                    return error_report(file, Some(&entity), SyncStatus::RegistrationError, &e);
                }
            }
        } else {
            None
        };

        // 5. Attach through the fallback chain.
        let attached_id = match reconcile::attach(
            catalog,
            &entity.entity_id,
            registered.as_ref(),
            &target.resource_url,
            kind,
            &alt,
        )
        .await
        {
            Ok(id) => id,
            Err(e) => return error_report(file, Some(&entity), SyncStatus::AttachFailed, &e),
        };

        // 6. Variant link for the featured slot, gated on confirmed
        // readiness. An unready asset records the skip instead of linking.
        if let Some(variant_id) = entity.variant_id.clone()
            && label.index == 0
        {
            let readiness =
                poll_readiness(catalog, &attached_id, poll_interval, poll_timeout).await;
            if readiness.is_ready() {
                let detach_candidates: Vec<String> =
                    reconcile::variant_media_ids(&existing, &entity)
                        .into_iter()
                        .filter(|id| !occupants.contains(id))
                        .collect();
                if let Err(e) = reconcile::link_variant(
                    catalog,
                    &entity.entity_id,
                    &variant_id,
                    &attached_id,
                    &detach_candidates,
                )
                .await
                {
                    details.push(format!("variant link failed: {e}"));
                }
            } else {
                details.push("variant link skipped: asset not ready".to_string());
            }
        }

        let status = if replaced {
            SyncStatus::Replaced
        } else {
            SyncStatus::Ok
        };
        tracing::info!(file = %file.basename, entity_id = %entity.entity_id, %status, "file synced");
        UnitReport {
            result: BatchResult {
                filename: file.basename.clone(),
                entity_id: Some(entity.entity_id.clone()),
                status,
                detail: (!details.is_empty()).then(|| details.join("; ")),
            },
            touched: Some((entity, attached_id)),
            retryable: false,
        }
    }

    /// Post-batch ordering reconciliation, once per touched entity.
    ///
    /// Best-effort: every asset created in the batch is polled first so the
    /// remote does not reject moves against unprocessed media, and a failed
    /// reorder is recorded against the entity without undoing any attach.
    async fn reorder_touched(
        &self,
        touched: &HashMap<String, (EntityRef, Vec<String>)>,
        opts: &RunOptions,
    ) {
        let catalog = &self.inner.catalog;
        let poll_interval = opts.poll_interval.unwrap_or(self.inner.config.poll_interval);
        let poll_timeout = opts.poll_timeout.unwrap_or(self.inner.config.poll_timeout);

        for (entity_id, (entity, created)) in touched {
            for asset_id in created {
                let readiness =
                    poll_readiness(catalog, asset_id, poll_interval, poll_timeout).await;
                if !readiness.is_ready() {
                    tracing::warn!(%entity_id, %asset_id, ?readiness, "asset unready before reorder");
                }
            }

            let lock = self.entity_lock(entity_id).await;
            let _guard = lock.lock().await;
            let plan = match catalog.list_media(entity_id).await {
                Ok(assets) => reconcile::plan_reorder(&assets, &entity.entity_title),
                Err(e) => {
                    tracing::warn!(%entity_id, error = %e, "listing media for reorder failed");
                    continue;
                }
            };
            if plan.is_empty() {
                continue;
            }
            tracing::info!(%entity_id, moves = plan.len(), "reordering media");
            if let Err(e) = catalog.reorder_media(entity_id, &plan).await {
                tracing::warn!(%entity_id, error = %e, "reorder failed");
            }
        }
    }

    async fn entity_lock(&self, entity_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.inner.entity_locks.lock().await;
        Arc::clone(
            locks
                .entry(entity_id.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(()))),
        )
    }
}

fn error_report(
    file: &LocalFile,
    entity: Option<&EntityRef>,
    status: SyncStatus,
    error: &CatalogError,
) -> UnitReport {
    tracing::warn!(file = %file.basename, %status, error = %error, "pipeline step failed");
    UnitReport {
        result: BatchResult {
            filename: file.basename.clone(),
            entity_id: entity.map(|e| e.entity_id.clone()),
            status,
            detail: Some(error.to_string()),
        },
        touched: None,
        retryable: error.is_transient(),
    }
}

fn failed_result(file: &LocalFile, detail: &str) -> BatchResult {
    BatchResult {
        filename: file.basename.clone(),
        entity_id: None,
        status: SyncStatus::Failed,
        detail: Some(detail.to_string()),
    }
}
