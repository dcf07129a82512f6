//! # Sync Coordinator
//!
//! Copies descriptions from a [`MediaSource`] onto an [`AssetTarget`].
//!
//! ## Workflow
//!
//! 1. Fetch every source item inside the lookback window
//! 2. For each item, in fetch order:
//!    - skip it when it has no description
//!    - look the asset up by file name
//!    - under `skip_if_present`, skip assets that already carry a description
//!    - under dry run, count the item without writing
//!    - otherwise write the description
//! 3. Report totals
//!
//! Items are processed sequentially and each is attempted exactly once. A
//! failed fetch aborts the run; failures on a single item never do (unless
//! [`LookupFailurePolicy::Abort`] is selected).
//!
//! ## Usage
//!
//! ```rust,ignore
//! use core_sync::{SyncCoordinator, SyncOptions};
//! use std::sync::Arc;
//!
//! let coordinator = SyncCoordinator::new(source, target, SyncOptions::from(&config))
//!     .with_observer(Arc::new(event_bus.clone()));
//!
//! let report = coordinator.run().await?;
//! println!("Updated {} items", report.updated);
//! ```

use crate::job::{ItemOutcome, SyncJobId, SyncReport};
use crate::{Result, SyncError};
use bridge_traits::storage::{AssetLookup, AssetTarget, MediaItem, MediaSource};
use core_runtime::config::{SyncConfig, SyncStrategy, DEFAULT_DAYS_BACK};
use core_runtime::events::{CoreEvent, NoopObserver, SyncEvent, SyncObserver};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, instrument, warn};

/// What to do when the target search fails (as opposed to finding nothing).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LookupFailurePolicy {
    /// Record the item as `LookupFailed` and move on, like a missing asset
    #[default]
    RecordAndContinue,
    /// Abort the run
    Abort,
}

/// Run parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOptions {
    /// Lookback window in days
    pub window_days: u32,
    /// Suppress writes
    pub dry_run: bool,
    /// Conflict strategy
    pub strategy: SyncStrategy,
    pub lookup_failure_policy: LookupFailurePolicy,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            window_days: DEFAULT_DAYS_BACK,
            dry_run: false,
            strategy: SyncStrategy::default(),
            lookup_failure_policy: LookupFailurePolicy::default(),
        }
    }
}

impl From<&SyncConfig> for SyncOptions {
    fn from(config: &SyncConfig) -> Self {
        Self {
            window_days: config.days_back,
            dry_run: config.dry_run,
            strategy: config.sync_strategy,
            lookup_failure_policy: LookupFailurePolicy::default(),
        }
    }
}

/// Sync orchestrator
pub struct SyncCoordinator {
    source: Arc<dyn MediaSource>,
    target: Arc<dyn AssetTarget>,
    options: SyncOptions,
    observer: Arc<dyn SyncObserver>,
}

impl SyncCoordinator {
    pub fn new(
        source: Arc<dyn MediaSource>,
        target: Arc<dyn AssetTarget>,
        options: SyncOptions,
    ) -> Self {
        Self {
            source,
            target,
            options,
            observer: Arc::new(NoopObserver),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn SyncObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn options(&self) -> &SyncOptions {
        &self.options
    }

    fn emit(&self, event: SyncEvent) {
        self.observer.on_event(CoreEvent::Sync(event));
    }

    /// Run one sync pass.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Source`] when the source cannot be read, and
    /// [`SyncError::Lookup`] when a lookup fails under
    /// [`LookupFailurePolicy::Abort`].
    #[instrument(skip(self), fields(window_days = self.options.window_days, dry_run = self.options.dry_run))]
    pub async fn run(&self) -> Result<SyncReport> {
        let job_id = SyncJobId::new();
        let started = Instant::now();

        self.emit(SyncEvent::Started {
            job_id: job_id.to_string(),
            window_days: self.options.window_days,
            dry_run: self.options.dry_run,
            strategy: self.options.strategy.to_string(),
        });

        info!(
            "Fetching Google Photos items from last {} days...",
            self.options.window_days
        );

        let items = match self.source.fetch_items(self.options.window_days).await {
            Ok(items) => items,
            Err(e) => {
                error!(error = %e, "Failed to fetch media items");
                self.emit(SyncEvent::Failed {
                    job_id: job_id.to_string(),
                    message: e.to_string(),
                });
                return Err(SyncError::Source(e));
            }
        };

        info!("Found {} items.", items.len());

        let mut report = SyncReport::new(items.len(), self.options.dry_run);

        for item in &items {
            let (filename, asset_id, outcome) = match self.process_item(item).await {
                Ok(processed) => processed,
                Err(e) => {
                    self.emit(SyncEvent::Failed {
                        job_id: job_id.to_string(),
                        message: e.to_string(),
                    });
                    return Err(e);
                }
            };

            report.record(&filename, asset_id.as_deref(), outcome);
            self.emit(SyncEvent::ItemProcessed {
                job_id: job_id.to_string(),
                filename,
                asset_id,
                outcome: outcome.to_string(),
            });
        }

        info!("Updated {} items.", report.updated);

        self.emit(SyncEvent::Completed {
            job_id: job_id.to_string(),
            total_found: report.total_found as u64,
            updated: report.updated as u64,
            duration_ms: started.elapsed().as_millis() as u64,
        });

        Ok(report)
    }

    /// Decide and apply the outcome of a single item.
    ///
    /// Returns the item's file name, the matched asset (if any) and the outcome.
    #[instrument(skip(self, item), fields(id = %item.id))]
    async fn process_item(&self, item: &MediaItem) -> Result<(String, Option<String>, ItemOutcome)> {
        let metadata = self.source.extract_metadata(item);
        let filename = metadata.filename.clone();

        let Some(description) = metadata.usable_description() else {
            debug!("Skipping {} (no description)", filename);
            return Ok((filename, None, ItemOutcome::SkippedNoDescription));
        };

        let asset_id = match self.target.find_asset_by_filename(&filename).await {
            AssetLookup::Found(asset_id) => asset_id,
            AssetLookup::NotFound => {
                warn!("Not found in Immich: {}", filename);
                return Ok((filename, None, ItemOutcome::NotFound));
            }
            AssetLookup::Failed(reason) => match self.options.lookup_failure_policy {
                LookupFailurePolicy::RecordAndContinue => {
                    warn!(reason = %reason, "Not found in Immich: {}", filename);
                    return Ok((filename, None, ItemOutcome::LookupFailed));
                }
                LookupFailurePolicy::Abort => {
                    error!(reason = %reason, "Lookup failed for {}, aborting", filename);
                    return Err(SyncError::Lookup { filename, reason });
                }
            },
        };

        if self.options.strategy == SyncStrategy::SkipIfPresent {
            let existing = self.target.get_asset_description(&asset_id).await;
            if !existing.is_empty() {
                info!("Skipping {} - already has description in Immich", filename);
                return Ok((filename, Some(asset_id), ItemOutcome::SkippedAlreadyPresent));
            }
        }

        if self.options.dry_run {
            info!("[DRY-RUN] Would update: {} → \"{}\"", filename, description);
            return Ok((filename, Some(asset_id), ItemOutcome::WouldUpdate));
        }

        let outcome = match self
            .target
            .update_asset_description(&asset_id, description)
            .await
        {
            Ok(true) => {
                info!("Updated: {}", filename);
                ItemOutcome::Updated
            }
            Ok(false) => {
                error!("Failed to update: {}", filename);
                ItemOutcome::UpdateFailed
            }
            Err(e) => {
                error!(error = %e, "Failed to update: {}", filename);
                ItemOutcome::UpdateFailed
            }
        };

        Ok((filename, Some(asset_id), outcome))
    }
}
