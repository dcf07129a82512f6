//! # Sync Job Records
//!
//! Identifiers, per-item outcomes and the end-of-run report.
//!
//! ## Overview
//!
//! Every source item reaches exactly one terminal [`ItemOutcome`]. The
//! [`SyncReport`] keeps the outcome of each item in fetch order plus a
//! counter per outcome; nothing here is persisted.
//!
//! ```text
//! item ──> no description ─────────────────> SkippedNoDescription
//!      └─> lookup ──> NotFound ────────────> NotFound
//!                 ├─> Failed ──────────────> LookupFailed
//!                 └─> Found ──> existing ──> SkippedAlreadyPresent
//!                           ├─> dry run ───> WouldUpdate
//!                           └─> write ─────> Updated | UpdateFailed
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ============================================================================
// ID Types
// ============================================================================

/// Unique identifier for a sync run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SyncJobId(Uuid);

impl SyncJobId {
    /// Create a new random sync job ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SyncJobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SyncJobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Outcomes
// ============================================================================

/// Terminal outcome of a single source item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemOutcome {
    /// The source item has no usable description
    SkippedNoDescription,
    /// No asset with the item's file name exists on the target
    NotFound,
    /// The target search itself failed
    LookupFailed,
    /// `skip_if_present` and the asset already has a description
    SkippedAlreadyPresent,
    /// Dry run: the write was suppressed
    WouldUpdate,
    /// The description was written
    Updated,
    /// The target rejected the write or could not be reached
    UpdateFailed,
}

impl ItemOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemOutcome::SkippedNoDescription => "skipped_no_description",
            ItemOutcome::NotFound => "not_found",
            ItemOutcome::LookupFailed => "lookup_failed",
            ItemOutcome::SkippedAlreadyPresent => "skipped_already_present",
            ItemOutcome::WouldUpdate => "would_update",
            ItemOutcome::Updated => "updated",
            ItemOutcome::UpdateFailed => "update_failed",
        }
    }

    /// Whether the outcome counts towards the run's updated total.
    pub fn counts_as_updated(&self) -> bool {
        matches!(self, ItemOutcome::Updated | ItemOutcome::WouldUpdate)
    }
}

impl fmt::Display for ItemOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one item, in fetch order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemResult {
    pub filename: String,
    /// Matched asset, when the lookup found one
    pub asset_id: Option<String>,
    pub outcome: ItemOutcome,
}

// ============================================================================
// Report
// ============================================================================

/// Summary of a finished run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReport {
    /// Items returned by the source
    pub total_found: usize,
    /// Items written, or that would have been written under dry run
    pub updated: usize,
    pub skipped_no_description: usize,
    pub not_found: usize,
    pub lookup_failed: usize,
    pub skipped_already_present: usize,
    pub update_failed: usize,
    pub dry_run: bool,
    pub outcomes: Vec<ItemResult>,
}

impl SyncReport {
    pub fn new(total_found: usize, dry_run: bool) -> Self {
        Self {
            total_found,
            dry_run,
            outcomes: Vec::with_capacity(total_found),
            ..Self::default()
        }
    }

    /// Record the terminal outcome of one item.
    pub fn record(&mut self, filename: &str, asset_id: Option<&str>, outcome: ItemOutcome) {
        match outcome {
            ItemOutcome::SkippedNoDescription => self.skipped_no_description += 1,
            ItemOutcome::NotFound => self.not_found += 1,
            ItemOutcome::LookupFailed => self.lookup_failed += 1,
            ItemOutcome::SkippedAlreadyPresent => self.skipped_already_present += 1,
            ItemOutcome::UpdateFailed => self.update_failed += 1,
            ItemOutcome::WouldUpdate | ItemOutcome::Updated => {}
        }
        if outcome.counts_as_updated() {
            self.updated += 1;
        }

        self.outcomes.push(ItemResult {
            filename: filename.to_string(),
            asset_id: asset_id.map(str::to_string),
            outcome,
        });
    }

    /// Number of items that reached `outcome`.
    pub fn count(&self, outcome: ItemOutcome) -> usize {
        self.outcomes
            .iter()
            .filter(|result| result.outcome == outcome)
            .count()
    }

    /// File names that were (or would have been) updated, in fetch order.
    pub fn updated_filenames(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|result| result.outcome.counts_as_updated())
            .map(|result| result.filename.as_str())
            .collect()
    }
}
