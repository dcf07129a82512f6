//! # Sync Module
//!
//! Copies photo descriptions from a media source onto matching assets of an
//! asset target.
//!
//! ## Overview
//!
//! A run fetches every source item inside the lookback window and walks them
//! one at a time:
//! - items without a description are skipped
//! - the matching asset is looked up by file name
//! - the conflict strategy decides whether an existing description blocks the write
//! - dry runs stop short of writing
//!
//! Nothing is persisted between runs; the target's current state is the only
//! memory.
//!
//! ## Components
//!
//! - **Sync Coordinator** (`coordinator`): the per-item decision procedure
//! - **Job** (`job`): run identifiers, per-item outcomes and the run report

pub mod coordinator;
pub mod error;
pub mod job;

pub use core_runtime::config::SyncStrategy;
pub use coordinator::{LookupFailurePolicy, SyncCoordinator, SyncOptions};
pub use error::{Result, SyncError};
pub use job::{ItemOutcome, ItemResult, SyncJobId, SyncReport};
