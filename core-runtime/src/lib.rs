//! # Core Runtime Module
//!
//! Provides foundational runtime infrastructure for the sync tool:
//! - Configuration loading and validation
//! - Logging and tracing initialisation
//! - Structured event publishing
//!
//! ## Overview
//!
//! Every other crate depends on this one for the shared error type, the
//! event types components report through, and the configuration the binary
//! hands to them.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use config::{SyncConfig, SyncStrategy};
pub use error::{Error, Result};
pub use events::{CoreEvent, EventBus, NoopObserver, SyncObserver};
