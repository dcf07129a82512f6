//! # Bridge Traits
//!
//! Abstractions the sync core is written against.
//!
//! ## Overview
//!
//! This crate defines the contract between the sync orchestration and the
//! concrete adapters that talk to the outside world. Production adapters live
//! in `bridge-desktop` and the `provider-*` crates; tests substitute mocks.
//!
//! ## Traits
//!
//! ### Networking
//! - [`HttpClient`](http::HttpClient) - Async HTTP operations
//!
//! ### Security & Storage
//! - [`SecureStore`](storage::SecureStore) - Credential persistence (the OAuth token artifact)
//!
//! ### Collaborators
//! - [`MediaSource`](storage::MediaSource) - Photo library descriptions are read from
//! - [`AssetTarget`](storage::AssetTarget) - Asset manager descriptions are written to
//!
//! ### Utilities
//! - [`Clock`](time::Clock) - Time source for deterministic testing
//!
//! ## Error Handling
//!
//! All bridge traits use the [`BridgeError`](error::BridgeError) type. Adapters
//! should convert their own errors into it with an actionable message.
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` so adapters can be shared behind
//! `Arc` across async tasks.

pub mod error;
pub mod http;
pub mod storage;
pub mod time;

pub use error::BridgeError;

// Re-export commonly used types
pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
pub use storage::{AssetLookup, AssetTarget, MediaItem, MediaMetadata, MediaSource, SecureStore};
pub use time::{Clock, FixedClock, SystemClock};
