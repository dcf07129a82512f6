//! # Event Bus System
//!
//! Provides typed, structured events for a sync run using `tokio::sync::broadcast`.
//!
//! ## Overview
//!
//! Components never print progress themselves beyond `tracing`. Instead they
//! report what happened to an injected [`SyncObserver`]:
//!
//! - **Event Types**: [`CoreEvent`] wrapping [`AuthEvent`] and [`SyncEvent`]
//! - **SyncObserver**: the seam components publish to
//! - **EventBus**: broadcast-channel observer that fans events out to subscribers
//! - **NoopObserver**: for callers that don't care
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   on_event   ┌───────────┐    subscribe    ┌────────────┐
//! │ AuthManager  ├─────────────>│           ├────────────────>│ Subscriber │
//! └──────────────┘              │ EventBus  │                 └────────────┘
//! ┌──────────────┐   on_event   │           │    subscribe    ┌────────────┐
//! │SyncCoordinat.├─────────────>│           ├────────────────>│ Subscriber │
//! └──────────────┘              └───────────┘                 └────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::{CoreEvent, EventBus, SyncEvent, SyncObserver};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let bus = EventBus::new(16);
//! let mut receiver = bus.subscribe();
//!
//! bus.on_event(CoreEvent::Sync(SyncEvent::Failed {
//!     job_id: "job-1".to_string(),
//!     message: "network down".to_string(),
//! }));
//!
//! let event = receiver.recv().await.unwrap();
//! assert_eq!(event.description(), "Sync failed");
//! # }
//! ```
//!
//! ## Error Handling
//!
//! - **`RecvError::Lagged(n)`**: Subscriber was too slow and missed `n` events.
//! - **`RecvError::Closed`**: All senders have been dropped.
//!
//! Publishing through [`SyncObserver`] never fails; an event with no
//! subscribers is simply dropped.

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast::{self, error::SendError};

pub use tokio::sync::broadcast::Receiver;

/// Default buffer size for the event bus channel.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 256;

// ============================================================================
// Core Event Types
// ============================================================================

/// Top-level event enum encompassing all event categories.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "payload")]
pub enum CoreEvent {
    /// Authentication-related events
    Auth(AuthEvent),
    /// Sync-related events
    Sync(SyncEvent),
}

impl CoreEvent {
    /// Returns a human-readable description of the event.
    pub fn description(&self) -> &str {
        match self {
            CoreEvent::Auth(e) => e.description(),
            CoreEvent::Sync(e) => e.description(),
        }
    }

    /// Returns the severity level of the event.
    pub fn severity(&self) -> EventSeverity {
        match self {
            CoreEvent::Auth(AuthEvent::AuthError { .. }) => EventSeverity::Error,
            CoreEvent::Sync(SyncEvent::Failed { .. }) => EventSeverity::Error,
            CoreEvent::Auth(AuthEvent::AuthorizationRequired { .. }) => EventSeverity::Warning,
            CoreEvent::Auth(AuthEvent::SignedIn) => EventSeverity::Info,
            CoreEvent::Sync(SyncEvent::Started { .. }) => EventSeverity::Info,
            CoreEvent::Sync(SyncEvent::Completed { .. }) => EventSeverity::Info,
            _ => EventSeverity::Debug,
        }
    }
}

/// Event severity levels for filtering and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventSeverity {
    Debug,
    Info,
    Warning,
    Error,
}

// ============================================================================
// Authentication Events
// ============================================================================

/// Events related to obtaining Google credentials.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum AuthEvent {
    /// A persisted token was loaded and is still valid.
    TokenLoaded {
        /// Expiry of the loaded token (Unix epoch seconds), if known.
        expires_at: Option<i64>,
    },
    /// The persisted token expired and is being refreshed.
    TokenRefreshing,
    /// Token refresh completed successfully.
    TokenRefreshed {
        /// Timestamp when the new token expires (Unix epoch seconds).
        expires_at: Option<i64>,
    },
    /// No usable token; the interactive consent flow is starting.
    AuthorizationRequired {
        /// URL the user must open.
        auth_url: String,
    },
    /// The interactive flow produced a new token.
    SignedIn,
    /// Authentication error occurred.
    AuthError {
        /// Human-readable error message.
        message: String,
        /// Whether re-running may succeed without user action.
        recoverable: bool,
    },
}

impl AuthEvent {
    fn description(&self) -> &str {
        match self {
            AuthEvent::TokenLoaded { .. } => "Stored token loaded",
            AuthEvent::TokenRefreshing => "Refreshing access token",
            AuthEvent::TokenRefreshed { .. } => "Token refreshed successfully",
            AuthEvent::AuthorizationRequired { .. } => "User authorization required",
            AuthEvent::SignedIn => "User signed in successfully",
            AuthEvent::AuthError { .. } => "Authentication error",
        }
    }
}

// ============================================================================
// Sync Events
// ============================================================================

/// Events emitted while copying descriptions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum SyncEvent {
    /// Sync run initiated.
    Started {
        /// Unique identifier for this run.
        job_id: String,
        /// Lookback window in days.
        window_days: u32,
        /// Whether writes are suppressed.
        dry_run: bool,
        /// Conflict strategy name.
        strategy: String,
    },
    /// One source item reached a terminal outcome.
    ItemProcessed {
        job_id: String,
        filename: String,
        /// Matched asset, when the lookup found one.
        asset_id: Option<String>,
        /// Outcome code, e.g. `updated` or `not_found`.
        outcome: String,
    },
    /// Sync finished.
    Completed {
        job_id: String,
        /// Items returned by the source.
        total_found: u64,
        /// Items updated (or that would have been, under dry run).
        updated: u64,
        /// Wall-clock duration in milliseconds.
        duration_ms: u64,
    },
    /// Sync aborted.
    Failed {
        job_id: String,
        /// Human-readable error message.
        message: String,
    },
}

impl SyncEvent {
    fn description(&self) -> &str {
        match self {
            SyncEvent::Started { .. } => "Sync started",
            SyncEvent::ItemProcessed { .. } => "Item processed",
            SyncEvent::Completed { .. } => "Sync completed",
            SyncEvent::Failed { .. } => "Sync failed",
        }
    }
}

// ============================================================================
// Observer
// ============================================================================

/// Receiver of structured events.
///
/// Implementations must not block; they are called inline from the sync loop.
pub trait SyncObserver: Send + Sync {
    fn on_event(&self, event: CoreEvent);
}

/// Observer that discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl SyncObserver for NoopObserver {
    fn on_event(&self, _event: CoreEvent) {}
}

// ============================================================================
// Event Bus
// ============================================================================

/// Central event bus for publishing and subscribing to events.
///
/// Cloning is cheap; all clones share the same channel.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<CoreEvent>,
}

impl EventBus {
    /// Creates a new event bus with the specified buffer size.
    ///
    /// Subscribers falling behind by more than `capacity` events receive
    /// `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of subscribers that received the event, or an error
    /// if there are no active subscribers.
    pub fn emit(&self, event: CoreEvent) -> Result<usize, SendError<CoreEvent>> {
        self.sender.send(event)
    }

    /// Creates a new subscriber. Past events are not replayed.
    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.sender.subscribe()
    }

    /// Returns the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }
}

impl SyncObserver for EventBus {
    fn on_event(&self, event: CoreEvent) {
        // No subscribers is not an error for publishers
        let _ = self.emit(event);
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}
