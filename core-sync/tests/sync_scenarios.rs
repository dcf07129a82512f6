//! Integration tests for description sync runs
//!
//! These tests drive the coordinator end to end against in-memory fakes:
//! - Described items are written onto matching assets
//! - Dry run leaves the target untouched
//! - `skip_if_present` protects existing descriptions
//! - Repeated runs are idempotent

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result as BridgeResult},
    storage::{AssetLookup, AssetTarget, MediaItem, MediaMetadata, MediaSource},
};
use core_sync::{ItemOutcome, SyncCoordinator, SyncError, SyncOptions, SyncStrategy};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex as AsyncMutex;

// ============================================================================
// Fakes
// ============================================================================

/// Photo library returning a fixed set of items
struct FakeLibrary {
    items: Vec<MediaItem>,
    fail_with: Option<String>,
}

impl FakeLibrary {
    fn new(items: Vec<MediaItem>) -> Self {
        Self {
            items,
            fail_with: None,
        }
    }

    fn failing(message: &str) -> Self {
        Self {
            items: Vec::new(),
            fail_with: Some(message.to_string()),
        }
    }
}

#[async_trait]
impl MediaSource for FakeLibrary {
    async fn fetch_items(&self, _window_days: u32) -> BridgeResult<Vec<MediaItem>> {
        match &self.fail_with {
            Some(message) => Err(BridgeError::OperationFailed(message.clone())),
            None => Ok(self.items.clone()),
        }
    }

    fn extract_metadata(&self, item: &MediaItem) -> MediaMetadata {
        MediaMetadata {
            id: item.id.clone(),
            filename: item.filename.clone(),
            description: item.description.clone(),
            creation_time: None,
        }
    }
}

#[derive(Debug, Clone, Default)]
struct FakeAsset {
    id: String,
    description: String,
}

/// Asset server keyed by original file name, recording every write
#[derive(Default)]
struct FakeServer {
    assets: AsyncMutex<HashMap<String, FakeAsset>>,
    writes: AsyncMutex<Vec<(String, String)>>,
    broken_search: Vec<String>,
}

impl FakeServer {
    async fn with_asset(self, filename: &str, id: &str, description: &str) -> Self {
        self.assets.lock().await.insert(
            filename.to_string(),
            FakeAsset {
                id: id.to_string(),
                description: description.to_string(),
            },
        );
        self
    }

    async fn description_of(&self, filename: &str) -> Option<String> {
        self.assets
            .lock()
            .await
            .get(filename)
            .map(|asset| asset.description.clone())
    }

    async fn write_count(&self) -> usize {
        self.writes.lock().await.len()
    }
}

#[async_trait]
impl AssetTarget for FakeServer {
    async fn find_asset_by_filename(&self, filename: &str) -> AssetLookup {
        if self.broken_search.iter().any(|name| name == filename) {
            return AssetLookup::Failed("HTTP 500".to_string());
        }
        match self.assets.lock().await.get(filename) {
            Some(asset) => AssetLookup::Found(asset.id.clone()),
            None => AssetLookup::NotFound,
        }
    }

    async fn get_asset_description(&self, asset_id: &str) -> String {
        self.assets
            .lock()
            .await
            .values()
            .find(|asset| asset.id == asset_id)
            .map(|asset| asset.description.clone())
            .unwrap_or_default()
    }

    async fn update_asset_description(&self, asset_id: &str, description: &str) -> BridgeResult<bool> {
        let mut assets = self.assets.lock().await;
        let Some(asset) = assets.values_mut().find(|asset| asset.id == asset_id) else {
            return Ok(false);
        };
        asset.description = description.to_string();
        self.writes
            .lock()
            .await
            .push((asset_id.to_string(), description.to_string()));
        Ok(true)
    }
}

fn media_item(id: &str, filename: &str, description: Option<&str>) -> MediaItem {
    MediaItem {
        id: id.to_string(),
        filename: filename.to_string(),
        description: description.map(str::to_string),
        mime_type: Some("image/jpeg".to_string()),
        creation_time: Some("2024-05-30T10:00:00Z".to_string()),
    }
}

fn library() -> FakeLibrary {
    FakeLibrary::new(vec![
        media_item("1", "test1.jpg", Some("Test photo")),
        media_item("2", "test2.jpg", None),
    ])
}

async fn server() -> Arc<FakeServer> {
    Arc::new(
        FakeServer::default()
            .with_asset("test1.jpg", "asset123", "")
            .await
            .with_asset("test2.jpg", "asset456", "")
            .await,
    )
}

// ============================================================================
// Scenarios
// ============================================================================

#[tokio::test]
async fn test_basic_sync_updates_described_items() {
    let server = server().await;
    let coordinator = SyncCoordinator::new(
        Arc::new(library()),
        server.clone(),
        SyncOptions::default(),
    );

    let report = coordinator.run().await.unwrap();

    assert_eq!(report.total_found, 2);
    assert_eq!(report.updated, 1);
    assert_eq!(report.skipped_no_description, 1);
    assert_eq!(
        server.writes.lock().await.clone(),
        vec![("asset123".to_string(), "Test photo".to_string())]
    );
    assert_eq!(server.description_of("test1.jpg").await.as_deref(), Some("Test photo"));
    assert_eq!(server.description_of("test2.jpg").await.as_deref(), Some(""));
}

#[tokio::test]
async fn test_dry_run_reports_without_writing() {
    let server = server().await;
    let options = SyncOptions {
        dry_run: true,
        ..SyncOptions::default()
    };
    let coordinator = SyncCoordinator::new(Arc::new(library()), server.clone(), options);

    let report = coordinator.run().await.unwrap();

    assert_eq!(report.updated, 1);
    assert_eq!(report.count(ItemOutcome::WouldUpdate), 1);
    assert_eq!(server.write_count().await, 0);
    assert_eq!(server.description_of("test1.jpg").await.as_deref(), Some(""));
}

#[tokio::test]
async fn test_skip_if_present_leaves_existing_description() {
    let server = Arc::new(
        FakeServer::default()
            .with_asset("test1.jpg", "asset123", "Existing")
            .await,
    );
    let options = SyncOptions {
        strategy: SyncStrategy::SkipIfPresent,
        ..SyncOptions::default()
    };
    let coordinator = SyncCoordinator::new(Arc::new(library()), server.clone(), options);

    let report = coordinator.run().await.unwrap();

    assert_eq!(report.updated, 0);
    assert_eq!(report.skipped_already_present, 1);
    assert_eq!(server.description_of("test1.jpg").await.as_deref(), Some("Existing"));
}

#[tokio::test]
async fn test_overwrite_replaces_existing_description() {
    let server = Arc::new(
        FakeServer::default()
            .with_asset("test1.jpg", "asset123", "Existing")
            .await,
    );
    let coordinator =
        SyncCoordinator::new(Arc::new(library()), server.clone(), SyncOptions::default());

    let report = coordinator.run().await.unwrap();

    assert_eq!(report.updated, 1);
    assert_eq!(report.not_found, 0);
    assert_eq!(server.description_of("test1.jpg").await.as_deref(), Some("Test photo"));
}

#[tokio::test]
async fn test_repeated_overwrite_runs_write_same_set() {
    let server = server().await;
    let library = Arc::new(library());

    let first = SyncCoordinator::new(library.clone(), server.clone(), SyncOptions::default())
        .run()
        .await
        .unwrap();
    let second = SyncCoordinator::new(library, server.clone(), SyncOptions::default())
        .run()
        .await
        .unwrap();

    assert_eq!(first.updated_filenames(), vec!["test1.jpg"]);
    assert_eq!(first.updated_filenames(), second.updated_filenames());
    assert_eq!(
        server.writes.lock().await.clone(),
        vec![
            ("asset123".to_string(), "Test photo".to_string()),
            ("asset123".to_string(), "Test photo".to_string()),
        ]
    );
    assert_eq!(server.description_of("test1.jpg").await.as_deref(), Some("Test photo"));
}

#[tokio::test]
async fn test_skip_if_present_rerun_writes_nothing() {
    let server = server().await;
    let library = Arc::new(library());

    let first = SyncCoordinator::new(library.clone(), server.clone(), SyncOptions::default())
        .run()
        .await
        .unwrap();

    let skip = SyncOptions {
        strategy: SyncStrategy::SkipIfPresent,
        ..SyncOptions::default()
    };
    let second = SyncCoordinator::new(library, server.clone(), skip)
        .run()
        .await
        .unwrap();

    assert_eq!(first.updated, 1);
    assert_eq!(second.updated, 0);
    assert_eq!(server.write_count().await, 1);
    assert_eq!(server.description_of("test1.jpg").await.as_deref(), Some("Test photo"));
}

#[tokio::test]
async fn test_unknown_and_unsearchable_items_continue() {
    let mut server = FakeServer::default()
        .with_asset("test1.jpg", "asset123", "")
        .await;
    server.broken_search = vec!["broken.jpg".to_string()];
    let server = Arc::new(server);

    let library = FakeLibrary::new(vec![
        media_item("1", "broken.jpg", Some("Lost")),
        media_item("2", "orphan.jpg", Some("Nowhere")),
        media_item("3", "test1.jpg", Some("Test photo")),
    ]);

    let report = SyncCoordinator::new(Arc::new(library), server.clone(), SyncOptions::default())
        .run()
        .await
        .unwrap();

    assert_eq!(report.total_found, 3);
    assert_eq!(report.lookup_failed, 1);
    assert_eq!(report.not_found, 1);
    assert_eq!(report.updated_filenames(), vec!["test1.jpg"]);
}

#[tokio::test]
async fn test_empty_window() {
    let server = server().await;
    let report = SyncCoordinator::new(
        Arc::new(FakeLibrary::new(Vec::new())),
        server.clone(),
        SyncOptions::default(),
    )
    .run()
    .await
    .unwrap();

    assert_eq!(report.total_found, 0);
    assert_eq!(report.updated, 0);
    assert!(report.outcomes.is_empty());
}

#[tokio::test]
async fn test_library_failure_fails_run() {
    let server = server().await;
    let err = SyncCoordinator::new(
        Arc::new(FakeLibrary::failing("Google Photos API error (403): forbidden")),
        server.clone(),
        SyncOptions::default(),
    )
    .run()
    .await
    .unwrap_err();

    assert!(matches!(err, SyncError::Source(_)));
    assert_eq!(server.write_count().await, 0);
}
