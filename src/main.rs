//! Copies Google Photos descriptions onto matching Immich assets.
//!
//! Configuration comes from the environment (and an optional `.env` file).
//! Progress is logged to stderr; the configuration summary and final result
//! go to stdout.

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use bridge_desktop::{FileSecureStore, ReqwestHttpClient};
use bridge_traits::http::HttpClient;
use core_auth::{
    AuthManager, ClientSecrets, CredentialProvider, LoopbackConsent, OAuthConfig,
    OAuthFlowManager, TokenStore,
};
use core_runtime::events::{EventSeverity, DEFAULT_EVENT_BUFFER_SIZE};
use core_runtime::logging::init_logging;
use core_runtime::{CoreEvent, EventBus, SyncConfig, SyncObserver};
use core_sync::{SyncCoordinator, SyncOptions, SyncReport};
use provider_google_photos::GooglePhotosClient;
use provider_immich::ImmichClient;
use tokio::sync::broadcast::{error::RecvError, Receiver};
use tracing::{debug, error, info, warn};

/// Placeholder redirect; the consent flow substitutes its bound loopback port.
const LOOPBACK_REDIRECT: &str = "http://127.0.0.1";

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    let config = match SyncConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = init_logging(config.logging_config()) {
        eprintln!("Error: {}", e);
        return ExitCode::FAILURE;
    }

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(config: SyncConfig) -> anyhow::Result<()> {
    print_config(&config);

    let events = EventBus::new(DEFAULT_EVENT_BUFFER_SIZE);
    let log_task = tokio::spawn(log_events(events.subscribe()));

    // Every clone of the bus lives inside `sync`; once it returns the channel
    // closes and the log task drains what is left.
    let result = sync(&config, events).await;
    let _ = log_task.await;

    let report = result?;
    print_report(&report);

    Ok(())
}

async fn sync(config: &SyncConfig, events: EventBus) -> anyhow::Result<SyncReport> {
    let observer: Arc<dyn SyncObserver> = Arc::new(events);

    let http_client: Arc<dyn HttpClient> =
        Arc::new(ReqwestHttpClient::try_new().context("Failed to create HTTP client")?);

    // Google
    let secrets = ClientSecrets::load(&config.google_credentials_path)
        .await
        .context("Failed to load Google client secrets")?;

    let (store, key) = FileSecureStore::for_file(&config.token_path)
        .context("Invalid token path")?;
    let token_store = TokenStore::new(Arc::new(store), key)
        .with_client(secrets.client_id.clone(), secrets.token_uri.clone());

    let oauth = OAuthFlowManager::new(
        OAuthConfig::google_photos(&secrets, LOOPBACK_REDIRECT),
        http_client.clone(),
    );
    let consent = LoopbackConsent::new(|auth_url| {
        println!("Please visit this URL to authorize this application:");
        println!("{}", auth_url);
    })
    .with_observer(observer.clone());

    let auth = Arc::new(
        AuthManager::new(token_store, oauth, Arc::new(consent)).with_observer(observer.clone()),
    );
    auth.acquire()
        .await
        .context("Google Photos authentication failed")?;

    // Immich
    let immich = Arc::new(ImmichClient::new(
        http_client.clone(),
        config.immich_base_url.clone(),
        config.immich_api_key.clone(),
    ));
    if let Err(e) = immich.ping().await {
        warn!(error = %e, "Immich server at {} did not answer ping", immich.base_url());
    }

    let photos = Arc::new(GooglePhotosClient::new(http_client, auth));

    let coordinator = SyncCoordinator::new(photos, immich, SyncOptions::from(config))
        .with_observer(observer);

    coordinator.run().await.context("Sync failed")
}

fn print_config(config: &SyncConfig) {
    debug!(?config, "Configuration loaded");
    println!("Config loaded:");
    println!("- Google credentials: {}", config.google_credentials_path.display());
    println!("- Immich URL: {}", config.immich_base_url);
    println!("- Days back: {}", config.days_back);
    println!("- Dry run: {}", config.dry_run);
    println!("- Strategy: {}", config.sync_strategy);
}

fn print_report(report: &SyncReport) {
    println!("Found {} items", report.total_found);
    if report.dry_run {
        println!("Updated {} items (dry run, nothing written)", report.updated);
    } else {
        println!("Updated {} items", report.updated);
    }
    println!("- Skipped (no description): {}", report.skipped_no_description);
    println!("- Skipped (already described): {}", report.skipped_already_present);
    println!("- Not found in Immich: {}", report.not_found);
    println!("- Lookup failed: {}", report.lookup_failed);
    println!("- Update failed: {}", report.update_failed);
}

/// Mirror structured events into the log.
async fn log_events(mut receiver: Receiver<CoreEvent>) {
    loop {
        match receiver.recv().await {
            Ok(event) => match event.severity() {
                EventSeverity::Debug => debug!(?event, "{}", event.description()),
                _ => info!(?event, "{}", event.description()),
            },
            Err(RecvError::Lagged(skipped)) => {
                debug!(skipped, "Event log fell behind");
            }
            Err(RecvError::Closed) => break,
        }
    }
}
