//! Loading configuration from the real process environment.
//!
//! Kept to a single test so nothing else in this binary races on the
//! environment.

use core_runtime::config::{SyncConfig, SyncStrategy};
use core_runtime::logging::LogLevel;
use std::path::PathBuf;

#[test]
fn test_from_env_reads_process_environment() {
    for key in [
        "GOOGLE_CREDENTIALS_PATH",
        "GOOGLE_TOKEN_PATH",
        "DRY_RUN",
        "LOG_FORMAT",
        "RUST_LOG",
    ] {
        std::env::remove_var(key);
    }
    std::env::set_var("IMMICH_BASE_URL", "https://photos.example.org/api/");
    std::env::set_var("IMMICH_API_KEY", "env-key");
    std::env::set_var("DAYS_BACK", "7");
    std::env::set_var("SYNC_STRATEGY", "SKIP_IF_PRESENT");
    std::env::set_var("LOG_LEVEL", "error");

    let config = SyncConfig::from_env().unwrap();

    assert_eq!(config.google_credentials_path, PathBuf::from("credentials.json"));
    assert_eq!(config.immich_base_url, "https://photos.example.org/api");
    assert_eq!(config.immich_api_key, "env-key");
    assert_eq!(config.days_back, 7);
    assert!(!config.dry_run);
    assert_eq!(config.sync_strategy, SyncStrategy::SkipIfPresent);
    assert_eq!(config.log_level, LogLevel::Error);

    std::env::set_var("DAYS_BACK", "soon");
    assert!(SyncConfig::from_env().is_err());
}
