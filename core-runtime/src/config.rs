//! # Sync Configuration Module
//!
//! Provides the typed configuration for a sync run.
//!
//! ## Overview
//!
//! Configuration is read once from the process environment (a `.env` file is
//! expected to have been loaded by the binary beforehand) and is immutable
//! afterwards. Parsing is fail-fast: malformed values produce an
//! [`Error::Config`] with an actionable message instead of silently falling
//! back to a default.
//!
//! ## Environment
//!
//! | Variable                  | Default            | Notes                                   |
//! |---------------------------|--------------------|-----------------------------------------|
//! | `GOOGLE_CREDENTIALS_PATH` | `credentials.json` | OAuth client-secret file                |
//! | `GOOGLE_TOKEN_PATH`       | `token.json`       | Persisted OAuth token                   |
//! | `IMMICH_BASE_URL`         | required           | Trailing slashes are trimmed            |
//! | `IMMICH_API_KEY`          | required           | Never logged                            |
//! | `DAYS_BACK`               | `15`               | Non-negative integer                    |
//! | `DRY_RUN`                 | `false`            | `1`, `true`, `yes` (any case) are true  |
//! | `SYNC_STRATEGY`           | `overwrite`        | `overwrite` or `skip_if_present`        |
//! | `LOG_LEVEL`               | `info`             | trace, debug, info, warn, error         |
//! | `LOG_FORMAT`              | build dependent    | pretty, json, compact                   |
//! | `RUST_LOG`                | unset              | Overrides the level-derived filter      |
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::SyncConfig;
//!
//! dotenvy::dotenv().ok();
//! let config = SyncConfig::from_env()?;
//! ```

use crate::error::{Error, Result};
use crate::logging::{redact_if_sensitive, LogFormat, LogLevel, LoggingConfig};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

pub const DEFAULT_CREDENTIALS_PATH: &str = "credentials.json";
pub const DEFAULT_TOKEN_PATH: &str = "token.json";
pub const DEFAULT_DAYS_BACK: u32 = 15;

/// How an existing description on the target is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncStrategy {
    /// Always write the source description
    #[default]
    Overwrite,
    /// Leave assets that already carry a non-empty description untouched
    SkipIfPresent,
}

impl SyncStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncStrategy::Overwrite => "overwrite",
            SyncStrategy::SkipIfPresent => "skip_if_present",
        }
    }
}

impl fmt::Display for SyncStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SyncStrategy {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "overwrite" => Ok(SyncStrategy::Overwrite),
            "skip_if_present" => Ok(SyncStrategy::SkipIfPresent),
            other => Err(Error::Config(format!(
                "Unknown SYNC_STRATEGY '{}'. Use 'overwrite' or 'skip_if_present'.",
                other
            ))),
        }
    }
}

/// Configuration for one sync run.
#[derive(Clone, PartialEq, Eq)]
pub struct SyncConfig {
    /// Path to the Google OAuth client-secret JSON
    pub google_credentials_path: PathBuf,

    /// Path to the persisted OAuth token
    pub token_path: PathBuf,

    /// Immich API base URL without trailing slash
    pub immich_base_url: String,

    /// Immich API key
    pub immich_api_key: String,

    /// Lookback window in days
    pub days_back: u32,

    /// Suppress writes to Immich
    pub dry_run: bool,

    /// Conflict strategy
    pub sync_strategy: SyncStrategy,

    /// Minimum log level
    pub log_level: LogLevel,

    /// Log output format
    pub log_format: LogFormat,

    /// Custom tracing filter (`RUST_LOG`)
    pub log_filter: Option<String>,
}

impl fmt::Debug for SyncConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncConfig")
            .field("google_credentials_path", &self.google_credentials_path)
            .field("token_path", &self.token_path)
            .field("immich_base_url", &self.immich_base_url)
            .field(
                "immich_api_key",
                &redact_if_sensitive("immich_api_key", &self.immich_api_key),
            )
            .field("days_back", &self.days_back)
            .field("dry_run", &self.dry_run)
            .field("sync_strategy", &self.sync_strategy)
            .field("log_level", &self.log_level)
            .field("log_format", &self.log_format)
            .field("log_filter", &self.log_filter)
            .finish()
    }
}

impl SyncConfig {
    /// Creates a new builder for constructing a `SyncConfig`.
    pub fn builder() -> SyncConfigBuilder {
        SyncConfigBuilder::default()
    }

    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let mut builder = Self::builder();

        if let Some(path) = get("GOOGLE_CREDENTIALS_PATH") {
            builder = builder.google_credentials_path(path);
        }
        if let Some(path) = get("GOOGLE_TOKEN_PATH") {
            builder = builder.token_path(path);
        }
        if let Some(url) = get("IMMICH_BASE_URL") {
            builder = builder.immich_base_url(url);
        }
        if let Some(key) = get("IMMICH_API_KEY") {
            builder = builder.immich_api_key(key);
        }
        if let Some(days) = get("DAYS_BACK") {
            let days = days.parse::<u32>().map_err(|_| {
                Error::Config(format!(
                    "DAYS_BACK must be a non-negative integer, got '{}'",
                    days
                ))
            })?;
            builder = builder.days_back(days);
        }
        if let Some(flag) = get("DRY_RUN") {
            builder = builder.dry_run(parse_flag(&flag));
        }
        if let Some(strategy) = get("SYNC_STRATEGY") {
            builder = builder.sync_strategy(strategy.parse()?);
        }
        if let Some(level) = get("LOG_LEVEL") {
            builder = builder.log_level(level.parse()?);
        }
        if let Some(format) = get("LOG_FORMAT") {
            builder = builder.log_format(format.parse()?);
        }
        if let Some(filter) = get("RUST_LOG") {
            builder = builder.log_filter(filter);
        }

        builder.build()
    }

    /// Logging settings derived from this configuration.
    pub fn logging_config(&self) -> LoggingConfig {
        let config = LoggingConfig::default()
            .with_level(self.log_level)
            .with_format(self.log_format);

        match &self.log_filter {
            Some(filter) => config.with_filter(filter.clone()),
            None => config,
        }
    }

    /// Validates the configuration and returns an error if invalid.
    pub fn validate(&self) -> Result<()> {
        if self.google_credentials_path.as_os_str().is_empty() {
            return Err(Error::Config(
                "Google credentials path cannot be empty".to_string(),
            ));
        }

        if self.token_path.as_os_str().is_empty() {
            return Err(Error::Config("Token path cannot be empty".to_string()));
        }

        if !(self.immich_base_url.starts_with("http://")
            || self.immich_base_url.starts_with("https://"))
        {
            return Err(Error::Config(format!(
                "IMMICH_BASE_URL must start with http:// or https://, got '{}'",
                self.immich_base_url
            )));
        }

        Ok(())
    }
}

/// Parse a boolean environment flag: `1`, `true` and `yes` are true,
/// case-insensitively; anything else is false.
pub fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes"
    )
}

/// Builder for constructing [`SyncConfig`] instances.
#[derive(Default)]
pub struct SyncConfigBuilder {
    google_credentials_path: Option<PathBuf>,
    token_path: Option<PathBuf>,
    immich_base_url: Option<String>,
    immich_api_key: Option<String>,
    days_back: Option<u32>,
    dry_run: bool,
    sync_strategy: SyncStrategy,
    log_level: Option<LogLevel>,
    log_format: Option<LogFormat>,
    log_filter: Option<String>,
}

impl SyncConfigBuilder {
    pub fn google_credentials_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.google_credentials_path = Some(path.into());
        self
    }

    pub fn token_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.token_path = Some(path.into());
        self
    }

    pub fn immich_base_url(mut self, url: impl Into<String>) -> Self {
        self.immich_base_url = Some(url.into());
        self
    }

    pub fn immich_api_key(mut self, key: impl Into<String>) -> Self {
        self.immich_api_key = Some(key.into());
        self
    }

    pub fn days_back(mut self, days: u32) -> Self {
        self.days_back = Some(days);
        self
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn sync_strategy(mut self, strategy: SyncStrategy) -> Self {
        self.sync_strategy = strategy;
        self
    }

    pub fn log_level(mut self, level: LogLevel) -> Self {
        self.log_level = Some(level);
        self
    }

    pub fn log_format(mut self, format: LogFormat) -> Self {
        self.log_format = Some(format);
        self
    }

    pub fn log_filter(mut self, filter: impl Into<String>) -> Self {
        self.log_filter = Some(filter.into());
        self
    }

    /// Builds the final [`SyncConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when the Immich URL or API key is missing or
    /// when validation fails.
    pub fn build(self) -> Result<SyncConfig> {
        let immich_base_url = self
            .immich_base_url
            .map(|url| url.trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty())
            .ok_or_else(|| {
                Error::Config(
                    "IMMICH_BASE_URL is required, e.g. http://immich.local:2283/api".to_string(),
                )
            })?;

        let immich_api_key = self.immich_api_key.filter(|key| !key.is_empty()).ok_or_else(|| {
            Error::Config(
                "IMMICH_API_KEY is required. Create one under Account Settings > API Keys in Immich."
                    .to_string(),
            )
        })?;

        let config = SyncConfig {
            google_credentials_path: self
                .google_credentials_path
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CREDENTIALS_PATH)),
            token_path: self
                .token_path
                .unwrap_or_else(|| PathBuf::from(DEFAULT_TOKEN_PATH)),
            immich_base_url,
            immich_api_key,
            days_back: self.days_back.unwrap_or(DEFAULT_DAYS_BACK),
            dry_run: self.dry_run,
            sync_strategy: self.sync_strategy,
            log_level: self.log_level.unwrap_or(LogLevel::Info),
            log_format: self.log_format.unwrap_or_default(),
            log_filter: self.log_filter,
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    fn required() -> Vec<(&'static str, &'static str)> {
        vec![
            ("IMMICH_BASE_URL", "http://immich.local:2283/api"),
            ("IMMICH_API_KEY", "key-123"),
        ]
    }

    #[test]
    fn test_defaults() {
        let config = SyncConfig::from_lookup(lookup_from(&required())).unwrap();

        assert_eq!(config.google_credentials_path, PathBuf::from("credentials.json"));
        assert_eq!(config.token_path, PathBuf::from("token.json"));
        assert_eq!(config.immich_base_url, "http://immich.local:2283/api");
        assert_eq!(config.days_back, 15);
        assert!(!config.dry_run);
        assert_eq!(config.sync_strategy, SyncStrategy::Overwrite);
        assert_eq!(config.log_level, LogLevel::Info);
        assert_eq!(config.log_filter, None);
    }

    #[test]
    fn test_all_values() {
        let mut vars = required();
        vars.extend([
            ("GOOGLE_CREDENTIALS_PATH", "/etc/sync/client.json"),
            ("GOOGLE_TOKEN_PATH", "/var/lib/sync/token.json"),
            ("DAYS_BACK", "30"),
            ("DRY_RUN", "YES"),
            ("SYNC_STRATEGY", "skip_if_present"),
            ("LOG_LEVEL", "debug"),
            ("LOG_FORMAT", "json"),
            ("RUST_LOG", "core_sync=trace"),
        ]);

        let config = SyncConfig::from_lookup(lookup_from(&vars)).unwrap();

        assert_eq!(
            config.google_credentials_path,
            PathBuf::from("/etc/sync/client.json")
        );
        assert_eq!(config.token_path, PathBuf::from("/var/lib/sync/token.json"));
        assert_eq!(config.days_back, 30);
        assert!(config.dry_run);
        assert_eq!(config.sync_strategy, SyncStrategy::SkipIfPresent);
        assert_eq!(config.log_level, LogLevel::Debug);
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.log_filter.as_deref(), Some("core_sync=trace"));
    }

    #[test]
    fn test_dry_run_flag_values() {
        for truthy in ["1", "true", "TRUE", "Yes", " yes "] {
            assert!(parse_flag(truthy), "{truthy} should be true");
        }
        for falsy in ["0", "false", "no", "on", "enabled", ""] {
            assert!(!parse_flag(falsy), "{falsy} should be false");
        }
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let config = SyncConfig::from_lookup(lookup_from(&[
            ("IMMICH_BASE_URL", "http://immich.local/api//"),
            ("IMMICH_API_KEY", "k"),
        ]))
        .unwrap();

        assert_eq!(config.immich_base_url, "http://immich.local/api");
    }

    #[test]
    fn test_invalid_days_back_is_config_error() {
        let mut vars = required();
        vars.push(("DAYS_BACK", "two weeks"));

        let err = SyncConfig::from_lookup(lookup_from(&vars)).unwrap_err();
        assert!(matches!(err, Error::Config(msg) if msg.contains("DAYS_BACK")));

        let mut vars = required();
        vars.push(("DAYS_BACK", "-3"));
        assert!(SyncConfig::from_lookup(lookup_from(&vars)).is_err());
    }

    #[test]
    fn test_days_back_zero_is_allowed() {
        let mut vars = required();
        vars.push(("DAYS_BACK", "0"));

        let config = SyncConfig::from_lookup(lookup_from(&vars)).unwrap();
        assert_eq!(config.days_back, 0);
    }

    #[test]
    fn test_unknown_strategy_is_config_error() {
        let mut vars = required();
        vars.push(("SYNC_STRATEGY", "merge"));

        let err = SyncConfig::from_lookup(lookup_from(&vars)).unwrap_err();
        assert!(matches!(err, Error::Config(msg) if msg.contains("merge")));
    }

    #[test]
    fn test_missing_immich_settings() {
        let err = SyncConfig::from_lookup(lookup_from(&[("IMMICH_API_KEY", "k")])).unwrap_err();
        assert!(matches!(err, Error::Config(msg) if msg.contains("IMMICH_BASE_URL")));

        let err = SyncConfig::from_lookup(lookup_from(&[(
            "IMMICH_BASE_URL",
            "http://immich.local",
        )]))
        .unwrap_err();
        assert!(matches!(err, Error::Config(msg) if msg.contains("IMMICH_API_KEY")));
    }

    #[test]
    fn test_base_url_requires_scheme() {
        let err = SyncConfig::from_lookup(lookup_from(&[
            ("IMMICH_BASE_URL", "immich.local"),
            ("IMMICH_API_KEY", "k"),
        ]))
        .unwrap_err();

        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let config = SyncConfig::from_lookup(lookup_from(&required())).unwrap();
        let debug = format!("{:?}", config);

        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("key-123"));
    }

    #[test]
    fn test_logging_config_follows_settings() {
        let mut vars = required();
        vars.extend([("LOG_LEVEL", "warning"), ("LOG_FORMAT", "compact")]);

        let logging = SyncConfig::from_lookup(lookup_from(&vars))
            .unwrap()
            .logging_config();

        assert_eq!(logging.level, LogLevel::Warn);
        assert_eq!(logging.format, LogFormat::Compact);
        assert_eq!(logging.filter, None);
    }

    #[test]
    fn test_strategy_display_round_trips() {
        for strategy in [SyncStrategy::Overwrite, SyncStrategy::SkipIfPresent] {
            assert_eq!(strategy.to_string().parse::<SyncStrategy>().unwrap(), strategy);
        }
    }
}
