//! # Authentication Manager
//!
//! Obtains a valid Google access token for a sync run.
//!
//! ## Overview
//!
//! [`AuthManager`] resolves credentials in this order:
//!
//! 1. A stored token that is still valid is used as-is.
//! 2. An expired token with a refresh token is refreshed and re-stored. If the
//!    refresh fails the stored token is deleted and the run fails with a
//!    re-authentication message.
//! 3. Otherwise the interactive [`ConsentFlow`] runs and its result is stored.
//!
//! Every step is reported to the injected [`SyncObserver`].
//!
//! ## Usage
//!
//! ```no_run
//! use core_auth::{AuthManager, CredentialProvider, LoopbackConsent, OAuthConfig,
//!     OAuthFlowManager, TokenStore};
//! use std::sync::Arc;
//! # use bridge_traits::{http::HttpClient, SecureStore};
//! # async fn example(
//! #     http_client: Arc<dyn HttpClient>,
//! #     secure_store: Arc<dyn SecureStore>,
//! #     secrets: core_auth::ClientSecrets,
//! # ) -> core_auth::Result<()> {
//! let oauth = OAuthFlowManager::new(
//!     OAuthConfig::google_photos(&secrets, "http://127.0.0.1/"),
//!     http_client,
//! );
//! let consent = LoopbackConsent::new(|url| eprintln!("Open {url}"));
//! let manager = AuthManager::new(
//!     TokenStore::new(secure_store, "token.json"),
//!     oauth,
//!     Arc::new(consent),
//! );
//!
//! let access_token = manager.access_token().await?;
//! # Ok(())
//! # }
//! ```

use crate::error::{AuthError, Result};
use crate::loopback::ConsentFlow;
use crate::oauth::OAuthFlowManager;
use crate::token_store::TokenStore;
use crate::types::OAuthTokens;
use async_trait::async_trait;
use bridge_traits::time::{Clock, SystemClock};
use core_runtime::events::{AuthEvent, CoreEvent, NoopObserver, SyncObserver};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::{timeout, Duration};
use tracing::{debug, error, info, instrument, warn};

/// Default timeout for a token refresh round trip
const DEFAULT_AUTH_TIMEOUT: Duration = Duration::from_secs(120);

/// Buffer time before token expiration to trigger refresh (5 minutes)
const TOKEN_REFRESH_BUFFER: Duration = Duration::from_secs(300);

/// Source of Google access tokens.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// Return a valid token set, running whatever flow is needed.
    async fn acquire(&self) -> Result<OAuthTokens>;

    /// Convenience for callers that only need the bearer token.
    async fn access_token(&self) -> Result<String> {
        Ok(self.acquire().await?.access_token)
    }
}

/// A fixed token, for callers that already hold one.
#[derive(Clone)]
pub struct StaticCredentials {
    tokens: OAuthTokens,
}

impl StaticCredentials {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            tokens: OAuthTokens {
                access_token: access_token.into(),
                refresh_token: None,
                expires_at: None,
                scopes: Vec::new(),
            },
        }
    }
}

#[async_trait]
impl CredentialProvider for StaticCredentials {
    async fn acquire(&self) -> Result<OAuthTokens> {
        Ok(self.tokens.clone())
    }
}

/// Loads, refreshes or interactively obtains the Google token.
pub struct AuthManager {
    token_store: TokenStore,
    oauth: OAuthFlowManager,
    consent: Arc<dyn ConsentFlow>,
    clock: Arc<dyn Clock>,
    observer: Arc<dyn SyncObserver>,
    /// Serializes acquisitions so two callers never refresh concurrently
    acquire_lock: Mutex<()>,
}

impl AuthManager {
    pub fn new(token_store: TokenStore, oauth: OAuthFlowManager, consent: Arc<dyn ConsentFlow>) -> Self {
        Self {
            token_store,
            oauth,
            consent,
            clock: Arc::new(SystemClock),
            observer: Arc::new(NoopObserver),
            acquire_lock: Mutex::new(()),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn SyncObserver>) -> Self {
        self.observer = observer;
        self
    }

    fn emit(&self, event: AuthEvent) {
        self.observer.on_event(CoreEvent::Auth(event));
    }

    /// Refresh `tokens` and persist the result.
    ///
    /// On failure the stored token is deleted so the next run starts with
    /// the consent flow.
    #[instrument(skip(self, tokens))]
    pub async fn refresh(&self, tokens: &OAuthTokens) -> Result<OAuthTokens> {
        let refresh_token = match tokens.refresh_token.as_deref() {
            Some(token) if !token.is_empty() => token,
            _ => return Err(AuthError::NoRefreshToken),
        };

        self.emit(AuthEvent::TokenRefreshing);
        info!("Token expired or expiring soon, refreshing");

        let refreshed = match timeout(
            DEFAULT_AUTH_TIMEOUT,
            self.oauth.refresh_access_token(refresh_token),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(AuthError::OperationTimeout {
                operation: "token refresh".to_string(),
            }),
        };

        let refreshed = match refreshed {
            Ok(refreshed) => refreshed,
            Err(e) => {
                error!(error = %e, "Token refresh failed");
                if let Err(delete_err) = self.token_store.delete_tokens().await {
                    warn!(error = %delete_err, "Failed to delete stale token");
                }
                self.emit(AuthEvent::AuthError {
                    message: format!("Token refresh failed: {}", e),
                    recoverable: false,
                });
                return Err(match e {
                    AuthError::TokenRefreshFailed(_) => e,
                    other => AuthError::TokenRefreshFailed(other.to_string()),
                });
            }
        };

        self.token_store.store_tokens(&refreshed).await?;
        self.emit(AuthEvent::TokenRefreshed {
            expires_at: refreshed.expires_at.map(|at| at.timestamp()),
        });

        info!("Token refreshed successfully");
        Ok(refreshed)
    }

    /// Run the interactive consent flow and persist the result.
    #[instrument(skip(self))]
    pub async fn sign_in(&self) -> Result<OAuthTokens> {
        info!("No valid token available, starting authorization flow");

        let tokens = match self.consent.authorize(&self.oauth).await {
            Ok(tokens) => tokens,
            Err(e) => {
                error!(error = %e, "Authorization failed");
                self.emit(AuthEvent::AuthError {
                    message: e.to_string(),
                    recoverable: false,
                });
                return Err(e);
            }
        };

        self.token_store.store_tokens(&tokens).await?;
        self.emit(AuthEvent::SignedIn);

        info!(
            has_refresh_token = tokens.has_refresh_token(),
            "Authorization completed"
        );
        Ok(tokens)
    }
}

#[async_trait]
impl CredentialProvider for AuthManager {
    #[instrument(skip(self))]
    async fn acquire(&self) -> Result<OAuthTokens> {
        let _guard = self.acquire_lock.lock().await;

        let Some(tokens) = self.token_store.retrieve_tokens().await? else {
            return self.sign_in().await;
        };

        let now = self.clock.now();
        if !tokens.is_expired_at(now, TOKEN_REFRESH_BUFFER.as_secs() as i64) {
            debug!("Stored token is valid, no refresh needed");
            self.emit(AuthEvent::TokenLoaded {
                expires_at: tokens.expires_at.map(|at| at.timestamp()),
            });
            return Ok(tokens);
        }

        if tokens.has_refresh_token() {
            return self.refresh(&tokens).await;
        }

        warn!("Stored token expired and has no refresh token, discarding it");
        self.token_store.delete_tokens().await?;
        self.sign_in().await
    }
}
