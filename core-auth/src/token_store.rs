//! Token Persistence
//!
//! Persists the OAuth token set through the [`SecureStore`] trait. The stored
//! document uses Google's "authorized user" layout so a token file written by
//! other Google client libraries can be reused as-is:
//!
//! ```json
//! {
//!   "token": "ya29...",
//!   "refresh_token": "1//...",
//!   "token_uri": "https://oauth2.googleapis.com/token",
//!   "client_id": "123.apps.googleusercontent.com",
//!   "scopes": ["https://www.googleapis.com/auth/photoslibrary.readonly"],
//!   "expiry": "2024-06-01T13:00:00Z"
//! }
//! ```
//!
//! The client secret is never written.
//!
//! ## Example
//!
//! ```no_run
//! use core_auth::{OAuthTokens, TokenStore};
//! use std::sync::Arc;
//! # use bridge_traits::storage::SecureStore;
//! # async fn example(secure_store: Arc<dyn SecureStore>) -> core_auth::Result<()> {
//! let token_store = TokenStore::new(secure_store, "token.json");
//!
//! let tokens = OAuthTokens::new("ya29...".to_string(), None, 3600, chrono::Utc::now());
//! token_store.store_tokens(&tokens).await?;
//!
//! let retrieved = token_store.retrieve_tokens().await?;
//! token_store.delete_tokens().await?;
//! # Ok(())
//! # }
//! ```

use crate::error::{AuthError, Result};
use crate::types::OAuthTokens;
use bridge_traits::storage::SecureStore;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Persistent storage for the OAuth token set.
///
/// Token values are never logged; failures are reported without exposing them.
#[derive(Clone)]
pub struct TokenStore {
    secure_store: Arc<dyn SecureStore>,
    key: String,
    client_id: Option<String>,
    token_uri: Option<String>,
}

/// On-disk token document.
#[derive(Debug, Serialize, Deserialize)]
struct StoredTokens {
    #[serde(alias = "access_token")]
    token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    token_uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    client_id: Option<String>,
    #[serde(default)]
    scopes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    expiry: Option<DateTime<Utc>>,
}

impl TokenStore {
    /// Create a token store keeping the token under `key`.
    pub fn new(secure_store: Arc<dyn SecureStore>, key: impl Into<String>) -> Self {
        let key = key.into();
        debug!(key = %key, "Initializing TokenStore");
        Self {
            secure_store,
            key,
            client_id: None,
            token_uri: None,
        }
    }

    /// Record the client registration alongside the token.
    pub fn with_client(mut self, client_id: impl Into<String>, token_uri: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self.token_uri = Some(token_uri.into());
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Store the token set, replacing whatever was stored before.
    pub async fn store_tokens(&self, tokens: &OAuthTokens) -> Result<()> {
        let stored = StoredTokens {
            token: tokens.access_token.clone(),
            refresh_token: tokens.refresh_token.clone(),
            token_uri: self.token_uri.clone(),
            client_id: self.client_id.clone(),
            scopes: tokens.scopes.clone(),
            expiry: tokens.expires_at,
        };

        let json = serde_json::to_vec_pretty(&stored)
            .map_err(|e| AuthError::Other(format!("Failed to serialize tokens: {}", e)))?;

        self.secure_store
            .set_secret(&self.key, &json)
            .await
            .map_err(|e| {
                warn!(key = %self.key, error = %e, "Failed to persist tokens");
                AuthError::SecureStorageUnavailable(e.to_string())
            })?;

        info!(
            key = %self.key,
            has_refresh_token = stored.refresh_token.is_some(),
            "Tokens stored"
        );

        Ok(())
    }

    /// Retrieve the stored token set.
    ///
    /// Returns:
    /// - `Ok(Some(tokens))` if a readable token exists
    /// - `Ok(None)` if nothing is stored, or the stored data was unreadable
    ///   (it is deleted so the next run starts clean)
    /// - `Err` if the store itself is unavailable
    pub async fn retrieve_tokens(&self) -> Result<Option<OAuthTokens>> {
        let data = self.secure_store.get_secret(&self.key).await.map_err(|e| {
            warn!(key = %self.key, error = %e, "Failed to read stored tokens");
            AuthError::SecureStorageUnavailable(e.to_string())
        })?;

        let Some(data) = data else {
            debug!(key = %self.key, "No stored tokens");
            return Ok(None);
        };

        let stored: StoredTokens = match serde_json::from_slice(&data) {
            Ok(stored) => stored,
            Err(e) => {
                warn!(
                    key = %self.key,
                    error = %e,
                    "Stored tokens are unreadable, discarding them"
                );

                if let Err(delete_err) = self.secure_store.delete_secret(&self.key).await {
                    warn!(
                        key = %self.key,
                        error = %delete_err,
                        "Failed to delete corrupted token data"
                    );
                }

                return Ok(None);
            }
        };

        debug!(
            key = %self.key,
            has_refresh_token = stored.refresh_token.is_some(),
            expiry = ?stored.expiry,
            "Loaded stored tokens"
        );

        Ok(Some(OAuthTokens {
            access_token: stored.token,
            refresh_token: stored.refresh_token,
            expires_at: stored.expiry,
            scopes: stored.scopes,
        }))
    }

    /// Delete the stored token set. Succeeds when nothing is stored.
    pub async fn delete_tokens(&self) -> Result<()> {
        self.secure_store
            .delete_secret(&self.key)
            .await
            .map_err(|e| {
                warn!(key = %self.key, error = %e, "Failed to delete stored tokens");
                AuthError::SecureStorageUnavailable(e.to_string())
            })?;

        info!(key = %self.key, "Stored tokens deleted");

        Ok(())
    }
}
