use crate::error::{AuthError, Result};
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use std::fmt;
use std::path::Path;

/// Google Photos read-only scope.
pub const PHOTOS_READONLY_SCOPE: &str = "https://www.googleapis.com/auth/photoslibrary.readonly";

pub const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/auth";
pub const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// OAuth 2.0 token set.
///
/// # Security
///
/// Tokens should be stored securely and never logged. The `Debug` implementation
/// redacts sensitive information.
///
/// # Examples
///
/// ```
/// use core_auth::OAuthTokens;
/// use chrono::{Duration, Utc};
///
/// let now = Utc::now();
/// let tokens = OAuthTokens::new("ya29.a0...".to_string(), None, 3600, now);
///
/// assert!(!tokens.is_expired_at(now, 300));
/// assert!(tokens.is_expired_at(now + Duration::hours(2), 0));
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct OAuthTokens {
    /// The access token used for API requests
    pub access_token: String,
    /// The refresh token used to obtain new access tokens
    pub refresh_token: Option<String>,
    /// When the access token expires (UTC); `None` when unknown
    pub expires_at: Option<DateTime<Utc>>,
    /// Scopes granted with this token
    pub scopes: Vec<String>,
}

impl OAuthTokens {
    /// Create a new token set expiring `expires_in` seconds after `issued_at`.
    pub fn new(
        access_token: String,
        refresh_token: Option<String>,
        expires_in: i64,
        issued_at: DateTime<Utc>,
    ) -> Self {
        Self {
            access_token,
            refresh_token,
            expires_at: Some(issued_at + Duration::seconds(expires_in)),
            scopes: Vec::new(),
        }
    }

    pub fn with_scopes(mut self, scopes: Vec<String>) -> Self {
        self.scopes = scopes;
        self
    }

    /// Whether the token is expired at `now`, treating anything expiring
    /// within `buffer_seconds` as already expired.
    ///
    /// A token without a known expiry is considered expired.
    pub fn is_expired_at(&self, now: DateTime<Utc>, buffer_seconds: i64) -> bool {
        match self.expires_at {
            Some(expires_at) => now >= expires_at - Duration::seconds(buffer_seconds),
            None => true,
        }
    }

    pub fn has_refresh_token(&self) -> bool {
        self.refresh_token
            .as_deref()
            .is_some_and(|token| !token.is_empty())
    }
}

// Custom Debug implementation to avoid logging tokens
impl fmt::Debug for OAuthTokens {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuthTokens")
            .field("access_token", &"[REDACTED]")
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("expires_at", &self.expires_at)
            .field("scopes", &self.scopes)
            .finish()
    }
}

/// OAuth client registration loaded from a Google client-secret file.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct ClientSecrets {
    pub client_id: String,
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default = "default_auth_uri")]
    pub auth_uri: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
    #[serde(default)]
    pub redirect_uris: Vec<String>,
}

fn default_auth_uri() -> String {
    GOOGLE_AUTH_URL.to_string()
}

fn default_token_uri() -> String {
    GOOGLE_TOKEN_URL.to_string()
}

/// On-disk layout: the registration sits under `installed` for desktop
/// clients or `web` for web clients.
#[derive(Deserialize)]
struct ClientSecretsFile {
    installed: Option<ClientSecrets>,
    web: Option<ClientSecrets>,
}

impl ClientSecrets {
    /// Parse the JSON downloaded from the Google Cloud console.
    pub fn from_json(data: &[u8]) -> std::result::Result<Self, String> {
        let file: ClientSecretsFile =
            serde_json::from_slice(data).map_err(|e| format!("invalid JSON: {}", e))?;

        let secrets = file
            .installed
            .or(file.web)
            .ok_or_else(|| "expected an 'installed' or 'web' client section".to_string())?;

        if secrets.client_id.trim().is_empty() {
            return Err("client_id is empty".to_string());
        }

        Ok(secrets)
    }

    /// Read and parse a client-secret file.
    pub async fn load(path: &Path) -> Result<Self> {
        let credentials_error = |reason: String| AuthError::CredentialsFile {
            path: path.display().to_string(),
            reason,
        };

        let data = tokio::fs::read(path)
            .await
            .map_err(|e| credentials_error(e.to_string()))?;

        Self::from_json(&data).map_err(credentials_error)
    }
}

impl fmt::Debug for ClientSecrets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientSecrets")
            .field("client_id", &self.client_id)
            .field(
                "client_secret",
                &self.client_secret.as_ref().map(|_| "[REDACTED]"),
            )
            .field("auth_uri", &self.auth_uri)
            .field("token_uri", &self.token_uri)
            .finish()
    }
}
