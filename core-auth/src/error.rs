use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Cannot read Google client credentials at {path}: {reason}")]
    CredentialsFile { path: String, reason: String },

    #[error("OAuth state mismatch: expected {expected}, got {actual}")]
    StateMismatch { expected: String, actual: String },

    #[error("Authorization was denied: {0}")]
    AuthorizationDenied(String),

    #[error("Invalid authorization code: {0}")]
    InvalidAuthCode(String),

    #[error("Authorization callback failed: {0}")]
    CallbackFailed(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Token expired and could not be refreshed. Please re-authenticate. ({0})")]
    TokenRefreshFailed(String),

    #[error("Token expired and no refresh token is available. Please re-authenticate.")]
    NoRefreshToken,

    #[error("Secure storage unavailable: {0}")]
    SecureStorageUnavailable(String),

    #[error("Operation timed out: {operation}")]
    OperationTimeout { operation: String },

    #[error("{0}")]
    Other(String),
}

impl AuthError {
    /// Whether the user has to run the consent flow again to recover.
    pub fn requires_reauthentication(&self) -> bool {
        matches!(
            self,
            AuthError::TokenRefreshFailed(_) | AuthError::NoRefreshToken
        )
    }
}

pub type Result<T> = std::result::Result<T, AuthError>;
