//! # Authentication Module
//!
//! Google OAuth 2.0 credential management for the sync run.
//!
//! ## Overview
//!
//! This crate obtains a valid Google Photos access token: it loads the
//! persisted token, refreshes it when expired, and falls back to the
//! installed-application consent flow with a loopback redirect.
//!
//! ## Features
//!
//! - OAuth 2.0 authorization code flow with PKCE
//! - Automatic token refresh before expiration
//! - Token persistence via the [`SecureStore`](bridge_traits::SecureStore) bridge
//! - Auth event emission through [`SyncObserver`](core_runtime::events::SyncObserver)

pub mod error;
pub mod loopback;
pub mod manager;
pub mod oauth;
pub mod token_store;
pub mod types;

pub use error::{AuthError, Result};
pub use loopback::{ConsentFlow, LoopbackConsent, LoopbackReceiver};
pub use manager::{AuthManager, CredentialProvider, StaticCredentials};
pub use oauth::{OAuthConfig, OAuthFlowManager, PkceVerifier};
pub use token_store::TokenStore;
pub use types::{ClientSecrets, OAuthTokens, PHOTOS_READONLY_SCOPE};
