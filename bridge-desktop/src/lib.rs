//! # Desktop Bridge Implementations
//!
//! Default implementations of bridge traits for desktop platforms
//! (macOS, Windows, Linux).
//!
//! ## Overview
//!
//! - `HttpClient` using `reqwest`
//! - `SecureStore` using owner-only files written through `tokio::fs`
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{FileSecureStore, ReqwestHttpClient};
//!
//! let http_client = ReqwestHttpClient::try_new()?;
//! let (store, key) = FileSecureStore::for_file(Path::new("token.json"))?;
//! ```

mod http;
mod secure_store;

pub use http::ReqwestHttpClient;
pub use secure_store::FileSecureStore;
