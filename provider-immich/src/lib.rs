//! # Immich Provider
//!
//! Implements the `AssetTarget` trait for the Immich REST API: asset lookup
//! by original file name, description reads and description writes.

pub mod client;
pub mod error;
pub mod types;

pub use client::ImmichClient;
pub use error::{ImmichError, Result};
