//! # Google Photos Provider
//!
//! Implements the `MediaSource` trait for the Google Photos Library API.
//!
//! ## Overview
//!
//! This module provides:
//! - Date-window search over `mediaItems:search` with full pagination
//! - Conversion of the API's media item resource into `MediaItem`
//! - Metadata projection for the sync orchestrator

pub mod client;
pub mod error;
pub mod types;

pub use client::GooglePhotosClient;
pub use error::{GooglePhotosError, Result};
