use bridge_traits::error::BridgeError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Failed to fetch items from the photo library: {0}")]
    Source(#[source] BridgeError),

    #[error("Asset lookup failed for {filename}: {reason}")]
    Lookup { filename: String, reason: String },
}

pub type Result<T> = std::result::Result<T, SyncError>;
