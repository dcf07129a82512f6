//! Immich API types
//!
//! Only the fields the sync reads or writes are modelled; everything else in
//! Immich's asset resource is ignored.

use serde::{Deserialize, Serialize};

/// `POST /search/metadata` request body
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataSearchRequest<'a> {
    pub original_file_name: &'a str,
}

/// `POST /search/metadata` response body
#[derive(Debug, Default, Deserialize)]
pub struct MetadataSearchResponse {
    #[serde(default)]
    pub assets: SearchAssets,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchAssets {
    #[serde(default)]
    pub items: Vec<AssetSummary>,
}

#[derive(Debug, Deserialize)]
pub struct AssetSummary {
    pub id: String,
}

/// `GET /assets/{id}` response body
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetResponse {
    #[serde(default)]
    pub exif_info: Option<ExifInfo>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ExifInfo {
    #[serde(default)]
    pub description: Option<String>,
}

impl AssetResponse {
    /// The stored description, empty when there is none.
    pub fn description(self) -> String {
        self.exif_info
            .and_then(|exif| exif.description)
            .unwrap_or_default()
    }
}

/// `PUT /asset/{id}` request body
#[derive(Debug, Clone, Serialize)]
pub struct UpdateAssetRequest<'a> {
    pub description: &'a str,
}
