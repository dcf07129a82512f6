//! Immich REST client
//!
//! Implements the `AssetTarget` trait. Lookup and read failures are logged and
//! folded into the trait's non-error results; only transport failures of a
//! write surface as errors.

use async_trait::async_trait;
use bridge_traits::error::Result;
use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
use bridge_traits::storage::{AssetLookup, AssetTarget};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, instrument};

use crate::error::ImmichError;
use crate::types::{AssetResponse, MetadataSearchRequest, MetadataSearchResponse, UpdateAssetRequest};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Immich API client authenticated with an API key.
pub struct ImmichClient {
    http_client: Arc<dyn HttpClient>,
    base_url: String,
    api_key: String,
}

impl ImmichClient {
    /// Create a new client
    ///
    /// # Arguments
    ///
    /// * `http_client` - HTTP client implementation
    /// * `base_url` - API root, e.g. `https://immich.example.com/api`; trailing slashes are ignored
    /// * `api_key` - Immich API key sent as `x-api-key`
    pub fn new(
        http_client: Arc<dyn HttpClient>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: HttpMethod, path: &str) -> HttpRequest {
        HttpRequest::new(method, format!("{}{}", self.base_url, path))
            .header("x-api-key", self.api_key.clone())
            .header("Accept", "application/json")
            .timeout(REQUEST_TIMEOUT)
    }

    /// Execute a request and insist on a success status.
    async fn execute_checked(&self, request: HttpRequest) -> std::result::Result<HttpResponse, ImmichError> {
        let response = self.http_client.execute(request).await?;

        if !response.is_success() {
            return Err(ImmichError::ApiError {
                status_code: response.status,
                message: String::from_utf8_lossy(&response.body).to_string(),
            });
        }

        Ok(response)
    }

    async fn search_by_filename(&self, filename: &str) -> std::result::Result<Option<String>, ImmichError> {
        let request = self
            .request(HttpMethod::Post, "/search/metadata")
            .json(&MetadataSearchRequest {
                original_file_name: filename,
            })?;

        let response = self.execute_checked(request).await?;
        let search: MetadataSearchResponse = serde_json::from_slice(&response.body)
            .map_err(|e| ImmichError::ParseError(e.to_string()))?;

        Ok(search.assets.items.into_iter().next().map(|asset| asset.id))
    }

    async fn fetch_description(&self, asset_id: &str) -> std::result::Result<String, ImmichError> {
        let request = self.request(HttpMethod::Get, &format!("/assets/{}", asset_id));

        let response = self.execute_checked(request).await?;
        let asset: AssetResponse = serde_json::from_slice(&response.body)
            .map_err(|e| ImmichError::ParseError(e.to_string()))?;

        Ok(asset.description())
    }

    /// Check that the server is reachable and the API root is correct.
    #[instrument(skip(self))]
    pub async fn ping(&self) -> std::result::Result<(), ImmichError> {
        let request = self.request(HttpMethod::Get, "/server/ping");
        self.execute_checked(request).await?;

        debug!("Immich server answered ping");
        Ok(())
    }
}

impl fmt::Debug for ImmichClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImmichClient")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

#[async_trait]
impl AssetTarget for ImmichClient {
    #[instrument(skip(self))]
    async fn find_asset_by_filename(&self, filename: &str) -> AssetLookup {
        debug!("Searching for asset by filename: {}", filename);

        match self.search_by_filename(filename).await {
            Ok(Some(asset_id)) => {
                debug!("Found asset ID: {}", asset_id);
                AssetLookup::Found(asset_id)
            }
            Ok(None) => {
                debug!("No matching asset found for filename: {}", filename);
                AssetLookup::NotFound
            }
            Err(e) => {
                error!("Immich search failed: {}", e);
                AssetLookup::Failed(e.to_string())
            }
        }
    }

    #[instrument(skip(self))]
    async fn get_asset_description(&self, asset_id: &str) -> String {
        match self.fetch_description(asset_id).await {
            Ok(description) => {
                debug!(
                    has_description = !description.is_empty(),
                    "Retrieved description for asset {}", asset_id
                );
                description
            }
            Err(e) => {
                error!("Failed to retrieve asset description: {}", e);
                String::new()
            }
        }
    }

    #[instrument(skip(self, description))]
    async fn update_asset_description(&self, asset_id: &str, description: &str) -> Result<bool> {
        let request = self
            .request(HttpMethod::Put, &format!("/asset/{}", asset_id))
            .json(&UpdateAssetRequest { description })?;

        let response = self.http_client.execute(request).await?;

        if response.is_success() {
            info!("Successfully updated asset {}", asset_id);
            Ok(true)
        } else {
            error!("Failed to update asset {}: HTTP {}", asset_id, response.status);
            Ok(false)
        }
    }
}
