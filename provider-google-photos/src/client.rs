//! Google Photos Library API client
//!
//! Implements the `MediaSource` trait on top of `mediaItems:search`.

use async_trait::async_trait;
use bridge_traits::error::Result;
use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest};
use bridge_traits::storage::{MediaItem, MediaMetadata, MediaSource};
use bridge_traits::time::{Clock, SystemClock};
use chrono::{DateTime, Duration, Utc};
use core_auth::CredentialProvider;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::error::GooglePhotosError;
use crate::types::{SearchRequest, SearchResponse};

/// Google Photos Library API base URL
const PHOTOS_API_BASE: &str = "https://photoslibrary.googleapis.com";

/// Maximum results per page (Library API limit)
const MAX_PAGE_SIZE: u32 = 100;

const REQUEST_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(30);

/// Google Photos Library API client
///
/// # Features
///
/// - Date-window search, paginated until the API stops returning a page token
/// - Client-side trimming of the day-granular server filter to the exact window
/// - Bearer authentication through a [`CredentialProvider`]
///
/// # Example
///
/// ```ignore
/// use provider_google_photos::GooglePhotosClient;
/// use bridge_traits::storage::MediaSource;
///
/// let client = GooglePhotosClient::new(http_client, credentials);
/// let items = client.fetch_items(15).await?;
/// ```
pub struct GooglePhotosClient {
    http_client: Arc<dyn HttpClient>,
    credentials: Arc<dyn CredentialProvider>,
    clock: Arc<dyn Clock>,
    base_url: String,
}

impl GooglePhotosClient {
    /// Create a new Google Photos client
    ///
    /// # Arguments
    ///
    /// * `http_client` - HTTP client implementation
    /// * `credentials` - Source of access tokens with the `photoslibrary.readonly` scope
    pub fn new(http_client: Arc<dyn HttpClient>, credentials: Arc<dyn CredentialProvider>) -> Self {
        Self {
            http_client,
            credentials,
            clock: Arc::new(SystemClock),
            base_url: PHOTOS_API_BASE.to_string(),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn search_url(&self) -> String {
        format!("{}/v1/mediaItems:search", self.base_url)
    }

    /// Parse an RFC 3339 creation time
    fn parse_timestamp(rfc3339: &str) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(rfc3339)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }

    /// Whether an item lies inside `[start, end]`.
    ///
    /// Items without a parseable creation time are kept; the server already
    /// matched them against the date filter.
    fn within_window(item: &MediaItem, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        match item.creation_time.as_deref().and_then(Self::parse_timestamp) {
            Some(created) => created >= start && created <= end,
            None => true,
        }
    }

    /// Fetch one page of search results.
    #[instrument(skip(self, access_token, request), fields(page_token = ?request.page_token))]
    async fn search_page(&self, access_token: &str, request: &SearchRequest) -> Result<SearchResponse> {
        let http_request = HttpRequest::new(HttpMethod::Post, self.search_url())
            .bearer_token(access_token)
            .header("Accept", "application/json")
            .timeout(REQUEST_TIMEOUT)
            .json(request)?;

        let response = self.http_client.execute(http_request).await?;

        if !response.is_success() {
            warn!(status = response.status, "Media item search failed");
            return Err(GooglePhotosError::ApiError {
                status_code: response.status,
                message: String::from_utf8_lossy(&response.body).to_string(),
            }
            .into());
        }

        let page: SearchResponse = serde_json::from_slice(&response.body).map_err(|e| {
            GooglePhotosError::ParseError(format!("Failed to parse search response: {}", e))
        })?;

        Ok(page)
    }
}

#[async_trait]
impl MediaSource for GooglePhotosClient {
    #[instrument(skip(self))]
    async fn fetch_items(&self, window_days: u32) -> Result<Vec<MediaItem>> {
        let end = self.clock.now();
        let start = end
            .checked_sub_signed(Duration::days(i64::from(window_days)))
            .ok_or(GooglePhotosError::InvalidWindow(window_days))?;

        let access_token = self
            .credentials
            .access_token()
            .await
            .map_err(GooglePhotosError::from)?;

        info!(%start, %end, "Searching Google Photos");

        let mut request = SearchRequest::date_window(start, end, MAX_PAGE_SIZE);
        let mut items = Vec::new();

        loop {
            let page = self.search_page(&access_token, &request).await?;

            debug!("Fetched {} items in this page", page.media_items.len());

            items.extend(
                page.media_items
                    .into_iter()
                    .map(MediaItem::from)
                    .filter(|item| Self::within_window(item, start, end)),
            );

            match page.next_page_token {
                Some(token) if !token.is_empty() => request.page_token = Some(token),
                _ => break,
            }
        }

        info!("Total media items fetched: {}", items.len());

        Ok(items)
    }

    fn extract_metadata(&self, item: &MediaItem) -> MediaMetadata {
        let metadata = MediaMetadata {
            id: item.id.clone(),
            filename: item.filename.clone(),
            description: item.description.clone(),
            creation_time: item.creation_time.as_deref().and_then(Self::parse_timestamp),
        };

        debug!(
            id = %metadata.id,
            filename = %metadata.filename,
            has_description = metadata.usable_description().is_some(),
            creation_time = ?metadata.creation_time,
            "Extracted metadata"
        );

        metadata
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::error::BridgeError;
    use bridge_traits::http::HttpResponse;
    use bridge_traits::time::FixedClock;
    use bytes::Bytes;
    use chrono::TimeZone;
    use core_auth::{AuthError, StaticCredentials};
    use mockall::{mock, Sequence};
    use std::collections::HashMap;

    mock! {
        HttpClient {}

        #[async_trait]
        impl HttpClient for HttpClient {
            async fn execute(&self, request: HttpRequest) -> Result<HttpResponse>;
        }
    }

    struct RevokedCredentials;

    #[async_trait]
    impl CredentialProvider for RevokedCredentials {
        async fn acquire(&self) -> core_auth::Result<core_auth::OAuthTokens> {
            Err(AuthError::NoRefreshToken)
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn client(http: MockHttpClient) -> GooglePhotosClient {
        GooglePhotosClient::new(Arc::new(http), Arc::new(StaticCredentials::new("ya29.test")))
            .with_clock(Arc::new(FixedClock(now())))
            .with_base_url("https://photos.example.com/")
    }

    fn ok(body: &str) -> HttpResponse {
        HttpResponse {
            status: 200,
            headers: HashMap::new(),
            body: Bytes::from(body.to_string()),
        }
    }

    fn body(request: &HttpRequest) -> serde_json::Value {
        serde_json::from_slice(request.body.as_ref().unwrap()).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_single_page() {
        let mut mock_http = MockHttpClient::new();

        mock_http
            .expect_execute()
            .withf(|request| {
                let body = body(request);
                request.method == HttpMethod::Post
                    && request.url == "https://photos.example.com/v1/mediaItems:search"
                    && request.headers.get("Authorization") == Some(&"Bearer ya29.test".to_string())
                    && body["pageSize"] == 100
                    && body["filters"]["dateFilter"]["ranges"][0]["startDate"]
                        == serde_json::json!({"year": 2024, "month": 5, "day": 17})
                    && body["filters"]["dateFilter"]["ranges"][0]["endDate"]
                        == serde_json::json!({"year": 2024, "month": 6, "day": 1})
                    && body.get("pageToken").is_none()
            })
            .times(1)
            .returning(|_| {
                Ok(ok(r#"{
                    "mediaItems": [
                        {
                            "id": "1",
                            "filename": "test1.jpg",
                            "description": "Test photo",
                            "mediaMetadata": {"creationTime": "2024-05-30T10:00:00Z"}
                        },
                        {
                            "id": "2",
                            "filename": "test2.jpg",
                            "mediaMetadata": {"creationTime": "2024-05-31T10:00:00Z"}
                        }
                    ]
                }"#))
            });

        let items = client(mock_http).fetch_items(15).await.unwrap();

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].filename, "test1.jpg");
        assert_eq!(items[0].description.as_deref(), Some("Test photo"));
        assert_eq!(items[1].description, None);
    }

    #[tokio::test]
    async fn test_fetch_follows_page_tokens() {
        let mut seq = Sequence::new();
        let mut mock_http = MockHttpClient::new();

        mock_http
            .expect_execute()
            .withf(|request| body(request).get("pageToken").is_none())
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| {
                Ok(ok(r#"{
                    "mediaItems": [{"id": "1", "filename": "a.jpg"}],
                    "nextPageToken": "page-2"
                }"#))
            });
        mock_http
            .expect_execute()
            .withf(|request| body(request)["pageToken"] == "page-2")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| {
                Ok(ok(r#"{
                    "mediaItems": [{"id": "2", "filename": "b.jpg"}],
                    "nextPageToken": ""
                }"#))
            });

        let items = client(mock_http).fetch_items(15).await.unwrap();

        let names: Vec<_> = items.iter().map(|i| i.filename.as_str()).collect();
        assert_eq!(names, vec!["a.jpg", "b.jpg"]);
    }

    #[tokio::test]
    async fn test_fetch_trims_to_exact_window() {
        let mut mock_http = MockHttpClient::new();

        mock_http.expect_execute().times(1).returning(|_| {
            Ok(ok(r#"{
                "mediaItems": [
                    {"id": "early", "filename": "early.jpg",
                     "mediaMetadata": {"creationTime": "2024-05-17T08:00:00Z"}},
                    {"id": "inside", "filename": "inside.jpg",
                     "mediaMetadata": {"creationTime": "2024-05-17T13:00:00Z"}},
                    {"id": "future", "filename": "future.jpg",
                     "mediaMetadata": {"creationTime": "2024-06-01T18:00:00Z"}},
                    {"id": "unknown", "filename": "unknown.jpg",
                     "mediaMetadata": {"creationTime": "not a date"}},
                    {"id": "bare", "filename": "bare.jpg"}
                ]
            }"#))
        });

        let items = client(mock_http).fetch_items(15).await.unwrap();

        let ids: Vec<_> = items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["inside", "unknown", "bare"]);
    }

    #[tokio::test]
    async fn test_fetch_empty_library() {
        let mut mock_http = MockHttpClient::new();
        mock_http.expect_execute().times(1).returning(|_| Ok(ok("{}")));

        let items = client(mock_http).fetch_items(15).await.unwrap();
        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_api_error_is_fatal() {
        let mut mock_http = MockHttpClient::new();
        mock_http.expect_execute().times(1).returning(|_| {
            Ok(HttpResponse {
                status: 403,
                headers: HashMap::new(),
                body: Bytes::from_static(b"insufficient scopes"),
            })
        });

        let err = client(mock_http).fetch_items(15).await.unwrap_err();

        assert!(err.to_string().contains("403"));
        assert!(err.to_string().contains("insufficient scopes"));
    }

    #[tokio::test]
    async fn test_fetch_transport_error_is_fatal() {
        let mut mock_http = MockHttpClient::new();
        mock_http
            .expect_execute()
            .times(1)
            .returning(|_| Err(BridgeError::OperationFailed("connection reset".to_string())));

        let err = client(mock_http).fetch_items(15).await.unwrap_err();
        assert!(matches!(err, BridgeError::OperationFailed(msg) if msg == "connection reset"));
    }

    #[tokio::test]
    async fn test_fetch_malformed_response() {
        let mut mock_http = MockHttpClient::new();
        mock_http
            .expect_execute()
            .times(1)
            .returning(|_| Ok(ok("<html>")));

        let err = client(mock_http).fetch_items(15).await.unwrap_err();
        assert!(err.to_string().contains("Failed to parse search response"));
    }

    #[tokio::test]
    async fn test_fetch_rejects_window_beyond_calendar() {
        let mut mock_http = MockHttpClient::new();
        mock_http.expect_execute().times(0);

        let err = client(mock_http).fetch_items(100_000_000).await.unwrap_err();

        assert!(matches!(err, BridgeError::OperationFailed(msg) if msg.contains("100000000")));
    }

    #[tokio::test]
    async fn test_fetch_without_credentials() {
        let mut mock_http = MockHttpClient::new();
        mock_http.expect_execute().times(0);

        let client = GooglePhotosClient::new(Arc::new(mock_http), Arc::new(RevokedCredentials));
        let err = client.fetch_items(15).await.unwrap_err();

        assert!(err.to_string().contains("Authentication failed"));
    }

    #[test]
    fn test_extract_metadata() {
        let client = client(MockHttpClient::new());
        let item = MediaItem {
            id: "1".to_string(),
            filename: "test1.jpg".to_string(),
            description: Some("Test photo".to_string()),
            mime_type: Some("image/jpeg".to_string()),
            creation_time: Some("2024-05-30T10:00:00+02:00".to_string()),
        };

        let meta = client.extract_metadata(&item);

        assert_eq!(meta.id, "1");
        assert_eq!(meta.filename, "test1.jpg");
        assert_eq!(meta.description.as_deref(), Some("Test photo"));
        assert_eq!(
            meta.creation_time,
            Some(Utc.with_ymd_and_hms(2024, 5, 30, 8, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_extract_metadata_missing_fields() {
        let client = client(MockHttpClient::new());
        let meta = client.extract_metadata(&MediaItem {
            id: "2".to_string(),
            ..MediaItem::default()
        });

        assert_eq!(meta.filename, "");
        assert_eq!(meta.description, None);
        assert_eq!(meta.creation_time, None);
    }
}
