//! Google Photos Library API types
//!
//! Request and response bodies for `mediaItems:search`.

use bridge_traits::storage::MediaItem;
use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};

/// `mediaItems:search` request body
///
/// See: https://developers.google.com/photos/library/reference/rest/v1/mediaItems/search
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    pub page_size: u32,
    pub filters: Filters,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_token: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Filters {
    pub date_filter: DateFilter,
}

#[derive(Debug, Clone, Serialize)]
pub struct DateFilter {
    pub ranges: Vec<DateRange>,
}

/// Inclusive calendar-day range
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    pub start_date: ApiDate,
    pub end_date: ApiDate,
}

/// Calendar date as the API expects it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ApiDate {
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

impl From<DateTime<Utc>> for ApiDate {
    fn from(instant: DateTime<Utc>) -> Self {
        Self {
            year: instant.year(),
            month: instant.month(),
            day: instant.day(),
        }
    }
}

impl SearchRequest {
    /// Search for items created between `start` and `end`, by calendar day.
    pub fn date_window(start: DateTime<Utc>, end: DateTime<Utc>, page_size: u32) -> Self {
        Self {
            page_size,
            filters: Filters {
                date_filter: DateFilter {
                    ranges: vec![DateRange {
                        start_date: start.into(),
                        end_date: end.into(),
                    }],
                },
            },
            page_token: None,
        }
    }
}

/// `mediaItems:search` response body
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    /// Omitted entirely when the page is empty
    #[serde(default)]
    pub media_items: Vec<GoogleMediaItem>,

    /// Token for next page
    #[serde(default)]
    pub next_page_token: Option<String>,
}

/// Media item resource
///
/// See: https://developers.google.com/photos/library/reference/rest/v1/mediaItems#MediaItem
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleMediaItem {
    pub id: String,

    #[serde(default)]
    pub filename: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub mime_type: Option<String>,

    #[serde(default)]
    pub media_metadata: Option<GoogleMediaMetadata>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleMediaMetadata {
    /// RFC 3339 creation time
    #[serde(default)]
    pub creation_time: Option<String>,
}

impl From<GoogleMediaItem> for MediaItem {
    fn from(item: GoogleMediaItem) -> Self {
        MediaItem {
            id: item.id,
            filename: item.filename,
            description: item.description,
            mime_type: item.mime_type,
            creation_time: item.media_metadata.and_then(|m| m.creation_time),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_search_request_body() {
        let start = Utc.with_ymd_and_hms(2024, 5, 17, 8, 30, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 6, 1, 8, 30, 0).unwrap();

        let mut request = SearchRequest::date_window(start, end, 100);
        let body = serde_json::to_value(&request).unwrap();

        assert_eq!(
            body,
            serde_json::json!({
                "pageSize": 100,
                "filters": {
                    "dateFilter": {
                        "ranges": [{
                            "startDate": {"year": 2024, "month": 5, "day": 17},
                            "endDate": {"year": 2024, "month": 6, "day": 1}
                        }]
                    }
                }
            })
        );

        request.page_token = Some("next".to_string());
        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(body["pageToken"], "next");
    }

    #[test]
    fn test_media_item_conversion() {
        let json = r#"{
            "id": "AF1Qip",
            "filename": "IMG_0001.jpg",
            "description": "Beach",
            "mimeType": "image/jpeg",
            "baseUrl": "https://lh3.googleusercontent.com/x",
            "mediaMetadata": {
                "creationTime": "2024-05-30T10:00:00Z",
                "width": "4032",
                "height": "3024"
            }
        }"#;

        let item: MediaItem = serde_json::from_str::<GoogleMediaItem>(json).unwrap().into();

        assert_eq!(item.id, "AF1Qip");
        assert_eq!(item.filename, "IMG_0001.jpg");
        assert_eq!(item.description.as_deref(), Some("Beach"));
        assert_eq!(item.mime_type.as_deref(), Some("image/jpeg"));
        assert_eq!(item.creation_time.as_deref(), Some("2024-05-30T10:00:00Z"));
    }

    #[test]
    fn test_sparse_media_item() {
        let item: MediaItem = serde_json::from_str::<GoogleMediaItem>(r#"{"id": "x"}"#)
            .unwrap()
            .into();

        assert_eq!(item.filename, "");
        assert_eq!(item.description, None);
        assert_eq!(item.creation_time, None);
    }

    #[test]
    fn test_empty_search_response() {
        let response: SearchResponse = serde_json::from_str("{}").unwrap();

        assert!(response.media_items.is_empty());
        assert_eq!(response.next_page_token, None);
    }
}
