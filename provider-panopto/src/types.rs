//! Panopto API request and response types

use serde::{Deserialize, Serialize};

/// Suffix of the HLS manifest URL the session listing reports.
const HLS_MANIFEST_SUFFIX: &str = ".hls/master.m3u8";

/// Entry of `GET /Panopto/Api/Folders`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FolderEntry {
    pub id: String,
    pub name: String,
    /// Only present when requested via `names[0]=SessionCount`
    #[serde(default)]
    pub session_count: Option<u64>,
}

/// Body of `POST /Panopto/Services/Data.svc/GetSessions`
#[derive(Debug, Clone, Serialize)]
pub struct SessionsRequest {
    #[serde(rename = "queryParameters")]
    pub query_parameters: SessionsQuery,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionsQuery {
    pub query: Option<String>,
    pub sort_column: u32,
    pub sort_ascending: bool,
    pub max_results: u32,
    pub page: u32,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    #[serde(rename = "folderID")]
    pub folder_id: String,
    pub bookmarked: bool,
    pub get_folder_data: bool,
    pub is_shared_with_me: bool,
    pub include_playlists: bool,
}

impl SessionsRequest {
    /// Sessions of one folder, oldest first.
    pub fn for_folder(folder_id: &str, max_results: u32, page: u32) -> Self {
        Self {
            query_parameters: SessionsQuery {
                query: None,
                sort_column: 1,
                sort_ascending: true,
                max_results,
                page,
                start_date: None,
                end_date: None,
                folder_id: folder_id.to_string(),
                bookmarked: false,
                get_folder_data: true,
                is_shared_with_me: false,
                include_playlists: true,
            },
        }
    }
}

/// WCF wraps the payload in `d`.
#[derive(Debug, Deserialize)]
pub struct SessionsEnvelope {
    pub d: SessionsPayload,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SessionsPayload {
    #[serde(default)]
    pub results: Vec<SessionEntry>,
    #[serde(default)]
    pub total_number: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SessionEntry {
    #[serde(rename = "DeliveryID")]
    pub delivery_id: String,
    pub session_name: String,
    #[serde(default)]
    pub ios_video_url: Option<String>,
}

impl SessionEntry {
    /// Direct MP4 URL derived from the HLS manifest URL.
    pub fn mp4_url(&self) -> Option<String> {
        self.ios_video_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .map(|url| url.replace(HLS_MANIFEST_SUFFIX, ".mp4"))
    }
}
