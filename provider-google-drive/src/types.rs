//! Google Drive API request and response types
//!
//! Data structures for Google Drive API v3 payloads.

use bridge_traits::archive::{DestinationFile, DestinationFolder};
use serde::{Deserialize, Serialize};

/// MIME type Drive uses for folders
pub const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";

/// Google Drive API file resource
///
/// See: https://developers.google.com/drive/api/v3/reference/files#resource
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveFile {
    /// File ID
    pub id: String,

    /// File name
    pub name: String,

    /// MIME type
    #[serde(default)]
    pub mime_type: String,

    /// File size in bytes, as a decimal string (omitted for folders)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,

    /// Parent folder IDs
    #[serde(default)]
    pub parents: Vec<String>,
}

impl DriveFile {
    pub fn is_folder(&self) -> bool {
        self.mime_type == FOLDER_MIME_TYPE
    }

    /// `parent_id` is used when the response did not include `parents`.
    pub fn into_folder(self, parent_id: &str) -> DestinationFolder {
        let parent_id = self.parents.into_iter().next().unwrap_or_else(|| parent_id.to_string());
        DestinationFolder {
            id: self.id,
            name: self.name,
            parent_id,
        }
    }

    pub fn into_file(self, parent_id: &str) -> DestinationFile {
        let size = self.size.as_deref().and_then(|s| s.parse().ok());
        let parent_id = self.parents.into_iter().next().unwrap_or_else(|| parent_id.to_string());
        DestinationFile {
            id: self.id,
            name: self.name,
            parent_id,
            size,
        }
    }
}

/// Google Drive API files.list response
///
/// See: https://developers.google.com/drive/api/v3/reference/files/list
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilesListResponse {
    /// List of files
    #[serde(default)]
    pub files: Vec<DriveFile>,

    /// Token for next page
    #[serde(default)]
    pub next_page_token: Option<String>,
}

/// Body of files.create and of a resumable-upload session request
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileMetadata<'a> {
    pub name: &'a str,
    pub mime_type: &'a str,
    pub parents: [&'a str; 1],
}

/// Standard Google API error body
#[derive(Debug, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
pub struct ErrorDetail {
    #[serde(default)]
    pub code: u16,
    pub message: String,
}
