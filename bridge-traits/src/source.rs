//! Source Platform Abstraction
//!
//! Read-only view of the lecture catalog on the video-hosting platform.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::http::ByteStream;

/// A folder (usually one course) on the source platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFolder {
    pub id: String,
    pub name: String,
    /// Number of recordings the platform reports for this folder
    pub session_count: u64,
}

/// A single recording inside a [`SourceFolder`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceVideo {
    pub id: String,
    pub name: String,
    pub folder_id: String,
    /// Direct URL of the downloadable video file
    pub download_url: String,
}

/// Catalog of the video-hosting platform, as seen by an authenticated user.
///
/// Listing order is the platform's order; callers must not reorder.
#[async_trait]
pub trait VideoSource: Send + Sync {
    /// List every folder visible to the user.
    async fn list_folders(&self) -> Result<Vec<SourceFolder>>;

    /// List every video in `folder`.
    async fn list_videos(&self, folder: &SourceFolder) -> Result<Vec<SourceVideo>>;

    /// Open the video's binary content for streaming.
    async fn open_video(&self, video: &SourceVideo) -> Result<ByteStream>;
}
