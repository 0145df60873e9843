//! Destination Storage Abstraction
//!
//! Point lookups and append-only writes against the cloud storage that
//! receives archived videos. Nothing here updates or deletes.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::http::ByteStream;

/// A folder in the destination storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DestinationFolder {
    pub id: String,
    pub name: String,
    pub parent_id: String,
}

/// A file in the destination storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DestinationFile {
    pub id: String,
    pub name: String,
    pub parent_id: String,
    /// Size in bytes, when the storage reports one
    pub size: Option<u64>,
}

/// Cloud storage receiving the archive.
///
/// Lookups are exact-name matches among the direct children of `parent_id`
/// and are answered fresh on every call.
#[async_trait]
pub trait ArchiveStore: Send + Sync {
    /// Id of the account's top-level folder.
    fn root_folder_id(&self) -> &str;

    /// Find a child folder named `name` under `parent_id`.
    async fn find_folder(&self, parent_id: &str, name: &str) -> Result<Option<DestinationFolder>>;

    /// Create a child folder named `name` under `parent_id`.
    async fn create_folder(&self, parent_id: &str, name: &str) -> Result<DestinationFolder>;

    /// Find a child file named `name` under `parent_id`.
    async fn find_file(&self, parent_id: &str, name: &str) -> Result<Option<DestinationFile>>;

    /// Stream `content` into a new file named `name` under `parent_id`.
    ///
    /// The file must not become visible to [`find_file`](Self::find_file)
    /// unless the whole stream was stored.
    async fn upload_file(
        &self,
        parent_id: &str,
        name: &str,
        mime_type: &str,
        content: ByteStream,
    ) -> Result<DestinationFile>;
}
