//! Google Drive API connector implementation
//!
//! Implements the `ArchiveStore` trait for Google Drive API v3.

use async_trait::async_trait;
use bridge_traits::archive::{ArchiveStore, DestinationFile, DestinationFolder};
use bridge_traits::error::Result;
use bridge_traits::http::{ByteReader, ByteStream, HttpClient, HttpMethod, HttpRequest, HttpResponse, RetryPolicy};
use bytes::Bytes;
use core_auth::CredentialProvider;
use core_runtime::config::{DEFAULT_UPLOAD_CHUNK_SIZE, UPLOAD_CHUNK_GRANULARITY};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tracing::{debug, instrument, warn};

use crate::error::GoogleDriveError;
use crate::types::{DriveFile, FileMetadata, FilesListResponse, FOLDER_MIME_TYPE};

/// Google Drive API base URL
const DRIVE_API_BASE: &str = "https://www.googleapis.com/drive/v3";

/// Google Drive media upload base URL
const DRIVE_UPLOAD_BASE: &str = "https://www.googleapis.com/upload/drive/v3";

/// Alias Drive accepts for the account's top-level folder
const ROOT_FOLDER_ID: &str = "root";

/// Fields to request for file resources
const FILE_FIELDS: &str = "id,name,mimeType,size,parents";

/// Status Drive answers an accepted, non-final upload chunk with
const RESUME_INCOMPLETE: u16 = 308;

/// Slowest uplink a chunk upload must survive, in bytes per second
const MIN_UPLOAD_RATE: u64 = 16 * 1024;

/// Lower bound of a chunk request's timeout
const MIN_CHUNK_TIMEOUT: Duration = Duration::from_secs(60);

/// Time allowed for sending one chunk of `len` bytes.
fn chunk_timeout(len: usize) -> Duration {
    Duration::from_secs(len as u64 / MIN_UPLOAD_RATE).max(MIN_CHUNK_TIMEOUT)
}

/// Quote a value for the `q` parameter of files.list.
pub(crate) fn escape_query_value(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

/// Parse the `Range: bytes=0-N` header of a 308 response into the number
/// of bytes the server holds.
fn confirmed_bytes(response: &HttpResponse) -> u64 {
    response
        .header("range")
        .and_then(|range| range.strip_prefix("bytes="))
        .and_then(|range| range.split_once('-'))
        .and_then(|(_, end)| end.trim().parse::<u64>().ok())
        .map(|end| end + 1)
        .unwrap_or(0)
}

/// Read until `buffer` is full or the stream ends.
async fn fill_chunk(reader: &mut ByteReader, buffer: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buffer.len() {
        let read = reader.read(&mut buffer[filled..]).await?;
        if read == 0 {
            break;
        }
        filled += read;
    }
    Ok(filled)
}

/// Google Drive API connector
///
/// Implements `ArchiveStore` for Google Drive API v3.
///
/// # Features
///
/// - Exact-name lookups of folders and files, excluding trashed items
/// - Folder creation
/// - Resumable uploads sent in fixed-size chunks, so only one chunk is ever
///   held in memory and nothing becomes visible until the last one lands
/// - OAuth 2.0 bearer tokens from a [`CredentialProvider`], fetched per
///   request so long uploads survive token expiry
///
/// # Example
///
/// ```ignore
/// use provider_google_drive::GoogleDriveConnector;
/// use bridge_traits::archive::ArchiveStore;
///
/// let connector = GoogleDriveConnector::new(http_client, credentials);
/// let folder = connector.find_folder(connector.root_folder_id(), "Panopto Videos").await?;
/// ```
pub struct GoogleDriveConnector {
    /// HTTP client for API requests
    http_client: Arc<dyn HttpClient>,

    /// Source of OAuth 2.0 access tokens
    credentials: Arc<dyn CredentialProvider>,

    /// Upload chunk size in bytes, a multiple of 256 KiB
    chunk_size: usize,
}

impl GoogleDriveConnector {
    /// Create a new Google Drive connector
    ///
    /// # Arguments
    ///
    /// * `http_client` - HTTP client implementation
    /// * `credentials` - Provider of access tokens with the `drive` scope
    pub fn new(http_client: Arc<dyn HttpClient>, credentials: Arc<dyn CredentialProvider>) -> Self {
        Self {
            http_client,
            credentials,
            chunk_size: DEFAULT_UPLOAD_CHUNK_SIZE,
        }
    }

    /// Set the upload chunk size, rounded down to a multiple of 256 KiB.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = (chunk_size / UPLOAD_CHUNK_GRANULARITY).max(1) * UPLOAD_CHUNK_GRANULARITY;
        self
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    async fn authorized(&self, request: HttpRequest) -> std::result::Result<HttpRequest, GoogleDriveError> {
        let token = self.credentials.access_token().await?;
        Ok(request.bearer_token(token))
    }

    async fn send(
        &self,
        request: HttpRequest,
        policy: Option<RetryPolicy>,
    ) -> std::result::Result<HttpResponse, GoogleDriveError> {
        let request = self.authorized(request).await?;
        let response = match policy {
            Some(policy) => self.http_client.execute_with_retry(request, policy).await?,
            None => self.http_client.execute(request).await?,
        };
        Ok(response)
    }

    /// First non-trashed child of `parent_id` named exactly `name`.
    #[instrument(skip(self))]
    async fn find_child(
        &self,
        parent_id: &str,
        name: &str,
        folder: bool,
    ) -> std::result::Result<Option<DriveFile>, GoogleDriveError> {
        let mime_clause = if folder { "=" } else { "!=" };
        let query = format!(
            "'{}' in parents and name = '{}' and trashed = false and mimeType {} '{}'",
            escape_query_value(parent_id),
            escape_query_value(name),
            mime_clause,
            FOLDER_MIME_TYPE
        );
        let url = format!(
            "{}/files?q={}&spaces=drive&pageSize=10&fields={}",
            DRIVE_API_BASE,
            urlencoding::encode(&query),
            urlencoding::encode(&format!("files({})", FILE_FIELDS))
        );

        let request = HttpRequest::new(HttpMethod::Get, url).header("Accept", "application/json");
        let response = self.send(request, None).await?;
        if !response.is_success() {
            return Err(GoogleDriveError::from_response(response.status, &response.body));
        }

        let listing: FilesListResponse = response
            .json()
            .map_err(|e| GoogleDriveError::ParseError(e.to_string()))?;
        if listing.files.len() > 1 {
            debug!(count = listing.files.len(), "Several items share this name, using the first");
        }

        Ok(listing.files.into_iter().next())
    }

    /// Open a resumable upload session and return its URI.
    async fn open_upload_session(
        &self,
        parent_id: &str,
        name: &str,
        mime_type: &str,
        content_length: Option<u64>,
    ) -> std::result::Result<String, GoogleDriveError> {
        let url = format!(
            "{}/files?uploadType=resumable&fields={}",
            DRIVE_UPLOAD_BASE,
            urlencoding::encode(FILE_FIELDS)
        );
        let metadata = FileMetadata {
            name,
            mime_type,
            parents: [parent_id],
        };

        let mut request = HttpRequest::new(HttpMethod::Post, url)
            .header("X-Upload-Content-Type", mime_type)
            .json(&metadata)?;
        if let Some(length) = content_length {
            request = request.header("X-Upload-Content-Length", length.to_string());
        }

        let response = self.send(request, None).await?;
        if !response.is_success() {
            return Err(GoogleDriveError::from_response(response.status, &response.body));
        }

        response
            .header("location")
            .map(str::to_string)
            .ok_or_else(|| GoogleDriveError::UploadSessionMissing(name.to_string()))
    }

    async fn upload_resumable(
        &self,
        parent_id: &str,
        name: &str,
        mime_type: &str,
        content: ByteStream,
    ) -> std::result::Result<DestinationFile, GoogleDriveError> {
        let total_hint = content.content_length;
        let session_uri = self
            .open_upload_session(parent_id, name, mime_type, total_hint)
            .await?;
        debug!(total_bytes = ?total_hint, "Upload session opened");

        let mut reader = content.reader;
        let mut buffer = vec![0u8; self.chunk_size];
        let mut offset: u64 = 0;

        loop {
            let filled = fill_chunk(&mut reader, &mut buffer).await?;
            let end = offset + filled as u64;
            let is_last = filled < self.chunk_size || total_hint == Some(end);

            let content_range = if filled == 0 {
                format!("bytes */{}", offset)
            } else if is_last {
                format!("bytes {}-{}/{}", offset, end - 1, end)
            } else {
                format!("bytes {}-{}/*", offset, end - 1)
            };
            debug!(content_range = %content_range, "Sending upload chunk");

            let request = HttpRequest::new(HttpMethod::Put, session_uri.clone())
                .header("Content-Range", content_range)
                .body(Bytes::copy_from_slice(&buffer[..filled]))
                .timeout(chunk_timeout(filled));
            // Chunks are never replayed.
            let response = self.send(request, Some(RetryPolicy::no_retry())).await?;

            match response.status {
                200 | 201 => {
                    let file: DriveFile = response
                        .json()
                        .map_err(|e| GoogleDriveError::ParseError(e.to_string()))?;
                    return Ok(file.into_file(parent_id));
                }
                RESUME_INCOMPLETE => {
                    let confirmed = confirmed_bytes(&response);
                    if confirmed != end {
                        warn!(sent = end, confirmed, "Server acknowledged a different byte range");
                        return Err(GoogleDriveError::UploadOutOfStep {
                            name: name.to_string(),
                            sent: end,
                            confirmed,
                        });
                    }
                    if filled == 0 {
                        // Finalizing request was not accepted as final.
                        return Err(GoogleDriveError::UploadOutOfStep {
                            name: name.to_string(),
                            sent: end,
                            confirmed,
                        });
                    }
                    offset = end;
                }
                status => return Err(GoogleDriveError::from_response(status, &response.body)),
            }
        }
    }
}

#[async_trait]
impl ArchiveStore for GoogleDriveConnector {
    fn root_folder_id(&self) -> &str {
        ROOT_FOLDER_ID
    }

    async fn find_folder(&self, parent_id: &str, name: &str) -> Result<Option<DestinationFolder>> {
        Ok(self
            .find_child(parent_id, name, true)
            .await?
            .map(|file| file.into_folder(parent_id)))
    }

    #[instrument(skip(self))]
    async fn create_folder(&self, parent_id: &str, name: &str) -> Result<DestinationFolder> {
        let url = format!(
            "{}/files?fields={}",
            DRIVE_API_BASE,
            urlencoding::encode(FILE_FIELDS)
        );
        let metadata = FileMetadata {
            name,
            mime_type: FOLDER_MIME_TYPE,
            parents: [parent_id],
        };
        let request = HttpRequest::new(HttpMethod::Post, url).json(&metadata)?;

        // Single attempt.
        let response = self.send(request, Some(RetryPolicy::no_retry())).await?;
        if !response.is_success() {
            return Err(GoogleDriveError::from_response(response.status, &response.body).into());
        }

        let file: DriveFile = response
            .json()
            .map_err(|e| GoogleDriveError::ParseError(e.to_string()))?;
        debug!(folder_id = %file.id, "Created folder");
        Ok(file.into_folder(parent_id))
    }

    async fn find_file(&self, parent_id: &str, name: &str) -> Result<Option<DestinationFile>> {
        Ok(self
            .find_child(parent_id, name, false)
            .await?
            .map(|file| file.into_file(parent_id)))
    }

    #[instrument(skip(self, content), fields(content_length = ?content.content_length))]
    async fn upload_file(
        &self,
        parent_id: &str,
        name: &str,
        mime_type: &str,
        content: ByteStream,
    ) -> Result<DestinationFile> {
        Ok(self
            .upload_resumable(parent_id, name, mime_type, content)
            .await?)
    }
}
