//! Panopto catalog connector
//!
//! Implements `VideoSource` against the endpoints the Panopto web UI uses.
//! Requests rely on the session cookies set by [`SamlAuthenticator`], so the
//! connector and the authenticator must share one `HttpClient`.

use async_trait::async_trait;
use bridge_traits::error::Result;
use bridge_traits::http::{ByteStream, HttpClient, HttpMethod, HttpRequest};
use bridge_traits::source::{SourceFolder, SourceVideo, VideoSource};
use core_runtime::config::DEFAULT_PAGE_SIZE;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::auth::{PanoptoCredentials, SamlAuthenticator};
use crate::endpoints::PanoptoEndpoints;
use crate::error::PanoptoError;
use crate::types::{FolderEntry, SessionsEnvelope, SessionsRequest};

/// Panopto connector
///
/// # Example
///
/// ```ignore
/// use provider_panopto::{PanoptoConnector, PanoptoCredentials};
/// use bridge_traits::source::VideoSource;
///
/// let connector = PanoptoConnector::new(http_client);
/// connector.sign_in(&PanoptoCredentials::new(user, password)?).await?;
/// let folders = connector.list_folders().await?;
/// ```
pub struct PanoptoConnector {
    http_client: Arc<dyn HttpClient>,
    endpoints: PanoptoEndpoints,
    page_size: u32,
    skip_unlistable_folders: bool,
}

impl PanoptoConnector {
    pub fn new(http_client: Arc<dyn HttpClient>) -> Self {
        Self {
            http_client,
            endpoints: PanoptoEndpoints::default(),
            page_size: DEFAULT_PAGE_SIZE,
            skip_unlistable_folders: false,
        }
    }

    pub fn with_endpoints(mut self, endpoints: PanoptoEndpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Whether a folder whose sessions cannot be listed is treated as empty
    /// instead of failing the run.
    pub fn with_skip_unlistable_folders(mut self, skip: bool) -> Self {
        self.skip_unlistable_folders = skip;
        self
    }

    /// Sign in through SAML single sign-on.
    pub async fn sign_in(&self, credentials: &PanoptoCredentials) -> Result<()> {
        SamlAuthenticator::new(Arc::clone(&self.http_client), self.endpoints.clone())
            .sign_in(credentials)
            .await
            .map_err(Into::into)
    }

    async fn fetch_folder_page(&self, page: u32) -> std::result::Result<Vec<FolderEntry>, PanoptoError> {
        let url = self.endpoints.folders_url(page);
        let request = HttpRequest::new(HttpMethod::Get, url).header("Accept", "application/json");
        let response = self.http_client.execute(request).await?;

        if !response.is_success() {
            return Err(PanoptoError::from_status(response.status, "listing folders"));
        }

        response
            .json::<Vec<FolderEntry>>()
            .map_err(|e| PanoptoError::ParseError(format!("folder listing: {}", e)))
    }

    async fn fetch_session_page(
        &self,
        folder: &SourceFolder,
        page: u32,
    ) -> std::result::Result<SessionsEnvelope, PanoptoError> {
        let request = HttpRequest::new(HttpMethod::Post, self.endpoints.sessions_url())
            .header("Accept", "application/json")
            .json(&SessionsRequest::for_folder(&folder.id, self.page_size, page))?;
        let response = self.http_client.execute(request).await?;

        if !response.is_success() {
            return Err(PanoptoError::from_status(
                response.status,
                format!("listing sessions of '{}'", folder.name),
            ));
        }

        response
            .json::<SessionsEnvelope>()
            .map_err(|e| PanoptoError::ParseError(format!("session listing: {}", e)))
    }
}

#[async_trait]
impl VideoSource for PanoptoConnector {
    #[instrument(skip(self))]
    async fn list_folders(&self) -> Result<Vec<SourceFolder>> {
        let mut folders = Vec::new();
        let mut seen = HashSet::new();
        let mut page = 0;

        loop {
            let entries = self.fetch_folder_page(page).await?;
            let before = seen.len();

            for entry in entries {
                if seen.insert(entry.id.clone()) {
                    folders.push(SourceFolder {
                        id: entry.id,
                        name: entry.name,
                        session_count: entry.session_count.unwrap_or(0),
                    });
                }
            }

            // An empty page, or one that only repeats known folders, ends
            // the listing.
            if seen.len() == before {
                break;
            }
            page += 1;
        }

        info!(count = folders.len(), "Listed Panopto folders");
        Ok(folders)
    }

    #[instrument(skip(self, folder), fields(folder = %folder.name))]
    async fn list_videos(&self, folder: &SourceFolder) -> Result<Vec<SourceVideo>> {
        let mut videos = Vec::new();
        let mut seen = HashSet::new();
        let mut page = 0;

        loop {
            let envelope = match self.fetch_session_page(folder, page).await {
                Ok(envelope) => envelope,
                // Only a refused first page is skippable.
                Err(e @ (PanoptoError::Unauthorized { .. } | PanoptoError::ApiError { .. }))
                    if page == 0 && self.skip_unlistable_folders =>
                {
                    warn!(error = %e, "Cannot list sessions of folder, skipping it");
                    return Ok(Vec::new());
                }
                Err(e) => return Err(e.into()),
            };
            let total = envelope.d.total_number;
            let results = envelope.d.results;
            let returned = results.len();
            let before = seen.len();

            for session in results {
                if !seen.insert(session.delivery_id.clone()) {
                    continue;
                }
                let Some(download_url) = session.mp4_url() else {
                    warn!(session = %session.session_name, "Session has no downloadable video, skipping");
                    continue;
                };
                videos.push(SourceVideo {
                    id: session.delivery_id,
                    name: session.session_name,
                    folder_id: folder.id.clone(),
                    download_url,
                });
            }

            let complete = match total {
                Some(total) => seen.len() as u64 >= total,
                None => returned < self.page_size as usize,
            };
            if complete || seen.len() == before {
                break;
            }
            page += 1;
        }

        debug!(count = videos.len(), "Listed sessions");
        Ok(videos)
    }

    #[instrument(skip(self, video), fields(video = %video.name))]
    async fn open_video(&self, video: &SourceVideo) -> Result<ByteStream> {
        debug!(url = %video.download_url, "Opening video stream");
        self.http_client
            .download_stream(video.download_url.clone())
            .await
    }
}
