//! # Source Catalog Reader
//!
//! Presents the source catalog as a lazy stream of the folders this run
//! should scan. Videos of a folder are requested only when the caller gets
//! to that folder.

use bridge_traits::source::{SourceFolder, SourceVideo, VideoSource};
use core_runtime::config::ArchiveConfig;
use futures::future;
use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};
use std::sync::Arc;
use tracing::debug;

use crate::error::{Result, SyncError};

pub struct SourceCatalog {
    source: Arc<dyn VideoSource>,
    config: ArchiveConfig,
}

impl SourceCatalog {
    pub fn new(source: Arc<dyn VideoSource>, config: ArchiveConfig) -> Self {
        Self { source, config }
    }

    /// Whether a folder is scanned: its name contains the filter and the
    /// source reports at least one session.
    pub fn is_selected(&self, folder: &SourceFolder) -> bool {
        if !self.config.matches_folder(&folder.name) {
            debug!(folder = %folder.name, "Folder does not match filter");
            return false;
        }
        if folder.session_count == 0 {
            debug!(folder = %folder.name, "Folder has no sessions");
            return false;
        }
        true
    }

    /// Selected folders, in source listing order.
    pub fn folders(&self) -> BoxStream<'_, Result<SourceFolder>> {
        let listing = async move {
            self.source
                .list_folders()
                .await
                .map_err(|e| SyncError::from_bridge("listing source folders", e))
        };

        stream::once(listing)
            .map_ok(|folders| stream::iter(folders.into_iter().map(Ok::<_, SyncError>)))
            .try_flatten()
            .try_filter(move |folder| future::ready(self.is_selected(folder)))
            .boxed()
    }

    pub async fn videos(&self, folder: &SourceFolder) -> Result<Vec<SourceVideo>> {
        self.source
            .list_videos(folder)
            .await
            .map_err(|e| SyncError::from_bridge(format!("listing videos of '{}'", folder.name), e))
    }
}
