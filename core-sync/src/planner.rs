//! # Sync Planner
//!
//! Decides per video whether it still has to be copied. The destination is
//! queried afresh for every decision; presence of a file with the expected
//! name is the only criterion.

use bridge_traits::archive::{ArchiveStore, DestinationFile, DestinationFolder};
use bridge_traits::source::SourceVideo;
use core_runtime::config::ArchiveConfig;
use std::sync::Arc;
use tracing::debug;

use crate::error::{Result, SyncError};

/// A video that has no counterpart in the destination yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferTask {
    pub source_video: SourceVideo,
    pub destination_folder_id: String,
    /// Destination file name, extension included
    pub filename: String,
}

impl TransferTask {
    pub fn source_video_id(&self) -> &str {
        &self.source_video.id
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VideoAction {
    /// A file of that name already exists
    Skip { existing: DestinationFile },
    Transfer(TransferTask),
}

pub struct SyncPlanner {
    store: Arc<dyn ArchiveStore>,
    config: ArchiveConfig,
}

impl SyncPlanner {
    pub fn new(store: Arc<dyn ArchiveStore>, config: ArchiveConfig) -> Self {
        Self { store, config }
    }

    pub async fn find_folder(&self, parent_id: &str, name: &str) -> Result<Option<DestinationFolder>> {
        self.store
            .find_folder(parent_id, name)
            .await
            .map_err(|e| SyncError::from_bridge(format!("looking up folder '{}'", name), e))
    }

    /// Skip when `<video name>.<extension>` exists under the folder.
    ///
    /// Two source videos sharing a name map to the same file, so once the
    /// first is copied the second is skipped.
    pub async fn plan_video(&self, destination_folder_id: &str, video: &SourceVideo) -> Result<VideoAction> {
        let filename = self.config.file_name_for(&video.name);

        let existing = self
            .store
            .find_file(destination_folder_id, &filename)
            .await
            .map_err(|e| SyncError::from_bridge(format!("looking up file '{}'", filename), e))?;

        match existing {
            Some(existing) => {
                debug!(
                    video_id = %video.id,
                    file = %filename,
                    file_id = %existing.id,
                    "Already archived, skipping"
                );
                Ok(VideoAction::Skip { existing })
            }
            None => Ok(VideoAction::Transfer(TransferTask {
                source_video: video.clone(),
                destination_folder_id: destination_folder_id.to_string(),
                filename,
            })),
        }
    }
}
