//! # Transfer Executor
//!
//! Performs the destination mutations of a run: creating folders and
//! streaming a source video into a new destination file.

use bridge_traits::archive::{ArchiveStore, DestinationFile, DestinationFolder};
use bridge_traits::http::ByteStream;
use bridge_traits::source::VideoSource;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::io::InspectReader;
use tracing::{debug, info, instrument};

use crate::error::{Result, SyncError};
use crate::planner::TransferTask;

/// Result of one completed transfer
#[derive(Debug, Clone)]
pub struct TransferOutcome {
    pub file: DestinationFile,
    /// Bytes read from the source stream
    pub bytes: u64,
    pub elapsed: Duration,
}

pub struct TransferExecutor {
    source: Arc<dyn VideoSource>,
    store: Arc<dyn ArchiveStore>,
    mime_type: String,
}

impl TransferExecutor {
    pub fn new(source: Arc<dyn VideoSource>, store: Arc<dyn ArchiveStore>, mime_type: impl Into<String>) -> Self {
        Self {
            source,
            store,
            mime_type: mime_type.into(),
        }
    }

    #[instrument(skip(self))]
    pub async fn create_folder(&self, parent_id: &str, name: &str) -> Result<DestinationFolder> {
        let folder = self
            .store
            .create_folder(parent_id, name)
            .await
            .map_err(|e| SyncError::from_bridge(format!("creating folder '{}'", name), e))?;
        info!(folder = %name, folder_id = %folder.id, "Created destination folder");
        Ok(folder)
    }

    /// Stream the video into a new file. Bytes pass straight from the source
    /// body to the upload; the file only exists once the upload completes.
    #[instrument(skip(self, task), fields(file = %task.filename))]
    pub async fn transfer(&self, task: &TransferTask) -> Result<TransferOutcome> {
        let started = Instant::now();
        let video = &task.source_video;

        let stream = self
            .source
            .open_video(video)
            .await
            .map_err(|e| SyncError::from_bridge(format!("downloading '{}'", video.name), e))?;
        debug!(content_length = ?stream.content_length, "Source stream opened");

        let counter = Arc::new(AtomicU64::new(0));
        let counted = Arc::clone(&counter);
        let reader = InspectReader::new(stream.reader, move |chunk: &[u8]| {
            counted.fetch_add(chunk.len() as u64, Ordering::Relaxed);
        });
        let content = ByteStream::new(Box::new(reader), stream.content_length);

        let file = self
            .store
            .upload_file(&task.destination_folder_id, &task.filename, &self.mime_type, content)
            .await
            .map_err(|e| SyncError::from_bridge(format!("uploading '{}'", task.filename), e))?;

        let outcome = TransferOutcome {
            file,
            bytes: counter.load(Ordering::Relaxed),
            elapsed: started.elapsed(),
        };
        info!(
            file = %task.filename,
            bytes = outcome.bytes,
            elapsed_ms = outcome.elapsed.as_millis() as u64,
            "Transferred video"
        );
        Ok(outcome)
    }
}
