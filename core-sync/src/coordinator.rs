//! # Sync Coordinator
//!
//! Walks the source catalog and makes the destination mirror it.
//!
//! ## Workflow
//!
//! For each folder selected by the [`SourceCatalog`], in listing order:
//! 1. List its videos; a folder without videos is left alone
//! 2. Resolve the destination folder under the archive root, creating the
//!    archive root and the folder when missing
//! 3. For each video, ask the [`SyncPlanner`] whether its file exists
//! 4. Hand every missing one to the [`TransferExecutor`]
//!
//! Everything runs one call at a time. The first error ends the run; since
//! completed files are skipped next time, re-running resumes the work.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use core_sync::SyncCoordinator;
//!
//! let coordinator = SyncCoordinator::new(source, store, config)?;
//! let report = coordinator.run().await?;
//! println!("{}", report);
//! ```

use bridge_traits::archive::{ArchiveStore, DestinationFolder};
use bridge_traits::source::{SourceFolder, VideoSource};
use core_runtime::config::ArchiveConfig;
use futures::TryStreamExt;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, instrument};

use crate::catalog::SourceCatalog;
use crate::error::Result;
use crate::executor::TransferExecutor;
use crate::planner::{SyncPlanner, VideoAction};
use crate::report::SyncReport;

pub struct SyncCoordinator {
    config: ArchiveConfig,
    root_folder_id: String,
    catalog: SourceCatalog,
    planner: SyncPlanner,
    executor: TransferExecutor,
}

impl SyncCoordinator {
    /// # Errors
    ///
    /// Returns `SyncError::Config` when `config` fails validation.
    pub fn new(
        source: Arc<dyn VideoSource>,
        store: Arc<dyn ArchiveStore>,
        config: ArchiveConfig,
    ) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            root_folder_id: store.root_folder_id().to_string(),
            catalog: SourceCatalog::new(Arc::clone(&source), config.clone()),
            planner: SyncPlanner::new(Arc::clone(&store), config.clone()),
            executor: TransferExecutor::new(source, store, config.mime_type.clone()),
            config,
        })
    }

    pub fn config(&self) -> &ArchiveConfig {
        &self.config
    }

    /// Run one sync pass over the whole catalog.
    #[instrument(skip(self), fields(archive = %self.config.archive_folder_name))]
    pub async fn run(&self) -> Result<SyncReport> {
        let started = Instant::now();
        let mut report = SyncReport::new();
        let mut archive_root: Option<DestinationFolder> = None;

        info!(filter = ?self.config.folder_filter, "Starting sync");

        let mut folders = self.catalog.folders();
        while let Some(folder) = folders.try_next().await? {
            report.folders_scanned += 1;
            self.sync_folder(&folder, &mut archive_root, &mut report)
                .await?;
        }

        report.duration = started.elapsed();
        info!(
            folders_scanned = report.folders_scanned,
            folders_created = report.folders_created,
            videos_transferred = report.videos_transferred,
            videos_skipped = report.videos_skipped,
            bytes_transferred = report.bytes_transferred,
            "Sync complete"
        );
        Ok(report)
    }

    #[instrument(skip_all, fields(folder = %folder.name))]
    async fn sync_folder(
        &self,
        folder: &SourceFolder,
        archive_root: &mut Option<DestinationFolder>,
        report: &mut SyncReport,
    ) -> Result<()> {
        let videos = self.catalog.videos(folder).await?;
        if videos.is_empty() {
            debug!("No videos, nothing to archive");
            report.folders_empty += 1;
            return Ok(());
        }
        info!(videos = videos.len(), "Scanning folder");
        report.videos_seen += videos.len() as u64;

        let root_id = match archive_root {
            Some(root) => root.id.clone(),
            None => {
                let root = self
                    .resolve_folder(&self.root_folder_id, &self.config.archive_folder_name, report)
                    .await?;
                let id = root.id.clone();
                *archive_root = Some(root);
                id
            }
        };
        let destination = self.resolve_folder(&root_id, &folder.name, report).await?;

        for video in &videos {
            match self.planner.plan_video(&destination.id, video).await? {
                VideoAction::Skip { .. } => report.videos_skipped += 1,
                VideoAction::Transfer(task) => {
                    let outcome = self.executor.transfer(&task).await?;
                    report.videos_transferred += 1;
                    report.bytes_transferred += outcome.bytes;
                }
            }
        }

        Ok(())
    }

    /// Existing child folder named `name`, created when missing.
    async fn resolve_folder(
        &self,
        parent_id: &str,
        name: &str,
        report: &mut SyncReport,
    ) -> Result<DestinationFolder> {
        if let Some(folder) = self.planner.find_folder(parent_id, name).await? {
            debug!(folder = %name, folder_id = %folder.id, "Reusing destination folder");
            return Ok(folder);
        }

        let folder = self.executor.create_folder(parent_id, name).await?;
        report.folders_created += 1;
        Ok(folder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SyncError;
    use crate::tests::{MockSource, MockStore};
    use bridge_traits::archive::DestinationFile;
    use bridge_traits::error::BridgeError;
    use bridge_traits::source::SourceVideo;

    fn folder(name: &str) -> SourceFolder {
        SourceFolder {
            id: format!("src-{}", name),
            name: name.to_string(),
            session_count: 1,
        }
    }

    fn video(name: &str) -> SourceVideo {
        SourceVideo {
            id: format!("vid-{}", name),
            name: name.to_string(),
            folder_id: "src-CSE101".to_string(),
            download_url: String::new(),
        }
    }

    fn dest(id: &str, name: &str, parent: &str) -> DestinationFolder {
        DestinationFolder {
            id: id.to_string(),
            name: name.to_string(),
            parent_id: parent.to_string(),
        }
    }

    fn store_with_root() -> MockStore {
        let mut store = MockStore::new();
        store.expect_root_folder_id().return_const("root".to_string());
        store
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut config = ArchiveConfig::default();
        config.archive_folder_name = String::new();

        let result = SyncCoordinator::new(Arc::new(MockSource::new()), Arc::new(store_with_root()), config);
        assert!(matches!(result, Err(SyncError::Config(_))));
    }

    #[tokio::test]
    async fn test_empty_folder_creates_nothing() {
        let mut source = MockSource::new();
        source.expect_list_folders().returning(|| Ok(vec![folder("CSE101")]));
        source.expect_list_videos().returning(|_| Ok(Vec::new()));

        let mut store = store_with_root();
        store.expect_find_folder().never();
        store.expect_create_folder().never();

        let coordinator =
            SyncCoordinator::new(Arc::new(source), Arc::new(store), ArchiveConfig::default()).unwrap();
        let report = coordinator.run().await.unwrap();

        assert_eq!(report.folders_scanned, 1);
        assert_eq!(report.folders_empty, 1);
        assert!(report.is_noop());
    }

    #[tokio::test]
    async fn test_existing_files_are_not_transferred() {
        let mut source = MockSource::new();
        source.expect_list_folders().returning(|| Ok(vec![folder("CSE101")]));
        source
            .expect_list_videos()
            .returning(|_| Ok(vec![video("lecture1"), video("lecture2")]));
        source.expect_open_video().never();

        let mut store = store_with_root();
        store.expect_find_folder().returning(|parent, name| {
            Ok(Some(match parent {
                "root" => dest("archive", name, parent),
                _ => dest("dest-cse101", name, parent),
            }))
        });
        store.expect_find_file().times(2).returning(|parent, name| {
            Ok(Some(DestinationFile {
                id: format!("file-{}", name),
                name: name.to_string(),
                parent_id: parent.to_string(),
                size: None,
            }))
        });
        store.expect_upload_file().never();

        let coordinator =
            SyncCoordinator::new(Arc::new(source), Arc::new(store), ArchiveConfig::default()).unwrap();
        let report = coordinator.run().await.unwrap();

        assert_eq!(report.videos_seen, 2);
        assert_eq!(report.videos_skipped, 2);
        assert!(report.is_noop());
    }

    #[tokio::test]
    async fn test_first_error_stops_the_run() {
        let mut source = MockSource::new();
        source
            .expect_list_folders()
            .returning(|| Ok(vec![folder("CSE101"), folder("CSE142")]));
        source
            .expect_list_videos()
            .times(1)
            .returning(|_| Err(BridgeError::Unauthorized("session expired".to_string())));

        let coordinator =
            SyncCoordinator::new(Arc::new(source), Arc::new(store_with_root()), ArchiveConfig::default())
                .unwrap();
        let err = coordinator.run().await.unwrap_err();
        assert!(err.is_authentication());
    }
}
