//! # Sync Module
//!
//! Copies lecture recordings from a video source into an archive store,
//! skipping whatever a previous run already copied.
//!
//! ## Overview
//!
//! A run is strictly sequential and keeps no state of its own: what has been
//! archived is read back from the destination every time, so an interrupted
//! run is resumed by running again.
//!
//! ## Components
//!
//! - **Source Catalog Reader** (`catalog`): Lazy stream of the folders to scan, filtered by name
//! - **Sync Planner** (`planner`): Per-video skip/transfer decision by destination file name
//! - **Transfer Executor** (`executor`): Folder creation and streaming video transfer
//! - **Sync Coordinator** (`coordinator`): The run loop tying the three together
//! - **Sync Report** (`report`): Counters of a finished run

pub mod catalog;
pub mod coordinator;
pub mod error;
pub mod executor;
pub mod planner;
pub mod report;

pub use catalog::SourceCatalog;
pub use coordinator::SyncCoordinator;
pub use error::{Result, SyncError};
pub use executor::{TransferExecutor, TransferOutcome};
pub use planner::{SyncPlanner, TransferTask, VideoAction};
pub use report::SyncReport;

#[cfg(test)]
pub(crate) mod tests {
    use async_trait::async_trait;
    use bridge_traits::archive::{ArchiveStore, DestinationFile, DestinationFolder};
    use bridge_traits::error::Result;
    use bridge_traits::http::ByteStream;
    use bridge_traits::source::{SourceFolder, SourceVideo, VideoSource};
    use mockall::mock;

    mock! {
        pub Source {}

        #[async_trait]
        impl VideoSource for Source {
            async fn list_folders(&self) -> Result<Vec<SourceFolder>>;
            async fn list_videos(&self, folder: &SourceFolder) -> Result<Vec<SourceVideo>>;
            async fn open_video(&self, video: &SourceVideo) -> Result<ByteStream>;
        }
    }

    mock! {
        pub Store {}

        #[async_trait]
        impl ArchiveStore for Store {
            fn root_folder_id(&self) -> &str;
            async fn find_folder(&self, parent_id: &str, name: &str) -> Result<Option<DestinationFolder>>;
            async fn create_folder(&self, parent_id: &str, name: &str) -> Result<DestinationFolder>;
            async fn find_file(&self, parent_id: &str, name: &str) -> Result<Option<DestinationFile>>;
            async fn upload_file(
                &self,
                parent_id: &str,
                name: &str,
                mime_type: &str,
                content: ByteStream,
            ) -> Result<DestinationFile>;
        }
    }
}
