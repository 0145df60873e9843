use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// Counters of one sync run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    /// Folders that passed the filter
    pub folders_scanned: u64,
    /// Scanned folders that yielded no videos
    pub folders_empty: u64,
    /// Destination folders created, archive root included
    pub folders_created: u64,
    /// Videos seen in scanned folders
    pub videos_seen: u64,
    /// Videos skipped because their file already exists
    pub videos_skipped: u64,
    /// Videos copied during this run
    pub videos_transferred: u64,
    pub bytes_transferred: u64,
    #[serde(skip)]
    pub duration: Duration,
}

impl SyncReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the run left the destination untouched.
    pub fn is_noop(&self) -> bool {
        self.folders_created == 0 && self.videos_transferred == 0
    }
}

impl fmt::Display for SyncReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} folders scanned ({} empty, {} created), {} videos seen, {} transferred ({} bytes), {} already archived, in {:.1}s",
            self.folders_scanned,
            self.folders_empty,
            self.folders_created,
            self.videos_seen,
            self.videos_transferred,
            self.bytes_transferred,
            self.videos_skipped,
            self.duration.as_secs_f64()
        )
    }
}
