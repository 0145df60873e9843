//! # Archive Configuration
//!
//! The configuration system uses a builder pattern to construct an
//! `ArchiveConfig`. It enforces fail-fast validation so a bad value is
//! rejected before any network call is made.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::ArchiveConfig;
//!
//! let config = ArchiveConfig::builder()
//!     .archive_folder_name("Panopto Videos")
//!     .folder_filter("CSE")
//!     .build()?;
//! ```

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

pub const DEFAULT_ARCHIVE_FOLDER: &str = "Panopto Videos";
pub const DEFAULT_FILE_EXTENSION: &str = "mp4";
pub const DEFAULT_MIME_TYPE: &str = "video/mp4";
pub const DEFAULT_PAGE_SIZE: u32 = 50;
pub const MAX_PAGE_SIZE: u32 = 1000;

/// Resumable upload chunks must be a multiple of this.
pub const UPLOAD_CHUNK_GRANULARITY: usize = 256 * 1024;
pub const DEFAULT_UPLOAD_CHUNK_SIZE: usize = 8 * 1024 * 1024;

/// Settings of one sync run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchiveConfig {
    /// Display name of the top-level destination folder
    pub archive_folder_name: String,

    /// Case-sensitive substring a source folder name must contain.
    /// `None` scans every folder.
    pub folder_filter: Option<String>,

    /// Extension appended to the video name, without the dot
    pub file_extension: String,

    /// MIME type recorded on uploaded files
    pub mime_type: String,

    /// Sessions requested per listing page
    pub page_size: u32,

    /// Bytes sent per resumable upload request
    pub upload_chunk_size: usize,

    /// Warn and continue when a folder's sessions cannot be listed
    pub skip_unlistable_folders: bool,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            archive_folder_name: DEFAULT_ARCHIVE_FOLDER.to_string(),
            folder_filter: None,
            file_extension: DEFAULT_FILE_EXTENSION.to_string(),
            mime_type: DEFAULT_MIME_TYPE.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            upload_chunk_size: DEFAULT_UPLOAD_CHUNK_SIZE,
            skip_unlistable_folders: false,
        }
    }
}

impl ArchiveConfig {
    pub fn builder() -> ArchiveConfigBuilder {
        ArchiveConfigBuilder::default()
    }

    /// Validates the configuration
    pub fn validate(&self) -> Result<()> {
        if self.archive_folder_name.trim().is_empty() {
            return Err(Error::Config(
                "Archive folder name cannot be empty".to_string(),
            ));
        }

        if let Some(filter) = &self.folder_filter {
            if filter.is_empty() {
                return Err(Error::Config(
                    "Folder filter cannot be empty; omit it to scan all folders".to_string(),
                ));
            }
        }

        if self.file_extension.is_empty() || self.file_extension.starts_with('.') {
            return Err(Error::Config(format!(
                "File extension must be non-empty and given without a leading dot, got '{}'",
                self.file_extension
            )));
        }

        if !self.mime_type.contains('/') {
            return Err(Error::Config(format!(
                "Invalid MIME type '{}'",
                self.mime_type
            )));
        }

        if self.page_size == 0 || self.page_size > MAX_PAGE_SIZE {
            return Err(Error::Config(format!(
                "Page size must be between 1 and {}, got {}",
                MAX_PAGE_SIZE, self.page_size
            )));
        }

        if self.upload_chunk_size == 0 || self.upload_chunk_size % UPLOAD_CHUNK_GRANULARITY != 0 {
            return Err(Error::Config(format!(
                "Upload chunk size must be a non-zero multiple of {} bytes, got {}",
                UPLOAD_CHUNK_GRANULARITY, self.upload_chunk_size
            )));
        }

        Ok(())
    }

    /// Whether a source folder with this name is in scope.
    pub fn matches_folder(&self, name: &str) -> bool {
        match &self.folder_filter {
            Some(filter) => name.contains(filter.as_str()),
            None => true,
        }
    }

    /// Destination file name for a source video name.
    pub fn file_name_for(&self, video_name: &str) -> String {
        format!("{}.{}", video_name, self.file_extension)
    }
}

/// Builder for [`ArchiveConfig`]
#[derive(Debug, Default)]
pub struct ArchiveConfigBuilder {
    archive_folder_name: Option<String>,
    folder_filter: Option<String>,
    file_extension: Option<String>,
    mime_type: Option<String>,
    page_size: Option<u32>,
    upload_chunk_size: Option<usize>,
    skip_unlistable_folders: bool,
}

impl ArchiveConfigBuilder {
    pub fn archive_folder_name(mut self, name: impl Into<String>) -> Self {
        self.archive_folder_name = Some(name.into());
        self
    }

    pub fn folder_filter(mut self, filter: impl Into<String>) -> Self {
        self.folder_filter = Some(filter.into());
        self
    }

    /// Scan every folder regardless of name.
    pub fn all_folders(mut self) -> Self {
        self.folder_filter = None;
        self
    }

    pub fn file_extension(mut self, extension: impl Into<String>) -> Self {
        self.file_extension = Some(extension.into());
        self
    }

    pub fn mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    pub fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = Some(page_size);
        self
    }

    pub fn upload_chunk_size(mut self, bytes: usize) -> Self {
        self.upload_chunk_size = Some(bytes);
        self
    }

    pub fn skip_unlistable_folders(mut self, skip: bool) -> Self {
        self.skip_unlistable_folders = skip;
        self
    }

    /// Builds and validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] describing the first invalid field.
    pub fn build(self) -> Result<ArchiveConfig> {
        let defaults = ArchiveConfig::default();

        let config = ArchiveConfig {
            archive_folder_name: self
                .archive_folder_name
                .unwrap_or(defaults.archive_folder_name),
            folder_filter: self.folder_filter,
            file_extension: self.file_extension.unwrap_or(defaults.file_extension),
            mime_type: self.mime_type.unwrap_or(defaults.mime_type),
            page_size: self.page_size.unwrap_or(defaults.page_size),
            upload_chunk_size: self
                .upload_chunk_size
                .unwrap_or(defaults.upload_chunk_size),
            skip_unlistable_folders: self.skip_unlistable_folders,
        };

        config.validate()?;
        Ok(config)
    }
}
