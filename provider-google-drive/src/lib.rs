//! # Google Drive Provider
//!
//! Implements the `ArchiveStore` trait for Google Drive API v3.
//!
//! ## Overview
//!
//! This module provides:
//! - Exact-name lookup of folders and files under a parent, ignoring trash
//! - Folder creation
//! - Chunked resumable uploads streamed from any `AsyncRead`
//! - Bearer tokens from `core_auth::CredentialProvider`
//!
//! Transport retries (429/5xx) are left to the `HttpClient`; upload chunks
//! and folder creation are sent exactly once.

pub mod connector;
pub mod error;
pub mod types;

pub use connector::GoogleDriveConnector;
pub use error::{GoogleDriveError, Result};
