//! # Host Bridge Traits
//!
//! Abstractions every lecture-sync component is written against.
//!
//! ## Overview
//!
//! The sync core never talks to a network library, a keychain or a browser
//! directly. Each capability it needs is a trait here, implemented by
//! `bridge-desktop` (host facilities) or a provider crate (remote services).
//!
//! ## Traits
//!
//! ### Networking & I/O
//! - [`HttpClient`](http::HttpClient) - Async HTTP with cookies, retry and streaming downloads
//!
//! ### Security & Storage
//! - [`SecureStore`](storage::SecureStore) - Credential persistence
//! - [`AuthorizationPrompt`](auth::AuthorizationPrompt) - Interactive OAuth consent
//!
//! ### Remote Services
//! - [`VideoSource`](source::VideoSource) - Lecture catalog on the video platform
//! - [`ArchiveStore`](archive::ArchiveStore) - Cloud storage receiving the archive
//!
//! ## Error Handling
//!
//! All bridge traits use [`BridgeError`](error::BridgeError). Implementations
//! should map rejected credentials to `BridgeError::Unauthorized` so callers
//! can tell an expired session from a flaky network.
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` so they can be shared behind `Arc`.

pub mod archive;
pub mod auth;
pub mod error;
pub mod http;
pub mod source;
pub mod storage;

pub use error::BridgeError;

pub use archive::{ArchiveStore, DestinationFile, DestinationFolder};
pub use auth::{AuthorizationPrompt, AuthorizationRedirect};
pub use http::{ByteReader, ByteStream, HttpClient, HttpMethod, HttpRequest, HttpResponse, RetryPolicy};
pub use source::{SourceFolder, SourceVideo, VideoSource};
pub use storage::SecureStore;
