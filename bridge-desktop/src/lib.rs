//! # Desktop Bridge Implementations
//!
//! Default implementations of bridge traits for desktop platforms
//! (macOS, Windows, Linux).
//!
//! ## Overview
//!
//! - `HttpClient` using `reqwest` with a cookie jar
//! - `SecureStore` backed by a private JSON file
//! - `SecureStore` backed by the OS keychain (`keyring` feature)
//! - `AuthorizationPrompt` using the system browser and a loopback listener
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{FileSecureStore, ReqwestHttpClient};
//!
//! let http_client = ReqwestHttpClient::new()?;
//! let store = FileSecureStore::new(FileSecureStore::default_path()?);
//! ```

mod file_store;
mod http;
mod loopback;

#[cfg(feature = "keyring")]
mod secure_store;

pub use file_store::FileSecureStore;
pub use http::ReqwestHttpClient;
pub use loopback::LoopbackPrompt;

#[cfg(feature = "keyring")]
pub use secure_store::KeyringSecureStore;
