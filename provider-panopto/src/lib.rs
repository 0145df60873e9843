//! Panopto Provider
//!
//! Reads the lecture catalog of a Panopto site that signs users in through
//! a university SAML identity provider.
//!
//! ## Overview
//!
//! - [`SamlAuthenticator`] replays the browser sign-in so the shared HTTP
//!   client's cookie jar holds a Panopto session
//! - [`PanoptoConnector`] implements `VideoSource`: folders with their
//!   session counts, the sessions of each folder, and a streaming download
//!   of each session's MP4 rendition
//!
//! Rejected credentials and expired sessions surface as
//! `BridgeError::Unauthorized`; everything else is `OperationFailed`.

pub mod auth;
pub mod connector;
pub mod endpoints;
pub mod error;
pub mod types;

pub use auth::{PanoptoCredentials, SamlAuthenticator};
pub use connector::PanoptoConnector;
pub use endpoints::PanoptoEndpoints;
pub use error::{PanoptoError, Result};
