//! # Authentication Module
//!
//! OAuth 2.0 credentials for the destination storage.
//!
//! ## Overview
//!
//! This crate implements the installed-application authorization flow,
//! refreshes access tokens before they lapse and persists them through the
//! platform secure store, so only the first run needs a browser.
//!
//! ## Features
//!
//! - OAuth 2.0 authorization-code flow with PKCE
//! - `credentials.json` client secrets parsing
//! - Token refresh with fallback to interactive authorization
//! - Token persistence via `SecureStore`

pub mod credential;
pub mod error;
pub mod oauth;
pub mod token_store;
pub mod types;

pub use credential::{
    CredentialProvider, InteractiveAuthorizer, LoopbackAuthorizer, PersistentCredentialProvider,
    StaticCredential,
};
pub use error::{AuthError, Result};
pub use oauth::{ClientSecrets, OAuthConfig, OAuthFlowManager, PkceVerifier};
pub use token_store::TokenStore;
pub use types::{OAuthTokens, ProviderKind};
