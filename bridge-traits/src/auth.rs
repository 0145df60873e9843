//! Interactive Authorization Abstraction
//!
//! The user-facing half of an OAuth authorization-code flow: showing the
//! consent page and receiving the redirect.

use async_trait::async_trait;

use crate::error::Result;

/// Query parameters delivered to the redirect URI.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthorizationRedirect {
    pub code: Option<String>,
    pub state: Option<String>,
    /// `error` parameter, set when the user denied access
    pub error: Option<String>,
}

#[async_trait]
pub trait AuthorizationPrompt: Send + Sync {
    /// Redirect URI registered with the provider for this prompt.
    fn redirect_uri(&self) -> String;

    /// Show the consent page to the user.
    async fn present(&self, authorization_url: &str) -> Result<()>;

    /// Wait until the provider redirects the user back.
    async fn wait_for_redirect(&self) -> Result<AuthorizationRedirect>;
}
