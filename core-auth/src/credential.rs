//! Credential acquisition
//!
//! [`PersistentCredentialProvider`] hands out a valid access token for the
//! destination storage using this strategy:
//!
//! ```text
//! cached / persisted token ──not expired──▶ use it
//!          │ expired, refresh token present
//!          ▼
//!      refresh ──ok──▶ persist, use it
//!          │ failed or no refresh token
//!          ▼
//!   interactive authorization ──▶ persist, use it
//! ```
//!
//! The interactive step is an injectable [`InteractiveAuthorizer`] so the
//! strategy can be exercised without a browser.

use crate::error::{AuthError, Result};
use crate::oauth::OAuthFlowManager;
use crate::token_store::TokenStore;
use crate::types::{OAuthTokens, ProviderKind};
use async_trait::async_trait;
use bridge_traits::auth::AuthorizationPrompt;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

/// Source of bearer tokens for API requests.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// A currently valid access token.
    async fn access_token(&self) -> Result<String>;
}

/// Obtains a fresh token set with user involvement.
#[async_trait]
pub trait InteractiveAuthorizer: Send + Sync {
    async fn authorize(&self) -> Result<OAuthTokens>;
}

/// Authorization-code flow with PKCE, completed through an [`AuthorizationPrompt`].
pub struct LoopbackAuthorizer {
    flow: Arc<OAuthFlowManager>,
    prompt: Arc<dyn AuthorizationPrompt>,
}

impl LoopbackAuthorizer {
    /// `flow` must be configured with `prompt.redirect_uri()`.
    pub fn new(flow: Arc<OAuthFlowManager>, prompt: Arc<dyn AuthorizationPrompt>) -> Self {
        Self { flow, prompt }
    }
}

#[async_trait]
impl InteractiveAuthorizer for LoopbackAuthorizer {
    #[instrument(skip(self), fields(provider = %self.flow.config().provider))]
    async fn authorize(&self) -> Result<OAuthTokens> {
        let provider = self.flow.config().provider;
        let (auth_url, verifier) = self.flow.build_auth_url()?;

        self.prompt
            .present(&auth_url)
            .await
            .map_err(|e| AuthError::Other(format!("Failed to present authorization URL: {}", e)))?;

        let redirect = self.prompt.wait_for_redirect().await.map_err(|e| {
            AuthError::Other(format!("Failed to receive authorization redirect: {}", e))
        })?;

        if let Some(error) = redirect.error {
            return Err(AuthError::AuthenticationFailed {
                provider: provider.to_string(),
                reason: error,
            });
        }

        let code = redirect
            .code
            .ok_or_else(|| AuthError::InvalidAuthCode("redirect carried no code".to_string()))?;
        let state = redirect.state.unwrap_or_default();

        self.flow.exchange_code(&code, &state, &verifier).await
    }
}

/// Token cache backed by persistent storage, refresh and interactive authorization.
pub struct PersistentCredentialProvider {
    provider: ProviderKind,
    flow: Arc<OAuthFlowManager>,
    store: TokenStore,
    authorizer: Arc<dyn InteractiveAuthorizer>,
    cached: Mutex<Option<OAuthTokens>>,
}

impl PersistentCredentialProvider {
    pub fn new(
        flow: Arc<OAuthFlowManager>,
        store: TokenStore,
        authorizer: Arc<dyn InteractiveAuthorizer>,
    ) -> Self {
        Self {
            provider: flow.config().provider,
            flow,
            store,
            authorizer,
            cached: Mutex::new(None),
        }
    }

    async fn load_persisted(&self) -> Result<Option<OAuthTokens>> {
        match self.store.retrieve_tokens(self.provider).await {
            Ok(tokens) => Ok(tokens),
            Err(AuthError::TokenCorrupted { reason, .. }) => {
                warn!(provider = %self.provider, %reason, "Discarding unreadable stored token");
                self.store.delete_tokens(self.provider).await?;
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Turn whatever we have into a usable token set, persisting anything new.
    async fn acquire(&self, current: Option<OAuthTokens>) -> Result<OAuthTokens> {
        if let Some(tokens) = current {
            if !tokens.is_expired() {
                return Ok(tokens);
            }

            if let Some(refresh_token) = tokens.refresh_token.as_deref().filter(|t| !t.is_empty())
            {
                debug!(provider = %self.provider, "Access token expired, refreshing");
                match self.flow.refresh_access_token(refresh_token).await {
                    Ok(refreshed) => {
                        self.store.store_tokens(self.provider, &refreshed).await?;
                        return Ok(refreshed);
                    }
                    Err(e) => {
                        warn!(
                            provider = %self.provider,
                            error = %e,
                            "Token refresh failed, falling back to interactive authorization"
                        );
                    }
                }
            }
        }

        info!(provider = %self.provider, "Interactive authorization required");
        let tokens = self.authorizer.authorize().await?;
        self.store.store_tokens(self.provider, &tokens).await?;
        Ok(tokens)
    }
}

#[async_trait]
impl CredentialProvider for PersistentCredentialProvider {
    async fn access_token(&self) -> Result<String> {
        let mut cached = self.cached.lock().await;

        if let Some(tokens) = cached.as_ref().filter(|t| !t.is_expired()) {
            return Ok(tokens.access_token.clone());
        }

        let current = match cached.take() {
            Some(tokens) => Some(tokens),
            None => self.load_persisted().await?,
        };

        let tokens = self.acquire(current).await?;
        let access_token = tokens.access_token.clone();
        *cached = Some(tokens);
        Ok(access_token)
    }
}

/// Fixed token, for tests and for callers that manage tokens themselves.
pub struct StaticCredential(String);

impl StaticCredential {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self(access_token.into())
    }
}

#[async_trait]
impl CredentialProvider for StaticCredential {
    async fn access_token(&self) -> Result<String> {
        Ok(self.0.clone())
    }
}
