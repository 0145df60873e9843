//! Secure Token Storage
//!
//! Persists OAuth tokens through the [`SecureStore`] bridge (a private file
//! or the OS keychain on desktop).
//!
//! - Tokens are never logged or exposed in error messages
//! - Corrupted entries are erased so the next run re-authorizes cleanly
//!
//! ## Example
//!
//! ```no_run
//! use core_auth::{OAuthTokens, ProviderKind, TokenStore};
//! use std::sync::Arc;
//! # use bridge_traits::storage::SecureStore;
//! # async fn example(secure_store: Arc<dyn SecureStore>) -> core_auth::Result<()> {
//! let token_store = TokenStore::new(secure_store);
//!
//! let tokens = OAuthTokens::new("access".to_string(), Some("refresh".to_string()), 3600);
//! token_store.store_tokens(ProviderKind::GoogleDrive, &tokens).await?;
//!
//! let retrieved = token_store.retrieve_tokens(ProviderKind::GoogleDrive).await?;
//! # Ok(())
//! # }
//! ```

use crate::error::{AuthError, Result};
use crate::types::{OAuthTokens, ProviderKind};
use bridge_traits::storage::SecureStore;
use chrono::{TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Secure storage for OAuth tokens
#[derive(Clone)]
pub struct TokenStore {
    secure_store: Arc<dyn SecureStore>,
}

/// On-disk shape of a token set
#[derive(Debug, Serialize, Deserialize)]
struct StoredTokens {
    access_token: String,
    refresh_token: Option<String>,
    /// Unix timestamp, seconds
    expires_at: i64,
}

impl TokenStore {
    pub fn new(secure_store: Arc<dyn SecureStore>) -> Self {
        debug!("Initializing TokenStore");
        Self { secure_store }
    }

    /// Store OAuth tokens for a provider, overwriting any previous set.
    pub async fn store_tokens(&self, provider: ProviderKind, tokens: &OAuthTokens) -> Result<()> {
        let key = Self::storage_key(provider);

        let stored = StoredTokens {
            access_token: tokens.access_token.clone(),
            refresh_token: tokens.refresh_token.clone(),
            expires_at: tokens.expires_at.timestamp(),
        };

        let json = serde_json::to_vec(&stored).map_err(|e| {
            warn!(provider = %provider, error = %e, "Failed to serialize tokens");
            AuthError::SerializationFailed {
                context: "token serialization".to_string(),
                source: e,
            }
        })?;

        self.secure_store
            .set_secret(&key, &json)
            .await
            .map_err(|e| {
                warn!(
                    provider = %provider,
                    error = %e,
                    "Failed to store tokens in secure storage"
                );
                AuthError::SecureStorageUnavailable(e.to_string())
            })?;

        info!(
            provider = %provider,
            has_refresh_token = stored.refresh_token.is_some(),
            "Tokens stored securely"
        );

        Ok(())
    }

    /// Retrieve OAuth tokens for a provider
    ///
    /// Returns:
    /// - `Ok(Some(tokens))` if tokens exist and are valid
    /// - `Ok(None)` if no tokens exist
    /// - `Err(TokenCorrupted)` if the entry could not be decoded (it is erased)
    /// - `Err(SecureStorageUnavailable)` if the secure store failed
    pub async fn retrieve_tokens(&self, provider: ProviderKind) -> Result<Option<OAuthTokens>> {
        let key = Self::storage_key(provider);

        let data = self.secure_store.get_secret(&key).await.map_err(|e| {
            warn!(
                provider = %provider,
                error = %e,
                "Failed to retrieve tokens from secure storage"
            );
            AuthError::SecureStorageUnavailable(e.to_string())
        })?;

        let Some(data) = data else {
            debug!(provider = %provider, "No tokens found in storage");
            return Ok(None);
        };

        let decoded = serde_json::from_slice::<StoredTokens>(&data)
            .map_err(|e| e.to_string())
            .and_then(|stored| {
                Utc.timestamp_opt(stored.expires_at, 0)
                    .single()
                    .map(|expires_at| OAuthTokens {
                        access_token: stored.access_token,
                        refresh_token: stored.refresh_token,
                        expires_at,
                    })
                    .ok_or_else(|| format!("invalid expiry timestamp {}", stored.expires_at))
            });

        let tokens = match decoded {
            Ok(tokens) => tokens,
            Err(reason) => {
                warn!(
                    provider = %provider,
                    error = %reason,
                    "Failed to deserialize tokens, they may be corrupted"
                );

                if let Err(delete_err) = self.secure_store.delete_secret(&key).await {
                    warn!(
                        provider = %provider,
                        error = %delete_err,
                        "Failed to delete corrupted token data"
                    );
                }

                return Err(AuthError::TokenCorrupted {
                    provider: provider.to_string(),
                    reason,
                });
            }
        };

        debug!(
            provider = %provider,
            has_refresh_token = tokens.refresh_token.is_some(),
            expires_at = %tokens.expires_at,
            "Tokens retrieved"
        );

        Ok(Some(tokens))
    }

    /// Delete OAuth tokens for a provider. Idempotent.
    pub async fn delete_tokens(&self, provider: ProviderKind) -> Result<()> {
        let key = Self::storage_key(provider);

        self.secure_store.delete_secret(&key).await.map_err(|e| {
            warn!(
                provider = %provider,
                error = %e,
                "Failed to delete tokens from secure storage"
            );
            AuthError::SecureStorageUnavailable(e.to_string())
        })?;

        info!(provider = %provider, "Tokens deleted");
        Ok(())
    }

    /// Keys are namespaced as `oauth_tokens:<provider>`.
    fn storage_key(provider: ProviderKind) -> String {
        format!("oauth_tokens:{}", provider.as_str())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use bridge_traits::error::BridgeError;
    use std::collections::HashMap;
    use tokio::sync::Mutex;

    /// In-memory SecureStore for testing
    #[derive(Clone, Default)]
    pub(crate) struct MockSecureStore {
        pub(crate) storage: Arc<Mutex<HashMap<String, Vec<u8>>>>,
        pub(crate) fail: bool,
    }

    #[async_trait::async_trait]
    impl SecureStore for MockSecureStore {
        async fn set_secret(&self, key: &str, value: &[u8]) -> bridge_traits::error::Result<()> {
            if self.fail {
                return Err(BridgeError::NotAvailable("store offline".to_string()));
            }
            let mut storage = self.storage.lock().await;
            storage.insert(key.to_string(), value.to_vec());
            Ok(())
        }

        async fn get_secret(&self, key: &str) -> bridge_traits::error::Result<Option<Vec<u8>>> {
            if self.fail {
                return Err(BridgeError::NotAvailable("store offline".to_string()));
            }
            let storage = self.storage.lock().await;
            Ok(storage.get(key).cloned())
        }

        async fn delete_secret(&self, key: &str) -> bridge_traits::error::Result<()> {
            let mut storage = self.storage.lock().await;
            storage.remove(key);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_store_and_retrieve_tokens() {
        let secure_store = Arc::new(MockSecureStore::default());
        let token_store = TokenStore::new(secure_store.clone());

        let tokens = OAuthTokens::new(
            "access_token_123".to_string(),
            Some("refresh_token_456".to_string()),
            3600,
        );

        token_store
            .store_tokens(ProviderKind::GoogleDrive, &tokens)
            .await
            .unwrap();

        assert!(secure_store
            .storage
            .lock()
            .await
            .contains_key("oauth_tokens:google_drive"));

        let retrieved = token_store
            .retrieve_tokens(ProviderKind::GoogleDrive)
            .await
            .unwrap()
            .expect("Tokens not found");

        assert_eq!(retrieved.access_token, tokens.access_token);
        assert_eq!(retrieved.refresh_token, tokens.refresh_token);
        assert_eq!(retrieved.expires_at.timestamp(), tokens.expires_at.timestamp());
    }

    #[tokio::test]
    async fn test_retrieve_missing_tokens() {
        let token_store = TokenStore::new(Arc::new(MockSecureStore::default()));
        let result = token_store
            .retrieve_tokens(ProviderKind::GoogleDrive)
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_corrupted_tokens_are_erased() {
        let secure_store = Arc::new(MockSecureStore::default());
        secure_store
            .storage
            .lock()
            .await
            .insert("oauth_tokens:google_drive".to_string(), b"{broken".to_vec());

        let token_store = TokenStore::new(secure_store.clone());
        let result = token_store.retrieve_tokens(ProviderKind::GoogleDrive).await;

        assert!(matches!(result, Err(AuthError::TokenCorrupted { .. })));
        assert!(secure_store.storage.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_delete_tokens_is_idempotent() {
        let token_store = TokenStore::new(Arc::new(MockSecureStore::default()));
        let tokens = OAuthTokens::new("a".to_string(), None, 60);

        token_store
            .store_tokens(ProviderKind::GoogleDrive, &tokens)
            .await
            .unwrap();
        token_store
            .delete_tokens(ProviderKind::GoogleDrive)
            .await
            .unwrap();
        token_store
            .delete_tokens(ProviderKind::GoogleDrive)
            .await
            .unwrap();

        assert!(token_store
            .retrieve_tokens(ProviderKind::GoogleDrive)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_storage_failure_is_reported() {
        let token_store = TokenStore::new(Arc::new(MockSecureStore {
            fail: true,
            ..Default::default()
        }));

        let result = token_store.retrieve_tokens(ProviderKind::GoogleDrive).await;
        assert!(matches!(result, Err(AuthError::SecureStorageUnavailable(_))));
    }
}
