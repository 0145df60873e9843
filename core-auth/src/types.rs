use serde::{Deserialize, Serialize};
use std::fmt;

/// Services the archiver signs in to.
///
/// # Examples
///
/// ```
/// use core_auth::ProviderKind;
///
/// let provider = ProviderKind::GoogleDrive;
/// assert_eq!(provider.display_name(), "Google Drive");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProviderKind {
    /// Panopto lecture capture (source)
    Panopto,
    /// Google Drive cloud storage (destination)
    GoogleDrive,
}

impl ProviderKind {
    /// Get the human-readable display name for this provider
    pub fn display_name(&self) -> &'static str {
        match self {
            ProviderKind::Panopto => "Panopto",
            ProviderKind::GoogleDrive => "Google Drive",
        }
    }

    /// Get the provider identifier string
    ///
    /// Used for logging and storage keys.
    ///
    /// ```
    /// use core_auth::ProviderKind;
    ///
    /// assert_eq!(ProviderKind::GoogleDrive.as_str(), "google_drive");
    /// ```
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Panopto => "panopto",
            ProviderKind::GoogleDrive => "google_drive",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// OAuth 2.0 token set.
///
/// # Security
///
/// Tokens should be stored securely and never logged. The `Debug` implementation
/// redacts sensitive information.
///
/// # Examples
///
/// ```
/// use core_auth::OAuthTokens;
///
/// let tokens = OAuthTokens::new("ya29.a0...".to_string(), Some("1//0g...".to_string()), 3600);
/// assert!(!tokens.is_expired());
/// assert!(tokens.can_refresh());
/// ```
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OAuthTokens {
    /// The access token used for API requests
    pub access_token: String,
    /// The refresh token used to obtain new access tokens
    pub refresh_token: Option<String>,
    /// When the access token expires (UTC)
    pub expires_at: chrono::DateTime<chrono::Utc>,
}

impl OAuthTokens {
    /// Create a new token set expiring `expires_in` seconds from now
    pub fn new(access_token: String, refresh_token: Option<String>, expires_in: i64) -> Self {
        Self {
            access_token,
            refresh_token,
            expires_at: chrono::Utc::now() + chrono::Duration::seconds(expires_in),
        }
    }

    /// Check if the access token is expired or will expire soon
    ///
    /// Uses a five minute buffer so a token is never handed out moments
    /// before it lapses in the middle of an upload chunk.
    pub fn is_expired(&self) -> bool {
        self.is_expired_with_buffer(300)
    }

    /// Check if the access token is expired with a custom buffer
    pub fn is_expired_with_buffer(&self, buffer_seconds: i64) -> bool {
        let now = chrono::Utc::now();
        let buffer = chrono::Duration::seconds(buffer_seconds);
        now >= self.expires_at - buffer
    }

    /// Whether a refresh token is available.
    pub fn can_refresh(&self) -> bool {
        self.refresh_token
            .as_deref()
            .is_some_and(|token| !token.is_empty())
    }

    /// Get the time remaining until token expiration
    ///
    /// Returns `None` if the token is already expired.
    pub fn time_until_expiry(&self) -> Option<chrono::Duration> {
        let now = chrono::Utc::now();
        if now >= self.expires_at {
            None
        } else {
            Some(self.expires_at - now)
        }
    }
}

// Custom Debug implementation to avoid logging tokens
impl fmt::Debug for OAuthTokens {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuthTokens")
            .field("access_token", &"[REDACTED]")
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn tokens_expiring_in(delta: Duration) -> OAuthTokens {
        OAuthTokens {
            access_token: "token".to_string(),
            refresh_token: Some("refresh".to_string()),
            expires_at: Utc::now() + delta,
        }
    }

    #[test]
    fn test_provider_kind_names() {
        assert_eq!(ProviderKind::GoogleDrive.display_name(), "Google Drive");
        assert_eq!(ProviderKind::Panopto.as_str(), "panopto");
        assert_eq!(format!("{}", ProviderKind::Panopto), "Panopto");
    }

    #[test]
    fn test_oauth_tokens_new() {
        let tokens = OAuthTokens::new("access".to_string(), Some("refresh".to_string()), 3600);
        assert_eq!(tokens.access_token, "access");
        assert_eq!(tokens.refresh_token.as_deref(), Some("refresh"));
        assert!(tokens.time_until_expiry().is_some());
    }

    #[test]
    fn test_oauth_tokens_expiry() {
        assert!(!tokens_expiring_in(Duration::hours(1)).is_expired());
        // Inside the default buffer
        assert!(tokens_expiring_in(Duration::seconds(200)).is_expired());
        assert!(tokens_expiring_in(Duration::hours(-1)).is_expired());

        let tokens = tokens_expiring_in(Duration::minutes(10));
        assert!(!tokens.is_expired_with_buffer(60));
        assert!(tokens.is_expired_with_buffer(600));
    }

    #[test]
    fn test_can_refresh() {
        let mut tokens = tokens_expiring_in(Duration::hours(1));
        assert!(tokens.can_refresh());

        tokens.refresh_token = Some(String::new());
        assert!(!tokens.can_refresh());

        tokens.refresh_token = None;
        assert!(!tokens.can_refresh());
    }

    #[test]
    fn test_oauth_tokens_time_until_expiry_expired() {
        assert!(tokens_expiring_in(Duration::hours(-1))
            .time_until_expiry()
            .is_none());
    }

    #[test]
    fn test_oauth_tokens_debug_redacts() {
        let tokens = OAuthTokens {
            access_token: "secret_access_token".to_string(),
            refresh_token: Some("secret_refresh_token".to_string()),
            expires_at: Utc::now(),
        };
        let debug_str = format!("{:?}", tokens);
        assert!(debug_str.contains("[REDACTED]"));
        assert!(!debug_str.contains("secret_access_token"));
        assert!(!debug_str.contains("secret_refresh_token"));
    }
}
