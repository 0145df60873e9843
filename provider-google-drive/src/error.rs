//! Error types for Google Drive provider

use bridge_traits::error::BridgeError;
use core_auth::AuthError;
use thiserror::Error;

/// Google Drive provider errors
#[derive(Error, Debug)]
pub enum GoogleDriveError {
    /// Authentication failed or token is invalid
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// API request returned an error
    #[error("Google Drive API error (status {status_code}): {message}")]
    ApiError { status_code: u16, message: String },

    /// Rate limit still exceeded after transport retries
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// The session-initiation response carried no upload URL
    #[error("Resumable upload session was not opened: {0}")]
    UploadSessionMissing(String),

    /// Server acknowledged a different byte range than was sent
    #[error("Upload of '{name}' out of step: sent {sent} bytes, server has {confirmed}")]
    UploadOutOfStep {
        name: String,
        sent: u64,
        confirmed: u64,
    },

    /// Reading the source stream failed mid-upload
    #[error("Failed to read upload content: {0}")]
    ContentRead(#[from] std::io::Error),

    /// Failed to parse API response
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Bridge error
    #[error(transparent)]
    BridgeError(#[from] BridgeError),
}

/// Result type for Google Drive operations
pub type Result<T> = std::result::Result<T, GoogleDriveError>;

impl GoogleDriveError {
    /// Classify a non-success API response.
    pub fn from_response(status_code: u16, body: &[u8]) -> Self {
        let message = serde_json::from_slice::<crate::types::ErrorResponse>(body)
            .map(|e| e.error.message)
            .unwrap_or_else(|_| String::from_utf8_lossy(body).trim().to_string());

        match status_code {
            401 => GoogleDriveError::AuthenticationFailed(message),
            429 => GoogleDriveError::RateLimitExceeded(message),
            _ => GoogleDriveError::ApiError {
                status_code,
                message,
            },
        }
    }
}

impl From<AuthError> for GoogleDriveError {
    fn from(error: AuthError) -> Self {
        match error {
            AuthError::NetworkError(msg) => {
                GoogleDriveError::BridgeError(BridgeError::OperationFailed(msg))
            }
            other => GoogleDriveError::AuthenticationFailed(other.to_string()),
        }
    }
}

impl From<GoogleDriveError> for BridgeError {
    fn from(error: GoogleDriveError) -> Self {
        match error {
            GoogleDriveError::AuthenticationFailed(msg) => {
                BridgeError::Unauthorized(format!("Google Drive: {}", msg))
            }
            GoogleDriveError::ContentRead(e) => BridgeError::Io(e),
            GoogleDriveError::BridgeError(e) => e,
            other => BridgeError::OperationFailed(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = GoogleDriveError::ApiError {
            status_code: 404,
            message: "File not found".to_string(),
        };

        assert_eq!(
            error.to_string(),
            "Google Drive API error (status 404): File not found"
        );
    }

    #[test]
    fn test_from_response_reads_error_message() {
        let body = br#"{"error": {"code": 403, "message": "The user does not have sufficient permissions"}}"#;
        let error = GoogleDriveError::from_response(403, body);

        assert!(matches!(
            &error,
            GoogleDriveError::ApiError { status_code: 403, message }
                if message == "The user does not have sufficient permissions"
        ));
        assert!(matches!(
            GoogleDriveError::from_response(401, b"Unauthorized"),
            GoogleDriveError::AuthenticationFailed(msg) if msg == "Unauthorized"
        ));
    }

    #[test]
    fn test_error_conversion() {
        let bridge_error: BridgeError =
            GoogleDriveError::AuthenticationFailed("Token expired".to_string()).into();
        assert!(bridge_error.is_unauthorized());

        let bridge_error: BridgeError = GoogleDriveError::RateLimitExceeded("slow down".to_string()).into();
        assert!(matches!(bridge_error, BridgeError::OperationFailed(_)));

        let auth_error = AuthError::NotAuthenticated;
        assert!(matches!(
            GoogleDriveError::from(auth_error),
            GoogleDriveError::AuthenticationFailed(_)
        ));
    }
}
