//! Error types for the Panopto provider

use bridge_traits::error::BridgeError;
use thiserror::Error;

/// Panopto provider errors
#[derive(Error, Debug)]
pub enum PanoptoError {
    /// Credentials were not supplied
    #[error("Missing credentials: {0}")]
    MissingCredentials(String),

    /// The sign-in page did not hand back a SAML assertion
    #[error("Sign-in was rejected; check PANOPTO_USERNAME and PANOPTO_PASSWORD")]
    SamlResponseMissing,

    /// A session cookie expected after a sign-in step was not set
    #[error("Sign-in step '{step}' did not set the {cookie} cookie")]
    MissingCookie { step: String, cookie: String },

    /// The session is not (or no longer) authorized
    #[error("Panopto session rejected (status {status_code}) while {context}")]
    Unauthorized { status_code: u16, context: String },

    /// API request returned an error
    #[error("Panopto API error (status {status_code}) while {context}")]
    ApiError { status_code: u16, context: String },

    /// Failed to parse API response
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Bridge error
    #[error(transparent)]
    BridgeError(#[from] BridgeError),
}

/// Result type for Panopto operations
pub type Result<T> = std::result::Result<T, PanoptoError>;

impl PanoptoError {
    /// Classify a non-success HTTP status.
    pub fn from_status(status_code: u16, context: impl Into<String>) -> Self {
        let context = context.into();
        if status_code == 401 || status_code == 403 {
            PanoptoError::Unauthorized {
                status_code,
                context,
            }
        } else {
            PanoptoError::ApiError {
                status_code,
                context,
            }
        }
    }
}

impl From<PanoptoError> for BridgeError {
    fn from(error: PanoptoError) -> Self {
        match error {
            PanoptoError::BridgeError(e) => e,
            e @ (PanoptoError::MissingCredentials(_)
            | PanoptoError::SamlResponseMissing
            | PanoptoError::MissingCookie { .. }
            | PanoptoError::Unauthorized { .. }) => BridgeError::Unauthorized(e.to_string()),
            e @ (PanoptoError::ApiError { .. } | PanoptoError::ParseError(_)) => {
                BridgeError::OperationFailed(e.to_string())
            }
        }
    }
}
