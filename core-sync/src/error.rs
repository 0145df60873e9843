use bridge_traits::error::BridgeError;
use thiserror::Error;

/// Errors that end a sync run. All of them are fatal; re-running is the
/// recovery.
#[derive(Error, Debug)]
pub enum SyncError {
    /// A session or token was rejected by either service
    #[error("Authentication failed while {operation}: {reason}")]
    Authentication { operation: String, reason: String },

    /// A listing, lookup or transfer call failed
    #[error("Remote service unavailable while {operation}: {source}")]
    RemoteUnavailable {
        operation: String,
        #[source]
        source: BridgeError,
    },

    #[error("Invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, SyncError>;

impl SyncError {
    /// Classify a bridge failure: rejected credentials are authentication
    /// errors, anything else means the remote could not serve the call.
    pub fn from_bridge(operation: impl Into<String>, error: BridgeError) -> Self {
        let operation = operation.into();
        match error {
            BridgeError::Unauthorized(reason) => SyncError::Authentication { operation, reason },
            source => SyncError::RemoteUnavailable { operation, source },
        }
    }

    pub fn is_authentication(&self) -> bool {
        matches!(self, SyncError::Authentication { .. })
    }
}

impl From<core_runtime::Error> for SyncError {
    fn from(error: core_runtime::Error) -> Self {
        SyncError::Config(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        let err = SyncError::from_bridge(
            "listing folders",
            BridgeError::Unauthorized("session expired".to_string()),
        );
        assert!(err.is_authentication());
        assert_eq!(
            err.to_string(),
            "Authentication failed while listing folders: session expired"
        );

        let err = SyncError::from_bridge(
            "uploading 'Lecture 1.mp4'",
            BridgeError::Io(std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset")),
        );
        assert!(matches!(err, SyncError::RemoteUnavailable { .. }));
        assert!(!err.is_authentication());
    }

    #[test]
    fn test_config_error_conversion() {
        let err: SyncError = core_runtime::Error::Config("page_size must be positive".to_string()).into();
        assert!(matches!(err, SyncError::Config(msg) if msg.contains("page_size")));
    }
}
