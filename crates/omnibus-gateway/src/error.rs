//! Error types for the session gateway.

use omnibus_core::error::OmnibusError;

/// Errors from the search and completion services or the session itself.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("gateway configuration error: {0}")]
    Config(String),
    #[error("authentication failed: {0}")]
    Auth(String),
    #[error("request failed: {0}")]
    Http(String),
    #[error("request timed out")]
    Timeout,
    #[error("service returned {status}: {message}")]
    Status { status: u16, message: String },
    #[error("invalid response payload: {0}")]
    InvalidPayload(String),
    #[error("session is closed")]
    SessionClosed,
}

impl GatewayError {
    /// Whether the failure came from the remote side rejecting credentials.
    pub fn is_auth_failure(&self) -> bool {
        matches!(
            self,
            GatewayError::Auth(_) | GatewayError::Status { status: 401, .. }
        )
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            GatewayError::Timeout
        } else if err.is_decode() {
            GatewayError::InvalidPayload(err.to_string())
        } else {
            GatewayError::Http(err.to_string())
        }
    }
}

impl From<GatewayError> for OmnibusError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::Config(msg) => OmnibusError::Config(msg),
            other => OmnibusError::Connection(other.to_string()),
        }
    }
}
