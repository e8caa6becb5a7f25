//! Portal error types

use fieldcase_core::CollaboratorError;

/// Portal client failures
#[derive(Debug, thiserror::Error)]
pub enum PortalError {
    /// HTTP client could not be built or the request failed in transit
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-success HTTP status
    #[error("unexpected status {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body
        body: String,
    },

    /// Portal answered with an `{"error": ...}` body
    #[error("portal error {code}: {message}")]
    Api {
        /// Portal error code
        code: i64,
        /// Portal error message
        message: String,
    },

    /// Body decoded but lacked what was asked for
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Client configuration is incomplete
    #[error("configuration error: {0}")]
    Config(String),
}

impl PortalError {
    /// Create invalid response error
    #[inline]
    #[must_use]
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidResponse(message.into())
    }
}

impl From<PortalError> for CollaboratorError {
    fn from(err: PortalError) -> Self {
        match err {
            PortalError::Transport(e) => Self::Transport(e.to_string()),
            PortalError::Status { status, body } => Self::Status { status, body },
            PortalError::Api { code: 404, message } => Self::NotFound(message),
            PortalError::Api { code, message } => Self::Rejected(format!("{code}: {message}")),
            PortalError::InvalidResponse(message) => Self::InvalidResponse(message),
            PortalError::Config(message) => Self::Rejected(message),
        }
    }
}

/// Result type for portal operations
pub type PortalResult<T> = Result<T, PortalError>;
