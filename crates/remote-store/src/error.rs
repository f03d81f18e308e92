//! Error types for the remote store crate.

use habitline_core::errors::RemoteStoreError;
use thiserror::Error;

/// Result type alias for document store operations.
pub type Result<T> = std::result::Result<T, DocumentStoreError>;

/// Errors that can occur while talking to the document store service.
#[derive(Debug, Error)]
pub enum DocumentStoreError {
    /// HTTP client error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// API error response from the document store service
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Invalid request (missing required data, etc.)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Authentication error (missing or invalid token)
    #[error("Authentication error: {0}")]
    Auth(String),
}

impl DocumentStoreError {
    /// Create an API error from status and message
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Create an invalid request error
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    /// Create an auth error
    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth(message.into())
    }

    /// HTTP status if this is an API error.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<DocumentStoreError> for RemoteStoreError {
    fn from(err: DocumentStoreError) -> Self {
        match err {
            DocumentStoreError::Http(e) => RemoteStoreError::Transport(e.to_string()),
            DocumentStoreError::Json(e) => RemoteStoreError::Json(e),
            DocumentStoreError::Api { status, message } => {
                RemoteStoreError::Api { status, message }
            }
            DocumentStoreError::InvalidRequest(message) => {
                RemoteStoreError::InvalidRequest(message)
            }
            DocumentStoreError::Auth(message) => RemoteStoreError::Auth(message),
        }
    }
}
