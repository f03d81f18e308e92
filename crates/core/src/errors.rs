//! Error types for the habitline core crate.

use thiserror::Error;

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the sync engine to callers.
#[derive(Debug, Error)]
pub enum Error {
    /// Remote document store failure
    #[error("remote store error: {0}")]
    RemoteStore(#[from] RemoteStoreError),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors produced by a [`RemoteDocumentStore`](crate::sync::RemoteDocumentStore)
/// implementation.
#[derive(Debug, Error)]
pub enum RemoteStoreError {
    /// Network-level failure (connect, timeout, body)
    #[error("transport error: {0}")]
    Transport(String),

    /// Error response from the document store service
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Authentication error (missing or invalid token)
    #[error("authentication error: {0}")]
    Auth(String),

    /// Invalid request (missing required data, etc.)
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl RemoteStoreError {
    /// Create an API error from status and message
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Create a transport error
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    /// Create an auth error
    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth(message.into())
    }

    /// Create an invalid request error
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    /// HTTP status if this is an API error.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}
