//! Wire types for the document store REST API.

use habitline_core::sync::RemoteTimestamp;
use serde::{Deserialize, Serialize};

/// Error response body returned by the service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiErrorResponse {
    pub code: String,
    pub message: String,
}

/// How a merge write combines with the stored document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeMode {
    /// Named top-level fields are replaced wholesale; others are preserved.
    Shallow,
    /// Nested maps are merged recursively; only named leaf paths change.
    Deep,
}

/// Body of a merge write.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeRequest {
    pub fields: serde_json::Value,
    pub merge: MergeMode,
}

/// Body of an atomic set/delete update.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRequest {
    pub set: serde_json::Value,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub delete: Vec<String>,
}

/// Acknowledgement of a successful write.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteAck {
    pub updated_at: RemoteTimestamp,
}
