//! Sync domain models and collaborator contracts.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::RemoteStoreError;
use crate::habits::{CompletionMap, Habit};

/// Local record of the last successful reconciliation or write, used as the
/// local side of the last-writer-wins comparison.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncMeta {
    #[serde(default)]
    pub updated_at: i64,
}

/// Server-assigned update timestamp: either plain epoch millis or a
/// structured server timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RemoteTimestamp {
    Millis(i64),
    Server {
        seconds: i64,
        #[serde(alias = "nanoseconds")]
        nanos: u32,
    },
}

impl RemoteTimestamp {
    /// Normalize to epoch millis.
    pub fn as_millis(self) -> i64 {
        match self {
            RemoteTimestamp::Millis(ms) => ms,
            RemoteTimestamp::Server { seconds, nanos } => {
                seconds * 1_000 + i64::from(nanos) / 1_000_000
            }
        }
    }
}

/// The per-user remote document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteDocument {
    #[serde(default)]
    pub habits: Vec<Habit>,
    #[serde(default)]
    pub completions: CompletionMap,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<RemoteTimestamp>,
}

/// Identity change notifications consumed by the sync coordinator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    SignedIn(String),
    SignedOut,
}

/// Synchronous best-effort lookup of the current user, for call sites that
/// may run before any identity notification has been delivered.
pub trait IdentityProvider: Send + Sync {
    fn current_user(&self) -> Option<String>;
}

/// Abstract per-user remote document store.
///
/// One document per user id. Every write is stamped with a server-assigned
/// update timestamp, returned normalized to epoch millis.
#[async_trait]
pub trait RemoteDocumentStore: Send + Sync {
    /// Fetch the user's document, or `None` when it does not exist.
    async fn fetch(&self, user_id: &str)
        -> Result<Option<RemoteDocument>, RemoteStoreError>;

    /// Merge top-level fields into the document, creating it when absent.
    /// Named fields are replaced wholesale; unrelated top-level fields are
    /// preserved.
    async fn merge_fields(
        &self,
        user_id: &str,
        fields: serde_json::Value,
    ) -> Result<i64, RemoteStoreError>;

    /// Deep-merge entries under the `completions` subtree, leaving other
    /// habits' and other dates' entries untouched.
    async fn merge_completions(
        &self,
        user_id: &str,
        completions: serde_json::Value,
    ) -> Result<i64, RemoteStoreError>;

    /// Atomically set and delete named field paths (dot notation, e.g.
    /// `completions.<habitId>`). Fails when the document does not exist.
    async fn update_fields(
        &self,
        user_id: &str,
        set: serde_json::Value,
        delete_paths: &[String],
    ) -> Result<i64, RemoteStoreError>;
}
