//! Document store API client.
//!
//! Speaks the per-user document REST API: one JSON document per user id,
//! server-assigned `updatedAt` stamps on every write, shallow or deep merge
//! semantics, and atomic field set/delete updates.

use std::sync::RwLock;
use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;

use habitline_core::errors::RemoteStoreError;
use habitline_core::sync::{RemoteDocument, RemoteDocumentStore};

use crate::error::{DocumentStoreError, Result};
use crate::types::{ApiErrorResponse, MergeMode, MergeRequest, UpdateRequest, WriteAck};

/// Default timeout for API requests.
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const MAX_LOG_BODY_CHARS: usize = 512;

/// Client for the habits document store REST API.
#[derive(Debug)]
pub struct DocumentStoreClient {
    client: reqwest::Client,
    base_url: String,
    access_token: RwLock<Option<String>>,
}

impl DocumentStoreClient {
    /// Create a new document store client.
    ///
    /// # Arguments
    ///
    /// * `base_url` - The base URL of the document API (e.g., "https://api.habitline.app")
    pub fn new(base_url: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            access_token: RwLock::new(None),
        }
    }

    /// Install or clear the access token used for subsequent requests.
    /// Typically called alongside sign-in/sign-out notifications.
    pub fn set_access_token(&self, token: Option<String>) {
        *self.access_token.write().expect("token lock") = token;
    }

    fn token(&self) -> Result<String> {
        self.access_token
            .read()
            .expect("token lock")
            .clone()
            .ok_or_else(|| DocumentStoreError::auth("No access token installed"))
    }

    /// Create headers for an API request.
    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let auth_value = HeaderValue::from_str(&format!("Bearer {}", self.token()?))
            .map_err(|_| DocumentStoreError::auth("Invalid access token format"))?;
        headers.insert(AUTHORIZATION, auth_value);

        Ok(headers)
    }

    fn log_response(status: StatusCode, body: &str) {
        if status.is_success() {
            debug!("API response status: {}", status);
            return;
        }

        let mut preview = body.chars().take(MAX_LOG_BODY_CHARS).collect::<String>();
        if body.chars().count() > MAX_LOG_BODY_CHARS {
            preview.push_str("...");
        }
        debug!("API response error ({}): {}", status, preview);
    }

    /// Parse a JSON response body.
    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T> {
        let status = response.status();
        let body = response.text().await?;
        Self::log_response(status, &body);

        if !status.is_success() {
            // Try to parse error response
            if let Ok(error) = serde_json::from_str::<ApiErrorResponse>(&body) {
                return Err(DocumentStoreError::api(
                    status.as_u16(),
                    format!("{}: {}", error.code, error.message),
                ));
            }
            return Err(DocumentStoreError::api(
                status.as_u16(),
                format!("Request failed: {}", body),
            ));
        }

        serde_json::from_str(&body).map_err(|e| {
            log::error!(
                "Failed to deserialize response. Body: {}, Error: {}",
                body,
                e
            );
            DocumentStoreError::api(status.as_u16(), format!("Failed to parse response: {}", e))
        })
    }

    /// Fetch a user's document.
    ///
    /// GET /v1/documents/{userId}
    pub async fn get_document(&self, user_id: &str) -> Result<Option<RemoteDocument>> {
        let url = format!("{}/v1/documents/{}", self.base_url, user_id);

        let response = self
            .client
            .get(&url)
            .headers(self.headers()?)
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        Ok(Some(Self::parse_response(response).await?))
    }

    /// Merge fields into a user's document, creating it when absent.
    /// Returns the server-assigned update timestamp in epoch millis.
    ///
    /// PATCH /v1/documents/{userId}
    pub async fn merge_document(
        &self,
        user_id: &str,
        fields: serde_json::Value,
        mode: MergeMode,
    ) -> Result<i64> {
        let url = format!("{}/v1/documents/{}", self.base_url, user_id);
        let request = MergeRequest {
            fields,
            merge: mode,
        };

        let response = self
            .client
            .patch(&url)
            .headers(self.headers()?)
            .json(&request)
            .send()
            .await?;

        let ack: WriteAck = Self::parse_response(response).await?;
        Ok(ack.updated_at.as_millis())
    }

    /// Atomically set and delete field paths on an existing document.
    /// Fails with an API error when the document does not exist.
    ///
    /// POST /v1/documents/{userId}/update
    pub async fn update_document(
        &self,
        user_id: &str,
        set: serde_json::Value,
        delete: Vec<String>,
    ) -> Result<i64> {
        let url = format!("{}/v1/documents/{}/update", self.base_url, user_id);
        let request = UpdateRequest { set, delete };

        let response = self
            .client
            .post(&url)
            .headers(self.headers()?)
            .json(&request)
            .send()
            .await?;

        let ack: WriteAck = Self::parse_response(response).await?;
        Ok(ack.updated_at.as_millis())
    }
}

#[async_trait]
impl RemoteDocumentStore for DocumentStoreClient {
    async fn fetch(
        &self,
        user_id: &str,
    ) -> std::result::Result<Option<RemoteDocument>, RemoteStoreError> {
        Ok(self.get_document(user_id).await?)
    }

    async fn merge_fields(
        &self,
        user_id: &str,
        fields: serde_json::Value,
    ) -> std::result::Result<i64, RemoteStoreError> {
        Ok(self
            .merge_document(user_id, fields, MergeMode::Shallow)
            .await?)
    }

    async fn merge_completions(
        &self,
        user_id: &str,
        completions: serde_json::Value,
    ) -> std::result::Result<i64, RemoteStoreError> {
        let fields = serde_json::json!({ "completions": completions });
        Ok(self.merge_document(user_id, fields, MergeMode::Deep).await?)
    }

    async fn update_fields(
        &self,
        user_id: &str,
        set: serde_json::Value,
        delete_paths: &[String],
    ) -> std::result::Result<i64, RemoteStoreError> {
        Ok(self
            .update_document(user_id, set, delete_paths.to_vec())
            .await?)
    }
}
