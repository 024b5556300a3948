//! Storage client for the hosted object-storage REST API.
//!
//! Objects are written with `POST {endpoint}/storage/v1/object/{bucket}/{key}`
//! and served from `{endpoint}/storage/v1/object/public/{bucket}/{key}`.

use async_trait::async_trait;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use super::{Bucket, StorageClient, UploadOptions, UploadReceipt};
use crate::config::StorageConfig;
use crate::error::StorageError;
use crate::types::BinaryPayload;

/// Storage client backed by `reqwest`.
pub struct HttpStorageClient {
    endpoint: String,
    api_key: String,
    client: reqwest::Client,
}

impl HttpStorageClient {
    pub fn new(endpoint: &str, api_key: &str) -> Self {
        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Build a client from the `[storage]` config section.
    pub fn from_config(config: &StorageConfig) -> Result<Self, StorageError> {
        if config.endpoint.trim().is_empty() {
            return Err(StorageError::backend(
                None,
                Some("storage.endpoint is not configured".to_string()),
            ));
        }
        let api_key = config.resolved_api_key().ok_or_else(|| {
            StorageError::backend(
                None,
                Some("Storage API key not set. Set PINUP_STORAGE_KEY env var.".to_string()),
            )
        })?;
        Ok(Self::new(&config.endpoint, &api_key))
    }

    fn object_url(&self, bucket: &str, key: &str) -> String {
        format!("{}/storage/v1/object/{}/{}", self.endpoint, bucket, key)
    }

    async fn send_upload(
        &self,
        bucket: &str,
        key: &str,
        payload: &BinaryPayload,
        options: &UploadOptions,
    ) -> Result<UploadReceipt, StorageError> {
        let resp = self
            .client
            .post(self.object_url(bucket, key))
            .bearer_auth(&self.api_key)
            .header("apikey", &self.api_key)
            .header("content-type", &options.content_type)
            .header("cache-control", format!("max-age={}", options.cache_control))
            .header("x-upsert", options.upsert.to_string())
            .body(payload.bytes().clone())
            .send()
            .await
            .map_err(classify_transport_error)?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(StorageError::backend(
                Some(status.as_u16()),
                error_message(&text),
            ));
        }

        Ok(UploadReceipt {
            path: key.to_string(),
        })
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
    error: Option<String>,
}

/// Pull the backend's own message out of an error body, if there is one.
fn error_message(body: &str) -> Option<String> {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) => parsed.message.or(parsed.error),
        Err(_) => {
            let trimmed = body.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
    }
}

fn classify_transport_error(err: reqwest::Error) -> StorageError {
    if err.is_timeout() {
        StorageError::Network(format!("request timed out: {err}"))
    } else {
        StorageError::Network(format!("upload request failed: {err}"))
    }
}

#[async_trait]
impl StorageClient for HttpStorageClient {
    fn name(&self) -> &str {
        "http"
    }

    async fn upload(
        &self,
        bucket: &str,
        key: &str,
        payload: &BinaryPayload,
        options: &UploadOptions,
        cancel: &CancellationToken,
    ) -> Result<UploadReceipt, StorageError> {
        // Dropping the request future aborts the connection
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(StorageError::Cancelled),
            result = self.send_upload(bucket, key, payload, options) => result,
        }
    }

    fn public_url(&self, bucket: &str, path: &str) -> Option<String> {
        if self.endpoint.is_empty() || path.is_empty() {
            return None;
        }
        Some(format!(
            "{}/storage/v1/object/public/{}/{}",
            self.endpoint, bucket, path
        ))
    }

    async fn list_buckets(&self) -> Result<Vec<Bucket>, StorageError> {
        let resp = self
            .client
            .get(format!("{}/storage/v1/bucket", self.endpoint))
            .bearer_auth(&self.api_key)
            .header("apikey", &self.api_key)
            .send()
            .await
            .map_err(classify_transport_error)?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(StorageError::backend(
                Some(status.as_u16()),
                error_message(&text),
            ));
        }

        resp.json()
            .await
            .map_err(|e| StorageError::backend(None, Some(format!("Invalid bucket list: {e}"))))
    }
}
