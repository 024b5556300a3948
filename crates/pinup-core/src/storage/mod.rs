//! Object storage client abstraction.
//!
//! The upload pipeline never talks to a backend directly; it goes through a
//! `StorageClient`. Two implementations ship with the crate:
//! - **http**: the hosted object-storage REST API
//! - **memory**: an in-process store for dry runs and tests

pub mod http;
pub mod memory;

#[cfg(test)]
pub(crate) mod mock;

pub use http::HttpStorageClient;
pub use memory::MemoryStorage;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::error::StorageError;
use crate::types::BinaryPayload;

/// Per-object upload options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOptions {
    /// `Cache-Control` max-age in seconds
    pub cache_control: String,
    /// MIME type of the object
    pub content_type: String,
    /// Overwrite an existing object with the same key
    pub upsert: bool,
}

/// What the backend returns for a stored object.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UploadReceipt {
    /// Path of the object inside its bucket
    pub path: String,
}

/// A storage bucket as reported by `list_buckets`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bucket {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub public: bool,
}

/// Trait that all storage backends implement.
///
/// Uses `async_trait` because the pipeline holds clients as
/// `Arc<dyn StorageClient>`.
#[async_trait]
pub trait StorageClient: Send + Sync {
    /// Backend name for logging (e.g. "http", "memory").
    fn name(&self) -> &str;

    /// Store `payload` under `key` in `bucket`.
    ///
    /// Implementations should stop network activity promptly once `cancel`
    /// fires; the orchestrator also stops waiting on its own.
    async fn upload(
        &self,
        bucket: &str,
        key: &str,
        payload: &BinaryPayload,
        options: &UploadOptions,
        cancel: &CancellationToken,
    ) -> Result<UploadReceipt, StorageError>;

    /// Public URL of a stored object, if the backend can resolve one.
    fn public_url(&self, bucket: &str, path: &str) -> Option<String>;

    /// List buckets for pre-flight checks.
    ///
    /// Optional capability: the default reports `Unsupported`, and callers
    /// must never fail an upload because this call failed.
    async fn list_buckets(&self) -> Result<Vec<Bucket>, StorageError> {
        Err(StorageError::Unsupported("list_buckets"))
    }
}
