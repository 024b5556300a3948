//! In-process storage backend.
//!
//! Keeps objects in a map. Used for `--dry-run` uploads and in tests.

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::Mutex;
use tokio_util::sync::CancellationToken;

use super::{Bucket, StorageClient, UploadOptions, UploadReceipt};
use crate::error::StorageError;
use crate::types::BinaryPayload;

/// A stored object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub bytes: Bytes,
    pub content_type: String,
    pub cache_control: String,
}

/// Storage backend that keeps everything in memory.
pub struct MemoryStorage {
    base_url: String,
    buckets: Vec<String>,
    objects: Mutex<HashMap<(String, String), StoredObject>>,
}

impl MemoryStorage {
    /// Create a store that accepts uploads into the given buckets.
    ///
    /// An empty bucket list accepts any bucket.
    pub fn new(base_url: &str, buckets: &[&str]) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            buckets: buckets.iter().map(|b| b.to_string()).collect(),
            objects: Mutex::new(HashMap::new()),
        }
    }

    /// Fetch a stored object.
    pub fn get(&self, bucket: &str, key: &str) -> Option<StoredObject> {
        self.lock()
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
    }

    /// Number of stored objects across all buckets.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<(String, String), StoredObject>> {
        // A poisoned map is still a consistent map
        self.objects.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn knows_bucket(&self, bucket: &str) -> bool {
        self.buckets.is_empty() || self.buckets.iter().any(|b| b == bucket)
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new("memory://local", &[])
    }
}

#[async_trait]
impl StorageClient for MemoryStorage {
    fn name(&self) -> &str {
        "memory"
    }

    async fn upload(
        &self,
        bucket: &str,
        key: &str,
        payload: &BinaryPayload,
        options: &UploadOptions,
        cancel: &CancellationToken,
    ) -> Result<UploadReceipt, StorageError> {
        if cancel.is_cancelled() {
            return Err(StorageError::Cancelled);
        }
        if !self.knows_bucket(bucket) {
            return Err(StorageError::backend(
                Some(404),
                Some("Bucket not found".to_string()),
            ));
        }

        let mut objects = self.lock();
        let id = (bucket.to_string(), key.to_string());
        if !options.upsert && objects.contains_key(&id) {
            return Err(StorageError::backend(
                Some(409),
                Some("The resource already exists".to_string()),
            ));
        }
        objects.insert(
            id,
            StoredObject {
                bytes: payload.bytes().clone(),
                content_type: options.content_type.clone(),
                cache_control: options.cache_control.clone(),
            },
        );

        Ok(UploadReceipt {
            path: key.to_string(),
        })
    }

    fn public_url(&self, bucket: &str, path: &str) -> Option<String> {
        Some(format!("{}/{}/{}", self.base_url, bucket, path))
    }

    async fn list_buckets(&self) -> Result<Vec<Bucket>, StorageError> {
        Ok(self
            .buckets
            .iter()
            .map(|name| Bucket {
                id: name.clone(),
                name: name.clone(),
                public: true,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> UploadOptions {
        UploadOptions {
            cache_control: "3600".to_string(),
            content_type: "image/jpeg".to_string(),
            upsert: false,
        }
    }

    fn payload() -> BinaryPayload {
        BinaryPayload::new("image/jpeg", vec![1u8, 2, 3]).unwrap()
    }

    #[tokio::test]
    async fn test_upload_and_resolve() {
        let storage = MemoryStorage::new("https://cdn.test/", &["moments"]);
        let cancel = CancellationToken::new();
        let receipt = storage
            .upload("moments", "u1/a.jpg", &payload(), &options(), &cancel)
            .await
            .unwrap();

        assert_eq!(receipt.path, "u1/a.jpg");
        assert_eq!(
            storage.public_url("moments", &receipt.path).as_deref(),
            Some("https://cdn.test/moments/u1/a.jpg")
        );
        let stored = storage.get("moments", "u1/a.jpg").unwrap();
        assert_eq!(stored.bytes.as_ref(), &[1, 2, 3]);
        assert_eq!(stored.content_type, "image/jpeg");
    }

    #[tokio::test]
    async fn test_rejects_unknown_bucket() {
        let storage = MemoryStorage::new("https://cdn.test", &["moments"]);
        let err = storage
            .upload("nope", "k.jpg", &payload(), &options(), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Backend { status: Some(404), .. }));
    }

    #[tokio::test]
    async fn test_refuses_overwrite_without_upsert() {
        let storage = MemoryStorage::default();
        let cancel = CancellationToken::new();
        storage
            .upload("b", "k.jpg", &payload(), &options(), &cancel)
            .await
            .unwrap();
        let err = storage
            .upload("b", "k.jpg", &payload(), &options(), &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Backend { status: Some(409), .. }));
        assert_eq!(storage.len(), 1);
    }

    #[tokio::test]
    async fn test_cancelled_upload_stores_nothing() {
        let storage = MemoryStorage::default();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = storage
            .upload("b", "k.jpg", &payload(), &options(), &cancel)
            .await
            .unwrap_err();
        assert_eq!(err, StorageError::Cancelled);
        assert!(storage.is_empty());
    }
}
