//! Scriptable storage client for pipeline tests.

use async_trait::async_trait;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;

use super::{Bucket, StorageClient, UploadOptions, UploadReceipt};
use crate::error::StorageError;
use crate::types::BinaryPayload;

/// What a scripted upload call does.
pub(crate) enum Step {
    Succeed,
    Fail(StorageError),
    /// Never settles; only a timeout or cancellation ends the call
    Hang,
}

/// A storage client whose upload results come from a script.
///
/// Each call to `upload()` invokes the script with the call index and the
/// payload's first byte, so tests can fail specific attempts or images.
pub(crate) struct ScriptedStorage {
    script: Box<dyn Fn(u32, u8) -> Step + Send + Sync>,
    call_count: Arc<AtomicU32>,
    list_count: Arc<AtomicU32>,
    uploaded_keys: Arc<Mutex<Vec<String>>>,
    resolve_urls: bool,
    buckets: Option<Vec<String>>,
    hang_bucket_list: bool,
}

impl ScriptedStorage {
    pub fn new(script: impl Fn(u32, u8) -> Step + Send + Sync + 'static) -> Self {
        Self {
            script: Box::new(script),
            call_count: Arc::new(AtomicU32::new(0)),
            list_count: Arc::new(AtomicU32::new(0)),
            uploaded_keys: Arc::new(Mutex::new(Vec::new())),
            resolve_urls: true,
            buckets: None,
            hang_bucket_list: false,
        }
    }

    pub fn succeeding() -> Self {
        Self::new(|_, _| Step::Succeed)
    }

    pub fn failing(error: StorageError) -> Self {
        Self::new(move |_, _| Step::Fail(error.clone()))
    }

    /// First `failures` calls fail with `error`, later calls succeed.
    pub fn fail_then_succeed(failures: u32, error: StorageError) -> Self {
        Self::new(move |idx, _| {
            if idx < failures {
                Step::Fail(error.clone())
            } else {
                Step::Succeed
            }
        })
    }

    pub fn hanging() -> Self {
        Self::new(|_, _| Step::Hang)
    }

    /// Report no public URL for stored objects.
    pub fn without_public_urls(mut self) -> Self {
        self.resolve_urls = false;
        self
    }

    /// Answer `list_buckets` with these names instead of `Unsupported`.
    pub fn with_buckets(mut self, buckets: &[&str]) -> Self {
        self.buckets = Some(buckets.iter().map(|b| b.to_string()).collect());
        self
    }

    /// Make `list_buckets` never settle.
    pub fn with_hanging_bucket_list(mut self) -> Self {
        self.hang_bucket_list = true;
        self
    }

    pub fn call_count_handle(&self) -> Arc<AtomicU32> {
        self.call_count.clone()
    }

    pub fn list_count_handle(&self) -> Arc<AtomicU32> {
        self.list_count.clone()
    }

    pub fn uploaded_keys_handle(&self) -> Arc<Mutex<Vec<String>>> {
        self.uploaded_keys.clone()
    }
}

#[async_trait]
impl StorageClient for ScriptedStorage {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn upload(
        &self,
        _bucket: &str,
        key: &str,
        payload: &BinaryPayload,
        _options: &UploadOptions,
        _cancel: &CancellationToken,
    ) -> Result<UploadReceipt, StorageError> {
        let idx = self.call_count.fetch_add(1, Ordering::SeqCst);
        let marker = payload.bytes().first().copied().unwrap_or_default();
        match (self.script)(idx, marker) {
            Step::Succeed => {
                self.uploaded_keys.lock().unwrap().push(key.to_string());
                Ok(UploadReceipt {
                    path: key.to_string(),
                })
            }
            Step::Fail(error) => Err(error),
            Step::Hang => std::future::pending().await,
        }
    }

    fn public_url(&self, bucket: &str, path: &str) -> Option<String> {
        self.resolve_urls
            .then(|| format!("https://cdn.test/{bucket}/{path}"))
    }

    async fn list_buckets(&self) -> Result<Vec<Bucket>, StorageError> {
        self.list_count.fetch_add(1, Ordering::SeqCst);
        if self.hang_bucket_list {
            return std::future::pending().await;
        }
        match &self.buckets {
            Some(names) => Ok(names
                .iter()
                .map(|name| Bucket {
                    id: name.clone(),
                    name: name.clone(),
                    public: true,
                })
                .collect()),
            None => Err(StorageError::Unsupported("list_buckets")),
        }
    }
}
