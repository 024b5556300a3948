//! Single-image upload with per-attempt timeout, retry and URL resolution.

use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use super::key;
use super::retry::{self, RetryError, RetryPolicy, Sleeper, TokioSleeper};
use crate::config::UploadConfig;
use crate::error::{FailureReason, StorageError};
use crate::storage::{StorageClient, UploadOptions, UploadReceipt};
use crate::types::{BinaryPayload, UploadContext, UploadFailure, UploadOutcome, UploadTask};

/// Uploads one payload at a time against a `StorageClient`.
pub struct UploadOrchestrator {
    client: Arc<dyn StorageClient>,
    sleeper: Arc<dyn Sleeper>,
    policy: RetryPolicy,
    attempt_timeout: Duration,
    cache_control: String,
}

impl UploadOrchestrator {
    pub fn new(client: Arc<dyn StorageClient>, config: &UploadConfig) -> Self {
        Self {
            client,
            sleeper: Arc::new(TokioSleeper),
            policy: RetryPolicy::from_config(config),
            attempt_timeout: Duration::from_millis(config.attempt_timeout_ms),
            cache_control: config.cache_control_secs.to_string(),
        }
    }

    /// Replace the sleeper used between attempts.
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn client(&self) -> &Arc<dyn StorageClient> {
        &self.client
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Upper bound on a single storage call.
    pub fn attempt_timeout(&self) -> Duration {
        self.attempt_timeout
    }

    /// Create the task for the image at 1-based `index`, with a fresh key.
    pub fn prepare(&self, payload: BinaryPayload, index: usize, ctx: &UploadContext) -> UploadTask {
        let storage_key = key::generate(
            &ctx.owner_id,
            &ctx.prefix,
            index.saturating_sub(1),
            payload.mime_type(),
        );
        UploadTask::new(payload, storage_key, index, self.policy.max_attempts)
    }

    /// Upload a task's payload and resolve its public URL.
    ///
    /// Never returns a raw storage error: every failure is classified into
    /// an `UploadFailure`.
    pub async fn upload(
        &self,
        task: &mut UploadTask,
        ctx: &UploadContext,
        cancel: &CancellationToken,
    ) -> UploadOutcome {
        let options = UploadOptions {
            cache_control: self.cache_control.clone(),
            content_type: task.payload.mime_type().to_string(),
            upsert: false,
        };
        let policy = RetryPolicy {
            max_attempts: task.max_attempts,
            ..self.policy
        };
        let index = task.index;
        let max_attempts = policy.max_attempts;
        let bucket = ctx.bucket.as_str();
        let key = task.storage_key.as_str();
        let payload = &task.payload;
        let options = &options;

        let result = retry::with_retry(
            &policy,
            self.sleeper.as_ref(),
            cancel,
            retry::is_retryable,
            |attempt| {
                tracing::debug!(
                    "Uploading image {index} to {bucket}/{key} (attempt {attempt}/{max_attempts})"
                );
                self.attempt(bucket, key, payload, options, cancel)
            },
        )
        .await;

        task.attempt = match &result {
            Ok((_, attempts)) => *attempts,
            Err(e) => e.attempts(),
        };
        let attempts = task.attempt;

        let failure = |reason: FailureReason| {
            UploadOutcome::Failure(UploadFailure {
                index,
                reason,
                attempts,
            })
        };

        match result {
            Ok((receipt, _)) => {
                let url = self
                    .client
                    .public_url(&ctx.bucket, &receipt.path)
                    .filter(|url| !url.trim().is_empty());
                match url {
                    Some(public_url) => UploadOutcome::Success {
                        public_url,
                        storage_key: receipt.path,
                        attempts,
                    },
                    None => {
                        tracing::warn!(
                            "Stored {} but {} returned no public URL",
                            receipt.path,
                            self.client.name()
                        );
                        failure(FailureReason::MissingPublicUrl { key: receipt.path })
                    }
                }
            }
            Err(RetryError::Cancelled { .. })
            | Err(RetryError::Permanent {
                error: StorageError::Cancelled,
                ..
            }) => failure(FailureReason::Cancelled),
            Err(RetryError::Permanent { error, .. }) => failure(FailureReason::NonRetryable(error)),
            Err(RetryError::Exhausted { error, .. }) => failure(FailureReason::MaxRetries(error)),
        }
    }

    /// One upload call raced against the attempt timeout and cancellation.
    async fn attempt(
        &self,
        bucket: &str,
        key: &str,
        payload: &BinaryPayload,
        options: &UploadOptions,
        cancel: &CancellationToken,
    ) -> Result<UploadReceipt, StorageError> {
        let upload = self.client.upload(bucket, key, payload, options, cancel);
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(StorageError::Cancelled),
            result = tokio::time::timeout(self.attempt_timeout, upload) => match result {
                Ok(outcome) => outcome,
                Err(_) => Err(StorageError::Timeout {
                    timeout_ms: self.attempt_timeout.as_millis() as u64,
                }),
            },
        }
    }
}
