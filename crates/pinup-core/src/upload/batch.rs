//! Sequential, all-or-nothing batch uploads.

use tokio_util::sync::CancellationToken;

use super::orchestrator::UploadOrchestrator;
use crate::error::{ConversionError, FailureReason, PipelineError, PipelineResult, StorageError};
use crate::pipeline::codec;
use crate::types::{BinaryPayload, EncodedImage, UploadContext, UploadOutcome, UploadedImage};

/// Uploads a batch of encoded images one at a time, in input order.
///
/// The first terminal failure aborts the batch: later images are never
/// decoded or uploaded, and images already stored are left in place.
pub struct BatchCoordinator {
    orchestrator: UploadOrchestrator,
    preflight: bool,
}

impl BatchCoordinator {
    pub fn new(orchestrator: UploadOrchestrator) -> Self {
        Self {
            orchestrator,
            preflight: true,
        }
    }

    /// Enable or disable the bucket listing check before each batch.
    pub fn with_preflight(mut self, preflight: bool) -> Self {
        self.preflight = preflight;
        self
    }

    pub fn orchestrator(&self) -> &UploadOrchestrator {
        &self.orchestrator
    }

    /// Upload every image and return their public URLs in input order.
    pub async fn upload_all(
        &self,
        images: &[EncodedImage],
        ctx: &UploadContext,
        cancel: &CancellationToken,
    ) -> PipelineResult<Vec<String>> {
        self.upload_all_with_progress(images, ctx, cancel, |_| {})
            .await
    }

    /// Like `upload_all`, calling `on_uploaded` after each image is stored.
    pub async fn upload_all_with_progress<F>(
        &self,
        images: &[EncodedImage],
        ctx: &UploadContext,
        cancel: &CancellationToken,
        on_uploaded: F,
    ) -> PipelineResult<Vec<String>>
    where
        F: FnMut(&UploadedImage),
    {
        self.run(images.len(), |i| images[i].decode(), ctx, cancel, on_uploaded)
            .await
    }

    /// Upload a batch given as data URL strings.
    pub async fn upload_images<S: AsRef<str>>(
        &self,
        data_urls: &[S],
        ctx: &UploadContext,
        cancel: &CancellationToken,
    ) -> PipelineResult<Vec<String>> {
        self.run(
            data_urls.len(),
            |i| codec::decode(data_urls[i].as_ref()),
            ctx,
            cancel,
            |_| {},
        )
        .await
    }

    async fn run<D, F>(
        &self,
        count: usize,
        mut decode: D,
        ctx: &UploadContext,
        cancel: &CancellationToken,
        mut on_uploaded: F,
    ) -> PipelineResult<Vec<String>>
    where
        D: FnMut(usize) -> Result<BinaryPayload, ConversionError>,
        F: FnMut(&UploadedImage),
    {
        if count == 0 {
            return Ok(Vec::new());
        }

        if self.preflight && !self.check_bucket(&ctx.bucket, cancel).await {
            tracing::info!("Batch cancelled during bucket check");
            return Err(PipelineError::Upload {
                index: 1,
                reason: FailureReason::Cancelled,
                attempts: 0,
            });
        }

        tracing::info!("Uploading {count} image(s) to bucket {}", ctx.bucket);

        let mut urls = Vec::with_capacity(count);
        for i in 0..count {
            let index = i + 1;

            if cancel.is_cancelled() {
                tracing::info!("Batch cancelled before image {index}/{count}");
                return Err(PipelineError::Upload {
                    index,
                    reason: FailureReason::Cancelled,
                    attempts: 0,
                });
            }

            let payload = decode(i).map_err(|e| match e {
                ConversionError::InvalidPayload(source) => {
                    PipelineError::Validation { index, source }
                }
                source => PipelineError::Conversion { index, source },
            })?;

            let mut task = self.orchestrator.prepare(payload, index, ctx);
            match self.orchestrator.upload(&mut task, ctx, cancel).await {
                UploadOutcome::Success {
                    public_url,
                    storage_key,
                    attempts,
                } => {
                    tracing::debug!("Image {index}/{count} stored at {storage_key} after {attempts} attempt(s)");
                    on_uploaded(&UploadedImage {
                        index,
                        storage_key,
                        public_url: public_url.clone(),
                    });
                    urls.push(public_url);
                }
                UploadOutcome::Failure(failure) => {
                    tracing::error!(
                        "Image {index}/{count} failed, aborting batch ({} already stored): {}",
                        urls.len(),
                        failure.reason
                    );
                    return Err(failure.into());
                }
            }
        }

        tracing::info!("Uploaded {count} image(s) to bucket {}", ctx.bucket);
        Ok(urls)
    }

    /// Log whether the target bucket is visible. Never blocks the upload.
    ///
    /// The listing is bounded by the attempt timeout. Returns `false` only
    /// when the batch was cancelled while listing.
    async fn check_bucket(&self, bucket: &str, cancel: &CancellationToken) -> bool {
        let limit = self.orchestrator.attempt_timeout();
        let listing = tokio::select! {
            biased;
            _ = cancel.cancelled() => return false,
            result = tokio::time::timeout(limit, self.orchestrator.client().list_buckets()) => result,
        };
        let listing = listing.unwrap_or(Err(StorageError::Timeout {
            timeout_ms: limit.as_millis() as u64,
        }));

        match listing {
            Ok(buckets) => {
                if buckets.iter().any(|b| b.name == bucket || b.id == bucket) {
                    tracing::debug!("Bucket {bucket} is available");
                } else {
                    let names: Vec<&str> = buckets.iter().map(|b| b.name.as_str()).collect();
                    tracing::warn!(
                        "Bucket {bucket} not found in bucket list [{}]; uploading anyway",
                        names.join(", ")
                    );
                }
            }
            Err(StorageError::Unsupported(_)) => {
                tracing::debug!("Storage client cannot list buckets; skipping bucket check");
            }
            Err(e) => {
                tracing::warn!("Could not list buckets: {e}; uploading anyway");
            }
        }
        true
    }
}
