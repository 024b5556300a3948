//! Pinup Core - Resilient client-side media upload pipeline.
//!
//! Pinup takes user-selected images, shrinks and re-encodes them, and uploads
//! them to object storage with bounded retries, returning public URLs.
//!
//! # Architecture
//!
//! ```text
//! PendingImage → Validate → Compress → Data URL → Decode → Upload (retry) → Public URL
//! ```
//!
//! A batch is uploaded sequentially and is all-or-nothing: the first image
//! that fails permanently aborts the batch with its 1-based index.
//!
//! # Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use pinup_core::{Config, HttpStorageClient, MediaUploader, PendingImage, UploadSite};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load()?;
//!     let client = Arc::new(HttpStorageClient::from_config(&config.storage)?);
//!     let uploader = MediaUploader::new(config, client);
//!
//!     let image = PendingImage::from_path("./beach.jpg".as_ref()).await?;
//!     let urls = uploader.upload_files(vec![image], UploadSite::Moment, "user-42").await?;
//!     println!("{}", urls[0]);
//!     Ok(())
//! }
//! ```

// Module declarations
pub mod config;
pub mod error;
pub mod pipeline;
pub mod storage;
pub mod types;
pub mod upload;

// Re-exports for convenient access
pub use config::Config;
pub use error::{
    ConfigError, ConversionError, FailureReason, PipelineError, PipelineResult, StorageError,
    ValidationError,
};
pub use pipeline::ImageIngestor;
pub use storage::{HttpStorageClient, MemoryStorage, StorageClient};
pub use types::{
    BinaryPayload, EncodedImage, PendingImage, UploadContext, UploadOutcome, UploadSite,
    UploadedImage,
};
pub use upload::{BatchCoordinator, UploadOrchestrator};

use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use upload::Sleeper;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Caller-facing uploader: ingestion plus batch upload against one backend.
pub struct MediaUploader {
    config: Config,
    ingestor: ImageIngestor,
    batch: BatchCoordinator,
    cancel: CancellationToken,
}

impl MediaUploader {
    /// Create an uploader for the given storage backend.
    pub fn new(config: Config, client: Arc<dyn StorageClient>) -> Self {
        tracing::debug!("Initializing Pinup v{} with {} storage", VERSION, client.name());
        let batch = Self::build_batch(&config, client, None);
        Self {
            ingestor: ImageIngestor::new(&config.ingest),
            batch,
            config,
            cancel: CancellationToken::new(),
        }
    }

    /// Replace the sleeper used for retry backoff.
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        let client = self.batch.orchestrator().client().clone();
        self.batch = Self::build_batch(&self.config, client, Some(sleeper));
        self
    }

    /// Use an externally owned cancellation token.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    fn build_batch(
        config: &Config,
        client: Arc<dyn StorageClient>,
        sleeper: Option<Arc<dyn Sleeper>>,
    ) -> BatchCoordinator {
        let mut orchestrator = UploadOrchestrator::new(client, &config.upload);
        if let Some(sleeper) = sleeper {
            orchestrator = orchestrator.with_sleeper(sleeper);
        }
        BatchCoordinator::new(orchestrator).with_preflight(config.upload.preflight)
    }

    /// Token that cancels the batch in progress.
    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn ingestor(&self) -> &ImageIngestor {
        &self.ingestor
    }

    pub fn batch(&self) -> &BatchCoordinator {
        &self.batch
    }

    /// Upload data URLs into the default bucket under `{owner_id}/{prefix}/`.
    pub async fn upload_images<S: AsRef<str>>(
        &self,
        data_urls: &[S],
        owner_id: &str,
        prefix: &str,
    ) -> PipelineResult<Vec<String>> {
        let ctx = UploadContext::new(owner_id, prefix, self.config.storage.default_bucket.as_str());
        self.batch.upload_images(data_urls, &ctx, &self.cancel).await
    }

    /// Upload already-ingested images to an explicit destination.
    pub async fn upload_to(
        &self,
        images: &[EncodedImage],
        ctx: &UploadContext,
    ) -> PipelineResult<Vec<String>> {
        self.batch.upload_all(images, ctx, &self.cancel).await
    }

    /// Ingest every image, then upload the batch for `site`.
    ///
    /// All images are ingested before the first upload, so a rejected image
    /// aborts the batch without touching storage.
    pub async fn upload_files(
        &self,
        images: Vec<PendingImage>,
        site: UploadSite,
        owner_id: &str,
    ) -> PipelineResult<Vec<String>> {
        let encoded = self.ingestor.ingest_all(images).await?;
        let ctx = UploadContext::for_site(site, owner_id);
        self.upload_to(&encoded, &ctx).await
    }
}
