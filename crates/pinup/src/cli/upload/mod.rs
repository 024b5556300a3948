//! The `pinup upload` command for uploading images.

mod report;
pub mod types;

pub use types::{OutputFormat, Site};

use anyhow::Context;
use clap::Args;
use pinup_core::{
    Config, HttpStorageClient, MediaUploader, MemoryStorage, PendingImage, StorageClient,
    UploadContext, UploadSite,
};
use std::path::PathBuf;
use std::sync::Arc;

use report::{create_progress_bar, UploadReport};

/// Arguments for the `upload` command.
#[derive(Args, Debug)]
pub struct UploadArgs {
    /// Image files to upload, in order
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Upload site; selects the default bucket and key prefix
    #[arg(short, long, value_enum)]
    pub site: Site,

    /// Owner ID used as the first key segment
    #[arg(long, env = "PINUP_OWNER")]
    pub owner: String,

    /// Override the site's bucket
    #[arg(long)]
    pub bucket: Option<String>,

    /// Override the site's key prefix
    #[arg(long)]
    pub prefix: Option<String>,

    /// Upload to an in-memory store instead of remote storage
    #[arg(long)]
    pub dry_run: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

impl UploadArgs {
    /// Destination for this run: the site's bucket and prefix, with overrides.
    fn context(&self) -> UploadContext {
        let site = UploadSite::from(self.site);
        UploadContext::new(
            self.owner.as_str(),
            self.prefix.as_deref().unwrap_or(site.prefix()),
            self.bucket.as_deref().unwrap_or(site.bucket()),
        )
    }
}

/// Execute the upload command.
pub async fn execute(args: UploadArgs, config: Config) -> anyhow::Result<()> {
    if args.owner.trim().is_empty() {
        anyhow::bail!("--owner must not be empty");
    }
    let ctx = args.context();

    let mut images = Vec::with_capacity(args.files.len());
    for path in &args.files {
        let image = PendingImage::from_path(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        images.push(image);
    }

    let client: Arc<dyn StorageClient> = if args.dry_run {
        tracing::info!("Dry run: uploading to in-memory storage");
        Arc::new(MemoryStorage::new("memory://dry-run", &[ctx.bucket.as_str()]))
    } else {
        Arc::new(
            HttpStorageClient::from_config(&config.storage)
                .context("Storage is not configured; run `pinup config init` or use --dry-run")?,
        )
    };
    let uploader = MediaUploader::new(config, client);

    let cancel = uploader.cancel_token().clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted; cancelling upload");
            cancel.cancel();
        }
    });

    let encoded = uploader
        .ingestor()
        .ingest_all(images)
        .await
        .map_err(|e| anyhow::anyhow!("{e} ({})", args.files[e.index() - 1].display()))?;

    let progress = create_progress_bar(encoded.len() as u64);
    let result = uploader
        .batch()
        .upload_all_with_progress(&encoded, &ctx, uploader.cancel_token(), |uploaded| {
            progress.inc(1);
            progress.set_message(uploaded.storage_key.clone());
        })
        .await;

    let urls = match result {
        Ok(urls) => {
            progress.finish_and_clear();
            urls
        }
        Err(e) if e.is_cancelled() => {
            progress.abandon_with_message("cancelled");
            anyhow::bail!("Upload cancelled at image {} of {}", e.index(), encoded.len());
        }
        Err(e) => {
            progress.abandon_with_message("failed");
            let file = args.files[e.index() - 1].display();
            return Err(anyhow::Error::new(e).context(format!("Upload aborted at {file}")));
        }
    };

    let report = UploadReport::new(&ctx, args.dry_run, &args.files, urls);
    println!("{}", report.render(args.format)?);
    Ok(())
}
