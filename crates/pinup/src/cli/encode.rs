//! The `pinup encode` command: ingest one image and emit its data URL.

use anyhow::Context;
use clap::Args;
use pinup_core::{Config, ImageIngestor, PendingImage};
use std::path::PathBuf;

/// Arguments for the `encode` command.
#[derive(Args, Debug)]
pub struct EncodeArgs {
    /// Image file to encode
    pub input: PathBuf,

    /// Write the data URL to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Execute the encode command.
pub async fn execute(args: EncodeArgs, config: Config) -> anyhow::Result<()> {
    let image = PendingImage::from_path(&args.input)
        .await
        .with_context(|| format!("Failed to read {}", args.input.display()))?;
    let source_bytes = image.size_bytes;

    let encoded = ImageIngestor::new(&config.ingest)
        .ingest(image)
        .await
        .with_context(|| format!("Failed to encode {}", args.input.display()))?;
    let data_url = encoded.data_url();

    tracing::info!(
        "Encoded {} ({} bytes) as {} ({} chars)",
        args.input.display(),
        source_bytes,
        encoded.mime_type,
        data_url.len()
    );

    match args.output {
        Some(path) => {
            std::fs::write(&path, &data_url)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!("Data URL written to {}", path.display());
        }
        None => println!("{data_url}"),
    }

    Ok(())
}
