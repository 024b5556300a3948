//! Progress display and result rendering for `pinup upload`.

use pinup_core::UploadContext;
use serde::Serialize;
use std::path::PathBuf;

use super::types::OutputFormat;

/// Create a progress bar for a batch upload.
pub(super) fn create_progress_bar(total: u64) -> indicatif::ProgressBar {
    use indicatif::{ProgressBar, ProgressStyle};

    let pb = ProgressBar::new(total);
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("##-");
    pb.set_style(style);
    pb.set_message("uploading...");
    pb
}

/// One uploaded file in the final report.
#[derive(Debug, Serialize)]
pub(super) struct UploadedFile {
    pub file: PathBuf,
    pub url: String,
}

/// Result of a successful batch, printed to stdout.
#[derive(Debug, Serialize)]
pub(super) struct UploadReport {
    pub owner_id: String,
    pub bucket: String,
    pub prefix: String,
    pub dry_run: bool,
    pub images: Vec<UploadedFile>,
}

impl UploadReport {
    pub fn new(ctx: &UploadContext, dry_run: bool, files: &[PathBuf], urls: Vec<String>) -> Self {
        let images = files
            .iter()
            .zip(urls)
            .map(|(file, url)| UploadedFile {
                file: file.clone(),
                url,
            })
            .collect();
        Self {
            owner_id: ctx.owner_id.clone(),
            bucket: ctx.bucket.clone(),
            prefix: ctx.prefix.clone(),
            dry_run,
            images,
        }
    }

    /// Text is one URL per line in input order.
    pub fn render(&self, format: OutputFormat) -> serde_json::Result<String> {
        match format {
            OutputFormat::Text => Ok(self
                .images
                .iter()
                .map(|image| image.url.as_str())
                .collect::<Vec<_>>()
                .join("\n")),
            OutputFormat::Json => serde_json::to_string_pretty(self),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report() -> UploadReport {
        UploadReport::new(
            &UploadContext::new("u1", "moments", "moments"),
            false,
            &[PathBuf::from("a.jpg"), PathBuf::from("b.png")],
            vec!["https://cdn.test/1".to_string(), "https://cdn.test/2".to_string()],
        )
    }

    #[test]
    fn test_render_text_one_url_per_line() {
        let text = report().render(OutputFormat::Text).unwrap();
        assert_eq!(text, "https://cdn.test/1\nhttps://cdn.test/2");
    }

    #[test]
    fn test_render_json() {
        let json = report().render(OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["bucket"], "moments");
        assert_eq!(value["dry_run"], false);
        assert_eq!(value["images"][1]["file"], "b.png");
        assert_eq!(value["images"][1]["url"], "https://cdn.test/2");
    }
}
