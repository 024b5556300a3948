//! Image ingestion: validate, downsample, re-encode, serialize.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use std::time::Duration;
use tokio::time::timeout;

use crate::config::IngestConfig;
use crate::error::{PipelineError, ValidationError};
use crate::types::{EncodedImage, PendingImage};

use super::compress::{Compressor, OUTPUT_MIME_TYPE};
use super::validate::Validator;

/// Turns user-selected images into encoded images ready for upload.
pub struct ImageIngestor {
    validator: Validator,
    compressor: Compressor,
    decode_timeout_ms: u64,
}

impl ImageIngestor {
    /// Create a new ingestor with the given constraints.
    pub fn new(config: &IngestConfig) -> Self {
        Self {
            validator: Validator::new(config),
            compressor: Compressor::new(config),
            decode_timeout_ms: config.decode_timeout_ms,
        }
    }

    /// Ingest a single image.
    ///
    /// Type and size are checked before any decoding. The CPU-bound
    /// decode/resize/encode runs on the blocking pool, bounded by the
    /// configured timeout. The output is not re-checked against the size
    /// ceiling; `BinaryPayload` does that when it is decoded for upload.
    pub async fn ingest(&self, image: PendingImage) -> Result<EncodedImage, ValidationError> {
        self.validator.validate(&image)?;

        let source_size = image.bytes.len();
        let compressor = self.compressor.clone();
        let bytes = image.bytes;
        let timeout_duration = Duration::from_millis(self.decode_timeout_ms);

        let result = timeout(
            timeout_duration,
            tokio::task::spawn_blocking(move || compressor.compress(&bytes)),
        )
        .await;

        let compressed = match result {
            Ok(Ok(Ok(compressed))) => compressed,
            Ok(Ok(Err(e))) => return Err(e),
            Ok(Err(e)) => return Err(ValidationError::Decode(format!("Task join error: {e}"))),
            Err(_) => {
                return Err(ValidationError::Timeout {
                    timeout_ms: self.decode_timeout_ms,
                })
            }
        };

        tracing::debug!(
            source_bytes = source_size,
            output_bytes = compressed.len(),
            "Ingested image"
        );

        Ok(EncodedImage {
            mime_type: OUTPUT_MIME_TYPE.to_string(),
            base64_payload: BASE64.encode(compressed),
        })
    }

    /// Ingest images in order, stopping at the first rejection.
    ///
    /// The error carries the 1-based index of the rejected image.
    pub async fn ingest_all(
        &self,
        images: Vec<PendingImage>,
    ) -> Result<Vec<EncodedImage>, PipelineError> {
        let mut encoded = Vec::with_capacity(images.len());
        for (i, image) in images.into_iter().enumerate() {
            let index = i + 1;
            let image = self
                .ingest(image)
                .await
                .map_err(|source| PipelineError::Validation { index, source })?;
            encoded.push(image);
        }
        Ok(encoded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::codec;
    use image::{DynamicImage, GenericImageView, ImageFormat};
    use std::io::Cursor;

    fn png(width: u32, height: u32) -> PendingImage {
        let mut buffer = Cursor::new(Vec::new());
        DynamicImage::new_rgb8(width, height)
            .write_to(&mut buffer, ImageFormat::Png)
            .unwrap();
        PendingImage::new(buffer.into_inner(), "image/png")
    }

    fn ingestor() -> ImageIngestor {
        ImageIngestor::new(&IngestConfig {
            max_width: 200,
            max_height: 200,
            ..IngestConfig::default()
        })
    }

    #[tokio::test]
    async fn test_ingest_produces_decodable_jpeg_data_url() {
        let encoded = ingestor().ingest(png(800, 400)).await.unwrap();
        assert_eq!(encoded.mime_type, "image/jpeg");

        let payload = codec::decode(&encoded.data_url()).unwrap();
        let image = image::load_from_memory(payload.bytes()).unwrap();
        assert_eq!(image.dimensions(), (200, 100));
    }

    #[tokio::test]
    async fn test_ingest_rejects_non_image() {
        let pending = PendingImage::new(b"%PDF-1.7".to_vec(), "application/pdf");
        let err = ingestor().ingest(pending).await.unwrap_err();
        assert!(matches!(err, ValidationError::NotAnImage { .. }));
    }

    #[tokio::test]
    async fn test_ingest_rejects_oversized_source_before_decoding() {
        // Not a valid image: rejection must come from the size check, not the decoder
        let pending = PendingImage::new(vec![0u8; 10 * 1024 * 1024 + 1], "image/jpeg");
        let err = ingestor().ingest(pending).await.unwrap_err();
        assert!(matches!(err, ValidationError::TooLarge { .. }));
    }

    #[tokio::test]
    async fn test_ingest_all_reports_index_of_rejected_image() {
        let images = vec![
            png(10, 10),
            PendingImage::new(b"text".to_vec(), "text/plain"),
            png(10, 10),
        ];
        let err = ingestor().ingest_all(images).await.unwrap_err();
        assert_eq!(err.index(), 2);
        assert!(matches!(err, PipelineError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_ingest_all_preserves_order() {
        let encoded = ingestor()
            .ingest_all(vec![png(40, 20), png(20, 40)])
            .await
            .unwrap();
        assert_eq!(encoded.len(), 2);

        let first = image::load_from_memory(encoded[0].decode().unwrap().bytes()).unwrap();
        let second = image::load_from_memory(encoded[1].decode().unwrap().bytes()).unwrap();
        assert_eq!(first.dimensions(), (40, 20));
        assert_eq!(second.dimensions(), (20, 40));
    }
}
