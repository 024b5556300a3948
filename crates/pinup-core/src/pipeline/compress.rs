//! Downsampling and lossy re-encoding.

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::metadata::Orientation;
use image::{DynamicImage, ExtendedColorType, GenericImageView, ImageDecoder, ImageReader};
use std::io::Cursor;

use crate::config::IngestConfig;
use crate::error::ValidationError;

/// MIME type of everything the compressor produces.
pub const OUTPUT_MIME_TYPE: &str = "image/jpeg";

/// Downsamples images to bounded dimensions and re-encodes them as JPEG.
#[derive(Debug, Clone)]
pub struct Compressor {
    max_width: u32,
    max_height: u32,
    quality: u8,
}

impl Compressor {
    pub fn new(config: &IngestConfig) -> Self {
        Self {
            max_width: config.max_width,
            max_height: config.max_height,
            quality: config.encoder_quality(),
        }
    }

    /// Decode, downsample and re-encode raw image bytes.
    ///
    /// The EXIF orientation tag is applied before resizing, since the JPEG
    /// output carries no metadata.
    pub fn compress(&self, bytes: &[u8]) -> Result<Vec<u8>, ValidationError> {
        let image = decode_oriented(bytes).map_err(|e| ValidationError::Decode(e.to_string()))?;
        self.compress_image(&image)
    }

    /// Downsample and re-encode an already decoded image.
    pub fn compress_image(&self, image: &DynamicImage) -> Result<Vec<u8>, ValidationError> {
        let (width, height) = image.dimensions();
        let (target_w, target_h) = self.target_dimensions(width, height);

        let resized = if (target_w, target_h) == (width, height) {
            image.clone()
        } else {
            tracing::trace!("Resizing {width}x{height} -> {target_w}x{target_h}");
            image.resize_exact(target_w, target_h, FilterType::Lanczos3)
        };

        // JPEG has no alpha channel
        let rgb = resized.to_rgb8();
        let mut buf = Vec::new();
        JpegEncoder::new_with_quality(&mut buf, self.quality)
            .encode(rgb.as_raw(), rgb.width(), rgb.height(), ExtendedColorType::Rgb8)
            .map_err(|e| ValidationError::Encode(e.to_string()))?;

        Ok(buf)
    }

    /// Output dimensions that fit inside the bounds, preserving aspect ratio.
    ///
    /// The scale factor comes from whichever dimension overflows more; images
    /// already within bounds are never upscaled.
    pub fn target_dimensions(&self, width: u32, height: u32) -> (u32, u32) {
        if width <= self.max_width && height <= self.max_height {
            return (width, height);
        }

        let scale = f64::min(
            self.max_width as f64 / width as f64,
            self.max_height as f64 / height as f64,
        );
        let new_w = ((width as f64 * scale).round() as u32).clamp(1, self.max_width);
        let new_h = ((height as f64 * scale).round() as u32).clamp(1, self.max_height);
        (new_w, new_h)
    }
}

fn decode_oriented(bytes: &[u8]) -> image::ImageResult<DynamicImage> {
    let mut decoder = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()?
        .into_decoder()?;
    let orientation = decoder.orientation().unwrap_or(Orientation::NoTransforms);
    let mut image = DynamicImage::from_decoder(decoder)?;
    image.apply_orientation(orientation);
    Ok(image)
}
