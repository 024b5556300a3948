//! Input validation before processing.

use crate::config::IngestConfig;
use crate::error::ValidationError;
use crate::types::PendingImage;

/// Validates pending images before any decoding work.
pub struct Validator {
    max_size_bytes: u64,
}

impl Validator {
    /// Create a new validator with the given ingestion limits.
    pub fn new(config: &IngestConfig) -> Self {
        Self {
            max_size_bytes: config.max_size_bytes,
        }
    }

    /// Perform quick validation before full decode.
    ///
    /// Checks:
    /// - Declared MIME type is `image/*`
    /// - Source is not empty
    /// - Source size is within the ceiling
    pub fn validate(&self, image: &PendingImage) -> Result<(), ValidationError> {
        if !image.mime_type.starts_with("image/") {
            return Err(ValidationError::NotAnImage {
                mime_type: image.mime_type.clone(),
            });
        }

        let size = image.size_bytes.max(image.bytes.len() as u64);
        if size == 0 {
            return Err(ValidationError::Empty);
        }
        if size > self.max_size_bytes {
            return Err(ValidationError::TooLarge {
                size_bytes: size,
                max_bytes: self.max_size_bytes,
            });
        }

        Ok(())
    }
}

/// Detect an image MIME type from the file's magic bytes.
pub fn sniff_mime(bytes: &[u8]) -> Option<&'static str> {
    let header = &bytes[..bytes.len().min(12)];
    if header.len() < 4 {
        return None;
    }

    // JPEG: FF D8 FF
    if header.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return Some("image/jpeg");
    }

    // PNG: 89 50 4E 47
    if header.starts_with(&[0x89, b'P', b'N', b'G']) {
        return Some("image/png");
    }

    // GIF: GIF8
    if header.starts_with(b"GIF8") {
        return Some("image/gif");
    }

    // WebP: RIFF....WEBP
    if header.starts_with(b"RIFF") && header.len() >= 12 && &header[8..12] == b"WEBP" {
        return Some("image/webp");
    }

    // BMP: BM
    if header.starts_with(b"BM") {
        return Some("image/bmp");
    }

    // TIFF: II (little-endian) or MM (big-endian) followed by version 42
    if header.starts_with(&[b'I', b'I', 0x2A, 0x00]) || header.starts_with(&[b'M', b'M', 0x00, 0x2A])
    {
        return Some("image/tiff");
    }

    // HEIC/HEIF/AVIF: ftyp box at offset 4
    if header.len() >= 12 && &header[4..8] == b"ftyp" {
        return match &header[8..12] {
            b"avif" | b"avis" => Some("image/avif"),
            _ => Some("image/heic"),
        };
    }

    None
}
