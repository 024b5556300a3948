//! Core data types for the Pinup upload pipeline.
//!
//! An image moves through these types in order:
//! `PendingImage` → `EncodedImage` → `BinaryPayload` → `UploadTask` → `UploadOutcome`.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use crate::config::MAX_IMAGE_BYTES;
use crate::error::{ConversionError, FailureReason, PipelineError, ValidationError};
use crate::pipeline::{codec, validate};

/// A user-selected image that has not been processed yet.
#[derive(Debug, Clone)]
pub struct PendingImage {
    /// Raw file bytes
    pub bytes: Vec<u8>,
    /// Declared MIME type (e.g. "image/png")
    pub mime_type: String,
    /// Size of the source in bytes
    pub size_bytes: u64,
}

impl PendingImage {
    /// Wrap raw bytes with their declared MIME type.
    pub fn new(bytes: Vec<u8>, mime_type: impl Into<String>) -> Self {
        let size_bytes = bytes.len() as u64;
        Self {
            bytes,
            mime_type: mime_type.into(),
            size_bytes,
        }
    }

    /// Read an image from disk.
    ///
    /// The MIME type is sniffed from the file's magic bytes, falling back to
    /// the extension. Files that look like neither get
    /// `application/octet-stream` and are rejected later during ingestion.
    pub async fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let mime_type = validate::sniff_mime(&bytes)
            .or_else(|| {
                image::ImageFormat::from_path(path)
                    .ok()
                    .map(|f| f.to_mime_type())
            })
            .unwrap_or("application/octet-stream");
        Ok(Self::new(bytes, mime_type))
    }
}

/// An ingested image serialized as MIME type plus base64 payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedImage {
    /// MIME type of the payload (e.g. "image/jpeg")
    pub mime_type: String,
    /// Standard base64 of the image bytes
    pub base64_payload: String,
}

impl EncodedImage {
    /// Render as `data:<mime>;base64,<payload>`.
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.base64_payload)
    }

    /// Decode the payload back into bytes.
    pub fn decode(&self) -> Result<BinaryPayload, ConversionError> {
        codec::decode_parts(&self.mime_type, &self.base64_payload)
    }
}

impl fmt::Display for EncodedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "data:{};base64,{}", self.mime_type, self.base64_payload)
    }
}

/// Decoded image bytes ready for upload.
///
/// Always holds between 1 byte and the 10 MB ceiling. `Bytes` makes the
/// per-attempt clone handed to the storage client free.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryPayload {
    mime_type: String,
    bytes: Bytes,
}

impl BinaryPayload {
    /// Build a payload, enforcing the size ceiling.
    pub fn new(mime_type: impl Into<String>, bytes: impl Into<Bytes>) -> Result<Self, ValidationError> {
        let bytes = bytes.into();
        if bytes.is_empty() {
            return Err(ValidationError::Empty);
        }
        if bytes.len() as u64 > MAX_IMAGE_BYTES {
            return Err(ValidationError::TooLarge {
                size_bytes: bytes.len() as u64,
                max_bytes: MAX_IMAGE_BYTES,
            });
        }
        Ok(Self {
            mime_type: mime_type.into(),
            bytes,
        })
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// One image's upload, owned by the orchestrator while it runs.
#[derive(Debug, Clone)]
pub struct UploadTask {
    /// Bytes to upload
    pub payload: BinaryPayload,
    /// Object key in the bucket
    pub storage_key: String,
    /// 1-based position in the batch
    pub index: usize,
    /// Attempts made so far
    pub attempt: u32,
    /// Attempt budget, including the first
    pub max_attempts: u32,
}

impl UploadTask {
    pub fn new(payload: BinaryPayload, storage_key: String, index: usize, max_attempts: u32) -> Self {
        Self {
            payload,
            storage_key,
            index,
            attempt: 0,
            max_attempts,
        }
    }
}

/// Terminal failure of a single image upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFailure {
    /// 1-based position in the batch
    pub index: usize,
    /// Classified cause
    pub reason: FailureReason,
    /// Attempts made before giving up
    pub attempts: u32,
}

impl From<UploadFailure> for PipelineError {
    fn from(failure: UploadFailure) -> Self {
        PipelineError::Upload {
            index: failure.index,
            reason: failure.reason,
            attempts: failure.attempts,
        }
    }
}

/// Result of uploading one image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    Success {
        public_url: String,
        storage_key: String,
        attempts: u32,
    },
    Failure(UploadFailure),
}

impl UploadOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, UploadOutcome::Success { .. })
    }
}

/// An image that finished uploading, reported to batch progress callbacks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadedImage {
    /// 1-based position in the batch
    pub index: usize,
    pub storage_key: String,
    pub public_url: String,
}

/// The places in the app that upload images.
///
/// Each site only differs in the bucket it writes to and the key prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UploadSite {
    /// Photos attached when creating a listing
    Listing,
    /// Photos on an itinerary item inside a listing
    Itinerary,
    /// Highlight cover images on a profile
    Highlight,
    /// Photos in a moment
    Moment,
    /// Photos added from the edit-listing-details screen
    ListingDetails,
}

impl UploadSite {
    pub fn bucket(&self) -> &'static str {
        match self {
            UploadSite::Listing | UploadSite::Itinerary | UploadSite::ListingDetails => {
                "listing-images"
            }
            UploadSite::Highlight => "highlights",
            UploadSite::Moment => "moments",
        }
    }

    pub fn prefix(&self) -> &'static str {
        match self {
            UploadSite::Listing => "listings",
            UploadSite::Itinerary => "itinerary",
            UploadSite::Highlight => "highlights",
            UploadSite::Moment => "moments",
            UploadSite::ListingDetails => "listing-details",
        }
    }
}

impl fmt::Display for UploadSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UploadSite::Listing => write!(f, "listing"),
            UploadSite::Itinerary => write!(f, "itinerary"),
            UploadSite::Highlight => write!(f, "highlight"),
            UploadSite::Moment => write!(f, "moment"),
            UploadSite::ListingDetails => write!(f, "listing-details"),
        }
    }
}

/// Where a batch's objects go: bucket, owner and key prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadContext {
    pub owner_id: String,
    pub prefix: String,
    pub bucket: String,
}

impl UploadContext {
    pub fn new(
        owner_id: impl Into<String>,
        prefix: impl Into<String>,
        bucket: impl Into<String>,
    ) -> Self {
        Self {
            owner_id: owner_id.into(),
            prefix: prefix.into(),
            bucket: bucket.into(),
        }
    }

    /// Context for one of the app's upload sites.
    pub fn for_site(site: UploadSite, owner_id: impl Into<String>) -> Self {
        Self::new(owner_id, site.prefix(), site.bucket())
    }
}
