//! Error types for the Pinup upload pipeline.
//!
//! Errors are organized by stage: ingestion (`ValidationError`), data URL
//! decoding (`ConversionError`), storage I/O (`StorageError`), and the
//! batch-level `PipelineError` that callers ultimately observe. Every batch
//! error carries the 1-based index of the image that failed.

use thiserror::Error;

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// An image failed type or size checks, or could not be re-encoded.
///
/// Raised before any network activity and never retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Declared MIME type is not `image/*`
    #[error("Unsupported file type '{mime_type}' (expected image/*)")]
    NotAnImage { mime_type: String },

    /// Source contains no bytes
    #[error("Image is empty")]
    Empty,

    /// Source or payload exceeds the size ceiling
    #[error("Image too large: {size_bytes} bytes exceeds the {max_bytes} byte limit")]
    TooLarge { size_bytes: u64, max_bytes: u64 },

    /// Bytes could not be decoded as an image
    #[error("Cannot decode image: {0}")]
    Decode(String),

    /// Re-encoding the downsampled image failed
    #[error("Cannot encode image: {0}")]
    Encode(String),

    /// Decoding and re-encoding took longer than allowed
    #[error("Image processing timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },
}

/// A data URL could not be turned back into bytes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConversionError {
    /// No comma between header and payload
    #[error("Invalid data URL: missing ',' between header and payload")]
    MissingSeparator,

    /// Nothing after the comma
    #[error("Invalid data URL: empty base64 payload")]
    EmptyPayload,

    /// Payload is not valid standard base64
    #[error("Invalid data URL: {0}")]
    InvalidBase64(#[from] base64::DecodeError),

    /// Header names a MIME type outside `image/*`
    #[error("Invalid data URL: '{mime_type}' is not an image type")]
    NotAnImage { mime_type: String },

    /// Decoded bytes violate the payload size bounds
    #[error("Invalid payload: {0}")]
    InvalidPayload(#[from] ValidationError),
}

/// Errors reported by a `StorageClient`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// Transport-level failure (DNS, connection reset, TLS, ...)
    #[error("Network error: {0}")]
    Network(String),

    /// The attempt did not settle within the per-attempt timeout
    #[error("Upload timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// The storage backend rejected the request
    #[error("{message}")]
    Backend {
        status: Option<u16>,
        message: String,
    },

    /// The client does not implement the requested capability
    #[error("Operation not supported by this storage client: {0}")]
    Unsupported(&'static str),

    /// The caller abandoned the operation
    #[error("Upload cancelled")]
    Cancelled,
}

impl StorageError {
    /// Build a backend error, falling back to a generic message when the
    /// backend did not supply one.
    pub fn backend(status: Option<u16>, message: Option<String>) -> Self {
        let message = match message.filter(|m| !m.trim().is_empty()) {
            Some(m) => m,
            None => match status {
                Some(code) => format!("Storage backend returned HTTP {code}"),
                None => "Storage backend rejected the upload".to_string(),
            },
        };
        Self::Backend { status, message }
    }
}

/// Why an image upload terminally failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// Every attempt failed with a transient error
    #[error("max retries exceeded: {0}")]
    MaxRetries(StorageError),

    /// A permanent error ended the attempts early
    #[error("{0}")]
    NonRetryable(StorageError),

    /// The object was stored but no public URL could be resolved
    #[error("uploaded '{key}' but no public URL was returned")]
    MissingPublicUrl { key: String },

    /// The batch was cancelled
    #[error("cancelled")]
    Cancelled,
}

impl FailureReason {
    /// The storage error behind this failure, if any.
    pub fn cause(&self) -> Option<&StorageError> {
        match self {
            FailureReason::MaxRetries(e) | FailureReason::NonRetryable(e) => Some(e),
            FailureReason::MissingPublicUrl { .. } | FailureReason::Cancelled => None,
        }
    }
}

/// Batch-level pipeline failure.
///
/// Wraps the first terminal per-image failure together with the 1-based index
/// of the image that caused it.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Image failed validation or re-encoding during ingestion
    #[error("Image {index} rejected: {source}")]
    Validation {
        index: usize,
        #[source]
        source: ValidationError,
    },

    /// Encoded image could not be decoded
    #[error("Image {index} could not be decoded: {source}")]
    Conversion {
        index: usize,
        #[source]
        source: ConversionError,
    },

    /// Upload failed permanently
    #[error("Image {index} failed to upload after {attempts} attempt(s): {reason}")]
    Upload {
        index: usize,
        reason: FailureReason,
        attempts: u32,
    },
}

impl PipelineError {
    /// 1-based index of the failing image.
    pub fn index(&self) -> usize {
        match self {
            PipelineError::Validation { index, .. }
            | PipelineError::Conversion { index, .. }
            | PipelineError::Upload { index, .. } => *index,
        }
    }

    /// Whether the failure came from cancelling the batch.
    pub fn is_cancelled(&self) -> bool {
        matches!(
            self,
            PipelineError::Upload {
                reason: FailureReason::Cancelled,
                ..
            }
        )
    }
}

/// Convenience type alias for pipeline-specific results.
pub type PipelineResult<T> = std::result::Result<T, PipelineError>;
