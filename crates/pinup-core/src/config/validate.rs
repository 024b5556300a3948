//! Configuration validation with range checks.

use crate::error::ConfigError;

use super::{Config, MAX_IMAGE_BYTES};

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.ingest.max_width == 0 || self.ingest.max_height == 0 {
            return Err(ConfigError::ValidationError(
                "ingest.max_width and ingest.max_height must be > 0".into(),
            ));
        }
        if !(self.ingest.quality > 0.0 && self.ingest.quality <= 1.0) {
            return Err(ConfigError::ValidationError(
                "ingest.quality must be in (0.0, 1.0]".into(),
            ));
        }
        if self.ingest.max_size_bytes == 0 || self.ingest.max_size_bytes > MAX_IMAGE_BYTES {
            return Err(ConfigError::ValidationError(format!(
                "ingest.max_size_bytes must be between 1 and {MAX_IMAGE_BYTES}"
            )));
        }
        if self.ingest.decode_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "ingest.decode_timeout_ms must be > 0".into(),
            ));
        }
        if self.upload.max_attempts == 0 {
            return Err(ConfigError::ValidationError(
                "upload.max_attempts must be > 0".into(),
            ));
        }
        if self.upload.attempt_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "upload.attempt_timeout_ms must be > 0".into(),
            ));
        }
        if self.storage.default_bucket.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "storage.default_bucket must not be empty".into(),
            ));
        }
        Ok(())
    }
}
