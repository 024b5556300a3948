//! Sub-configuration structs with defaults shared by every upload site.

use serde::{Deserialize, Serialize};

/// Hard ceiling on image size, before and after compression (10 MB).
pub const MAX_IMAGE_BYTES: u64 = 10 * 1024 * 1024;

/// Image ingestion constraints.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Maximum output width in pixels
    pub max_width: u32,

    /// Maximum output height in pixels
    pub max_height: u32,

    /// Lossy compression quality factor (0.0 - 1.0]
    pub quality: f32,

    /// Maximum accepted source size in bytes
    pub max_size_bytes: u64,

    /// Decode + re-encode timeout in milliseconds
    pub decode_timeout_ms: u64,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            max_width: 1600,
            max_height: 1600,
            quality: 0.85,
            max_size_bytes: MAX_IMAGE_BYTES,
            decode_timeout_ms: 10_000,
        }
    }
}

impl IngestConfig {
    /// Quality mapped onto the 1-100 scale used by the JPEG encoder.
    pub fn encoder_quality(&self) -> u8 {
        (self.quality * 100.0).round().clamp(1.0, 100.0) as u8
    }
}

/// Upload retry and timeout policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    /// Total attempts per image, including the first
    pub max_attempts: u32,

    /// Per-attempt timeout in milliseconds
    pub attempt_timeout_ms: u64,

    /// Linear backoff unit: attempt N waits `N * backoff_base_ms`
    pub backoff_base_ms: u64,

    /// `Cache-Control` max-age sent with every object, in seconds
    pub cache_control_secs: u64,

    /// Check that the target bucket exists before uploading (never fatal)
    pub preflight: bool,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            attempt_timeout_ms: 30_000,
            backoff_base_ms: 1000,
            cache_control_secs: 3600,
            preflight: true,
        }
    }
}

/// Remote object storage settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Base URL of the storage service (e.g. "https://xyz.example.co")
    pub endpoint: String,

    /// API key (supports ${ENV_VAR} syntax)
    pub api_key: String,

    /// Bucket used when a caller gives only an owner and prefix
    pub default_bucket: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            api_key: "${PINUP_STORAGE_KEY}".to_string(),
            default_bucket: "listing-images".to_string(),
        }
    }
}

impl StorageConfig {
    /// API key with `${ENV_VAR}` references resolved.
    pub fn resolved_api_key(&self) -> Option<String> {
        resolve_env_var(&self.api_key)
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log format: "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

/// Resolve `${ENV_VAR}` references in config strings.
pub fn resolve_env_var(value: &str) -> Option<String> {
    if value.starts_with("${") && value.ends_with('}') {
        let var_name = &value[2..value.len() - 1];
        std::env::var(var_name).ok().filter(|v| !v.is_empty())
    } else if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}
