//! Image ingestion pipeline components.
//!
//! This module contains the stages that turn a user-selected file into an
//! upload-ready payload:
//! - **validate**: Type and size checks, MIME sniffing
//! - **compress**: Downsampling and JPEG re-encoding
//! - **ingest**: Orchestrates validation and compression into a data URL
//! - **codec**: Data URL encoding/decoding

pub mod codec;
pub mod compress;
pub mod ingest;
pub mod validate;

// Re-exports for convenient access
pub use compress::Compressor;
pub use ingest::ImageIngestor;
pub use validate::Validator;
