//! Data URL encoding and decoding.
//!
//! Pure functions over `data:<mime>;base64,<payload>` strings. No I/O.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};

use crate::error::ConversionError;
use crate::types::{BinaryPayload, EncodedImage};

/// MIME type assumed when the header does not name one.
pub const DEFAULT_MIME_TYPE: &str = "image/jpeg";

/// Encode bytes as a data URL.
pub fn encode(bytes: &[u8], mime_type: &str) -> String {
    EncodedImage {
        mime_type: mime_type.to_string(),
        base64_payload: BASE64.encode(bytes),
    }
    .data_url()
}

/// Split a data URL into MIME type and base64 payload without decoding it.
///
/// The header is everything before the first comma. The MIME type sits
/// between the first `:` and the following `;` of the header and defaults
/// to `image/jpeg`. Non-image types are rejected.
pub fn parse(encoded: &str) -> Result<EncodedImage, ConversionError> {
    let (header, payload) = encoded
        .split_once(',')
        .ok_or(ConversionError::MissingSeparator)?;
    if payload.is_empty() {
        return Err(ConversionError::EmptyPayload);
    }
    let mime_type = mime_from_header(header);
    ensure_image(mime_type)?;

    Ok(EncodedImage {
        mime_type: mime_type.to_string(),
        base64_payload: payload.to_string(),
    })
}

/// Decode a data URL into its binary payload.
pub fn decode(encoded: &str) -> Result<BinaryPayload, ConversionError> {
    let (header, payload) = encoded
        .split_once(',')
        .ok_or(ConversionError::MissingSeparator)?;
    decode_parts(mime_from_header(header), payload)
}

/// Decode an already-split MIME type and base64 payload.
pub(crate) fn decode_parts(mime_type: &str, payload: &str) -> Result<BinaryPayload, ConversionError> {
    if payload.is_empty() {
        return Err(ConversionError::EmptyPayload);
    }
    ensure_image(mime_type)?;
    let bytes = BASE64.decode(payload)?;
    Ok(BinaryPayload::new(mime_type, bytes)?)
}

fn ensure_image(mime_type: &str) -> Result<(), ConversionError> {
    if mime_type.starts_with("image/") {
        Ok(())
    } else {
        Err(ConversionError::NotAnImage {
            mime_type: mime_type.to_string(),
        })
    }
}

/// Text between `:` and `;`. Headers without both fall back to the default.
fn mime_from_header(header: &str) -> &str {
    header
        .split_once(':')
        .and_then(|(_, rest)| rest.split_once(';'))
        .map(|(mime, _)| mime.trim())
        .filter(|m| !m.is_empty())
        .unwrap_or(DEFAULT_MIME_TYPE)
}
