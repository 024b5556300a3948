//! Storage key generation.
//!
//! Key format: `{owner_id}/{prefix}/{epoch_millis}_{sequence}_{random}.{ext}`.
//! The timestamp, batch position and random suffix together keep keys unique
//! across batches, within a batch, and across devices of the same owner.

use rand::distributions::Alphanumeric;
use rand::Rng;
use std::time::{SystemTime, UNIX_EPOCH};

const SUFFIX_LEN: usize = 6;

/// File extension for a MIME type.
pub fn extension_for(mime_type: &str) -> &'static str {
    match mime_type {
        "image/png" => "png",
        "image/webp" => "webp",
        "image/gif" => "gif",
        _ => "jpg",
    }
}

/// Generate a fresh key for the image at `sequence` (0-based) in its batch.
pub fn generate(owner_id: &str, prefix: &str, sequence: usize, mime_type: &str) -> String {
    compose(
        owner_id,
        prefix,
        epoch_millis(),
        sequence,
        &random_suffix(),
        mime_type,
    )
}

/// Assemble a key from its parts.
///
/// Slashes around the owner and prefix are trimmed and empty segments are
/// skipped, so keys never start with `/` or contain `//`.
pub fn compose(
    owner_id: &str,
    prefix: &str,
    epoch_millis: u128,
    sequence: usize,
    suffix: &str,
    mime_type: &str,
) -> String {
    let file_name = format!(
        "{epoch_millis}_{sequence}_{suffix}.{}",
        extension_for(mime_type)
    );
    [owner_id.trim_matches('/'), prefix.trim_matches('/')]
        .into_iter()
        .filter(|segment| !segment.is_empty())
        .chain(std::iter::once(file_name.as_str()))
        .collect::<Vec<_>>()
        .join("/")
}

fn epoch_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default()
}

fn random_suffix() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SUFFIX_LEN)
        .map(|b| char::from(b).to_ascii_lowercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_for() {
        assert_eq!(extension_for("image/png"), "png");
        assert_eq!(extension_for("image/webp"), "webp");
        assert_eq!(extension_for("image/gif"), "gif");
        assert_eq!(extension_for("image/jpeg"), "jpg");
        assert_eq!(extension_for("image/heic"), "jpg");
    }

    #[test]
    fn test_compose() {
        assert_eq!(
            compose("user-1", "moments", 1_700_000_000_000, 2, "a1b2c3", "image/png"),
            "user-1/moments/1700000000000_2_a1b2c3.png"
        );
    }

    #[test]
    fn test_compose_trims_and_skips_empty_segments() {
        assert_eq!(
            compose("/user-1/", "", 5, 0, "zzzzzz", "image/jpeg"),
            "user-1/5_0_zzzzzz.jpg"
        );
        assert_eq!(
            compose("u", "/listings/itinerary/", 5, 1, "abcdef", "image/jpeg"),
            "u/listings/itinerary/5_1_abcdef.jpg"
        );
    }

    #[test]
    fn test_generate_shape() {
        let key = generate("user-1", "highlights", 4, "image/webp");
        let parts: Vec<&str> = key.split('/').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "user-1");
        assert_eq!(parts[1], "highlights");

        let file = parts[2].strip_suffix(".webp").unwrap();
        let fields: Vec<&str> = file.split('_').collect();
        assert_eq!(fields.len(), 3);
        assert!(fields[0].parse::<u128>().unwrap() > 0);
        assert_eq!(fields[1], "4");
        assert_eq!(fields[2].len(), SUFFIX_LEN);
        assert!(fields[2]
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
    }

    #[test]
    fn test_generate_is_unique() {
        let a = generate("u", "p", 0, "image/jpeg");
        let b = generate("u", "p", 0, "image/jpeg");
        assert_ne!(a, b);
    }
}
