//! CLI enum types for the upload command: upload site and output format.

use clap::ValueEnum;
use pinup_core::UploadSite;

/// Where in the app the images are being uploaded for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Site {
    /// Listing photos
    Listing,
    /// Itinerary item photos inside a listing
    Itinerary,
    /// Highlight photos
    Highlight,
    /// Moment photos
    Moment,
    /// Photos on the listing details page
    ListingDetails,
}

impl From<Site> for UploadSite {
    fn from(site: Site) -> Self {
        match site {
            Site::Listing => UploadSite::Listing,
            Site::Itinerary => UploadSite::Itinerary,
            Site::Highlight => UploadSite::Highlight,
            Site::Moment => UploadSite::Moment,
            Site::ListingDetails => UploadSite::ListingDetails,
        }
    }
}

/// Supported output formats.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    /// One URL per line (default)
    #[default]
    Text,
    /// A single JSON object
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}
