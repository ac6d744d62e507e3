//! Pipeline stage definitions
//!
//! The pipeline walks these stages strictly in order. Each stage owns one output artifact;
//! the next stage reads only that artifact.

use std::fmt;

/// A phase of the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Stage {
    /// Download the listing page to `listing.html`
    FetchListing,

    /// Parse `listing.html` into `detail_urls.json`
    ExtractDetailUrls,

    /// Fetch every detail page and write `image_urls.json`
    ExtractImageUrls,

    /// Download every image and write `image_ids.json`
    DownloadImages,

    /// Nothing left to do
    Done,
}

impl Stage {
    /// Returns the stage that follows this one
    pub fn next(&self) -> Self {
        match self {
            Self::FetchListing => Self::ExtractDetailUrls,
            Self::ExtractDetailUrls => Self::ExtractImageUrls,
            Self::ExtractImageUrls => Self::DownloadImages,
            Self::DownloadImages | Self::Done => Self::Done,
        }
    }

    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done)
    }

    /// Short machine-friendly name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FetchListing => "fetch_listing",
            Self::ExtractDetailUrls => "extract_detail_urls",
            Self::ExtractImageUrls => "extract_image_urls",
            Self::DownloadImages => "download_images",
            Self::Done => "done",
        }
    }

    /// Returns the working stages in execution order
    pub fn all_stages() -> [Self; 4] {
        [
            Self::FetchListing,
            Self::ExtractDetailUrls,
            Self::ExtractImageUrls,
            Self::DownloadImages,
        ]
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
