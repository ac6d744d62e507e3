//! Crawler module for fetching and parsing wiki pages
//!
//! This module contains the network-facing and parsing components of the pipeline:
//! - Global request pacing
//! - HTTP fetching of pages and image payloads
//! - Listing page and detail page extraction
//! - Image download and persistence

mod detail;
mod downloader;
mod fetcher;
mod listing;
mod rate_limiter;

pub use detail::{DetailExtraction, DetailExtractor, SectionContainer};
pub use downloader::{extension_for, is_image_content_type, DownloadOutcome, ImageDownloader};
pub use fetcher::{build_http_client, resolve_url, FetchedPage, FetchedPayload, PageFetcher};
pub use listing::{ListingExtraction, ListingExtractor};
pub use rate_limiter::RateLimiter;
