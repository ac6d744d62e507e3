//! Image download and persistence
//!
//! Each image is fetched, checked against its declared content type, fully decoded to
//! learn its real format and then written under a pre-assigned identifier. The extension
//! comes from the decoded format, never from the URL.

use crate::crawler::PageFetcher;
use crate::pipeline::SkipReason;
use crate::storage::sibling_with_suffix;
use crate::{Result, ScrapeError};
use image::ImageFormat;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Outcome of a single download
#[derive(Debug, Clone)]
pub enum DownloadOutcome {
    /// Image decoded and written to `path`
    Saved { path: PathBuf, format: ImageFormat },

    /// Nothing was written; the identifier slot stays empty
    Skipped(SkipReason),
}

/// Downloads images into the output directory
#[derive(Debug, Clone)]
pub struct ImageDownloader {
    fetcher: PageFetcher,
    output_dir: PathBuf,
}

impl ImageDownloader {
    pub fn new(fetcher: PageFetcher, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            fetcher,
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Fetches `url` and stores it as `<file_id>.<ext>`
    ///
    /// Network and write failures are errors. A non-success status, a non-image content
    /// type or an undecodable body is a skip.
    pub async fn download(&self, url: &str, file_id: &str) -> Result<DownloadOutcome> {
        let payload = self.fetcher.fetch_bytes(url).await?;

        if !payload.is_success() {
            return Ok(DownloadOutcome::Skipped(SkipReason::HttpStatus(
                payload.status,
            )));
        }

        if !is_image_content_type(&payload.content_type) {
            return Ok(DownloadOutcome::Skipped(SkipReason::NonImageContent {
                content_type: payload.content_type,
            }));
        }

        let format = match decode_format(&payload.bytes) {
            Ok(format) => format,
            Err(e) => {
                return Ok(DownloadOutcome::Skipped(SkipReason::UndecodableImage(
                    e.to_string(),
                )))
            }
        };

        let path = self
            .output_dir
            .join(format!("{}.{}", file_id, extension_for(format)));
        write_image(&path, &payload.bytes).await?;

        tracing::debug!("Saved {} as {}", url, path.display());
        Ok(DownloadOutcome::Saved { path, format })
    }

    /// Lists images an earlier attempt already saved, keyed by identifier
    ///
    /// Only files named `<digits>.<ext>` count; `.part` leftovers and artifacts are ignored.
    pub async fn existing_files(&self) -> Result<HashMap<String, PathBuf>> {
        let mut files = HashMap::new();

        let mut entries = match tokio::fs::read_dir(&self.output_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(files),
            Err(e) => return Err(ScrapeError::persistence(&self.output_dir, e)),
        };

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| ScrapeError::persistence(&self.output_dir, e))?
        {
            let path = entry.path();
            if let Some(id) = saved_image_id(&path) {
                files.insert(id, path);
            }
        }

        Ok(files)
    }
}

/// Whether a declared content type announces an image
pub fn is_image_content_type(content_type: &str) -> bool {
    content_type.to_ascii_lowercase().contains("image")
}

/// Detects the format from magic bytes and decodes the whole image
fn decode_format(bytes: &[u8]) -> image::ImageResult<ImageFormat> {
    let format = image::guess_format(bytes)?;
    image::load_from_memory_with_format(bytes, format)?;
    Ok(format)
}

/// File extension for a decoded format
///
/// The lowercased format name is used, so JPEG and TIFF become `jpeg` and `tiff`. Formats
/// without a well-known name fall back to their primary extension.
pub fn extension_for(format: ImageFormat) -> &'static str {
    match format {
        ImageFormat::Png => "png",
        ImageFormat::Jpeg => "jpeg",
        ImageFormat::Gif => "gif",
        ImageFormat::WebP => "webp",
        ImageFormat::Tiff => "tiff",
        ImageFormat::Bmp => "bmp",
        ImageFormat::Ico => "ico",
        other => other.extensions_str().first().copied().unwrap_or("img"),
    }
}

/// Writes through a `.part` file so an interrupted write never looks like a saved image
async fn write_image(path: &Path, bytes: &[u8]) -> Result<()> {
    let part_path = sibling_with_suffix(path, "part");

    if let Err(e) = tokio::fs::write(&part_path, bytes).await {
        tracing::debug!("Cleaning up partial file {}", part_path.display());
        let _ = tokio::fs::remove_file(&part_path).await;
        return Err(ScrapeError::persistence(part_path, e));
    }

    tokio::fs::rename(&part_path, path)
        .await
        .map_err(|e| ScrapeError::persistence(path, e))
}

/// `00042.png` → `Some("00042")`
fn saved_image_id(path: &Path) -> Option<String> {
    let extension = path.extension()?.to_str()?;
    if extension == "part" || extension == "tmp" || extension == "json" {
        return None;
    }

    let stem = path.file_stem()?.to_str()?;
    if !stem.is_empty() && stem.chars().all(|c| c.is_ascii_digit()) {
        Some(stem.to_string())
    } else {
        None
    }
}
