//! File-backed persistence for stage artifacts
//!
//! Intermediate artifacts live in the temp directory, the identifier map lives next to
//! the images in the output directory. Every write goes to a `.tmp` sibling first and is
//! renamed into place, so a reader never observes a half-written artifact.

use crate::storage::{DetailUrlMap, ImageIdMap, ImageUrlMap};
use crate::{Result, ScrapeError};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

pub const LISTING_PAGE_FILE: &str = "listing.html";
pub const DETAIL_URLS_FILE: &str = "detail_urls.json";
pub const IMAGE_URLS_FILE: &str = "image_urls.json";
pub const IMAGE_IDS_FILE: &str = "image_ids.json";

/// Reads and writes the artifacts of a pipeline run
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    temp_dir: PathBuf,
    output_dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(temp_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            temp_dir: temp_dir.into(),
            output_dir: output_dir.into(),
        }
    }

    pub fn temp_dir(&self) -> &Path {
        &self.temp_dir
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn listing_page_path(&self) -> PathBuf {
        self.temp_dir.join(LISTING_PAGE_FILE)
    }

    pub fn detail_urls_path(&self) -> PathBuf {
        self.temp_dir.join(DETAIL_URLS_FILE)
    }

    pub fn image_urls_path(&self) -> PathBuf {
        self.temp_dir.join(IMAGE_URLS_FILE)
    }

    pub fn image_ids_path(&self) -> PathBuf {
        self.output_dir.join(IMAGE_IDS_FILE)
    }

    /// Creates the temp and output directories if they are missing
    pub async fn ensure_dirs(&self) -> Result<()> {
        for dir in [&self.temp_dir, &self.output_dir] {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|e| ScrapeError::persistence(dir, e))?;
        }
        Ok(())
    }

    pub async fn save_listing_page(&self, html: &str) -> Result<()> {
        write_atomic(&self.listing_page_path(), html.as_bytes()).await
    }

    /// Loads the saved listing page, treating an empty file as absent
    pub async fn load_listing_page(&self) -> Result<Option<String>> {
        let path = self.listing_page_path();
        match tokio::fs::read_to_string(&path).await {
            Ok(html) if html.trim().is_empty() => {
                tracing::warn!("Ignoring empty listing page at {}", path.display());
                Ok(None)
            }
            Ok(html) => Ok(Some(html)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(ScrapeError::persistence(path, e)),
        }
    }

    pub async fn save_detail_urls(&self, map: &DetailUrlMap) -> Result<()> {
        save_json(&self.detail_urls_path(), map).await
    }

    pub async fn load_detail_urls(&self) -> Result<Option<DetailUrlMap>> {
        load_json(&self.detail_urls_path()).await
    }

    pub async fn save_image_urls(&self, map: &ImageUrlMap) -> Result<()> {
        save_json(&self.image_urls_path(), map).await
    }

    pub async fn load_image_urls(&self) -> Result<Option<ImageUrlMap>> {
        load_json(&self.image_urls_path()).await
    }

    pub async fn save_image_ids(&self, map: &ImageIdMap) -> Result<()> {
        save_json(&self.image_ids_path(), map).await
    }

    pub async fn load_image_ids(&self) -> Result<Option<ImageIdMap>> {
        load_json(&self.image_ids_path()).await
    }

    /// Removes every artifact so the next run starts from the listing page
    ///
    /// Downloaded images are left in place.
    pub async fn clear(&self) -> Result<()> {
        for path in [
            self.listing_page_path(),
            self.detail_urls_path(),
            self.image_urls_path(),
            self.image_ids_path(),
        ] {
            match tokio::fs::remove_file(&path).await {
                Ok(()) => tracing::debug!("Removed {}", path.display()),
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(ScrapeError::persistence(path, e)),
            }
        }
        Ok(())
    }

    /// Deletes the temp directory and everything in it
    pub async fn remove_temp_dir(&self) -> Result<()> {
        match tokio::fs::remove_dir_all(&self.temp_dir).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ScrapeError::persistence(&self.temp_dir, e)),
        }
    }
}

/// Serializes a value as pretty JSON (2-space indent, non-ASCII kept as is)
async fn save_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).map_err(|e| ScrapeError::Serialization {
        path: path.to_path_buf(),
        source: e,
    })?;
    write_atomic(path, json.as_bytes()).await
}

/// Loads a JSON artifact
///
/// A missing file yields `None`. So does a file that does not parse: it is logged and the
/// stage that produces it runs again.
async fn load_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    let content = match tokio::fs::read(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(ScrapeError::persistence(path, e)),
    };

    match serde_json::from_slice(&content) {
        Ok(value) => Ok(Some(value)),
        Err(e) => {
            tracing::warn!("Ignoring malformed artifact {}: {}", path.display(), e);
            Ok(None)
        }
    }
}

/// Writes bytes to a sibling `.tmp` file, then renames it over the target
pub(crate) async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let tmp_path = sibling_with_suffix(path, "tmp");

    if let Err(e) = tokio::fs::write(&tmp_path, bytes).await {
        let _ = tokio::fs::remove_file(&tmp_path).await;
        return Err(ScrapeError::persistence(&tmp_path, e));
    }

    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(|e| ScrapeError::persistence(path, e))
}

/// `dir/name.ext` → `dir/name.ext.<suffix>`
pub(crate) fn sibling_with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".");
    name.push(suffix);
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store(root: &TempDir) -> ArtifactStore {
        ArtifactStore::new(root.path().join("temp"), root.path().join("data"))
    }

    #[tokio::test]
    async fn test_missing_artifacts_load_as_none() {
        let root = TempDir::new().unwrap();
        let store = store(&root);
        store.ensure_dirs().await.unwrap();

        assert!(store.load_listing_page().await.unwrap().is_none());
        assert!(store.load_detail_urls().await.unwrap().is_none());
        assert!(store.load_image_urls().await.unwrap().is_none());
        assert!(store.load_image_ids().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_detail_urls_written_as_pretty_json() {
        let root = TempDir::new().unwrap();
        let store = store(&root);
        store.ensure_dirs().await.unwrap();

        let mut map = DetailUrlMap::new();
        map.insert("カタリナ", "/katalina.html".to_string());
        store.save_detail_urls(&map).await.unwrap();

        let raw = std::fs::read_to_string(store.detail_urls_path()).unwrap();
        assert_eq!(raw, "{\n  \"カタリナ\": \"/katalina.html\"\n}");
        assert_eq!(store.load_detail_urls().await.unwrap(), Some(map));
        assert!(!sibling_with_suffix(&store.detail_urls_path(), "tmp").exists());
    }

    #[tokio::test]
    async fn test_malformed_artifact_is_ignored() {
        let root = TempDir::new().unwrap();
        let store = store(&root);
        store.ensure_dirs().await.unwrap();

        std::fs::write(store.image_urls_path(), "{\"Alpha\": [").unwrap();
        assert!(store.load_image_urls().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_clear_and_remove_temp_dir() {
        let root = TempDir::new().unwrap();
        let store = store(&root);
        store.ensure_dirs().await.unwrap();

        store.save_listing_page("<html></html>").await.unwrap();
        store.save_image_ids(&ImageIdMap::new()).await.unwrap();
        store.clear().await.unwrap();
        assert!(!store.listing_page_path().exists());
        assert!(!store.image_ids_path().exists());

        store.remove_temp_dir().await.unwrap();
        assert!(!store.temp_dir().exists());
        assert!(store.output_dir().exists());
        // Removing twice is fine
        store.remove_temp_dir().await.unwrap();
    }

    #[test]
    fn test_sibling_with_suffix() {
        let path = Path::new("/tmp/out/00.png");
        assert_eq!(
            sibling_with_suffix(path, "part"),
            PathBuf::from("/tmp/out/00.png.part")
        );
    }
}
