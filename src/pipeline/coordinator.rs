//! Pipeline coordinator - main orchestration logic
//!
//! This module drives the four stages in order:
//! - Fetching the listing page
//! - Extracting detail-page URLs from it
//! - Fetching every detail page and extracting image URLs
//! - Downloading every image under a generated identifier
//!
//! Every stage reads its input from the artifact written by the previous stage, never
//! from memory. A fresh process can therefore pick up at the first stage whose artifact
//! is missing.

use crate::config::Config;
use crate::crawler::{
    build_http_client, resolve_url, DetailExtractor, DownloadOutcome, ImageDownloader,
    ListingExtractor, PageFetcher, RateLimiter,
};
use crate::pipeline::identifiers::assign_identifiers;
use crate::pipeline::progress::stage_bar;
use crate::pipeline::{RunSummary, Skip, SkipReason, Stage, StageReport};
use crate::storage::{ArtifactStore, ImageIdMap, ImageUrlMap};
use crate::{Result, ScrapeError};
use chrono::Utc;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Main pipeline structure
pub struct Pipeline {
    config: Arc<Config>,
    store: ArtifactStore,
    fetcher: PageFetcher,
    listing: ListingExtractor,
    detail: DetailExtractor,
    downloader: ImageDownloader,
    fresh: bool,
    show_progress: bool,
}

impl Pipeline {
    /// Creates a pipeline paced by the configured request interval
    pub fn new(config: Config) -> Result<Self> {
        let limiter = Arc::new(RateLimiter::new(Duration::from_millis(
            config.scraper.get_interval,
        )));
        Self::with_rate_limiter(config, limiter)
    }

    /// Creates a pipeline that shares the given rate limiter
    pub fn with_rate_limiter(config: Config, limiter: Arc<RateLimiter>) -> Result<Self> {
        let client = build_http_client(&config.user_agent, &config.scraper)?;
        let fetcher = PageFetcher::new(client, limiter);

        let listing = ListingExtractor::new(&config.selectors.listing_table)?;
        let detail = DetailExtractor::new(&config.selectors, &config.scraper.image_base_url)?;
        let downloader = ImageDownloader::new(fetcher.clone(), &config.output.output_dir);
        let store = ArtifactStore::new(&config.output.temp_dir, &config.output.output_dir);

        Ok(Self {
            config: Arc::new(config),
            store,
            fetcher,
            listing,
            detail,
            downloader,
            fresh: false,
            show_progress: true,
        })
    }

    /// Ignore existing artifacts and downloaded files
    pub fn fresh(mut self, fresh: bool) -> Self {
        self.fresh = fresh;
        self
    }

    /// Draw progress bars for the looping stages
    pub fn show_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    /// Returns the first stage whose output artifact is missing or malformed
    pub async fn resume_point(&self) -> Result<Stage> {
        if self.store.load_image_ids().await?.is_some() {
            return Ok(Stage::Done);
        }
        if self.store.load_image_urls().await?.is_some() {
            return Ok(Stage::DownloadImages);
        }
        if self.store.load_detail_urls().await?.is_some() {
            return Ok(Stage::ExtractImageUrls);
        }
        if self.store.load_listing_page().await?.is_some() {
            return Ok(Stage::ExtractDetailUrls);
        }
        Ok(Stage::FetchListing)
    }

    /// Runs the pipeline to completion
    ///
    /// Stages whose artifact already exists are skipped. The first failing stage halts the
    /// run with [`ScrapeError::StageFailed`]; artifacts written so far stay on disk.
    pub async fn run(&self) -> Result<RunSummary> {
        let started_at = Utc::now();
        self.store.ensure_dirs().await?;

        if self.fresh {
            tracing::info!("Starting fresh run (ignoring existing artifacts)");
            self.store.clear().await?;
        }

        let resumed_from = self.resume_point().await?;
        if resumed_from == Stage::FetchListing {
            tracing::info!("Starting run at {}", resumed_from);
        } else {
            tracing::info!("Resuming run at {}", resumed_from);
        }

        let mut reports = Vec::new();
        for stage in Stage::all_stages() {
            if stage < resumed_from {
                let report = StageReport::from_artifact(stage);
                report.log_summary();
                reports.push(report);
                continue;
            }

            tracing::info!("[{}] starting", stage);
            let report = self
                .run_stage(stage, resumed_from)
                .await
                .map_err(|e| {
                    let e = into_stage_failure(stage, e);
                    tracing::error!("{}", e);
                    e
                })?;
            report.log_summary();
            reports.push(report);
        }

        let images_saved = self
            .store
            .load_image_ids()
            .await?
            .map(|ids| ids.total_len())
            .unwrap_or(0);

        let temp_removed = if self.config.output.keep_temp {
            tracing::info!(
                "Keeping intermediate artifacts in {}",
                self.store.temp_dir().display()
            );
            false
        } else {
            tracing::info!("Removing {}", self.store.temp_dir().display());
            self.store.remove_temp_dir().await?;
            true
        };

        Ok(RunSummary {
            started_at,
            finished_at: Utc::now(),
            resumed_from,
            reports,
            images_saved,
            temp_removed,
        })
    }

    async fn run_stage(&self, stage: Stage, resumed_from: Stage) -> Result<StageReport> {
        match stage {
            Stage::FetchListing => self.fetch_listing().await,
            Stage::ExtractDetailUrls => self.extract_detail_urls().await,
            Stage::ExtractImageUrls => self.extract_image_urls().await,
            // Numbered files on disk only belong to this image list if the list came
            // from an earlier run of this same download stage.
            Stage::DownloadImages => {
                let reuse_existing = !self.fresh && resumed_from == Stage::DownloadImages;
                self.download_images(reuse_existing).await
            }
            Stage::Done => Ok(StageReport::new(Stage::Done)),
        }
    }

    /// FetchListing: listing URL → `listing.html`
    async fn fetch_listing(&self) -> Result<StageReport> {
        let mut report = StageReport::new(Stage::FetchListing);
        let url = &self.config.scraper.listing_url;

        let page = self.fetcher.fetch(url).await?;
        if !page.is_success() {
            return Err(ScrapeError::UnexpectedStatus {
                url: url.clone(),
                status: page.status,
            });
        }

        self.store
            .save_listing_page(&page.body)
            .await
            .map_err(|e| stage_failed(Stage::FetchListing, 0, 1, e))?;
        report.processed = 1;
        Ok(report)
    }

    /// ExtractDetailUrls: `listing.html` → `detail_urls.json`
    async fn extract_detail_urls(&self) -> Result<StageReport> {
        let mut report = StageReport::new(Stage::ExtractDetailUrls);

        let html = self
            .store
            .load_listing_page()
            .await?
            .ok_or_else(|| ScrapeError::MissingArtifact(self.store.listing_page_path()))?;

        let extraction = self.listing.extract(&html);
        report.processed = extraction.rows_seen;
        for skip in extraction.skips {
            report.skip(skip);
        }

        if extraction.detail_urls.is_empty() {
            tracing::warn!("Listing page yielded no characters");
        } else {
            tracing::info!("Found {} characters", extraction.detail_urls.len());
        }

        let rows = extraction.rows_seen;
        self.store
            .save_detail_urls(&extraction.detail_urls)
            .await
            .map_err(|e| stage_failed(Stage::ExtractDetailUrls, rows, rows, e))?;
        Ok(report)
    }

    /// ExtractImageUrls: `detail_urls.json` → one detail page per character → `image_urls.json`
    async fn extract_image_urls(&self) -> Result<StageReport> {
        let stage = Stage::ExtractImageUrls;
        let mut report = StageReport::new(stage);

        let detail_urls = self
            .store
            .load_detail_urls()
            .await?
            .ok_or_else(|| ScrapeError::MissingArtifact(self.store.detail_urls_path()))?;

        let total = detail_urls.len();
        let bar = stage_bar(self.show_progress, total, "detail pages");
        let mut image_urls = ImageUrlMap::new();

        for (index, (name, href)) in detail_urls.iter().enumerate() {
            bar.set_message(name.to_string());

            let urls = match resolve_url(&self.config.scraper.listing_url, href) {
                Ok(url) => {
                    let page = self
                        .fetcher
                        .fetch(url.as_str())
                        .await
                        .map_err(|e| stage_failed(stage, index, total, e))?;

                    if page.is_success() {
                        let extraction = self.detail.extract(&page.body);
                        for skip in extraction.skips {
                            report.skip(Skip::new(format!("{}: {}", name, skip.item), skip.reason));
                        }
                        extraction.image_urls
                    } else {
                        report.skip(Skip::new(name, SkipReason::HttpStatus(page.status)));
                        Vec::new()
                    }
                }
                Err(e) => {
                    report.skip(Skip::new(name, SkipReason::MalformedPage(e.to_string())));
                    Vec::new()
                }
            };

            tracing::debug!("{}: {} image(s)", name, urls.len());
            image_urls.insert(name, urls);
            report.processed += 1;
            bar.inc(1);
        }

        bar.finish_and_clear();
        tracing::info!(
            "Collected {} image URL(s) for {} character(s)",
            image_urls.total_len(),
            image_urls.len()
        );

        self.store
            .save_image_urls(&image_urls)
            .await
            .map_err(|e| stage_failed(stage, total, total, e))?;
        Ok(report)
    }

    /// DownloadImages: `image_urls.json` → `<id>.<ext>` files → `image_ids.json`
    async fn download_images(&self, reuse_existing: bool) -> Result<StageReport> {
        let stage = Stage::DownloadImages;
        let mut report = StageReport::new(stage);

        let image_urls = self
            .store
            .load_image_urls()
            .await?
            .ok_or_else(|| ScrapeError::MissingArtifact(self.store.image_urls_path()))?;

        let existing: HashMap<String, PathBuf> = if reuse_existing {
            self.downloader.existing_files().await?
        } else {
            HashMap::new()
        };

        let total = image_urls.total_len();
        let bar = stage_bar(self.show_progress, total, "images");
        let mut image_ids = ImageIdMap::new();
        let mut completed = 0usize;

        for (name, slots) in assign_identifiers(&image_urls) {
            bar.set_message(name.clone());
            let mut ids = Vec::with_capacity(slots.len());

            for slot in slots {
                if let Some(path) = existing.get(&slot.file_id) {
                    tracing::debug!("Reusing {} for {}", path.display(), slot.url);
                    report.reused += 1;
                    ids.push(slot.file_id);
                } else {
                    let outcome = self
                        .downloader
                        .download(&slot.url, &slot.file_id)
                        .await
                        .map_err(|e| stage_failed(stage, completed, total, e))?;

                    match outcome {
                        DownloadOutcome::Saved { .. } => ids.push(slot.file_id),
                        DownloadOutcome::Skipped(reason) => {
                            report.skip(Skip::new(format!("{}: {}", name, slot.url), reason))
                        }
                    }
                }

                completed += 1;
                report.processed += 1;
                bar.inc(1);
            }

            image_ids.insert(name, ids);
        }

        bar.finish_and_clear();
        self.store
            .save_image_ids(&image_ids)
            .await
            .map_err(|e| stage_failed(stage, completed, total, e))?;
        Ok(report)
    }
}

fn stage_failed(stage: Stage, completed: usize, total: usize, source: ScrapeError) -> ScrapeError {
    ScrapeError::StageFailed {
        stage,
        completed,
        total,
        source: Box::new(source),
    }
}

/// Attaches the stage to errors raised outside an item loop
fn into_stage_failure(stage: Stage, error: ScrapeError) -> ScrapeError {
    match error {
        failed @ ScrapeError::StageFailed { .. } => failed,
        other => stage_failed(stage, 0, 0, other),
    }
}
