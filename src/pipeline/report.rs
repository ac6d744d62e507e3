//! Per-stage diagnostics
//!
//! Items that are dropped without aborting the run are recorded here so that the
//! operator can see exactly what a scraped dataset is missing.

use crate::pipeline::Stage;
use chrono::{DateTime, Utc};
use std::fmt;

/// Why an item produced no output
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// An expected structural element (table, row anchor, section block) is absent
    MalformedPage(String),

    /// The declared content type of a download is not an image
    NonImageContent { content_type: String },

    /// The payload claimed to be an image but could not be decoded
    UndecodableImage(String),

    /// The server answered with a non-success status
    HttpStatus(u16),

    /// A character name appeared twice in the listing; the later row won
    DuplicateName { name: String, replaced: String },
}

impl SkipReason {
    /// Short label used when grouping skips
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MalformedPage(_) => "malformed_page",
            Self::NonImageContent { .. } => "non_image_content",
            Self::UndecodableImage(_) => "undecodable_image",
            Self::HttpStatus(_) => "http_status",
            Self::DuplicateName { .. } => "duplicate_name",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedPage(detail) => write!(f, "malformed page: {}", detail),
            Self::NonImageContent { content_type } => {
                write!(f, "not an image (content-type: {:?})", content_type)
            }
            Self::UndecodableImage(detail) => write!(f, "undecodable image: {}", detail),
            Self::HttpStatus(status) => write!(f, "HTTP status {}", status),
            Self::DuplicateName { name, replaced } => {
                write!(f, "duplicate name {:?} (replaced {})", name, replaced)
            }
        }
    }
}

/// One dropped item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Skip {
    /// What was skipped: a row, a section, a character or an image URL
    pub item: String,
    pub reason: SkipReason,
}

impl Skip {
    pub fn new(item: impl Into<String>, reason: SkipReason) -> Self {
        Self {
            item: item.into(),
            reason,
        }
    }
}

/// Outcome of one stage
#[derive(Debug, Clone)]
pub struct StageReport {
    pub stage: Stage,

    /// Items the stage worked through
    pub processed: usize,

    /// Items satisfied by output from an earlier attempt
    pub reused: usize,

    /// Items that produced nothing
    pub skips: Vec<Skip>,

    /// The stage did not run because its artifact already existed
    pub from_artifact: bool,
}

impl StageReport {
    pub fn new(stage: Stage) -> Self {
        Self {
            stage,
            processed: 0,
            reused: 0,
            skips: Vec::new(),
            from_artifact: false,
        }
    }

    /// Report for a stage whose artifact was already present
    pub fn from_artifact(stage: Stage) -> Self {
        Self {
            from_artifact: true,
            ..Self::new(stage)
        }
    }

    /// Records a skip and logs it
    pub fn skip(&mut self, skip: Skip) {
        tracing::debug!("[{}] skipped {}: {}", self.stage, skip.item, skip.reason);
        self.skips.push(skip);
    }

    /// Number of skips of the given kind
    pub fn count_kind(&self, kind: &str) -> usize {
        self.skips.iter().filter(|s| s.reason.kind() == kind).count()
    }

    /// Logs a one-line summary, warning when anything was skipped
    pub fn log_summary(&self) {
        if self.from_artifact {
            tracing::info!("[{}] skipped, artifact already present", self.stage);
        } else if self.skips.is_empty() {
            tracing::info!(
                "[{}] done: {} processed, {} reused",
                self.stage,
                self.processed,
                self.reused
            );
        } else {
            tracing::warn!(
                "[{}] done: {} processed, {} reused, {} skipped",
                self.stage,
                self.processed,
                self.reused,
                self.skips.len()
            );
        }
    }
}

/// Outcome of a whole pipeline run
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,

    /// First stage that actually had work to do
    pub resumed_from: Stage,

    /// One report per working stage, in execution order
    pub reports: Vec<StageReport>,

    /// Images written or reused in the download stage
    pub images_saved: usize,

    /// Whether the temp directory was deleted at the end
    pub temp_removed: bool,
}

impl RunSummary {
    pub fn report(&self, stage: Stage) -> Option<&StageReport> {
        self.reports.iter().find(|r| r.stage == stage)
    }

    pub fn total_skips(&self) -> usize {
        self.reports.iter().map(|r| r.skips.len()).sum()
    }
}
