//! chara-scrape: a polite character image harvester
//!
//! This crate crawls a character-listing wiki page, follows each character's detail page,
//! collects the image references found under a fixed set of section headings and downloads
//! them into a deterministic, numbered layout. Every stage persists its output so that an
//! interrupted run can be resumed from the last completed stage.

pub mod config;
pub mod crawler;
pub mod output;
pub mod pipeline;
pub mod storage;

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for chara-scrape operations
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Network error for {url}: {source}")]
    Network { url: String, source: reqwest::Error },

    #[error("Unexpected HTTP status {status} for {url}")]
    UnexpectedStatus { url: String, status: u16 },

    #[error("Invalid URL {url}: {source}")]
    InvalidUrl {
        url: String,
        source: ::url::ParseError,
    },

    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("Failed to persist {}: {source}", path.display())]
    Persistence {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to serialize {}: {source}", path.display())]
    Serialization {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Missing input artifact {}", .0.display())]
    MissingArtifact(PathBuf),

    #[error("Stage {stage} failed after {completed}/{total} items: {source}")]
    StageFailed {
        stage: pipeline::Stage,
        completed: usize,
        total: usize,
        source: Box<ScrapeError>,
    },
}

impl ScrapeError {
    /// Builds a persistence error for the given path
    pub fn persistence(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Persistence {
            path: path.into(),
            source,
        }
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid selector `{selector}`: {message}")]
    InvalidSelector { selector: String, message: String },
}

/// Result type alias for chara-scrape operations
pub type Result<T> = std::result::Result<T, ScrapeError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use pipeline::{Pipeline, RunSummary, Stage};
pub use storage::{CharacterMap, DetailUrlMap, ImageIdMap, ImageUrlMap};
