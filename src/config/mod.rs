//! Configuration module for chara-scrape
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every section is optional; missing values fall back to defaults that target the
//! original character wiki.
//!
//! # Example
//!
//! ```no_run
//! use chara_scrape::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("chara-scrape.toml")).unwrap();
//! println!("Images go to: {}", config.output.output_dir.display());
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, OutputConfig, ScraperConfig, SelectorConfig, UserAgentConfig, DEFAULT_IMAGE_BASE_URL,
    DEFAULT_LISTING_URL,
};

// Re-export parser functions
pub use parser::{
    compute_config_hash, load_config, load_config_with_hash, load_raw_config_with_hash,
    parse_config, parse_raw_config,
};
pub use validation::{parse_selector, validate, MIN_GET_INTERVAL_MS};
