//! Storage module for persisting pipeline artifacts
//!
//! This module handles everything that touches durable state between stages:
//! - The ordered `CharacterMap` shared by all JSON artifacts
//! - Reading, writing and clearing artifacts in the temp and output directories

mod artifacts;
mod character_map;

pub use artifacts::{
    ArtifactStore, DETAIL_URLS_FILE, IMAGE_IDS_FILE, IMAGE_URLS_FILE, LISTING_PAGE_FILE,
};
pub use character_map::{CharacterMap, DetailUrlMap, ImageIdMap, ImageUrlMap};

pub(crate) use artifacts::sibling_with_suffix;
