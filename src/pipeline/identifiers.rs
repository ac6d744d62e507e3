//! File identifier assignment
//!
//! Identifiers come from one counter running over the flattened `image_urls.json`
//! sequence, zero-padded to one digit more than the total count needs. They depend only
//! on that artifact, so a retried download lands on the same file name.

use crate::storage::ImageUrlMap;

/// Width of an identifier for `total` images
pub fn identifier_width(total: usize) -> usize {
    total.to_string().len() + 1
}

/// Formats slot `index` at the given width
pub fn format_identifier(index: usize, width: usize) -> String {
    format!("{:0width$}", index, width = width)
}

/// One image to download
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageSlot {
    pub file_id: String,
    pub url: String,
}

/// Assigns an identifier to every URL, keeping the map's order
///
/// Returns `(character name, slots)` pairs in the same order as `image_urls`.
pub fn assign_identifiers(image_urls: &ImageUrlMap) -> Vec<(String, Vec<ImageSlot>)> {
    let width = identifier_width(image_urls.total_len());
    let mut counter = 0usize;

    image_urls
        .iter()
        .map(|(name, urls)| {
            let slots = urls
                .iter()
                .map(|url| {
                    let slot = ImageSlot {
                        file_id: format_identifier(counter, width),
                        url: url.clone(),
                    };
                    counter += 1;
                    slot
                })
                .collect();
            (name.to_string(), slots)
        })
        .collect()
}
