//! Character table parsing
//!
//! The listing page holds one sortable table with a header row followed by one row per
//! character. The first anchor of each row links to the character's detail page; its
//! `title` attribute is the character name.

use crate::config::parse_selector;
use crate::pipeline::{Skip, SkipReason};
use crate::storage::DetailUrlMap;
use crate::ConfigError;
use scraper::{Html, Selector};

/// Result of parsing the listing page
#[derive(Debug, Clone, Default)]
pub struct ListingExtraction {
    /// Character name → detail-page href, in row order
    pub detail_urls: DetailUrlMap,

    /// Number of data rows examined (header excluded)
    pub rows_seen: usize,

    /// Rows that did not yield an entry, or replaced an earlier one
    pub skips: Vec<Skip>,
}

/// Extracts the detail URL map from the listing page
#[derive(Debug, Clone)]
pub struct ListingExtractor {
    table: Selector,
    row: Selector,
    anchor: Selector,
}

impl ListingExtractor {
    /// Creates an extractor for the table matched by `table_selector`
    pub fn new(table_selector: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            table: parse_selector(table_selector)?,
            row: parse_selector("tr")?,
            anchor: parse_selector("a")?,
        })
    }

    /// Parses the listing HTML
    ///
    /// Never fails: a missing table, anchor or attribute is recorded as a skip and the row
    /// is left out.
    pub fn extract(&self, html: &str) -> ListingExtraction {
        let document = Html::parse_document(html);
        let mut extraction = ListingExtraction::default();

        let Some(table) = document.select(&self.table).next() else {
            extraction.skips.push(Skip::new(
                "listing table",
                SkipReason::MalformedPage("character table not found".to_string()),
            ));
            return extraction;
        };

        // First row is the header
        for (index, row) in table.select(&self.row).skip(1).enumerate() {
            extraction.rows_seen += 1;
            let item = format!("row {}", index + 1);

            let Some(anchor) = row.select(&self.anchor).next() else {
                extraction.skips.push(Skip::new(
                    item,
                    SkipReason::MalformedPage("row has no anchor".to_string()),
                ));
                continue;
            };

            let (Some(name), Some(href)) = (anchor.value().attr("title"), anchor.value().attr("href"))
            else {
                extraction.skips.push(Skip::new(
                    item,
                    SkipReason::MalformedPage("anchor lacks title or href".to_string()),
                ));
                continue;
            };

            if let Some(previous) = extraction
                .detail_urls
                .insert(name.to_string(), href.to_string())
            {
                extraction.skips.push(Skip::new(
                    item,
                    SkipReason::DuplicateName {
                        name: name.to_string(),
                        replaced: previous,
                    },
                ));
            }
        }

        extraction
    }
}
