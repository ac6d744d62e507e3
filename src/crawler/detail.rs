//! Detail page parsing
//!
//! A character page is a sequence of section headings and image blocks. The block that
//! follows a recognized heading holds that section's images; anchors inside it whose
//! `title` names an image resource are turned into attachment URLs.

use crate::config::{parse_selector, SelectorConfig};
use crate::pipeline::{Skip, SkipReason};
use crate::ConfigError;
use scraper::{ElementRef, Html, Selector};

/// The image container found under one recognized section heading
#[derive(Debug, Clone)]
pub struct SectionContainer<'a> {
    /// Marker the heading matched
    pub marker: &'a str,

    /// Block holding the images, `None` when the heading is the last selected block
    pub container: Option<ElementRef<'a>>,
}

/// Result of parsing one detail page
#[derive(Debug, Clone, Default)]
pub struct DetailExtraction {
    /// Absolute image URLs in document order, duplicates kept
    pub image_urls: Vec<String>,

    /// Number of recognized section headings
    pub sections_matched: usize,

    /// Headings that had no container after them
    pub skips: Vec<Skip>,
}

/// Extracts image URLs from a character's detail page
#[derive(Debug, Clone)]
pub struct DetailExtractor {
    blocks: Selector,
    titled_anchor: Selector,
    section_markers: Vec<String>,
    image_title_marker: String,
    image_base_url: String,
}

impl DetailExtractor {
    pub fn new(selectors: &SelectorConfig, image_base_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            blocks: parse_selector(&selectors.detail_blocks)?,
            titled_anchor: parse_selector("a[title]")?,
            section_markers: selectors.section_markers.clone(),
            image_title_marker: selectors.image_title_marker.clone(),
            image_base_url: image_base_url.to_string(),
        })
    }

    /// Returns the image containers scoped under each recognized section, in document order
    ///
    /// Headings and blocks are matched by the block selector. A heading is a block whose
    /// text contains one of the section markers; its container is the next selected block.
    /// A heading containing several markers yields one section per marker, in marker order,
    /// all sharing the same container.
    pub fn sections<'a>(&'a self, document: &'a Html) -> Vec<SectionContainer<'a>> {
        let blocks: Vec<ElementRef<'a>> = document.select(&self.blocks).collect();

        blocks
            .iter()
            .enumerate()
            .flat_map(|(index, block)| {
                let text: String = block.text().collect();
                let container = blocks.get(index + 1).copied();
                self.section_markers
                    .iter()
                    .filter(move |marker| text.contains(marker.as_str()))
                    .map(move |marker| SectionContainer {
                        marker: marker.as_str(),
                        container,
                    })
            })
            .collect()
    }

    /// Parses one detail page
    ///
    /// Never fails: a page without recognized headings yields no URLs, and a heading without
    /// a following block contributes nothing and is reported as a skip.
    pub fn extract(&self, html: &str) -> DetailExtraction {
        let document = Html::parse_document(html);
        let mut extraction = DetailExtraction::default();

        for section in self.sections(&document) {
            extraction.sections_matched += 1;

            let Some(container) = section.container else {
                extraction.skips.push(Skip::new(
                    section.marker,
                    SkipReason::MalformedPage("section heading has no image block".to_string()),
                ));
                continue;
            };

            extraction.image_urls.extend(self.image_urls_in(container));
        }

        extraction
    }

    fn image_urls_in<'a>(&'a self, container: ElementRef<'a>) -> impl Iterator<Item = String> + 'a {
        container
            .select(&self.titled_anchor)
            .filter_map(|anchor| anchor.value().attr("title"))
            .filter(|title| title.contains(self.image_title_marker.as_str()))
            .map(|title| format!("{}{}", self.image_base_url, title))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://wiki.example.com/attach?openfile=";

    fn extractor() -> DetailExtractor {
        let selectors = SelectorConfig {
            section_markers: vec![
                "Profile".to_string(),
                "Chibi Art".to_string(),
                "Extra Poses".to_string(),
            ],
            ..SelectorConfig::default()
        };
        DetailExtractor::new(&selectors, BASE).unwrap()
    }

    #[test]
    fn test_images_under_recognized_sections() {
        let html = r#"<html><body>
            <h3>Profile</h3>
            <div class="ie5">
              <a href="/a" title="alpha_full.png"><img src="x"></a>
              <a href="/b" title="alpha_notes.txt">notes</a>
              <a href="/c">untitled</a>
            </div>
            <h3>Trivia</h3>
            <div class="ie5"><a href="/d" title="ignored.png">no</a></div>
            <h3>Extra Poses</h3>
            <div class="img_margin"><a title="pose_1.png">1</a><a title="pose_2.png">2</a></div>
        </body></html>"#;

        let extraction = extractor().extract(html);

        assert_eq!(extraction.sections_matched, 2);
        assert_eq!(
            extraction.image_urls,
            vec![
                format!("{}alpha_full.png", BASE),
                format!("{}pose_1.png", BASE),
                format!("{}pose_2.png", BASE),
            ]
        );
        assert!(extraction.skips.is_empty());
    }

    #[test]
    fn test_no_recognized_heading_yields_empty() {
        let html = r#"<html><body>
            <h3>Trivia</h3>
            <div class="ie5"><a title="a.png">a</a></div>
        </body></html>"#;

        let extraction = extractor().extract(html);

        assert!(extraction.image_urls.is_empty());
        assert_eq!(extraction.sections_matched, 0);
        assert!(extraction.skips.is_empty());
    }

    #[test]
    fn test_heading_as_last_block_contributes_nothing() {
        let html = r#"<html><body>
            <h3>Profile</h3>
            <div class="ie5"><a title="one.png">1</a></div>
            <h3>Chibi Art</h3>
        </body></html>"#;

        let extraction = extractor().extract(html);

        assert_eq!(extraction.image_urls, vec![format!("{}one.png", BASE)]);
        assert_eq!(extraction.sections_matched, 2);
        assert_eq!(extraction.skips.len(), 1);
        assert_eq!(extraction.skips[0].item, "Chibi Art");
    }

    #[test]
    fn test_duplicates_are_preserved() {
        let html = r#"<html><body>
            <h3>Profile</h3>
            <div class="ie5"><a title="same.png">1</a><a title="same.png">2</a></div>
        </body></html>"#;

        let extraction = extractor().extract(html);
        assert_eq!(extraction.image_urls.len(), 2);
        assert_eq!(extraction.image_urls[0], extraction.image_urls[1]);
    }

    #[test]
    fn test_heading_matching_two_markers_counts_per_marker() {
        let html = r#"<html><body>
            <h3>Profile / Chibi Art</h3>
            <div class="ie5"><a title="x.png">x</a></div>
        </body></html>"#;

        let extraction = extractor().extract(html);
        assert_eq!(extraction.sections_matched, 2);
        assert_eq!(
            extraction.image_urls,
            vec![format!("{}x.png", BASE), format!("{}x.png", BASE)]
        );

        let document = Html::parse_document(html);
        let extractor = extractor();
        let markers: Vec<&str> = extractor
            .sections(&document)
            .iter()
            .map(|section| section.marker)
            .collect();
        assert_eq!(markers, vec!["Profile", "Chibi Art"]);
    }

    #[test]
    fn test_default_markers_on_combined_heading() {
        let extractor = DetailExtractor::new(&SelectorConfig::default(), "B/").unwrap();
        let html = r#"<html><body>
            <h3>基本情報 / SDキャラ画像</h3>
            <div class="ie5"><a title="a.png">a</a></div>
        </body></html>"#;

        let extraction = extractor.extract(html);
        assert_eq!(extraction.image_urls, vec!["B/a.png", "B/a.png"]);
    }

    #[test]
    fn test_sections_capability() {
        let html = r#"<html><body>
            <h3>Chibi Art</h3><div class="ie5"><a title="c.png">c</a></div>
            <h3>Profile</h3>
        </body></html>"#;

        let extractor = extractor();
        let document = Html::parse_document(html);
        let sections = extractor.sections(&document);

        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].marker, "Chibi Art");
        assert!(sections[0].container.is_some());
        assert_eq!(sections[1].marker, "Profile");
        assert!(sections[1].container.is_none());
    }

    #[test]
    fn test_empty_page() {
        let extraction = extractor().extract("");
        assert!(extraction.image_urls.is_empty());
    }
}
