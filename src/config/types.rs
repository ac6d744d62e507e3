use serde::Deserialize;
use std::path::PathBuf;

/// Listing page of the character wiki the scraper was written for
pub const DEFAULT_LISTING_URL: &str =
    "https://gbf-wiki.com/index.php?%C1%B4%A5%AD%A5%E3%A5%E9%A5%AF%A5%BF%A1%BC%B0%EC%CD%F7";

/// Attachment endpoint that image titles are appended to
pub const DEFAULT_IMAGE_BASE_URL: &str =
    "https://gbf-wiki.com/index.php?plugin=attach&refer=img&openfile=";

/// Main configuration structure for chara-scrape
///
/// Every section has defaults, so an empty file (or no file at all) yields a
/// configuration that targets the original wiki.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub scraper: ScraperConfig,
    #[serde(default, rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub selectors: SelectorConfig,
}

/// Request targets and pacing
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScraperConfig {
    /// URL of the page holding the character table
    #[serde(rename = "listing-url")]
    pub listing_url: String,

    /// Prefix that image titles are concatenated onto
    #[serde(rename = "image-base-url")]
    pub image_base_url: String,

    /// Minimum time between two outbound requests (milliseconds)
    #[serde(rename = "get-interval")]
    pub get_interval: u64,

    /// Whole-request timeout (seconds)
    #[serde(rename = "request-timeout")]
    pub request_timeout: u64,

    /// Connection timeout (seconds)
    #[serde(rename = "connect-timeout")]
    pub connect_timeout: u64,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            listing_url: DEFAULT_LISTING_URL.to_string(),
            image_base_url: DEFAULT_IMAGE_BASE_URL.to_string(),
            get_interval: 1000,
            request_timeout: 30,
            connect_timeout: 10,
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: Option<String>,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: Option<String>,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: env!("CARGO_PKG_NAME").to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: None,
            contact_email: None,
        }
    }
}

impl UserAgentConfig {
    /// Formats the user agent header value
    ///
    /// Format: `CrawlerName/Version`, followed by `(+ContactURL; ContactEmail)` when
    /// contact details are configured.
    pub fn header_value(&self) -> String {
        let base = format!("{}/{}", self.crawler_name, self.crawler_version);
        match (&self.contact_url, &self.contact_email) {
            (Some(url), Some(email)) => format!("{} (+{}; {})", base, url, email),
            (Some(url), None) => format!("{} (+{})", base, url),
            (None, Some(email)) => format!("{} ({})", base, email),
            (None, None) => base,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory receiving the images and `image_ids.json`
    #[serde(rename = "output-dir")]
    pub output_dir: PathBuf,

    /// Directory holding the intermediate artifacts
    #[serde(rename = "temp-dir")]
    pub temp_dir: PathBuf,

    /// Keep the temp directory after a complete run
    #[serde(rename = "keep-temp")]
    pub keep_temp: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("data"),
            temp_dir: PathBuf::from("temp"),
            keep_temp: false,
        }
    }
}

/// Selectors and markers used to locate data in the wiki markup
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    /// CSS selector of the sortable character table
    #[serde(rename = "listing-table")]
    pub listing_table: String,

    /// CSS selector matching section headings and image blocks on a detail page
    #[serde(rename = "detail-blocks")]
    pub detail_blocks: String,

    /// Heading substrings whose following block holds images
    #[serde(rename = "section-markers")]
    pub section_markers: Vec<String>,

    /// Substring an anchor title must contain to count as an image
    #[serde(rename = "image-title-marker")]
    pub image_title_marker: String,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            listing_table: "table#sortabletable1".to_string(),
            detail_blocks: "div.ie5, div.img_margin, h3".to_string(),
            section_markers: vec![
                "基本情報".to_string(),
                "SDキャラ画像".to_string(),
                "EX POSE画像".to_string(),
            ],
            image_title_marker: ".png".to_string(),
        }
    }
}
