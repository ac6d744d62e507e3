//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests made by the pipeline:
//! - Building the HTTP client with a proper user agent string
//! - GET requests for HTML pages (listing and detail pages)
//! - GET requests for binary payloads (images)
//! - Pacing every request through the shared [`RateLimiter`]

use crate::config::{ScraperConfig, UserAgentConfig};
use crate::crawler::RateLimiter;
use crate::ScrapeError;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Response};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// A fetched HTML page
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Final URL after redirects
    pub final_url: String,
    /// HTTP status code
    pub status: u16,
    /// Content-Type header value (empty if absent)
    pub content_type: String,
    /// Decoded page text
    pub body: String,
}

impl FetchedPage {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// A fetched binary payload
#[derive(Debug, Clone)]
pub struct FetchedPayload {
    /// Final URL after redirects
    pub final_url: String,
    /// HTTP status code
    pub status: u16,
    /// Declared Content-Type header value (empty if absent)
    pub content_type: String,
    /// Raw response body
    pub bytes: Vec<u8>,
}

impl FetchedPayload {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Builds an HTTP client with proper configuration
///
/// # Example
///
/// ```no_run
/// use chara_scrape::config::{ScraperConfig, UserAgentConfig};
/// use chara_scrape::crawler::build_http_client;
///
/// let client = build_http_client(&UserAgentConfig::default(), &ScraperConfig::default()).unwrap();
/// ```
pub fn build_http_client(
    user_agent: &UserAgentConfig,
    scraper: &ScraperConfig,
) -> Result<Client, ScrapeError> {
    Client::builder()
        .user_agent(user_agent.header_value())
        .timeout(Duration::from_secs(scraper.request_timeout))
        .connect_timeout(Duration::from_secs(scraper.connect_timeout))
        .gzip(true)
        .brotli(true)
        .build()
        .map_err(ScrapeError::Client)
}

/// Resolves a possibly relative href against the page it was found on
pub fn resolve_url(base: &str, href: &str) -> Result<Url, ScrapeError> {
    let base_url = Url::parse(base).map_err(|source| ScrapeError::InvalidUrl {
        url: base.to_string(),
        source,
    })?;
    base_url
        .join(href.trim())
        .map_err(|source| ScrapeError::InvalidUrl {
            url: href.to_string(),
            source,
        })
}

/// Issues rate-limited GET requests
///
/// Cloning is cheap: clones share the connection pool and the rate limiter.
#[derive(Debug, Clone)]
pub struct PageFetcher {
    client: Client,
    limiter: Arc<RateLimiter>,
}

impl PageFetcher {
    pub fn new(client: Client, limiter: Arc<RateLimiter>) -> Self {
        Self { client, limiter }
    }

    /// Returns the shared rate limiter
    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    /// Fetches a page and decodes its body as text
    ///
    /// Non-success statuses are returned to the caller, which decides whether the page is
    /// still usable. Transport failures become [`ScrapeError::Network`].
    pub async fn fetch(&self, url: &str) -> Result<FetchedPage, ScrapeError> {
        let response = self.send(url).await?;
        let (final_url, status, content_type) = response_meta(&response);

        let body = response.text().await.map_err(|source| ScrapeError::Network {
            url: url.to_string(),
            source,
        })?;

        tracing::debug!("Fetched {} ({}, {} bytes)", final_url, status, body.len());

        Ok(FetchedPage {
            final_url,
            status,
            content_type,
            body,
        })
    }

    /// Fetches a payload as raw bytes
    pub async fn fetch_bytes(&self, url: &str) -> Result<FetchedPayload, ScrapeError> {
        let response = self.send(url).await?;
        let (final_url, status, content_type) = response_meta(&response);

        let bytes = response
            .bytes()
            .await
            .map_err(|source| ScrapeError::Network {
                url: url.to_string(),
                source,
            })?
            .to_vec();

        tracing::debug!(
            "Fetched {} ({}, {}, {} bytes)",
            final_url,
            status,
            content_type,
            bytes.len()
        );

        Ok(FetchedPayload {
            final_url,
            status,
            content_type,
            bytes,
        })
    }

    async fn send(&self, url: &str) -> Result<Response, ScrapeError> {
        self.limiter.await_slot().await;

        self.client
            .get(url)
            .send()
            .await
            .map_err(|source| {
                if source.is_timeout() {
                    tracing::warn!("Request timeout for {}", url);
                } else if source.is_connect() {
                    tracing::warn!("Connection failed for {}", url);
                }
                ScrapeError::Network {
                    url: url.to_string(),
                    source,
                }
            })
    }
}

fn response_meta(response: &Response) -> (String, u16, String) {
    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    (
        response.url().to_string(),
        response.status().as_u16(),
        content_type,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_fetcher() -> PageFetcher {
        let client =
            build_http_client(&UserAgentConfig::default(), &ScraperConfig::default()).unwrap();
        PageFetcher::new(client, Arc::new(RateLimiter::disabled()))
    }

    #[test]
    fn test_build_http_client() {
        let client = build_http_client(&UserAgentConfig::default(), &ScraperConfig::default());
        assert!(client.is_ok());
    }

    #[test]
    fn test_user_agent_format() {
        let mut config = UserAgentConfig {
            crawler_name: "TestCrawler".to_string(),
            crawler_version: "1.0".to_string(),
            contact_url: Some("https://example.com/about".to_string()),
            contact_email: Some("admin@example.com".to_string()),
        };
        assert_eq!(
            config.header_value(),
            "TestCrawler/1.0 (+https://example.com/about; admin@example.com)"
        );

        config.contact_url = None;
        config.contact_email = None;
        assert_eq!(config.header_value(), "TestCrawler/1.0");
    }

    #[test]
    fn test_resolve_url() {
        let base = "https://wiki.example.com/index.php?list";
        assert_eq!(
            resolve_url(base, "/alpha.html").unwrap().as_str(),
            "https://wiki.example.com/alpha.html"
        );
        assert_eq!(
            resolve_url(base, "https://other.example.com/b").unwrap().as_str(),
            "https://other.example.com/b"
        );
        assert!(resolve_url("not a base", "/x").is_err());
    }

    #[tokio::test]
    async fn test_fetch_page_text() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/page"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("<html>hi</html>")
                    .insert_header("content-type", "text/html; charset=utf-8"),
            )
            .mount(&server)
            .await;

        let page = test_fetcher()
            .fetch(&format!("{}/page", server.uri()))
            .await
            .unwrap();

        assert!(page.is_success());
        assert_eq!(page.body, "<html>hi</html>");
        assert!(page.content_type.starts_with("text/html"));
    }

    #[tokio::test]
    async fn test_fetch_reports_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let payload = test_fetcher()
            .fetch_bytes(&format!("{}/missing.png", server.uri()))
            .await
            .unwrap();

        assert_eq!(payload.status, 404);
        assert!(!payload.is_success());
    }

    #[tokio::test]
    async fn test_connection_failure_is_network_error() {
        // Grab a free port, then close the listener so nothing is there
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let result = test_fetcher().fetch(&format!("http://{}/", addr)).await;
        assert!(matches!(result, Err(ScrapeError::Network { .. })));
    }
}
