use crate::config::types::{Config, OutputConfig, ScraperConfig, SelectorConfig, UserAgentConfig};
use crate::ConfigError;
use scraper::Selector;
use std::path::{Component, Path, PathBuf};
use url::Url;

/// Smallest request interval accepted from a configuration file (milliseconds)
pub const MIN_GET_INTERVAL_MS: u64 = 100;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_scraper_config(&config.scraper)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_output_config(&config.output)?;
    validate_selector_config(&config.selectors)?;
    Ok(())
}

/// Validates request targets and pacing
fn validate_scraper_config(config: &ScraperConfig) -> Result<(), ConfigError> {
    validate_http_url("listing-url", &config.listing_url)?;
    validate_http_url("image-base-url", &config.image_base_url)?;

    if config.get_interval < MIN_GET_INTERVAL_MS {
        return Err(ConfigError::Validation(format!(
            "get-interval must be >= {}ms, got {}ms",
            MIN_GET_INTERVAL_MS, config.get_interval
        )));
    }

    if config.request_timeout < 1 {
        return Err(ConfigError::Validation(
            "request-timeout must be >= 1s".to_string(),
        ));
    }

    if config.connect_timeout < 1 {
        return Err(ConfigError::Validation(
            "connect-timeout must be >= 1s".to_string(),
        ));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    // Validate crawler name: non-empty, alphanumeric + hyphens only
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler-name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler-name must be alphanumeric with hyphens only, got '{}'",
            config.crawler_name
        )));
    }

    if config.crawler_version.is_empty() {
        return Err(ConfigError::Validation(
            "crawler-version cannot be empty".to_string(),
        ));
    }

    if let Some(contact_url) = &config.contact_url {
        Url::parse(contact_url)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact-url: {}", e)))?;
    }

    if let Some(email) = &config.contact_email {
        validate_email(email)?;
    }

    Ok(())
}

/// Validates output configuration
///
/// The temp directory is removed after a complete run, so it must never be the output
/// directory or one of its ancestors.
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.output_dir.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "output-dir cannot be empty".to_string(),
        ));
    }

    if config.temp_dir.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "temp-dir cannot be empty".to_string(),
        ));
    }

    let cwd = std::env::current_dir()?;
    let temp_dir = absolute_clean(&config.temp_dir, &cwd);
    let output_dir = absolute_clean(&config.output_dir, &cwd);

    if output_dir.starts_with(&temp_dir) {
        return Err(ConfigError::Validation(format!(
            "output-dir '{}' must not be inside temp-dir '{}'",
            config.output_dir.display(),
            config.temp_dir.display()
        )));
    }

    if cwd.starts_with(&temp_dir) {
        return Err(ConfigError::Validation(format!(
            "temp-dir '{}' must not be the working directory or one of its parents",
            config.temp_dir.display()
        )));
    }

    Ok(())
}

/// Resolves `path` against `base` and folds `.` and `..` components without touching the
/// filesystem
fn absolute_clean(path: &Path, base: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    };

    let mut clean = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                clean.pop();
            }
            other => clean.push(other.as_os_str()),
        }
    }
    clean
}

/// Validates selectors and markers
fn validate_selector_config(config: &SelectorConfig) -> Result<(), ConfigError> {
    validate_selector(&config.listing_table)?;
    validate_selector(&config.detail_blocks)?;

    if config.section_markers.is_empty() {
        return Err(ConfigError::Validation(
            "section-markers must contain at least one marker".to_string(),
        ));
    }

    if config.section_markers.iter().any(|m| m.is_empty()) {
        return Err(ConfigError::Validation(
            "section-markers cannot contain empty markers".to_string(),
        ));
    }

    if config.image_title_marker.is_empty() {
        return Err(ConfigError::Validation(
            "image-title-marker cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Parses a CSS selector, mapping failures to a configuration error
pub fn parse_selector(selector: &str) -> Result<Selector, ConfigError> {
    Selector::parse(selector).map_err(|e| ConfigError::InvalidSelector {
        selector: selector.to_string(),
        message: e.to_string(),
    })
}

fn validate_selector(selector: &str) -> Result<(), ConfigError> {
    parse_selector(selector).map(|_| ())
}

/// Requires an absolute http(s) URL
fn validate_http_url(field: &str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {} '{}': {}", field, value, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::Validation(format!(
            "{} '{}' must use http or https",
            field, value
        )));
    }

    Ok(())
}

/// Basic email validation
fn validate_email(email: &str) -> Result<(), ConfigError> {
    // Basic email format check: must contain @ and have text on both sides
    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 || parts[0].is_empty() || parts[1].is_empty() {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    // Domain part should contain at least one dot
    if !parts[1].contains('.') {
        return Err(ConfigError::Validation(format!(
            "Invalid email domain: '{}'",
            email
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate(&Config::default()).is_ok());
    }

    #[test]
    fn test_interval_floor() {
        let mut config = Config::default();
        config.scraper.get_interval = 10;
        assert!(matches!(
            validate(&config),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_listing_url_must_be_http() {
        let mut config = Config::default();
        config.scraper.listing_url = "ftp://example.com/list".to_string();
        assert!(validate(&config).is_err());

        config.scraper.listing_url = "not a url".to_string();
        assert!(matches!(validate(&config), Err(ConfigError::InvalidUrl(_))));
    }

    #[test]
    fn test_output_inside_temp_rejected() {
        let mut config = Config::default();
        config.output.temp_dir = PathBuf::from("work");
        config.output.output_dir = PathBuf::from("work/images");
        assert!(validate(&config).is_err());

        config.output.output_dir = PathBuf::from("work");
        assert!(validate(&config).is_err());

        config.output.output_dir = PathBuf::from("images");
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_dotted_temp_dir_containing_output_rejected() {
        let mut config = Config::default();
        config.output.temp_dir = PathBuf::from(".");
        config.output.output_dir = PathBuf::from("data");
        assert!(matches!(
            validate(&config),
            Err(ConfigError::Validation(_))
        ));

        config.output.temp_dir = PathBuf::from("./work");
        config.output.output_dir = PathBuf::from("work/images");
        assert!(validate(&config).is_err());

        config.output.temp_dir = PathBuf::from("scratch/../work");
        config.output.output_dir = PathBuf::from("./work/./images");
        assert!(validate(&config).is_err());

        config.output.temp_dir = PathBuf::from("./work");
        config.output.output_dir = PathBuf::from("./images");
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_temp_dir_above_working_directory_rejected() {
        let mut config = Config::default();
        config.output.temp_dir = PathBuf::from("..");
        config.output.output_dir = PathBuf::from("/elsewhere/data");
        assert!(validate(&config).is_err());

        let cwd = std::env::current_dir().unwrap();
        config.output.temp_dir = cwd;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_absolute_clean() {
        let base = Path::new("/srv/run");
        assert_eq!(absolute_clean(Path::new("."), base), PathBuf::from("/srv/run"));
        assert_eq!(
            absolute_clean(Path::new("./a/../b/./c"), base),
            PathBuf::from("/srv/run/b/c")
        );
        assert_eq!(
            absolute_clean(Path::new("/tmp/x/.."), base),
            PathBuf::from("/tmp")
        );
    }

    #[test]
    fn test_invalid_selector() {
        let mut config = Config::default();
        config.selectors.detail_blocks = "div..ie5 >>".to_string();
        assert!(matches!(
            validate(&config),
            Err(ConfigError::InvalidSelector { .. })
        ));
    }

    #[test]
    fn test_markers_required() {
        let mut config = Config::default();
        config.selectors.section_markers.clear();
        assert!(validate(&config).is_err());

        config.selectors.section_markers = vec![String::new()];
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("user@example.com").is_ok());
        assert!(validate_email("admin@sub.example.com").is_ok());

        assert!(validate_email("invalid").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("user@").is_err());
        assert!(validate_email("user@domain").is_err());
    }

    #[test]
    fn test_crawler_name_charset() {
        let mut config = Config::default();
        config.user_agent.crawler_name = "bad name!".to_string();
        assert!(validate(&config).is_err());
    }
}
