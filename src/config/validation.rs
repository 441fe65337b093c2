use crate::config::types::{BrowserConfig, CrawlConfig, FilterConfig};
use crate::ConfigError;
use url::Url;

/// Validates a submitted crawl configuration
///
/// Called once at submission time so that bad configurations are rejected
/// before a task is ever queued, rather than failing mid-pipeline.
pub fn validate(config: &CrawlConfig) -> Result<(), ConfigError> {
    validate_start_url(&config.start_url)?;
    validate_limits(config)?;
    validate_filters(&config.filters)?;
    validate_browser(&config.browser)?;
    Ok(())
}

/// Validates the seed URL: parseable, http(s), and with a host
fn validate_start_url(start_url: &str) -> Result<(), ConfigError> {
    if start_url.trim().is_empty() {
        return Err(ConfigError::InvalidUrl("start-url cannot be empty".into()));
    }

    let url = Url::parse(start_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("{}: {}", start_url, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "start-url must use http or https, got '{}'",
            url.scheme()
        )));
    }

    if url.host_str().is_none() {
        return Err(ConfigError::InvalidUrl(format!(
            "start-url has no host: {}",
            start_url
        )));
    }

    Ok(())
}

/// Validates crawl limits
fn validate_limits(config: &CrawlConfig) -> Result<(), ConfigError> {
    if config.max_pages < 1 {
        return Err(ConfigError::Validation(format!(
            "max-pages must be >= 1, got {}",
            config.max_pages
        )));
    }

    if config.max_pages > 10_000 {
        return Err(ConfigError::Validation(format!(
            "max-pages must be <= 10000, got {}",
            config.max_pages
        )));
    }

    if config.max_depth > 10 {
        return Err(ConfigError::Validation(format!(
            "max-depth must be <= 10, got {}",
            config.max_depth
        )));
    }

    Ok(())
}

/// Validates filter entries: no empty domains or patterns
fn validate_filters(filters: &FilterConfig) -> Result<(), ConfigError> {
    for domain in &filters.exclude_domains {
        if domain.trim().is_empty() {
            return Err(ConfigError::Validation(
                "exclude-domains entries cannot be empty".to_string(),
            ));
        }
    }

    for pattern in &filters.exclude_patterns {
        if pattern.trim().is_empty() {
            return Err(ConfigError::Validation(
                "exclude-patterns entries cannot be empty".to_string(),
            ));
        }
    }

    Ok(())
}

/// Validates browser options
fn validate_browser(browser: &BrowserConfig) -> Result<(), ConfigError> {
    if browser.browser_type.trim().is_empty() {
        return Err(ConfigError::Validation(
            "browser-type cannot be empty".to_string(),
        ));
    }

    let vp = browser.viewport;
    if vp.width < 100 || vp.width > 7680 || vp.height < 100 || vp.height > 4320 {
        return Err(ConfigError::Validation(format!(
            "viewport must be between 100x100 and 7680x4320, got {}x{}",
            vp.width, vp.height
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::Viewport;

    fn base_config() -> CrawlConfig {
        CrawlConfig {
            start_url: "https://example.com/".to_string(),
            crawl_strategy: Default::default(),
            max_depth: 2,
            max_pages: 50,
            filters: Default::default(),
            browser: Default::default(),
            cache_mode: Default::default(),
            word_threshold: 10,
            wait_for: None,
        }
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(validate(&base_config()).is_ok());
    }

    #[test]
    fn test_empty_start_url_rejected() {
        let mut config = base_config();
        config.start_url = "".to_string();
        assert!(matches!(
            validate(&config),
            Err(ConfigError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_non_http_start_url_rejected() {
        let mut config = base_config();
        config.start_url = "ftp://example.com/".to_string();
        assert!(matches!(
            validate(&config),
            Err(ConfigError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_zero_max_pages_rejected() {
        let mut config = base_config();
        config.max_pages = 0;
        assert!(matches!(
            validate(&config),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_excessive_max_depth_rejected() {
        let mut config = base_config();
        config.max_depth = 50;
        assert!(matches!(
            validate(&config),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_empty_filter_entry_rejected() {
        let mut config = base_config();
        config.filters.exclude_domains = vec!["".to_string()];
        assert!(matches!(
            validate(&config),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_tiny_viewport_rejected() {
        let mut config = base_config();
        config.browser.viewport = Viewport {
            width: 10,
            height: 10,
        };
        assert!(matches!(
            validate(&config),
            Err(ConfigError::Validation(_))
        ));
    }
}
