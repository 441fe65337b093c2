//! Fetch option types built from a crawl configuration

use crate::config::{BrowserConfig, CacheMode, CrawlConfig, CrawlStrategy};
use url::Url;

/// Social media hosts dropped when `exclude-social` is set
const SOCIAL_HOSTS: &[&str] = &[
    "facebook.com",
    "twitter.com",
    "x.com",
    "instagram.com",
    "linkedin.com",
    "youtube.com",
    "tiktok.com",
    "pinterest.com",
    "reddit.com",
];

/// Options for fetching one page with extraction
#[derive(Debug, Clone)]
pub struct PageFetchOptions {
    /// Cache behavior, forwarded verbatim
    pub cache_mode: CacheMode,

    /// Minimum word count for a content block to be kept
    pub word_threshold: u32,

    /// Optional condition the fetcher waits for before extracting
    pub wait_for: Option<String>,

    /// Request CSS-selector-based navigation extraction
    pub extract_navigation: bool,

    /// Browser options, consumed by browser-driving fetchers
    pub browser: BrowserConfig,
}

impl PageFetchOptions {
    /// Builds single-page fetch options from a crawl configuration
    pub fn from_config(config: &CrawlConfig) -> Self {
        Self {
            cache_mode: config.cache_mode,
            word_threshold: config.word_threshold,
            wait_for: config.wait_for.clone(),
            extract_navigation: true,
            browser: config.browser.clone(),
        }
    }
}

/// Options for the site discovery call
#[derive(Debug, Clone)]
pub struct DiscoverOptions {
    /// Traversal order
    pub strategy: CrawlStrategy,

    /// Maximum link depth from the start URL
    pub max_depth: u32,

    /// Maximum number of pages to discover
    pub max_pages: u32,

    /// Domains whose URLs are never followed
    pub exclude_domains: Vec<String>,

    /// Substring patterns whose matching URLs are never followed
    pub exclude_patterns: Vec<String>,

    /// Drop outbound links that leave the start URL's host
    pub exclude_external: bool,

    /// Drop links to social media sites
    pub exclude_social: bool,

    /// Drop externally hosted images
    pub exclude_media: bool,

    /// Cache behavior, forwarded verbatim
    pub cache_mode: CacheMode,

    /// Optional condition the fetcher waits for before extracting
    pub wait_for: Option<String>,

    /// Minimum word count for a content block to be kept
    pub word_threshold: u32,

    /// Browser options, consumed by browser-driving fetchers
    pub browser: BrowserConfig,
}

impl DiscoverOptions {
    /// Builds deep-crawl options from a crawl configuration
    pub fn from_config(config: &CrawlConfig) -> Self {
        Self {
            strategy: config.crawl_strategy,
            max_depth: config.max_depth,
            max_pages: config.max_pages,
            exclude_domains: config.filters.exclude_domains.clone(),
            exclude_patterns: config.filters.exclude_patterns.clone(),
            exclude_external: config.filters.exclude_external,
            exclude_social: config.filters.exclude_social,
            exclude_media: config.filters.exclude_images,
            cache_mode: config.cache_mode,
            wait_for: config.wait_for.clone(),
            word_threshold: config.word_threshold,
            browser: config.browser.clone(),
        }
    }

    /// Decides whether discovery may follow `url` from a crawl rooted at `base`
    ///
    /// With `exclude_external` set (the default), discovery never leaves the
    /// start URL's site (its host or a subdomain of it); the exclusion lists
    /// and social filter prune further.
    pub fn allows(&self, url: &Url, base: &Url) -> bool {
        if url.scheme() != "http" && url.scheme() != "https" {
            return false;
        }

        let host = match url.host_str() {
            Some(h) => h,
            None => return false,
        };

        // Same site: the base host itself or one of its subdomains
        let base_host = match base.host_str() {
            Some(h) => h,
            None => return false,
        };
        if host == base_host {
            if url.port_or_known_default() != base.port_or_known_default() {
                return false;
            }
        } else if self.exclude_external && !host.ends_with(&format!(".{}", base_host)) {
            return false;
        }

        for domain in &self.exclude_domains {
            if host == domain || host.ends_with(&format!(".{}", domain)) {
                return false;
            }
        }

        let url_str = url.as_str();
        for pattern in &self.exclude_patterns {
            if url_str.contains(pattern.as_str()) {
                return false;
            }
        }

        if self.exclude_social {
            for social in SOCIAL_HOSTS {
                if host == *social || host.ends_with(&format!(".{}", social)) {
                    return false;
                }
            }
        }

        true
    }
}
