use serde::{Deserialize, Serialize};

/// One crawl job's configuration
///
/// This is the explicit, typed form of a submitted job: every recognized
/// option is enumerated here with a default, and the whole structure is
/// validated once at submission time.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CrawlConfig {
    /// The seed URL the crawl starts from
    #[serde(rename = "start-url")]
    pub start_url: String,

    /// Traversal order used during discovery
    #[serde(rename = "crawl-strategy", default)]
    pub crawl_strategy: CrawlStrategy,

    /// Maximum link depth from the seed URL
    #[serde(rename = "max-depth", default = "default_max_depth")]
    pub max_depth: u32,

    /// Maximum number of pages to discover
    #[serde(rename = "max-pages", default = "default_max_pages")]
    pub max_pages: u32,

    /// URL filtering rules applied during discovery
    #[serde(default)]
    pub filters: FilterConfig,

    /// Browser options forwarded to the fetch capability
    #[serde(default)]
    pub browser: BrowserConfig,

    /// Fetch cache behavior, passed through to the fetch capability verbatim
    #[serde(rename = "cache-mode", default)]
    pub cache_mode: CacheMode,

    /// Minimum word count for a content block to be kept
    #[serde(rename = "word-threshold", default = "default_word_threshold")]
    pub word_threshold: u32,

    /// Optional condition the fetcher waits for before extracting
    #[serde(rename = "wait-for", default)]
    pub wait_for: Option<String>,
}

/// Traversal order for site discovery
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CrawlStrategy {
    /// Breadth-first: explore all pages at one depth before going deeper
    Bfs,
    /// Depth-first: follow each branch to its full depth before backtracking
    Dfs,
}

impl Default for CrawlStrategy {
    fn default() -> Self {
        Self::Bfs
    }
}

/// Cache behavior for the fetch capability
///
/// The engine does not interpret these values; they are forwarded verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheMode {
    Enabled,
    Disabled,
    ReadOnly,
    WriteOnly,
    Bypass,
}

impl Default for CacheMode {
    fn default() -> Self {
        Self::Enabled
    }
}

/// URL filtering rules for discovery
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FilterConfig {
    /// Domains whose URLs are never followed
    #[serde(rename = "exclude-domains", default)]
    pub exclude_domains: Vec<String>,

    /// Substring patterns whose matching URLs are never followed
    #[serde(rename = "exclude-patterns", default)]
    pub exclude_patterns: Vec<String>,

    /// Drop links that leave the seed URL's host
    #[serde(rename = "exclude-external", default = "default_true")]
    pub exclude_external: bool,

    /// Drop links to social media sites
    #[serde(rename = "exclude-social", default)]
    pub exclude_social: bool,

    /// Drop images hosted outside the seed URL's host
    #[serde(rename = "exclude-images", default)]
    pub exclude_images: bool,

    /// Whether the fetcher should descend into iframes
    #[serde(rename = "process-iframes", default)]
    pub process_iframes: bool,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            exclude_domains: Vec::new(),
            exclude_patterns: Vec::new(),
            exclude_external: true,
            exclude_social: false,
            exclude_images: false,
            process_iframes: false,
        }
    }
}

/// Browser options forwarded to the fetch capability
///
/// The built-in HTTP fetcher ignores these; a browser-driving fetcher
/// implementation consumes them.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BrowserConfig {
    /// Browser engine name (e.g. "chromium", "firefox")
    #[serde(rename = "browser-type", default = "default_browser_type")]
    pub browser_type: String,

    /// Run the browser without a visible window
    #[serde(default = "default_true")]
    pub headless: bool,

    /// Viewport dimensions in pixels
    #[serde(default)]
    pub viewport: Viewport,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            browser_type: default_browser_type(),
            headless: true,
            viewport: Viewport::default(),
        }
    }
}

/// Browser viewport dimensions
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
        }
    }
}

fn default_max_depth() -> u32 {
    2
}

fn default_max_pages() -> u32 {
    50
}

fn default_word_threshold() -> u32 {
    10
}

fn default_browser_type() -> String {
    "chromium".to_string()
}

fn default_true() -> bool {
    true
}
