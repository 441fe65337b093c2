//! The fetch capability seam
//!
//! The orchestration engine consumes page fetching as an abstract capability:
//! given a URL and options, a [`Fetcher`] returns page content, extracted
//! structured fields, outbound links, and a success flag. Network I/O,
//! JavaScript execution, retries, and rendering all live behind this trait.
//!
//! [`HttpFetcher`] is the built-in plain-HTTP implementation; a browser-based
//! implementation would plug in the same way.

mod http;
mod options;

pub use http::{build_http_client, HttpFetcher};
pub use options::{DiscoverOptions, PageFetchOptions};

use async_trait::async_trait;

/// Raw result of fetching one URL
///
/// Failures are carried in-band (`success == false` plus `error_message`)
/// rather than as errors: a failed fetch is an expected outcome, and the
/// pipeline decides whether it is fatal.
#[derive(Debug, Clone)]
pub struct FetchOutcome {
    /// Whether the fetch succeeded
    pub success: bool,

    /// The fetched URL (after redirects, if any)
    pub url: String,

    /// Page title
    pub title: Option<String>,

    /// Meta description
    pub description: Option<String>,

    /// Cleaned textual content of the page
    pub html_content: Option<String>,

    /// Extraction payload as a JSON string, when extraction was requested
    ///
    /// Shape: `{"navigation": "<html fragment>", "navigation_links": [..]}`.
    pub extracted: Option<String>,

    /// Outbound links, absolute URLs
    pub links: Vec<String>,

    /// Error description when `success` is false
    pub error_message: Option<String>,
}

impl FetchOutcome {
    /// Builds a failed outcome for a URL
    pub fn failure(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            url: url.into(),
            title: None,
            description: None,
            html_content: None,
            extracted: None,
            links: Vec::new(),
            error_message: Some(message.into()),
        }
    }
}

/// Result of a discovery run against a start URL
///
/// Discovery explores the site per the configured strategy and returns the
/// complete frontier up front, so the fetch-all phase always knows exactly
/// which URLs to visit.
#[derive(Debug, Clone)]
pub struct Discovery {
    /// Outcome of fetching the start URL itself
    pub seed: FetchOutcome,

    /// Every discovered URL, including the start URL, in visit order
    pub frontier: Vec<String>,
}

/// Abstract page-fetching capability
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetches a single page with extraction options
    async fn fetch_one(&self, url: &str, options: &PageFetchOptions) -> FetchOutcome;

    /// Fetches the start URL and explores the site for further pages
    ///
    /// A failed seed fetch yields a `Discovery` with a failed `seed` outcome
    /// and an empty frontier.
    async fn discover(&self, start_url: &str, options: &DiscoverOptions) -> Discovery;
}
