//! Normalized per-page results and navigation entries

use crate::fetch::FetchOutcome;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Maximum stored content length per page, in characters
pub const MAX_CONTENT_CHARS: usize = 5000;

/// Maximum number of outbound links kept per page
pub const MAX_LINKS_PER_PAGE: usize = 50;

/// Aggregate counters for one crawl task
///
/// All counters are monotonically non-decreasing within a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TaskStats {
    /// URLs discovered during phase 1
    pub discovered: usize,

    /// Pages successfully fetched (always equals the result count)
    pub crawled: usize,

    /// Pages whose fetch failed in phase 2
    pub failed: usize,
}

/// Normalized result of fetching one URL
#[derive(Debug, Clone, Serialize)]
pub struct FetchRecord {
    /// The fetched URL
    pub url: String,

    /// Page title, empty if none
    pub title: String,

    /// Meta description, empty if none
    pub description: String,

    /// Cleaned page content, truncated to [`MAX_CONTENT_CHARS`]
    pub content: String,

    /// Word count of the full cleaned content (before truncation)
    pub word_count: usize,

    /// When the page was fetched
    pub timestamp: DateTime<Utc>,

    /// Whether the fetch succeeded
    pub success: bool,

    /// Raw HTML of the page's navigation region, if one was extracted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub navigation_content: Option<String>,

    /// Hrefs found inside navigation regions
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub navigation_links: Vec<String>,

    /// Outbound links from the page, bounded to [`MAX_LINKS_PER_PAGE`]
    pub links: Vec<String>,
}

impl FetchRecord {
    /// Normalizes a raw fetch outcome into a stored record
    ///
    /// The extraction payload is parsed as JSON with a `navigation` HTML
    /// fragment and a `navigation_links` array; a payload that does not parse
    /// is treated as if no extraction happened (logged, never fatal).
    pub fn from_outcome(outcome: &FetchOutcome) -> Self {
        let content_full = outcome.html_content.as_deref().unwrap_or("");
        let word_count = content_full.split_whitespace().count();
        let content: String = content_full.chars().take(MAX_CONTENT_CHARS).collect();

        let (navigation_content, navigation_links) = match &outcome.extracted {
            Some(payload) => parse_extraction_payload(payload, &outcome.url),
            None => (None, Vec::new()),
        };

        let mut links = outcome.links.clone();
        links.truncate(MAX_LINKS_PER_PAGE);

        Self {
            url: outcome.url.clone(),
            title: outcome.title.clone().unwrap_or_default(),
            description: outcome.description.clone().unwrap_or_default(),
            content,
            word_count,
            timestamp: Utc::now(),
            success: outcome.success,
            navigation_content,
            navigation_links,
            links,
        }
    }
}

/// Parses the extraction payload JSON into navigation fields
///
/// Returns `(None, vec![])` if the payload is malformed.
fn parse_extraction_payload(payload: &str, url: &str) -> (Option<String>, Vec<String>) {
    let value: serde_json::Value = match serde_json::from_str(payload) {
        Ok(v) => v,
        Err(e) => {
            tracing::debug!("Malformed extraction payload for {}: {}", url, e);
            return (None, Vec::new());
        }
    };

    let navigation = value
        .get("navigation")
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string());

    let navigation_links = value
        .get("navigation_links")
        .and_then(|v| v.as_array())
        .map(|arr| {
            arr.iter()
                .filter_map(|v| v.as_str())
                .map(|s| s.to_string())
                .collect()
        })
        .unwrap_or_default();

    (navigation, navigation_links)
}

/// Classification of a navigation link's source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkKind {
    Navigation,
}

/// One entry in a task's final navigation structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavLink {
    /// Absolute URL, resolved against the page it was found on
    pub url: String,

    /// Trimmed display text of the link
    pub title: String,

    /// Source classification (always navigation in this engine)
    #[serde(rename = "type")]
    pub kind: LinkKind,
}
