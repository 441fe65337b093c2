//! Plain-HTTP fetcher implementation
//!
//! This module implements the [`Fetcher`] capability over reqwest + scraper:
//! - GET requests with a descriptive user agent and timeouts
//! - Title, meta description, and cleaned text extraction
//! - CSS-selector-based navigation region extraction
//! - Same-site frontier exploration for discovery (BFS or DFS)
//!
//! Browser options (browser type, headless, viewport) and the wait-for
//! condition are accepted but ignored here; they are consumed by
//! browser-driving fetcher implementations.

use crate::config::CrawlStrategy;
use crate::fetch::{DiscoverOptions, Discovery, FetchOutcome, Fetcher, PageFetchOptions};
use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};
use std::collections::{HashSet, VecDeque};
use std::time::Duration;
use url::Url;

/// CSS selector union for navigation regions
const NAV_REGION_SELECTOR: &str = "nav, .nav, .navigation, nav[role='navigation'], .navbar, \
     .menu, .sidebar, .nav-menu, .main-nav, .site-nav, .primary-nav, .header-nav, .top-nav, \
     .side-nav, .navigation-menu";

/// CSS selector union for links inside navigation regions
const NAV_LINK_SELECTOR: &str = "nav a, .nav a, .navigation a, .navbar a, .menu a";

/// Builds an HTTP client with proper configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client() -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(concat!("nav-atlas/", env!("CARGO_PKG_VERSION")))
        .timeout(Duration::from_secs(30))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// HTTP implementation of the fetch capability
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Creates a fetcher with the default client configuration
    pub fn new() -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_http_client()?,
        })
    }

    /// Creates a fetcher around an existing client
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// Fetches one page and extracts its fields
    async fn fetch_page(&self, url: &str, extract_navigation: bool) -> FetchOutcome {
        let response = match self.client.get(url).send().await {
            Ok(r) => r,
            Err(e) => {
                let message = if e.is_timeout() {
                    "Request timeout".to_string()
                } else if e.is_connect() {
                    "Connection refused".to_string()
                } else {
                    e.to_string()
                };
                return FetchOutcome::failure(url, message);
            }
        };

        let status = response.status();
        let final_url = response.url().to_string();

        if !status.is_success() {
            return FetchOutcome::failure(final_url, format!("HTTP {}", status.as_u16()));
        }

        let body = match response.text().await {
            Ok(b) => b,
            Err(e) => return FetchOutcome::failure(final_url, e.to_string()),
        };

        let base = match Url::parse(&final_url) {
            Ok(u) => u,
            Err(e) => return FetchOutcome::failure(final_url, e.to_string()),
        };

        parse_outcome(&base, &body, extract_navigation)
    }
}

/// Parses a fetched body into a successful outcome
fn parse_outcome(base: &Url, body: &str, extract_navigation: bool) -> FetchOutcome {
    let document = Html::parse_document(body);

    let title = select_text(&document, "title");
    let description = select_attr(&document, "meta[name='description']", "content");
    let text = page_text(&document);
    let links = extract_links(&document, base);

    let extracted = if extract_navigation {
        Some(extraction_payload(&document, base))
    } else {
        None
    };

    FetchOutcome {
        success: true,
        url: base.to_string(),
        title,
        description,
        html_content: Some(text),
        extracted,
        links,
        error_message: None,
    }
}

/// First matching element's text, trimmed and non-empty
fn select_text(document: &Html, selector: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;
    document
        .select(&selector)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
}

/// First matching element's attribute value
fn select_attr(document: &Html, selector: &str, attr: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;
    document
        .select(&selector)
        .next()
        .and_then(|el| el.value().attr(attr))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Whole-page visible text with collapsed whitespace
fn page_text(document: &Html) -> String {
    document
        .root_element()
        .text()
        .collect::<Vec<_>>()
        .join(" ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// All http(s) outbound links as absolute URLs
fn extract_links(document: &Html, base: &Url) -> Vec<String> {
    let selector = match Selector::parse("a[href]") {
        Ok(s) => s,
        Err(_) => return Vec::new(),
    };

    let mut links = Vec::new();
    for element in document.select(&selector) {
        if let Some(href) = element.value().attr("href") {
            if let Some(absolute) = resolve_link(href, base) {
                links.push(absolute);
            }
        }
    }
    links
}

/// Resolves a link href to an absolute http(s) URL
///
/// Returns None for empty hrefs, fragment-only anchors, and non-web schemes
/// (javascript:, mailto:, tel:, data:).
fn resolve_link(href: &str, base: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    if href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return None;
    }

    match base.join(href) {
        Ok(absolute) if absolute.scheme() == "http" || absolute.scheme() == "https" => {
            Some(absolute.to_string())
        }
        _ => None,
    }
}

/// Builds the navigation extraction payload as a JSON string
fn extraction_payload(document: &Html, base: &Url) -> String {
    let mut regions = Vec::new();
    if let Ok(selector) = Selector::parse(NAV_REGION_SELECTOR) {
        for element in document.select(&selector) {
            regions.push(element.html());
        }
    }

    let mut nav_links = Vec::new();
    if let Ok(selector) = Selector::parse(NAV_LINK_SELECTOR) {
        for element in document.select(&selector) {
            if let Some(href) = element.value().attr("href") {
                if let Some(absolute) = resolve_link(href, base) {
                    nav_links.push(absolute);
                }
            }
        }
    }

    serde_json::json!({
        "navigation": regions.join("\n"),
        "navigation_links": nav_links,
    })
    .to_string()
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch_one(&self, url: &str, options: &PageFetchOptions) -> FetchOutcome {
        let mut outcome = self.fetch_page(url, options.extract_navigation).await;

        if options.wait_for.is_some() {
            tracing::debug!("wait-for condition ignored by the HTTP fetcher");
        }

        // exclude-external pruning of outbound links happens at discovery;
        // single-page results keep whatever the page linked to
        outcome.links.truncate(crate::task::MAX_LINKS_PER_PAGE);
        outcome
    }

    async fn discover(&self, start_url: &str, options: &DiscoverOptions) -> Discovery {
        let base = match Url::parse(start_url) {
            Ok(u) => u,
            Err(e) => {
                return Discovery {
                    seed: FetchOutcome::failure(start_url, e.to_string()),
                    frontier: Vec::new(),
                }
            }
        };

        let seed = self.fetch_page(start_url, true).await;
        if !seed.success {
            return Discovery {
                seed,
                frontier: Vec::new(),
            };
        }

        // Frontier walk from the seed's links, same site only
        let mut visited: HashSet<String> = HashSet::new();
        let mut frontier: Vec<String> = Vec::new();
        let mut queue: VecDeque<(String, u32, Vec<String>)> = VecDeque::new();

        visited.insert(seed.url.clone());
        frontier.push(seed.url.clone());
        queue.push_back((seed.url.clone(), 0, seed.links.clone()));

        while let Some((_, depth, links)) = match options.strategy {
            CrawlStrategy::Bfs => queue.pop_front(),
            CrawlStrategy::Dfs => queue.pop_back(),
        } {
            if depth >= options.max_depth {
                continue;
            }

            for link in links {
                if frontier.len() >= options.max_pages as usize {
                    break;
                }

                let url = match Url::parse(&link) {
                    Ok(u) => u,
                    Err(_) => continue,
                };

                if !options.allows(&url, &base) {
                    continue;
                }

                let normalized = url.to_string();
                if !visited.insert(normalized.clone()) {
                    continue;
                }

                // One fetch per page to learn its links; navigation extraction
                // is deferred to the fetch-all phase
                let outcome = self.fetch_page(&normalized, false).await;
                if !outcome.success {
                    tracing::debug!(
                        "Discovery skipping {}: {}",
                        normalized,
                        outcome.error_message.as_deref().unwrap_or("unknown error")
                    );
                    continue;
                }

                frontier.push(normalized.clone());
                queue.push_back((normalized, depth + 1, outcome.links));
            }

            if frontier.len() >= options.max_pages as usize {
                break;
            }
        }

        Discovery { seed, frontier }
    }
}
