//! Anchor extraction from navigation HTML fragments

use crate::task::{LinkKind, NavLink};
use scraper::{Html, Selector};
use url::Url;

/// Extracts navigation link candidates from a raw HTML fragment
///
/// Scans the fragment for anchors with an href and visible text, resolves
/// each href against `base_url`, and keeps only http(s) links on the same
/// host (and port) as the base. Cross-site links are silently discarded.
/// No ordering or uniqueness guarantee; dedup and sorting happen at merge
/// time.
pub fn extract_nav_links(fragment: &str, base_url: &Url) -> Vec<NavLink> {
    let selector = match Selector::parse("a[href]") {
        Ok(s) => s,
        Err(_) => return Vec::new(),
    };

    let document = Html::parse_fragment(fragment);
    let mut links = Vec::new();

    for element in document.select(&selector) {
        let href = match element.value().attr("href") {
            Some(h) if !h.trim().is_empty() => h.trim(),
            _ => continue,
        };

        let title = element.text().collect::<String>().trim().to_string();
        if title.is_empty() {
            continue;
        }

        let resolved = match base_url.join(href) {
            Ok(u) => u,
            Err(e) => {
                tracing::debug!("Skipping unresolvable href '{}': {}", href, e);
                continue;
            }
        };

        if !is_same_site(&resolved, base_url) {
            continue;
        }

        links.push(NavLink {
            url: resolved.to_string(),
            title,
            kind: LinkKind::Navigation,
        });
    }

    links
}

/// True when `url` is http(s) and shares the base URL's authority
fn is_same_site(url: &Url, base: &Url) -> bool {
    if url.scheme() != "http" && url.scheme() != "https" {
        return false;
    }

    url.host_str() == base.host_str() && url.port_or_known_default() == base.port_or_known_default()
}
