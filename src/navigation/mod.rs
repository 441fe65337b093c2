//! Navigation extraction and merging
//!
//! This module turns raw navigation HTML fragments into normalized
//! [`NavLink`] records and merges candidates from many pages into one
//! deduplicated, sorted navigation structure.

mod extractor;

pub use extractor::extract_nav_links;

use crate::task::NavLink;
use std::collections::HashMap;

/// Merges navigation link candidates into a final navigation sequence
///
/// Deduplication is last-write-wins keyed by URL: when the same URL was
/// discovered from multiple pages, the later candidate's title survives.
/// The final order is lexicographic by title, so merging is idempotent.
pub fn merge_nav_links(candidates: Vec<NavLink>) -> Vec<NavLink> {
    let mut by_url: HashMap<String, NavLink> = HashMap::new();
    for candidate in candidates {
        by_url.insert(candidate.url.clone(), candidate);
    }

    let mut merged: Vec<NavLink> = by_url.into_values().collect();
    merged.sort_by(|a, b| a.title.cmp(&b.title).then_with(|| a.url.cmp(&b.url)));
    merged
}
