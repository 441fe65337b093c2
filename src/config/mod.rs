//! Configuration module for Nav-Atlas
//!
//! This module defines the typed crawl configuration, its validation rules,
//! and TOML file loading for the CLI front-end.
//!
//! # Example
//!
//! ```no_run
//! use nav_atlas::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("crawl.toml")).unwrap();
//! println!("Crawl will use max depth: {}", config.max_depth);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    BrowserConfig, CacheMode, CrawlConfig, CrawlStrategy, FilterConfig, Viewport,
};

// Re-export parser and validation functions
pub use parser::{load_config, parse_config};
pub use validation::validate;
