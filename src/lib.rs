//! Nav-Atlas: a website structure mapper
//!
//! This crate implements a crawl orchestration engine: jobs are submitted as
//! configurations, queued, and executed one at a time by a background worker
//! that discovers a site's pages, fetches them, extracts navigation structure,
//! and reports live progress through an event sink.

pub mod config;
pub mod events;
pub mod fetch;
pub mod navigation;
pub mod pipeline;
pub mod service;
pub mod task;

use thiserror::Error;

/// Main error type for Nav-Atlas operations
#[derive(Debug, Error)]
pub enum AtlasError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Target unreachable: {url}: {message}")]
    Unreachable { url: String, message: String },

    #[error("Unknown task id: {id}")]
    TaskNotFound { id: String },

    #[error("Task queue is full ({capacity} pending)")]
    QueueFull { capacity: usize },

    #[error("Task queue is shut down")]
    QueueClosed,

    #[error("Pipeline panicked: {0}")]
    PipelinePanic(String),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid start URL: {0}")]
    InvalidUrl(String),
}

/// Result type alias for Nav-Atlas operations
pub type Result<T> = std::result::Result<T, AtlasError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::CrawlConfig;
pub use events::{BroadcastSink, EventSink, NullSink, TaskEvent};
pub use fetch::{Fetcher, HttpFetcher};
pub use service::{crawl_service, CrawlService, CrawlWorker};
pub use task::{Task, TaskId, TaskSnapshot, TaskStatus};
