//! Task state machine for crawl jobs
//!
//! This module owns one job's lifecycle: status transitions, progress,
//! accumulated results and stats, and the final navigation structure. The
//! mutators here are pure with respect to delivery: each one returns the
//! [`TaskEvent`] describing the change, and the caller decides where to
//! publish it. This keeps the state machine testable without a live
//! transport.

mod record;
mod status;

pub use record::{FetchRecord, LinkKind, NavLink, TaskStats, MAX_CONTENT_CHARS, MAX_LINKS_PER_PAGE};
pub use status::TaskStatus;

use crate::config::CrawlConfig;
use crate::events::{LogLevel, TaskEvent};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use uuid::Uuid;

/// Opaque unique identifier of a crawl task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct TaskId(Uuid);

impl TaskId {
    /// Allocates a fresh random id
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One crawl job
///
/// A task is created in `Pending` status by the dispatcher and mutated only
/// by the worker running its pipeline. Readers take snapshots; they never see
/// partially applied mutations because every mutator runs under the task's
/// write lock (held by the caller).
pub struct Task {
    id: TaskId,
    config: CrawlConfig,
    status: TaskStatus,
    progress: u8,
    status_text: String,
    stats: TaskStats,
    results: Vec<FetchRecord>,
    navigation: Vec<NavLink>,
    error: Option<String>,
    started_at: Option<DateTime<Utc>>,
    ended_at: Option<DateTime<Utc>>,

    /// URLs found during discovery; ordered so phase 2 iterates deterministically
    discovered_urls: BTreeSet<String>,

    /// URL -> index into `results`, used to skip already-fetched URLs
    fetched_urls: HashMap<String, usize>,
}

impl Task {
    /// Creates a new pending task from a validated configuration
    pub fn new(id: TaskId, config: CrawlConfig) -> Self {
        Self {
            id,
            config,
            status: TaskStatus::Pending,
            progress: 0,
            status_text: "Waiting to start".to_string(),
            stats: TaskStats::default(),
            results: Vec::new(),
            navigation: Vec::new(),
            error: None,
            started_at: None,
            ended_at: None,
            discovered_urls: BTreeSet::new(),
            fetched_urls: HashMap::new(),
        }
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn config(&self) -> &CrawlConfig {
        &self.config
    }

    pub fn status(&self) -> TaskStatus {
        self.status
    }

    pub fn progress(&self) -> u8 {
        self.progress
    }

    pub fn stats(&self) -> TaskStats {
        self.stats
    }

    pub fn results(&self) -> &[FetchRecord] {
        &self.results
    }

    pub fn navigation(&self) -> &[NavLink] {
        &self.navigation
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// The discovered frontier, in deterministic (lexicographic) order
    pub fn discovered_urls(&self) -> impl Iterator<Item = &str> {
        self.discovered_urls.iter().map(|s| s.as_str())
    }

    pub fn discovered_count(&self) -> usize {
        self.discovered_urls.len()
    }

    /// Returns the stored record for an already-fetched URL
    pub fn fetched_record(&self, url: &str) -> Option<&FetchRecord> {
        self.fetched_urls.get(url).map(|&i| &self.results[i])
    }

    pub fn is_fetched(&self, url: &str) -> bool {
        self.fetched_urls.contains_key(url)
    }

    /// Updates status, progress, and status text; the sole status mutator
    ///
    /// Progress is clamped to be monotonically non-decreasing while running.
    /// Transitions out of a terminal status are refused (the update is
    /// dropped with a warning). Entering `Running` stamps `started_at` and
    /// resets progress; entering a terminal status stamps `ended_at`.
    ///
    /// Returns the `TaskUpdate` event describing the (possibly refused)
    /// resulting state.
    pub fn update_status(
        &mut self,
        status: TaskStatus,
        progress: Option<u8>,
        status_text: Option<&str>,
    ) -> TaskEvent {
        if !self.status.can_transition_to(status) {
            tracing::warn!(
                "Refusing transition {} -> {} for task {}",
                self.status,
                status,
                self.id
            );
            return self.update_event();
        }

        if status == TaskStatus::Running && self.status == TaskStatus::Pending {
            self.started_at = Some(Utc::now());
            self.progress = progress.unwrap_or(0).min(100);
        } else if let Some(p) = progress {
            self.progress = self.progress.max(p.min(100));
        }

        if status.is_terminal() && !self.status.is_terminal() {
            self.ended_at = Some(Utc::now());
        }
        if status == TaskStatus::Completed {
            self.progress = 100;
        }

        self.status = status;
        if let Some(text) = status_text {
            self.status_text = text.to_string();
        }

        self.update_event()
    }

    /// Marks the task failed with an error message; shorthand for the
    /// terminal failure transition
    pub fn fail(&mut self, error: impl Into<String>) -> TaskEvent {
        let error = error.into();
        self.error = Some(error.clone());
        self.update_status(TaskStatus::Failed, None, Some(&error))
    }

    /// Appends a fetch record and recomputes `stats.crawled`
    ///
    /// Returns the `Result` event carrying the record.
    pub fn add_result(&mut self, record: FetchRecord) -> TaskEvent {
        self.fetched_urls
            .insert(record.url.clone(), self.results.len());
        self.results.push(record.clone());
        self.stats.crawled = self.results.len();

        TaskEvent::Result {
            task_id: self.id,
            record,
        }
    }

    /// Produces a log event without mutating task state
    ///
    /// The message is also mirrored to the tracing subscriber.
    pub fn add_log(&self, message: impl Into<String>, level: LogLevel) -> TaskEvent {
        let message = message.into();
        tracing::info!("[{}] {}", self.id, message);

        TaskEvent::Log {
            task_id: self.id,
            timestamp: Utc::now(),
            message,
            level,
        }
    }

    /// Adds URLs to the discovered frontier and updates `stats.discovered`
    pub fn record_discovered<I, S>(&mut self, urls: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for url in urls {
            self.discovered_urls.insert(url.into());
        }
        self.stats.discovered = self.discovered_urls.len();
    }

    /// Counts one failed fetch in phase 2
    pub fn record_fetch_failure(&mut self) {
        self.stats.failed += 1;
    }

    /// Stores the final merged navigation structure (written once, phase 3)
    pub fn set_navigation(&mut self, navigation: Vec<NavLink>) {
        self.navigation = navigation;
    }

    /// Builds the `TaskUpdate` event for the current state
    fn update_event(&self) -> TaskEvent {
        TaskEvent::TaskUpdate {
            task_id: self.id,
            status: self.status,
            progress: self.progress,
            status_text: self.status_text.clone(),
            stats: self.stats,
        }
    }

    /// Takes a consistent, serializable snapshot of the full task state
    pub fn snapshot(&self) -> TaskSnapshot {
        TaskSnapshot {
            task_id: self.id,
            config: self.config.clone(),
            status: self.status,
            progress: self.progress,
            status_text: self.status_text.clone(),
            stats: self.stats,
            results: self.results.clone(),
            navigation: self.navigation.clone(),
            error: self.error.clone(),
            started_at: self.started_at,
            ended_at: self.ended_at,
        }
    }

    /// Builds the short listing view of this task
    pub fn summary(&self) -> TaskSummary {
        TaskSummary {
            task_id: self.id,
            status: self.status,
            progress: self.progress,
            stats: self.stats,
            started_at: self.started_at,
        }
    }
}

/// Full serializable view of a task, returned by status queries
#[derive(Debug, Clone, Serialize)]
pub struct TaskSnapshot {
    pub task_id: TaskId,
    pub config: CrawlConfig,
    pub status: TaskStatus,
    pub progress: u8,
    pub status_text: String,
    pub stats: TaskStats,
    pub results: Vec<FetchRecord>,
    pub navigation: Vec<NavLink>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
}

/// Short per-task view used in task listings
#[derive(Debug, Clone, Serialize)]
pub struct TaskSummary {
    pub task_id: TaskId,
    pub status: TaskStatus,
    pub progress: u8,
    pub stats: TaskStats,
    pub started_at: Option<DateTime<Utc>>,
}
