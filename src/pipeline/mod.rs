//! The three-phase crawl pipeline
//!
//! One pipeline drives one task from `Running` to a terminal status:
//!
//! 1. **Discover** - one deep fetch against the start URL collects the full
//!    frontier of site pages (fatal on failure)
//! 2. **FetchAll** - every discovered URL is fetched once, sequentially, with
//!    a politeness delay; individual failures are counted, never fatal
//! 3. **BuildNavigation** - navigation fragments from all fetched pages are
//!    extracted, merged last-write-wins by URL, and sorted by title
//!
//! Each state mutation produces exactly one event, published to the sink
//! right after the task's write lock is released.

use crate::events::{EventSink, LogLevel};
use crate::fetch::{DiscoverOptions, Fetcher, PageFetchOptions};
use crate::navigation::{extract_nav_links, merge_nav_links};
use crate::task::{FetchRecord, NavLink, Task, TaskStatus};
use crate::{AtlasError, Result};
use std::sync::{Arc, RwLock};
use std::time::Duration;
use url::Url;

/// Fixed delay between page fetches in the fetch-all phase
const FETCH_DELAY: Duration = Duration::from_millis(500);

// Phase-anchored progress checkpoints
const PROGRESS_DISCOVER_START: u8 = 10;
const PROGRESS_DISCOVER_DONE: u8 = 30;
const PROGRESS_FETCH_START: u8 = 40;
const PROGRESS_FETCH_DONE: u8 = 90;
const PROGRESS_NAVIGATION: u8 = 95;

/// Executes one task's crawl against a fetcher, publishing events to a sink
pub struct CrawlPipeline {
    task: Arc<RwLock<Task>>,
    fetcher: Arc<dyn Fetcher>,
    sink: Arc<dyn EventSink>,
}

impl CrawlPipeline {
    pub fn new(
        task: Arc<RwLock<Task>>,
        fetcher: Arc<dyn Fetcher>,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            task,
            fetcher,
            sink,
        }
    }

    /// Runs all phases to completion or first unrecoverable error
    ///
    /// Unrecoverable errors are absorbed into the task (status `Failed`,
    /// error recorded); they are not propagated so the worker loop can move
    /// on to the next task regardless.
    pub async fn run(&self) {
        self.update(TaskStatus::Running, Some(0), Some("Initializing crawl"));
        self.log("Crawl task started", LogLevel::Info);

        let outcome = self.execute().await;

        match outcome {
            Ok(()) => {
                self.update(TaskStatus::Completed, Some(100), Some("Crawl complete"));
                self.log("Crawl task finished", LogLevel::Success);
            }
            Err(e) => {
                let message = e.to_string();
                tracing::error!("Task failed: {}", message);
                self.log(format!("Task failed: {}", message), LogLevel::Error);
                let event = self.with_task(|t| t.fail(&message));
                self.sink.publish(event);
            }
        }
    }

    /// The phase sequence; stops at the first fatal error
    async fn execute(&self) -> Result<()> {
        self.discover().await?;
        self.fetch_all().await?;
        self.build_navigation();
        Ok(())
    }

    /// Phase 1: discover the site's structure from the start URL
    ///
    /// The discovery call returns the whole frontier up front; a seed fetch
    /// failure fails the entire task.
    async fn discover(&self) -> Result<()> {
        self.update(
            TaskStatus::Running,
            Some(PROGRESS_DISCOVER_START),
            Some("Discovering site structure"),
        );
        self.log("Starting site discovery", LogLevel::Info);

        let (start_url, options) = self.with_task(|t| {
            (
                t.config().start_url.clone(),
                DiscoverOptions::from_config(t.config()),
            )
        });

        let discovery = self.fetcher.discover(&start_url, &options).await;

        if !discovery.seed.success {
            return Err(AtlasError::Unreachable {
                url: start_url,
                message: discovery
                    .seed
                    .error_message
                    .unwrap_or_else(|| "unknown error".to_string()),
            });
        }

        self.log(
            format!("Discovered site structure from {}", start_url),
            LogLevel::Info,
        );

        let record = FetchRecord::from_outcome(&discovery.seed);
        let events = self.with_task(|t| {
            t.record_discovered(
                std::iter::once(start_url.clone()).chain(discovery.frontier.iter().cloned()),
            );
            let result_event = t.add_result(record);
            let update_event = t.update_status(
                TaskStatus::Running,
                Some(PROGRESS_DISCOVER_DONE),
                Some("Site discovery complete"),
            );
            [result_event, update_event]
        });
        for event in events {
            self.sink.publish(event);
        }

        let discovered = self.with_task(|t| t.discovered_count());
        self.log(
            format!("Discovery found {} page(s)", discovered),
            LogLevel::Info,
        );

        Ok(())
    }

    /// Phase 2: fetch every discovered URL not already fetched
    ///
    /// Single attempt per URL; a failure is logged, counted, and skipped.
    async fn fetch_all(&self) -> Result<()> {
        self.update(
            TaskStatus::Running,
            Some(PROGRESS_FETCH_START),
            Some("Fetching all discovered pages"),
        );

        let (pending, options) = self.with_task(|t| {
            let pending: Vec<String> = t
                .discovered_urls()
                .filter(|url| !t.is_fetched(url))
                .map(|url| url.to_string())
                .collect();
            (pending, PageFetchOptions::from_config(t.config()))
        });

        let total = pending.len();
        if total == 0 {
            self.log("No further pages to fetch", LogLevel::Info);
            return Ok(());
        }

        self.log(format!("Fetching {} page(s)", total), LogLevel::Info);

        for (index, url) in pending.iter().enumerate() {
            let progress = PROGRESS_FETCH_START + ((index * 50) / total) as u8;
            self.update(
                TaskStatus::Running,
                Some(progress),
                Some(&format!("Fetching ({}/{}): {}", index + 1, total, url)),
            );

            let outcome = self.fetcher.fetch_one(url, &options).await;

            if outcome.success {
                self.log(format!("Fetched {}", url), LogLevel::Info);
                let record = FetchRecord::from_outcome(&outcome);
                let event = self.with_task(|t| t.add_result(record));
                self.sink.publish(event);
            } else {
                let reason = outcome
                    .error_message
                    .as_deref()
                    .unwrap_or("unknown error")
                    .to_string();
                self.log(
                    format!("Fetch failed: {} - {}", url, reason),
                    LogLevel::Warning,
                );
                self.with_task(|t| t.record_fetch_failure());
            }

            // Politeness throttle between requests
            tokio::time::sleep(FETCH_DELAY).await;
        }

        self.update(
            TaskStatus::Running,
            Some(PROGRESS_FETCH_DONE),
            Some("Content fetch complete"),
        );

        Ok(())
    }

    /// Phase 3: merge navigation fragments from all fetched pages
    ///
    /// Per-record problems are skipped with a log; this phase never fails.
    fn build_navigation(&self) {
        self.update(
            TaskStatus::Running,
            Some(PROGRESS_NAVIGATION),
            Some("Building navigation structure"),
        );
        self.log("Building navigation structure", LogLevel::Info);

        let sources: Vec<(String, String)> = self.with_task(|t| {
            t.results()
                .iter()
                .filter_map(|record| {
                    record
                        .navigation_content
                        .as_ref()
                        .filter(|fragment| !fragment.trim().is_empty())
                        .map(|fragment| (record.url.clone(), fragment.clone()))
                })
                .collect()
        });

        let mut candidates: Vec<NavLink> = Vec::new();
        for (url, fragment) in sources {
            let base = match Url::parse(&url) {
                Ok(u) => u,
                Err(e) => {
                    self.log(
                        format!("Skipping navigation from {}: {}", url, e),
                        LogLevel::Warning,
                    );
                    continue;
                }
            };
            candidates.extend(extract_nav_links(&fragment, &base));
        }

        let merged = merge_nav_links(candidates);
        let count = merged.len();
        self.with_task(|t| t.set_navigation(merged));

        self.log(
            format!("Navigation structure built with {} entries", count),
            LogLevel::Info,
        );
    }

    /// Runs a closure against the task under its write lock
    ///
    /// The lock is never held across an await point, so readers always get a
    /// consistent snapshot between mutations.
    fn with_task<R>(&self, f: impl FnOnce(&mut Task) -> R) -> R {
        let mut task = self.task.write().unwrap();
        f(&mut task)
    }

    /// Applies a status update and publishes the resulting event
    fn update(&self, status: TaskStatus, progress: Option<u8>, text: Option<&str>) {
        let event = self.with_task(|t| t.update_status(status, progress, text));
        self.sink.publish(event);
    }

    /// Emits a log event
    fn log(&self, message: impl Into<String>, level: LogLevel) {
        let event = self.task.read().unwrap().add_log(message, level);
        self.sink.publish(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::TaskEvent;
    use crate::fetch::{Discovery, FetchOutcome};
    use crate::task::TaskId;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// In-memory fetcher returning scripted outcomes per URL
    struct ScriptedFetcher {
        pages: HashMap<String, FetchOutcome>,
        frontier: Vec<String>,
    }

    impl ScriptedFetcher {
        fn new(frontier: Vec<&str>) -> Self {
            Self {
                pages: HashMap::new(),
                frontier: frontier.into_iter().map(|s| s.to_string()).collect(),
            }
        }

        fn page(mut self, url: &str, outcome: FetchOutcome) -> Self {
            self.pages.insert(url.to_string(), outcome);
            self
        }
    }

    #[async_trait]
    impl Fetcher for ScriptedFetcher {
        async fn fetch_one(&self, url: &str, _options: &PageFetchOptions) -> FetchOutcome {
            self.pages
                .get(url)
                .cloned()
                .unwrap_or_else(|| FetchOutcome::failure(url, "not scripted"))
        }

        async fn discover(&self, start_url: &str, _options: &DiscoverOptions) -> Discovery {
            Discovery {
                seed: self
                    .pages
                    .get(start_url)
                    .cloned()
                    .unwrap_or_else(|| FetchOutcome::failure(start_url, "not scripted")),
                frontier: self.frontier.clone(),
            }
        }
    }

    /// Sink that records every published event
    #[derive(Default)]
    struct RecordingSink {
        events: Mutex<Vec<TaskEvent>>,
    }

    impl EventSink for RecordingSink {
        fn publish(&self, event: TaskEvent) {
            self.events.lock().unwrap().push(event);
        }
    }

    fn success_outcome(url: &str, nav: Option<&str>) -> FetchOutcome {
        let extracted = nav.map(|fragment| {
            serde_json::json!({
                "navigation": fragment,
                "navigation_links": [],
            })
            .to_string()
        });
        FetchOutcome {
            success: true,
            url: url.to_string(),
            title: Some("Page".to_string()),
            description: None,
            html_content: Some("page content here".to_string()),
            extracted,
            links: vec![],
            error_message: None,
        }
    }

    fn pipeline_for(
        fetcher: ScriptedFetcher,
        start_url: &str,
    ) -> (CrawlPipeline, Arc<RwLock<Task>>, Arc<RecordingSink>) {
        let config =
            crate::config::parse_config(&format!(r#"start-url = "{}""#, start_url)).unwrap();
        let task = Arc::new(RwLock::new(Task::new(TaskId::new(), config)));
        let sink = Arc::new(RecordingSink::default());
        let pipeline = CrawlPipeline::new(task.clone(), Arc::new(fetcher), sink.clone());
        (pipeline, task, sink)
    }

    #[tokio::test(start_paused = true)]
    async fn test_happy_path_completes() {
        let seed = "https://a.com/";
        let fetcher = ScriptedFetcher::new(vec![seed, "https://a.com/about", "https://a.com/docs"])
            .page(seed, success_outcome(seed, Some(r#"<a href="/about">About</a>"#)))
            .page("https://a.com/about", success_outcome("https://a.com/about", None))
            .page("https://a.com/docs", success_outcome("https://a.com/docs", None));

        let (pipeline, task, _sink) = pipeline_for(fetcher, seed);
        pipeline.run().await;

        let task = task.read().unwrap();
        assert_eq!(task.status(), TaskStatus::Completed);
        assert_eq!(task.progress(), 100);
        assert_eq!(task.stats().discovered, 3);
        assert_eq!(task.stats().crawled, 3);
        assert_eq!(task.stats().failed, 0);
        assert_eq!(task.navigation().len(), 1);
        assert_eq!(task.navigation()[0].url, "https://a.com/about");
    }

    #[tokio::test(start_paused = true)]
    async fn test_seed_failure_fails_task() {
        let seed = "https://down.example/";
        let fetcher = ScriptedFetcher::new(vec![])
            .page(seed, FetchOutcome::failure(seed, "Connection refused"));

        let (pipeline, task, _sink) = pipeline_for(fetcher, seed);
        pipeline.run().await;

        let task = task.read().unwrap();
        assert_eq!(task.status(), TaskStatus::Failed);
        assert!(task.results().is_empty());
        let error = task.error().unwrap();
        assert!(error.contains("unreachable"), "error was: {}", error);
        assert!(error.contains("Connection refused"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_failures_are_isolated() {
        let seed = "https://a.com/";
        let urls: Vec<String> = (0..9).map(|i| format!("https://a.com/p{}", i)).collect();
        let mut frontier: Vec<&str> = vec![seed];
        frontier.extend(urls.iter().map(|s| s.as_str()));

        let mut fetcher =
            ScriptedFetcher::new(frontier).page(seed, success_outcome(seed, None));
        for (i, url) in urls.iter().enumerate() {
            // Three of the ten discovered pages fail
            let outcome = if i < 3 {
                FetchOutcome::failure(url, "HTTP 500")
            } else {
                success_outcome(url, None)
            };
            fetcher = fetcher.page(url, outcome);
        }

        let (pipeline, task, _sink) = pipeline_for(fetcher, seed);
        pipeline.run().await;

        let task = task.read().unwrap();
        assert_eq!(task.status(), TaskStatus::Completed);
        assert_eq!(task.stats().failed, 3);
        assert_eq!(task.stats().crawled, 7);
    }

    #[tokio::test(start_paused = true)]
    async fn test_seed_not_refetched_in_phase_two() {
        let seed = "https://a.com/";
        let fetcher = ScriptedFetcher::new(vec![seed])
            .page(seed, success_outcome(seed, None));

        let (pipeline, task, _sink) = pipeline_for(fetcher, seed);
        pipeline.run().await;

        let task = task.read().unwrap();
        assert_eq!(task.status(), TaskStatus::Completed);
        // Only the discovery-phase record; phase 2 skipped the fetched seed
        assert_eq!(task.results().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_progress_never_decreases() {
        let seed = "https://a.com/";
        let fetcher = ScriptedFetcher::new(vec![seed, "https://a.com/x"])
            .page(seed, success_outcome(seed, None))
            .page("https://a.com/x", success_outcome("https://a.com/x", None));

        let (pipeline, _task, sink) = pipeline_for(fetcher, seed);
        pipeline.run().await;

        let events = sink.events.lock().unwrap();
        let mut last = 0u8;
        for event in events.iter() {
            if let TaskEvent::TaskUpdate { progress, .. } = event {
                assert!(*progress >= last, "progress went {} -> {}", last, progress);
                last = *progress;
            }
        }
        assert_eq!(last, 100);
    }

    #[tokio::test(start_paused = true)]
    async fn test_navigation_last_write_wins_across_pages() {
        let seed = "https://a.com/";
        let other = "https://a.com/other";
        let fetcher = ScriptedFetcher::new(vec![seed, other])
            .page(
                seed,
                success_outcome(seed, Some(r#"<a href="/x">Early Title</a>"#)),
            )
            .page(
                other,
                success_outcome(other, Some(r#"<a href="/x">Late Title</a>"#)),
            );

        let (pipeline, task, _sink) = pipeline_for(fetcher, seed);
        pipeline.run().await;

        let task = task.read().unwrap();
        assert_eq!(task.navigation().len(), 1);
        assert_eq!(task.navigation()[0].title, "Late Title");
    }

    #[tokio::test(start_paused = true)]
    async fn test_every_update_event_is_published() {
        let seed = "https://a.com/";
        let fetcher = ScriptedFetcher::new(vec![seed])
            .page(seed, success_outcome(seed, None));

        let (pipeline, _task, sink) = pipeline_for(fetcher, seed);
        pipeline.run().await;

        let events = sink.events.lock().unwrap();
        let updates = events
            .iter()
            .filter(|e| matches!(e, TaskEvent::TaskUpdate { .. }))
            .count();
        let results = events
            .iter()
            .filter(|e| matches!(e, TaskEvent::Result { .. }))
            .count();

        // Init, discover start/done, fetch start, nav, completed at minimum
        assert!(updates >= 6, "only {} update events", updates);
        assert_eq!(results, 1);
    }
}
