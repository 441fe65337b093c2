//! Task queue, dispatcher, and worker
//!
//! [`CrawlService`] is the submission and query surface: it owns the task
//! registry and feeds a bounded queue. [`CrawlWorker`] drains that queue with
//! strictly sequential execution: one pipeline runs to a terminal status
//! before the next task starts, bounding resource usage to a single active
//! fetch session.
//!
//! Both halves are explicit objects constructed once at process start and
//! passed where needed; there is no ambient global state. The registry
//! supports concurrent snapshot reads while the worker mutates the one task
//! it currently owns.

use crate::config::CrawlConfig;
use crate::events::EventSink;
use crate::fetch::Fetcher;
use crate::pipeline::CrawlPipeline;
use crate::task::{FetchRecord, NavLink, Task, TaskId, TaskSnapshot, TaskStats, TaskSummary};
use crate::{AtlasError, Result};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tokio::sync::mpsc;

/// Default bound of the pending-task queue
pub const DEFAULT_QUEUE_CAPACITY: usize = 64;

type Registry = Arc<RwLock<HashMap<TaskId, Arc<RwLock<Task>>>>>;

/// Results-only view of a task, for result queries
#[derive(Debug, Clone, Serialize)]
pub struct TaskResults {
    pub results: Vec<FetchRecord>,
    pub navigation: Vec<NavLink>,
    pub stats: TaskStats,
}

/// Submission and query surface for crawl tasks
///
/// Cloneable and cheap to share; all clones feed the same worker.
#[derive(Clone)]
pub struct CrawlService {
    registry: Registry,
    tx: mpsc::Sender<Arc<RwLock<Task>>>,
    capacity: usize,
}

/// The single background worker draining the task queue
pub struct CrawlWorker {
    rx: mpsc::Receiver<Arc<RwLock<Task>>>,
    registry: Registry,
    fetcher: Arc<dyn Fetcher>,
    sink: Arc<dyn EventSink>,
}

/// Creates a connected service/worker pair
///
/// The worker must be driven (typically `tokio::spawn(worker.run())`) for
/// submitted tasks to execute. Dropping the service (and every clone of it)
/// shuts the worker down after it finishes the queued tasks.
pub fn crawl_service(
    fetcher: Arc<dyn Fetcher>,
    sink: Arc<dyn EventSink>,
    queue_capacity: usize,
) -> (CrawlService, CrawlWorker) {
    let (tx, rx) = mpsc::channel(queue_capacity);
    let registry: Registry = Arc::new(RwLock::new(HashMap::new()));

    let service = CrawlService {
        registry: registry.clone(),
        tx,
        capacity: queue_capacity,
    };
    let worker = CrawlWorker {
        rx,
        registry,
        fetcher,
        sink,
    };

    (service, worker)
}

impl CrawlService {
    /// Submits a new crawl job
    ///
    /// Validates the configuration, allocates an id, registers the task
    /// (immediately visible to queries), and enqueues it. Never blocks on
    /// pipeline execution; a full queue rejects the submission.
    pub fn submit(&self, config: CrawlConfig) -> Result<TaskId> {
        crate::config::validate(&config)?;

        let id = TaskId::new();
        let task = Arc::new(RwLock::new(Task::new(id, config)));

        self.registry.write().unwrap().insert(id, task.clone());

        if let Err(e) = self.tx.try_send(task) {
            // Keep the registry consistent with the queue
            self.registry.write().unwrap().remove(&id);
            return match e {
                mpsc::error::TrySendError::Full(_) => Err(AtlasError::QueueFull {
                    capacity: self.capacity,
                }),
                mpsc::error::TrySendError::Closed(_) => Err(AtlasError::QueueClosed),
            };
        }

        tracing::info!("Task {} submitted", id);
        Ok(id)
    }

    /// Returns the full snapshot of a task, including mid-run partial results
    pub fn snapshot(&self, id: TaskId) -> Result<TaskSnapshot> {
        self.with_task(id, |task| task.snapshot())
    }

    /// Returns the results-only view of a task
    pub fn results(&self, id: TaskId) -> Result<TaskResults> {
        self.with_task(id, |task| TaskResults {
            results: task.results().to_vec(),
            navigation: task.navigation().to_vec(),
            stats: task.stats(),
        })
    }

    /// Lists all known tasks
    pub fn list(&self) -> Vec<TaskSummary> {
        let registry = self.registry.read().unwrap();
        registry
            .values()
            .map(|task| task.read().unwrap().summary())
            .collect()
    }

    fn with_task<R>(&self, id: TaskId, f: impl FnOnce(&Task) -> R) -> Result<R> {
        let registry = self.registry.read().unwrap();
        let task = registry
            .get(&id)
            .ok_or_else(|| AtlasError::TaskNotFound { id: id.to_string() })?;
        let task = task.read().unwrap();
        Ok(f(&task))
    }
}

impl CrawlWorker {
    /// Runs the worker loop until the queue closes
    ///
    /// Each task's pipeline is executed inside its own spawned task so that a
    /// panic is contained: the panicking task is marked failed and the loop
    /// continues with the next one.
    pub async fn run(mut self) {
        tracing::info!("Crawl worker started");

        while let Some(task) = self.rx.recv().await {
            let id = task.read().unwrap().id();
            tracing::info!("Worker executing task {}", id);

            let pipeline =
                CrawlPipeline::new(task.clone(), self.fetcher.clone(), self.sink.clone());
            let handle = tokio::spawn(async move { pipeline.run().await });

            if let Err(e) = handle.await {
                tracing::error!("Pipeline for task {} panicked: {}", id, e);
                let event = task
                    .write()
                    .unwrap()
                    .fail(format!("Pipeline panicked: {}", e));
                self.sink.publish(event);
            }
        }

        tracing::info!(
            "Crawl worker stopped ({} task(s) in registry)",
            self.registry.read().unwrap().len()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::NullSink;
    use crate::fetch::{DiscoverOptions, Discovery, FetchOutcome, PageFetchOptions};
    use crate::task::TaskStatus;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Fetcher that answers success for everything and records call order
    #[derive(Default)]
    struct OrderTrackingFetcher {
        calls: Mutex<Vec<String>>,
    }

    impl OrderTrackingFetcher {
        fn outcome(url: &str) -> FetchOutcome {
            FetchOutcome {
                success: true,
                url: url.to_string(),
                title: Some("Page".to_string()),
                description: None,
                html_content: Some("content".to_string()),
                extracted: None,
                links: vec![],
                error_message: None,
            }
        }
    }

    #[async_trait]
    impl Fetcher for OrderTrackingFetcher {
        async fn fetch_one(&self, url: &str, _options: &PageFetchOptions) -> FetchOutcome {
            self.calls.lock().unwrap().push(url.to_string());
            Self::outcome(url)
        }

        async fn discover(&self, start_url: &str, _options: &DiscoverOptions) -> Discovery {
            self.calls.lock().unwrap().push(start_url.to_string());
            Discovery {
                seed: Self::outcome(start_url),
                frontier: vec![start_url.to_string()],
            }
        }
    }

    fn config_for(url: &str) -> CrawlConfig {
        crate::config::parse_config(&format!(r#"start-url = "{}""#, url)).unwrap()
    }

    async fn wait_terminal(service: &CrawlService, id: TaskId) -> TaskSnapshot {
        loop {
            let snapshot = service.snapshot(id).unwrap();
            if snapshot.status.is_terminal() {
                return snapshot;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    #[tokio::test]
    async fn test_submitted_task_visible_immediately() {
        let (service, _worker) = crawl_service(
            Arc::new(OrderTrackingFetcher::default()),
            Arc::new(NullSink),
            4,
        );

        // Worker not running: the task stays pending but is queryable
        let id = service.submit(config_for("https://a.com/")).unwrap();
        let snapshot = service.snapshot(id).unwrap();
        assert_eq!(snapshot.status, TaskStatus::Pending);
        assert_eq!(snapshot.progress, 0);
    }

    #[tokio::test]
    async fn test_unknown_id_is_not_found() {
        let (service, _worker) = crawl_service(
            Arc::new(OrderTrackingFetcher::default()),
            Arc::new(NullSink),
            4,
        );

        let result = service.snapshot(TaskId::new());
        assert!(matches!(result, Err(AtlasError::TaskNotFound { .. })));
    }

    #[tokio::test]
    async fn test_invalid_config_rejected_at_submission() {
        let (service, _worker) = crawl_service(
            Arc::new(OrderTrackingFetcher::default()),
            Arc::new(NullSink),
            4,
        );

        let mut config = config_for("https://a.com/");
        config.max_pages = 0;
        let result = service.submit(config);
        assert!(matches!(result, Err(AtlasError::Config(_))));
        assert!(service.list().is_empty());
    }

    #[tokio::test]
    async fn test_full_queue_rejects_submission() {
        let (service, _worker) = crawl_service(
            Arc::new(OrderTrackingFetcher::default()),
            Arc::new(NullSink),
            1,
        );

        service.submit(config_for("https://a.com/")).unwrap();
        let result = service.submit(config_for("https://b.com/"));
        assert!(matches!(result, Err(AtlasError::QueueFull { capacity: 1 })));

        // The rejected task is not left dangling in the registry
        assert_eq!(service.list().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_tasks_execute_strictly_sequentially() {
        let fetcher = Arc::new(OrderTrackingFetcher::default());
        let (service, worker) = crawl_service(fetcher.clone(), Arc::new(NullSink), 8);
        tokio::spawn(worker.run());

        let id_a = service.submit(config_for("https://a.com/")).unwrap();
        let id_b = service.submit(config_for("https://b.com/")).unwrap();

        let snap_a = wait_terminal(&service, id_a).await;
        let snap_b = wait_terminal(&service, id_b).await;
        assert_eq!(snap_a.status, TaskStatus::Completed);
        assert_eq!(snap_b.status, TaskStatus::Completed);

        // A finished before B started
        assert!(snap_a.ended_at.unwrap() <= snap_b.started_at.unwrap());

        // Every fetch for A happened before any fetch for B
        let calls = fetcher.calls.lock().unwrap();
        let last_a = calls.iter().rposition(|u| u.contains("a.com")).unwrap();
        let first_b = calls.iter().position(|u| u.contains("b.com")).unwrap();
        assert!(last_a < first_b, "calls interleaved: {:?}", *calls);
    }

    #[tokio::test(start_paused = true)]
    async fn test_results_query_after_completion() {
        let fetcher = Arc::new(OrderTrackingFetcher::default());
        let (service, worker) = crawl_service(fetcher, Arc::new(NullSink), 8);
        tokio::spawn(worker.run());

        let id = service.submit(config_for("https://a.com/")).unwrap();
        wait_terminal(&service, id).await;

        let results = service.results(id).unwrap();
        assert_eq!(results.stats.crawled, results.results.len());
        assert_eq!(results.results.len(), 1);
    }
}
