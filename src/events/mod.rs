//! Event types and sinks for live task observation
//!
//! The state machine in `task` produces one event per mutation; the pipeline
//! hands those events to an [`EventSink`] for delivery to observers. The sink
//! is fire-and-forget: delivery is at-most-once and publishing never fails
//! from the engine's point of view.

use crate::task::{FetchRecord, TaskId, TaskStats, TaskStatus};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;

/// Severity of a task log event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// An event produced by a task mutation, delivered to observers
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TaskEvent {
    /// Status, progress, or status text changed
    TaskUpdate {
        task_id: TaskId,
        status: TaskStatus,
        progress: u8,
        status_text: String,
        stats: TaskStats,
    },

    /// A human-readable log line from the running pipeline
    Log {
        task_id: TaskId,
        timestamp: DateTime<Utc>,
        message: String,
        level: LogLevel,
    },

    /// A page was fetched and its record appended to the task
    Result {
        task_id: TaskId,
        record: FetchRecord,
    },
}

/// Destination for task events
///
/// Implementations must not block and must not fail: a sink that cannot
/// deliver an event drops it silently. The transport layer (e.g. a WebSocket
/// hub) subscribes on the other side.
pub trait EventSink: Send + Sync {
    fn publish(&self, event: TaskEvent);
}

/// An event sink backed by a tokio broadcast channel
///
/// Observers subscribe via [`BroadcastSink::subscribe`]; lagging or absent
/// receivers lose events, which matches the at-most-once delivery contract.
pub struct BroadcastSink {
    tx: broadcast::Sender<TaskEvent>,
}

impl BroadcastSink {
    /// Creates a sink whose channel buffers up to `capacity` events per receiver
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Opens a new subscription to the event stream
    pub fn subscribe(&self) -> broadcast::Receiver<TaskEvent> {
        self.tx.subscribe()
    }
}

impl EventSink for BroadcastSink {
    fn publish(&self, event: TaskEvent) {
        // send only fails when there are no receivers; that is fine
        let _ = self.tx.send(event);
    }
}

/// A sink that discards every event
///
/// Useful when running the engine without observers.
#[derive(Debug, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn publish(&self, _event: TaskEvent) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_broadcast_sink_delivers_to_subscriber() {
        let sink = BroadcastSink::new(16);
        let mut rx = sink.subscribe();

        let task_id = TaskId::new();
        sink.publish(TaskEvent::Log {
            task_id,
            timestamp: Utc::now(),
            message: "hello".to_string(),
            level: LogLevel::Info,
        });

        match rx.try_recv().unwrap() {
            TaskEvent::Log { message, .. } => assert_eq!(message, "hello"),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_broadcast_sink_without_subscribers_does_not_panic() {
        let sink = BroadcastSink::new(16);
        sink.publish(TaskEvent::Log {
            task_id: TaskId::new(),
            timestamp: Utc::now(),
            message: "dropped".to_string(),
            level: LogLevel::Warning,
        });
    }

    #[test]
    fn test_event_serializes_with_kind_tag() {
        let event = TaskEvent::Log {
            task_id: TaskId::new(),
            timestamp: Utc::now(),
            message: "x".to_string(),
            level: LogLevel::Error,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["kind"], "log");
        assert_eq!(json["level"], "error");
    }
}
