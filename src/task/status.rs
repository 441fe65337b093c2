/// Task status definitions for the crawl job lifecycle
///
/// This module defines the states a crawl task moves through and the legality
/// of transitions between them.
use serde::Serialize;
use std::fmt;

/// Represents the current status of a crawl task
///
/// Legal transitions: `Pending -> Running -> Completed` and
/// `Running -> Failed`. There are no transitions out of a terminal status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    /// Task is registered and waiting in the queue
    Pending,

    /// Task is being executed by the worker
    Running,

    /// Task finished all pipeline phases successfully
    Completed,

    /// Task hit an unrecoverable error and was aborted
    Failed,
}

impl TaskStatus {
    /// Returns true if this is a terminal status (the task will never change again)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Returns true if a transition from `self` to `next` is legal
    pub fn can_transition_to(&self, next: TaskStatus) -> bool {
        match (self, next) {
            (Self::Pending, Self::Running) => true,
            (Self::Running, Self::Completed) => true,
            (Self::Running, Self::Failed) => true,
            // A task that never started can still be aborted by the worker
            (Self::Pending, Self::Failed) => true,
            // Self-transition carries progress/text updates while running
            (a, b) if *a == b => true,
            _ => false,
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        };
        write!(f, "{}", s)
    }
}
