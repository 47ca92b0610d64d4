use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::command::{JobId, JobKind, StudioId};

/// Metadata envelope attached to every job event.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EventMeta {
    pub version: u16,
    pub correlation_id: Uuid,
    pub studio_id: StudioId,
    pub timestamp: DateTime<Utc>,
}

impl EventMeta {
    pub fn new(studio_id: StudioId, correlation_id: Option<Uuid>) -> Self {
        Self {
            version: 1,
            correlation_id: correlation_id.unwrap_or_else(Uuid::now_v7),
            studio_id,
            timestamp: Utc::now(),
        }
    }
}

/// Job lifecycle event with metadata and payload.
#[derive(Clone, Debug)]
pub struct JobEvent {
    pub meta: EventMeta,
    pub payload: JobEventPayload,
}

/// Event payload emitted for job lifecycle transitions.
#[derive(Clone, Debug)]
#[non_exhaustive]
pub enum JobEventPayload {
    /// Job was admitted into a studio worker's queue.
    Submitted { job_id: JobId, kind: JobKind },
    /// The worker began executing the job.
    Started { job_id: JobId, kind: JobKind },
    /// Job reached the `Succeeded` terminal state.
    Completed { job_id: JobId, kind: JobKind },
    /// Job reached the `Failed` terminal state.
    Failed {
        job_id: JobId,
        kind: JobKind,
        error: String,
    },
}

/// In-process event bus for job lifecycle events, using a tokio broadcast
/// channel.
///
/// Purely observational: publishing never blocks, and with no subscribers
/// events are dropped. A subscriber that lags behind receives
/// `RecvError::Lagged` without ever blocking the publishing worker, so the
/// bus cannot affect dispatch semantics.
pub struct InProcEventBus {
    sender: broadcast::Sender<JobEvent>,
    capacity: usize,
}

impl std::fmt::Debug for InProcEventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InProcEventBus")
            .field("capacity", &self.capacity)
            .field("subscribers", &self.sender.receiver_count())
            .finish()
    }
}

impl InProcEventBus {
    /// Create a new event bus buffering up to `capacity` events per
    /// subscriber before old ones are dropped.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender, capacity }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Publish an event to all subscribers. Non-blocking; silently a no-op
    /// when nobody is subscribed.
    pub fn publish(&self, event: JobEvent) {
        let _ = self.sender.send(event);
    }

    /// Subscribe to job lifecycle events published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<JobEvent> {
        self.sender.subscribe()
    }
}
