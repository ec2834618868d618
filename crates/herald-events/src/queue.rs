//! Name-addressed handoff onto the background processing queues.
//!
//! A message is addressed by a `(Processor, QueueName)` pair: the processor
//! names the worker pool that handles the job, the queue names the backing
//! store the job waits in. The service serializes typed payloads into the
//! queue's byte form; the queue system itself lives outside this crate.

use std::{fmt, time::Duration};

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use herald_core::models::{EventDeliveryId, ProjectId};

/// Worker pool a queued job is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Processor {
    /// Fan-out worker that materializes deliveries for a new event.
    CreateEvent,

    /// Fan-out worker for events carrying inline endpoint and subscription
    /// material.
    CreateDynamicEvent,

    /// Dispatch worker that sends a scheduled delivery.
    Event,
}

impl fmt::Display for Processor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CreateEvent => write!(f, "create_event"),
            Self::CreateDynamicEvent => write!(f, "create_dynamic_event"),
            Self::Event => write!(f, "event"),
        }
    }
}

/// Backing queue a job is stored in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueName {
    /// Newly authored events awaiting fan-out.
    CreateEvent,

    /// Scheduled deliveries awaiting dispatch.
    Event,
}

impl fmt::Display for QueueName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CreateEvent => write!(f, "create_event"),
            Self::Event => write!(f, "event"),
        }
    }
}

/// A unit of queued work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    /// Stable id, reused on redelivery so consumers can deduplicate.
    pub id: String,

    /// Serialized payload in the queue's byte form.
    pub payload: Bytes,

    /// Delay before the job becomes visible to workers.
    pub delay: Option<Duration>,
}

/// Queue payload referencing a delivery to (re)dispatch.
///
/// Dispatch workers load the full delivery themselves; the reference keeps
/// queue entries small and always-fresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventDeliveryRef {
    /// Delivery to dispatch.
    pub event_delivery_id: EventDeliveryId,

    /// Project the delivery belongs to.
    pub project_id: ProjectId,
}

/// Failure raised by a queue writer.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct QueueError(pub String);

impl QueueError {
    /// Creates an error from any message.
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Write half of the queue system consumed by the event service.
#[async_trait]
pub trait Queuer: Send + Sync {
    /// Enqueues `job` for `processor` onto `queue`.
    ///
    /// Failures propagate verbatim; the service decides whether to surface
    /// or swallow them per call site.
    async fn write(&self, processor: Processor, queue: QueueName, job: Job)
        -> Result<(), QueueError>;
}

pub mod mock {
    //! Recording queue writer for tests.

    use tokio::sync::RwLock;

    use super::{Job, Processor, QueueError, QueueName, Queuer};
    use async_trait::async_trait;

    /// A single recorded queue write.
    #[derive(Debug, Clone)]
    pub struct QueuedJob {
        /// Processor the job was addressed to.
        pub processor: Processor,
        /// Queue the job was written onto.
        pub queue: QueueName,
        /// The job itself.
        pub job: Job,
    }

    /// In-memory queue writer that records writes and can fail on demand.
    #[derive(Default)]
    pub struct MockQueuer {
        writes: RwLock<Vec<QueuedJob>>,
        write_error: RwLock<Option<String>>,
    }

    impl MockQueuer {
        /// Creates a recording queue with no scripted failures.
        pub fn new() -> Self {
            Self::default()
        }

        /// Makes the next write fail with `message`. Single-shot.
        pub async fn inject_write_error(&self, message: impl Into<String>) {
            *self.write_error.write().await = Some(message.into());
        }

        /// Returns every recorded write in order.
        pub async fn writes(&self) -> Vec<QueuedJob> {
            self.writes.read().await.clone()
        }

        /// Returns the number of successful writes.
        pub async fn write_count(&self) -> usize {
            self.writes.read().await.len()
        }
    }

    #[async_trait]
    impl Queuer for MockQueuer {
        async fn write(
            &self,
            processor: Processor,
            queue: QueueName,
            job: Job,
        ) -> Result<(), QueueError> {
            if let Some(message) = self.write_error.write().await.take() {
                return Err(QueueError(message));
            }
            self.writes.write().await.push(QueuedJob { processor, queue, job });
            Ok(())
        }
    }
}
