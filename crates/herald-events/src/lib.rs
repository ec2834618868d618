//! Event authoring, delivery state transitions, and queue handoff.
//!
//! The event service sits between HTTP ingress and the dispatch workers: it
//! turns inbound payloads into canonical `Event` records, guards every
//! `EventDelivery` status transition, and pairs each transition that
//! schedules work with a write onto the processing queue.
//!
//! # Data Flow
//!
//! ```text
//!  ingress payload                   retry / resend call
//!        │                                  │
//!        ▼                                  ▼
//!  ┌──────────────┐                  ┌───────────────┐
//!  │  authoring   │                  │ state machine │
//!  │ (validate +  │                  │ (status and   │
//!  │  resolve)    │                  │  endpoint     │
//!  └──────┬───────┘                  │  guards)      │
//!         │                          └───────┬───────┘
//!         ▼                                  ▼
//!  ┌──────────────┐                  ┌───────────────┐
//!  │ CreateEvent  │                  │ requeue:      │
//!  │ queue        │                  │ status write  │
//!  └──────────────┘                  │ + Event queue │
//!                                    └───────────────┘
//! ```
//!
//! The requeue pairing is deliberately non-transactional; a sweeper outside
//! this crate re-enqueues deliveries stranded in `Scheduled`.
//!
//! The service owns no persistent state. Every collaborator is an interface
//! value (repositories, queue writer, search index, cache), injectable for
//! testing through the `mock` modules each abstraction ships with.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use std::time::Duration;

pub mod ingress;
pub mod queue;
pub mod repo;
pub mod search;
pub mod service;

pub use ingress::{
    CreateEventPayload, DynamicEndpoint, DynamicEventPayload, DynamicEventStub,
    DynamicSubscription, FanoutEventPayload,
};
pub use queue::{EventDeliveryRef, Job, Processor, QueueError, QueueName, Queuer};
pub use repo::{
    Cache, DeviceRepository, EndpointRepository, EventDeliveryRepository, EventRepository,
    RepoResult, SourceRepository, SubscriptionRepository,
};
pub use search::{SearchError, Searcher};
pub use service::{BatchOutcome, EventService};

/// Delay applied to requeued delivery jobs so the status write settles
/// before a worker claims the job.
pub const REQUEUE_DELAY: Duration = Duration::from_secs(1);
