//! Core domain models and strongly-typed identifiers.
//!
//! Defines projects, endpoints, events, and event deliveries together with
//! newtype ID wrappers for compile-time type safety. The status enums carry
//! the transition vocabulary enforced by the event service.

use std::{collections::HashMap, fmt};

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Strongly-typed project identifier.
///
/// Projects are addressed by opaque string ids assigned at provisioning
/// time; every repository call is scoped by one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectId(pub String);

impl ProjectId {
    /// Creates an id from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ProjectId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Strongly-typed event identifier.
///
/// Follows an authored event through persistence, queue payloads, and the
/// search index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(pub String);

impl EventId {
    /// Creates an id from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generates a fresh globally-unique id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when the id carries no characters.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for EventId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Strongly-typed endpoint identifier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EndpointId(pub String);

impl EndpointId {
    /// Creates an id from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generates a fresh globally-unique id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when the id carries no characters.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for EndpointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for EndpointId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Strongly-typed event delivery identifier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventDeliveryId(pub String);

impl EventDeliveryId {
    /// Creates an id from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generates a fresh globally-unique id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EventDeliveryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for EventDeliveryId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Strongly-typed subscription identifier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubscriptionId(pub String);

impl SubscriptionId {
    /// Creates an id from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for SubscriptionId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Retry pacing strategy applied to a project's deliveries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// Fixed delay between attempts.
    #[default]
    Linear,

    /// Delay doubles with each attempt.
    Exponential,
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Linear => write!(f, "linear"),
            Self::Exponential => write!(f, "exponential"),
        }
    }
}

/// Retry pacing configuration for failed deliveries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyConfig {
    /// How the delay between attempts grows.
    pub kind: StrategyKind,

    /// Base delay between attempts in milliseconds.
    pub duration_ms: u64,

    /// Attempts before a delivery fails permanently.
    pub retry_count: u32,
}

/// Signature header configuration.
///
/// The signing itself happens in the dispatch workers; the service only
/// carries the configuration alongside the project.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureConfig {
    /// Header name the signature is written to.
    pub header: String,

    /// Hash function identifier, e.g. `SHA256`.
    pub hash: String,
}

/// Project-level configuration applied to everything the project fans out.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Retry pacing for deliveries. Authoring requires one to be present.
    pub strategy: Option<StrategyConfig>,

    /// Signature configuration for outgoing dispatches.
    pub signature: Option<SignatureConfig>,

    /// Whether replayed requests are rejected at ingress.
    pub replay_attacks: bool,
}

/// A tenant project. Owns endpoints, authored events, and their deliveries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    /// Unique identifier for this project.
    pub uid: ProjectId,

    /// Human-readable project name.
    pub name: String,

    /// Configuration block. An event may not be authored without a valid
    /// retry strategy inside it.
    pub config: Option<ProjectConfig>,
}

impl Project {
    /// Returns the retry strategy when the configuration carries one.
    pub fn retry_strategy(&self) -> Option<&StrategyConfig> {
        self.config.as_ref().and_then(|config| config.strategy.as_ref())
    }
}

/// Endpoint lifecycle status.
///
/// Gates retry and force-resend decisions: deliveries are only forced to
/// `Active` endpoints, and an `Inactive` endpoint passes through `Pending`
/// before work is queued to it again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndpointStatus {
    /// Receiving deliveries normally.
    Active,

    /// Disabled after repeated failure; revivable through retry.
    Inactive,

    /// Revival in progress; no new work until it completes.
    Pending,

    /// Deliberately paused by an operator.
    Paused,
}

impl fmt::Display for EndpointStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active => write!(f, "active"),
            Self::Inactive => write!(f, "inactive"),
            Self::Pending => write!(f, "pending"),
            Self::Paused => write!(f, "paused"),
        }
    }
}

/// A delivery target registered under a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    /// Unique identifier for this endpoint.
    pub uid: EndpointId,

    /// Project that owns this endpoint.
    pub project_id: ProjectId,

    /// Tenant-scoped grouping key used by fan-out authoring.
    pub owner_id: String,

    /// Display title.
    pub title: String,

    /// Contact for delivery failure notices.
    pub support_email: Option<String>,

    /// Current lifecycle status.
    pub status: EndpointStatus,

    /// When this endpoint was registered.
    pub created_at: DateTime<Utc>,

    /// When configuration was last modified.
    pub updated_at: DateTime<Utc>,

    /// Soft delete timestamp.
    pub deleted_at: Option<DateTime<Utc>>,
}

/// An authored ingress event awaiting fan-out to per-endpoint deliveries.
///
/// Events are immutable once authored; deletions are soft via `deleted_at`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Unique identifier for this event.
    pub uid: EventId,

    /// Event type tag, e.g. `payment.created`.
    pub event_type: String,

    /// Project the event was authored under.
    pub project_id: ProjectId,

    /// Canonical payload bytes exactly as received.
    pub data: Vec<u8>,

    /// The same payload interpreted as UTF-8, kept for indexing and display.
    pub raw: String,

    /// Custom HTTP headers forwarded on dispatch, one value list per name.
    pub headers: HashMap<String, Vec<String>>,

    /// Endpoint count populated by the fan-out worker once subscriptions
    /// are matched. Zero at authoring time.
    pub matched_endpoints: i32,

    /// Target endpoint ids resolved at authoring time.
    pub endpoints: Vec<EndpointId>,

    /// When the event was authored.
    pub created_at: DateTime<Utc>,

    /// When the record was last touched.
    pub updated_at: DateTime<Utc>,

    /// Soft delete timestamp.
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Event {
    /// Payload as [`Bytes`] for zero-copy handoff.
    pub fn data_bytes(&self) -> Bytes {
        Bytes::from(self.data.clone())
    }
}

/// Event delivery lifecycle status.
///
/// ```text
/// Scheduled -> Processing -> Success
///                         -> Retry -> Scheduled (worker-driven)
///                         -> Failure
///                         -> Discarded
/// ```
///
/// The service re-enters `Scheduled` from `Retry`/`Failure` (user retry),
/// from `Success`/`Failure` (force resend), and from anywhere through the
/// internal requeue primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventDeliveryStatus {
    /// Queued and waiting for a dispatch worker.
    Scheduled,

    /// A worker is actively dispatching.
    Processing,

    /// Failed, waiting for its next automatic attempt.
    Retry,

    /// Delivered; terminal unless force-resent.
    Success,

    /// All attempts exhausted; recoverable through user retry.
    Failure,

    /// Dropped without dispatch, e.g. endpoint disabled mid-flight.
    Discarded,
}

impl fmt::Display for EventDeliveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scheduled => write!(f, "scheduled"),
            Self::Processing => write!(f, "processing"),
            Self::Retry => write!(f, "retry"),
            Self::Success => write!(f, "success"),
            Self::Failure => write!(f, "failure"),
            Self::Discarded => write!(f, "discarded"),
        }
    }
}

/// Audit record of a single dispatch attempt. Immutable once recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryAttempt {
    /// Unique identifier for this attempt.
    pub uid: String,

    /// HTTP status returned by the endpoint, if it responded.
    pub http_status: Option<u16>,

    /// Error description when the attempt failed before a response.
    pub error: Option<String>,

    /// When the attempt was made.
    pub attempted_at: DateTime<Utc>,
}

/// Per-endpoint materialization of an event, with its own status lifecycle.
///
/// Created downstream by the fan-out worker; the service reads and
/// transitions it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventDelivery {
    /// Unique identifier for this delivery.
    pub uid: EventDeliveryId,

    /// Project the delivery belongs to.
    pub project_id: ProjectId,

    /// Event this delivery materializes.
    pub event_id: EventId,

    /// Endpoint the delivery targets.
    pub endpoint_id: EndpointId,

    /// Subscription that matched the event to the endpoint.
    pub subscription_id: SubscriptionId,

    /// Current lifecycle status.
    pub status: EventDeliveryStatus,

    /// Attempt history recorded by the dispatch workers, oldest first.
    pub attempts: Vec<DeliveryAttempt>,

    /// When the delivery was materialized.
    pub created_at: DateTime<Utc>,

    /// When the record was last touched.
    pub updated_at: DateTime<Utc>,
}

/// A routing rule binding an endpoint to the event types it receives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    /// Unique identifier for this subscription.
    pub uid: SubscriptionId,

    /// Project that owns the subscription.
    pub project_id: ProjectId,

    /// Endpoint the subscription routes to.
    pub endpoint_id: EndpointId,

    /// Human-readable name.
    pub name: String,
}

/// An inbound ingest source (webhook origin).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    /// Unique identifier for this source.
    pub uid: String,

    /// Project that owns the source.
    pub project_id: ProjectId,

    /// Human-readable name.
    pub name: String,
}

/// A device client registered for event streaming.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    /// Unique identifier for this device.
    pub uid: String,

    /// Project that owns the device.
    pub project_id: ProjectId,

    /// Host name reported by the client.
    pub host_name: String,
}
