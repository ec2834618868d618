//! Ingress payload shapes accepted by the authoring entry points.
//!
//! These mirror the wire models the HTTP layer deserializes; the service
//! consumes them as plain data and never re-validates their JSON form.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use herald_core::models::StrategyConfig;

/// Payload for targeted event authoring.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateEventPayload {
    /// Endpoint the event is addressed to.
    pub endpoint_id: String,

    /// Event type tag, e.g. `payment.created`.
    pub event_type: String,

    /// Raw JSON payload bytes.
    pub data: Vec<u8>,

    /// Extra HTTP headers to forward on dispatch.
    pub custom_headers: Option<HashMap<String, String>>,
}

/// Payload for owner-scoped fan-out authoring.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FanoutEventPayload {
    /// Grouping key whose endpoints all receive the event.
    pub owner_id: String,

    /// Event type tag.
    pub event_type: String,

    /// Raw JSON payload bytes.
    pub data: Vec<u8>,

    /// Extra HTTP headers to forward on dispatch.
    pub custom_headers: Option<HashMap<String, String>>,
}

/// Inline endpoint material carried by a dynamic event.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DynamicEndpoint {
    /// Destination URL.
    pub url: String,

    /// Signing secret for the ephemeral endpoint.
    pub secret: Option<String>,

    /// Display name.
    pub name: String,
}

/// Alerting thresholds for a dynamic subscription.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AlertConfig {
    /// Failures before an alert fires.
    pub count: u32,

    /// Alert threshold window, e.g. `1h`.
    pub threshold: String,
}

/// Event-type filters for a dynamic subscription.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Event types the subscription matches; `*` matches all.
    pub event_types: Vec<String>,
}

/// Rate limiting for a dynamic subscription.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Deliveries allowed per window.
    pub count: u32,

    /// Window length in seconds.
    pub duration_secs: u64,
}

/// Inline subscription material carried by a dynamic event.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DynamicSubscription {
    /// Display name.
    pub name: String,

    /// Alerting overrides.
    pub alert_config: Option<AlertConfig>,

    /// Retry pacing overrides.
    pub retry_config: Option<StrategyConfig>,

    /// Event-type filter overrides.
    pub filter_config: Option<FilterConfig>,

    /// Rate limit overrides.
    pub rate_limit_config: Option<RateLimitConfig>,
}

/// Event stub carried inline with a dynamic event.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DynamicEventStub {
    /// Event type tag; `*` for wildcard routing.
    pub event_type: String,

    /// Raw JSON payload bytes.
    pub data: Vec<u8>,

    /// Extra HTTP headers to forward on dispatch.
    pub custom_headers: Option<HashMap<String, String>>,
}

/// A complete dynamic event: inline endpoint, subscription, and event stub.
///
/// Everything a worker needs to materialize an ephemeral delivery travels in
/// the payload itself; nothing is looked up at authoring time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DynamicEventPayload {
    /// Endpoint to deliver to.
    pub endpoint: DynamicEndpoint,

    /// Subscription routing the event.
    pub subscription: DynamicSubscription,

    /// The event itself.
    pub event: DynamicEventStub,
}
