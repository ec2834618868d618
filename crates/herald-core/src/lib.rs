//! Core domain models and error taxonomy for the Herald event service.
//!
//! Provides strongly-typed identifiers, the project/endpoint/event/delivery
//! domain records, query descriptors for paging and search, and the
//! structured error types every service operation surfaces. All other crates
//! depend on these foundational types for type safety and consistency.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod filter;
pub mod models;

pub use error::{ErrorKind, ServiceError, ServiceResult, StoreError};
pub use filter::{Direction, Filter, Pageable, PaginationData, SearchParams};
pub use models::{
    DeliveryAttempt, Device, Endpoint, EndpointId, EndpointStatus, Event, EventDelivery,
    EventDeliveryId, EventDeliveryStatus, EventId, Project, ProjectConfig, ProjectId,
    SignatureConfig, Source, StrategyConfig, StrategyKind, Subscription, SubscriptionId,
};

/// Default page size applied when a pageable carries no explicit size.
pub const DEFAULT_PER_PAGE: i32 = 20;
