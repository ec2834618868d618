//! Error types and result handling for event service operations.
//!
//! Defines the structured service error every public entry point surfaces,
//! with HTTP-style status hints for upstream handlers, plus the storage-layer
//! error taxonomy raised by repository implementations.

use thiserror::Error;

/// Result type alias using [`ServiceError`].
pub type ServiceResult<T> = std::result::Result<T, ServiceError>;

/// HTTP-style classification carried by a [`ServiceError`].
///
/// Upstream handlers translate the kind to a response status; they never
/// match on message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The request was malformed or failed a state precondition.
    BadRequest,

    /// The caller is not authenticated.
    Unauthorized,

    /// The caller is authenticated but not allowed.
    Forbidden,

    /// The addressed resource does not exist.
    NotFound,

    /// The request conflicts with current resource state.
    Conflict,

    /// An unexpected downstream failure.
    Internal,
}

impl ErrorKind {
    /// Returns the HTTP status code this kind maps to.
    pub const fn status_hint(self) -> u16 {
        match self {
            Self::BadRequest => 400,
            Self::Unauthorized => 401,
            Self::Forbidden => 403,
            Self::NotFound => 404,
            Self::Conflict => 409,
            Self::Internal => 500,
        }
    }
}

/// Structured error surfaced by every public service operation.
///
/// Carries a kind for status mapping and a human message. The distinction
/// between user error and downstream failure lives in the message; the kind
/// stays coarse so handlers can translate it mechanically.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct ServiceError {
    kind: ErrorKind,
    message: String,
}

impl ServiceError {
    /// Creates an error with an explicit kind.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self { kind, message: message.into() }
    }

    /// Creates a `BadRequest` error, the kind used by every core failure.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::BadRequest, message)
    }

    /// Returns the error kind.
    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the HTTP status code hint for this error.
    pub const fn status_hint(&self) -> u16 {
        self.kind.status_hint()
    }

    /// Returns the human-readable message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Storage-layer failures raised by repository implementations.
///
/// The sentinel variants exist so missing-resource failures surface with
/// stable messages instead of backend-specific ones.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// The addressed endpoint does not exist.
    #[error("endpoint not found")]
    EndpointNotFound,

    /// The addressed event does not exist.
    #[error("event not found")]
    EventNotFound,

    /// The addressed event delivery does not exist.
    #[error("event delivery not found")]
    EventDeliveryNotFound,

    /// The addressed subscription does not exist.
    #[error("subscription not found")]
    SubscriptionNotFound,

    /// The addressed source does not exist.
    #[error("source not found")]
    SourceNotFound,

    /// The addressed device does not exist.
    #[error("device not found")]
    DeviceNotFound,

    /// Backend failure executing the operation.
    #[error("datastore error: {0}")]
    Database(String),
}
