//! Search facade collaborator interface.
//!
//! The textual/temporal query runs against an external index which returns
//! matching event ids plus its own pagination state; the service then
//! materializes the ids back into full records through the event repository.

use async_trait::async_trait;
use thiserror::Error;

use herald_core::{filter::Filter, models::EventId, PaginationData};

/// Failure raised by the external search index.
///
/// Surfaced to callers verbatim; the index's message is the diagnostic.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct SearchError(pub String);

impl SearchError {
    /// Creates an error from any message.
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// External full-text and temporal index over authored events.
#[async_trait]
pub trait Searcher: Send + Sync {
    /// Runs `filter` against the index.
    ///
    /// Returns matching event ids and the index's pagination state, which
    /// the service passes through unadjusted.
    async fn search(&self, filter: &Filter) -> Result<(Vec<EventId>, PaginationData), SearchError>;
}

pub mod mock {
    //! Scripted search index for tests.

    use tokio::sync::RwLock;

    use super::{Filter, PaginationData, SearchError, Searcher};
    use async_trait::async_trait;
    use herald_core::models::EventId;

    type SearchOutcome = Result<(Vec<EventId>, PaginationData), SearchError>;

    /// Search index double returning a scripted response.
    #[derive(Default)]
    pub struct MockSearcher {
        outcome: RwLock<Option<SearchOutcome>>,
        call_count: RwLock<usize>,
    }

    impl MockSearcher {
        /// Creates a searcher that returns no hits until scripted.
        pub fn new() -> Self {
            Self::default()
        }

        /// Scripts the next responses to return `ids` and `pagination`.
        pub async fn respond_with(&self, ids: Vec<EventId>, pagination: PaginationData) {
            *self.outcome.write().await = Some(Ok((ids, pagination)));
        }

        /// Scripts the next responses to fail with `message`.
        pub async fn fail_with(&self, message: impl Into<String>) {
            *self.outcome.write().await = Some(Err(SearchError::new(message)));
        }

        /// Returns how many times the index was queried.
        pub async fn call_count(&self) -> usize {
            *self.call_count.read().await
        }
    }

    #[async_trait]
    impl Searcher for MockSearcher {
        async fn search(&self, _filter: &Filter) -> SearchOutcome {
            *self.call_count.write().await += 1;
            self.outcome
                .read()
                .await
                .clone()
                .unwrap_or_else(|| Ok((Vec::new(), PaginationData::default())))
        }
    }
}
