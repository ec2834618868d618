//! Query descriptors for delivery filtering, paged reads, and search.
//!
//! A single [`Filter`] value carries every constraint an operation accepts;
//! zero values mean "unconstrained". Cursor paging follows the storage
//! layer's opaque cursors in either direction.

use serde::{Deserialize, Serialize};

use crate::models::{EndpointId, EventDeliveryStatus, EventId, Project};
use crate::DEFAULT_PER_PAGE;

/// Cursor paging direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Walk forward from `next_cursor`.
    #[default]
    Next,

    /// Walk backward from `prev_cursor`.
    Prev,
}

/// Cursor window over a result set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pageable {
    /// Page size requested from the storage layer.
    pub per_page: i32,

    /// Which way the cursor walks.
    pub direction: Direction,

    /// Opaque forward cursor; `None` starts from the newest record.
    pub next_cursor: Option<String>,

    /// Opaque backward cursor.
    pub prev_cursor: Option<String>,
}

impl Default for Pageable {
    fn default() -> Self {
        Self {
            per_page: DEFAULT_PER_PAGE,
            direction: Direction::Next,
            next_cursor: None,
            prev_cursor: None,
        }
    }
}

/// Epoch-second creation-time window. Zero bounds are unconstrained.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchParams {
    /// Inclusive lower bound on `created_at`, epoch seconds.
    pub created_at_start: i64,

    /// Inclusive upper bound on `created_at`, epoch seconds.
    pub created_at_end: i64,
}

/// Pagination state returned alongside a page of results.
///
/// Produced by the storage layer or the search index; the service passes it
/// through unadjusted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationData {
    /// Page size the producer applied.
    pub per_page: i64,

    /// Whether another page exists past `next_page_cursor`.
    pub has_next_page: bool,

    /// Whether another page exists before `prev_page_cursor`.
    pub has_prev_page: bool,

    /// Cursor for the following page.
    pub next_page_cursor: Option<String>,

    /// Cursor for the preceding page.
    pub prev_page_cursor: Option<String>,
}

/// Query descriptor shared by batch retry, paged reads, and search.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    /// Project the query is scoped to.
    pub project: Project,

    /// Restrict to these endpoints; empty means all.
    pub endpoint_ids: Vec<EndpointId>,

    /// Restrict to deliveries of one event.
    pub event_id: Option<EventId>,

    /// Restrict to these delivery statuses; empty means all.
    pub status: Vec<EventDeliveryStatus>,

    /// Creation-time window.
    pub search_params: SearchParams,

    /// Cursor window.
    pub pageable: Pageable,
}

impl Filter {
    /// Creates an unconstrained filter scoped to `project`.
    pub fn for_project(project: Project) -> Self {
        Self {
            project,
            endpoint_ids: Vec::new(),
            event_id: None,
            status: Vec::new(),
            search_params: SearchParams::default(),
            pageable: Pageable::default(),
        }
    }
}
