//! The event service: authoring, delivery state transitions, and retry
//! orchestration.
//!
//! Each public method is one request-scoped operation and may run
//! concurrently with any other; within a method the order of endpoint
//! lookup, state check, status update, and queue enqueue is strict.
//! Cancellation rides on future semantics: dropping the returned future
//! aborts the operation at its next `.await`.

use std::{collections::HashMap, sync::Arc};

use bytes::Bytes;
use chrono::Utc;
use serde::Serialize;
use tracing::{debug, error, warn};
use uuid::Uuid;

use herald_core::{
    error::{ServiceError, ServiceResult},
    filter::{Filter, PaginationData},
    models::{
        EndpointId, EndpointStatus, Event, EventDelivery, EventDeliveryId, EventDeliveryStatus,
        EventId, Project,
    },
};

use crate::{
    ingress::{CreateEventPayload, DynamicEventPayload, FanoutEventPayload},
    queue::{EventDeliveryRef, Job, Processor, QueueName, Queuer},
    repo::{
        Cache, DeviceRepository, EndpointRepository, EventDeliveryRepository, EventRepository,
        SourceRepository, SubscriptionRepository,
    },
    search::Searcher,
    REQUEUE_DELAY,
};

/// Message for an authoring call that arrives without a project reference.
pub const ERR_INVALID_PROJECT: &str = "an error occurred while creating event - invalid project";

/// Message for a project whose configuration carries no retry strategy.
pub const ERR_NO_RETRY_STRATEGY: &str = "retry strategy not defined in configuration";

/// Message for a targeted authoring call without an endpoint id.
pub const ERR_INVALID_ENDPOINT_ID: &str = "please provide a valid endpoint id";

/// Message for a fan-out whose owner id resolves to no endpoints.
pub const ERR_NO_VALID_OWNER_ID_ENDPOINT_FOUND: &str = "owner id has no configured endpoints";

/// Message for a force resend batch containing a non-successful delivery.
pub const ERR_INVALID_EVENT_DELIVERY_STATUS: &str =
    "only successful event deliveries can be force resent";

/// Accumulated counts from a batch operation.
///
/// A failure here is per-delivery; the batch keeps going past it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    /// Deliveries requeued successfully.
    pub successes: usize,

    /// Deliveries skipped or failed.
    pub failures: usize,
}

/// The event service core.
///
/// A struct of collaborator interface values, injectable for testing. The
/// service owns no state of its own; all persistence lives behind the
/// repository traits and all asynchrony is handed to the queue system.
pub struct EventService {
    /// Endpoint lookup and status transitions.
    pub endpoint_repo: Arc<dyn EndpointRepository>,

    /// Authored event persistence.
    pub event_repo: Arc<dyn EventRepository>,

    /// Delivery persistence and paging.
    pub event_delivery_repo: Arc<dyn EventDeliveryRepository>,

    /// Reserved for subscription look-aside.
    pub subscription_repo: Arc<dyn SubscriptionRepository>,

    /// Reserved for filter hydration.
    pub source_repo: Arc<dyn SourceRepository>,

    /// Reserved for stream fan-out extensions.
    pub device_repo: Arc<dyn DeviceRepository>,

    /// Background queue writer.
    pub queue: Arc<dyn Queuer>,

    /// Reserved look-aside cache.
    pub cache: Arc<dyn Cache>,

    /// External search index over events.
    pub searcher: Arc<dyn Searcher>,
}

impl EventService {
    /// Authors a targeted event addressed to one endpoint and hands it to
    /// the fan-out queue.
    ///
    /// The project must carry a retry strategy; the endpoint must exist.
    pub async fn create_event(
        &self,
        payload: &CreateEventPayload,
        project: Option<&Project>,
    ) -> ServiceResult<Event> {
        if payload.endpoint_id.is_empty() {
            return Err(ServiceError::bad_request(ERR_INVALID_ENDPOINT_ID));
        }
        let project = validate_authoring_project(project)?;

        let endpoint_id = EndpointId::new(payload.endpoint_id.clone());
        let endpoint = self
            .endpoint_repo
            .find_endpoint_by_id(&project.uid, &endpoint_id)
            .await
            .map_err(|err| ServiceError::bad_request(err.to_string()))?;

        let event = build_event(
            project,
            &payload.event_type,
            &payload.data,
            payload.custom_headers.as_ref(),
            vec![endpoint.uid],
        );
        self.enqueue_authored_event(Processor::CreateEvent, &event).await;
        Ok(event)
    }

    /// Authors one event addressed to every endpoint grouped under
    /// `owner_id`, in resolver order.
    pub async fn create_fanout_event(
        &self,
        payload: &FanoutEventPayload,
        project: Option<&Project>,
    ) -> ServiceResult<Event> {
        let project = validate_authoring_project(project)?;

        let endpoints = self
            .endpoint_repo
            .find_endpoints_by_owner_id(&project.uid, &payload.owner_id)
            .await
            .map_err(|err| ServiceError::bad_request(err.to_string()))?;
        if endpoints.is_empty() {
            return Err(ServiceError::bad_request(ERR_NO_VALID_OWNER_ID_ENDPOINT_FOUND));
        }

        let endpoint_ids = endpoints.into_iter().map(|endpoint| endpoint.uid).collect();
        let event = build_event(
            project,
            &payload.event_type,
            &payload.data,
            payload.custom_headers.as_ref(),
            endpoint_ids,
        );
        self.enqueue_authored_event(Processor::CreateEvent, &event).await;
        Ok(event)
    }

    /// Enqueues a dynamic event carrying inline endpoint and subscription
    /// material.
    ///
    /// No lookups happen here; the worker materializes the ephemeral
    /// endpoint and subscription and applies strategy checks then.
    pub async fn create_dynamic_event(
        &self,
        payload: &DynamicEventPayload,
        project: Option<&Project>,
    ) -> ServiceResult<()> {
        let project = project.ok_or_else(|| ServiceError::bad_request(ERR_INVALID_PROJECT))?;

        let job = Job {
            id: Uuid::new_v4().to_string(),
            payload: serialize_payload(payload)?,
            delay: None,
        };
        if let Err(err) =
            self.queue.write(Processor::CreateDynamicEvent, QueueName::CreateEvent, job).await
        {
            error!(
                project_id = %project.uid,
                error = %err,
                "failed to enqueue dynamic event"
            );
        }
        Ok(())
    }

    /// Re-enqueues an existing event for a fresh fan-out pass.
    pub async fn replay_event(&self, event: &Event, project: &Project) -> ServiceResult<()> {
        let job = Job {
            id: event.uid.to_string(),
            payload: serialize_payload(event)?,
            delay: None,
        };
        self.queue
            .write(Processor::CreateEvent, QueueName::CreateEvent, job)
            .await
            .map_err(|_| ServiceError::bad_request("failed to write event to queue"))?;

        debug!(event_id = %event.uid, project_id = %project.uid, "event replayed");
        Ok(())
    }

    /// Operator-facing alias for [`EventService::retry_event_delivery`].
    pub async fn resend_event_delivery(
        &self,
        delivery: &EventDelivery,
        project: &Project,
    ) -> ServiceResult<()> {
        self.retry_event_delivery(delivery, project).await
    }

    /// Recovers a failed delivery by scheduling it for another dispatch.
    ///
    /// Successful deliveries are rejected outright; deliveries that are
    /// queued or in flight cannot be retried. An `Inactive` endpoint is
    /// revived through `Pending` before the delivery is requeued.
    pub async fn retry_event_delivery(
        &self,
        delivery: &EventDelivery,
        project: &Project,
    ) -> ServiceResult<()> {
        match delivery.status {
            EventDeliveryStatus::Success => {
                return Err(ServiceError::bad_request("event already sent"));
            }
            EventDeliveryStatus::Retry
            | EventDeliveryStatus::Processing
            | EventDeliveryStatus::Scheduled => {
                return Err(ServiceError::bad_request(
                    "cannot resend event that did not fail previously",
                ));
            }
            EventDeliveryStatus::Failure | EventDeliveryStatus::Discarded => {}
        }

        let endpoint = self
            .endpoint_repo
            .find_endpoint_by_id(&project.uid, &delivery.endpoint_id)
            .await
            .map_err(|_| ServiceError::bad_request("endpoint not found"))?;

        match endpoint.status {
            EndpointStatus::Pending => {
                return Err(ServiceError::bad_request("endpoint is being re-activated"));
            }
            EndpointStatus::Paused => {
                return Err(ServiceError::bad_request("endpoint is paused"));
            }
            EndpointStatus::Inactive => {
                self.endpoint_repo
                    .update_endpoint_status(&project.uid, &endpoint.uid, EndpointStatus::Pending)
                    .await
                    .map_err(|_| ServiceError::bad_request("failed to update endpoint status"))?;
            }
            EndpointStatus::Active => {}
        }

        self.requeue_event_delivery(delivery, project).await
    }

    /// Re-dispatches deliveries that already succeeded.
    ///
    /// Pre-validation is all-or-nothing: every delivery in the batch must
    /// currently be `Success`, otherwise nothing is touched. Past that
    /// point, per-delivery failures are counted and the batch continues.
    pub async fn force_resend_event_deliveries(
        &self,
        ids: &[EventDeliveryId],
        project: &Project,
    ) -> ServiceResult<BatchOutcome> {
        let deliveries = self
            .event_delivery_repo
            .find_event_deliveries_by_ids(&project.uid, ids)
            .await
            .map_err(|_| ServiceError::bad_request("failed to fetch event deliveries"))?;

        if deliveries.iter().any(|d| d.status != EventDeliveryStatus::Success) {
            return Err(ServiceError::bad_request(ERR_INVALID_EVENT_DELIVERY_STATUS));
        }

        let mut outcome = BatchOutcome::default();
        for delivery in &deliveries {
            match self.force_resend_event_delivery(delivery, project).await {
                Ok(()) => outcome.successes += 1,
                Err(err) => {
                    warn!(
                        delivery_id = %delivery.uid,
                        error = %err,
                        "force resend failed for delivery"
                    );
                    outcome.failures += 1;
                }
            }
        }
        Ok(outcome)
    }

    /// Retries every delivery matching `filter`, page by page.
    ///
    /// Successful deliveries are never auto-retried through this entry;
    /// each one counts as a failure and the walk continues.
    pub async fn batch_retry_event_delivery(&self, filter: &Filter) -> ServiceResult<BatchOutcome> {
        let mut outcome = BatchOutcome::default();
        let mut pageable = filter.pageable.clone();

        loop {
            let (deliveries, pagination) = self
                .event_delivery_repo
                .load_event_deliveries_paged(
                    &filter.project.uid,
                    &filter.endpoint_ids,
                    filter.event_id.as_ref(),
                    &filter.status,
                    filter.search_params,
                    &pageable,
                )
                .await
                .map_err(|err| ServiceError::bad_request(err.to_string()))?;

            if deliveries.is_empty() {
                break;
            }

            for delivery in &deliveries {
                match self.retry_event_delivery(delivery, &filter.project).await {
                    Ok(()) => outcome.successes += 1,
                    Err(err) => {
                        warn!(
                            delivery_id = %delivery.uid,
                            error = %err,
                            "batch retry failed for delivery"
                        );
                        outcome.failures += 1;
                    }
                }
            }

            if !pagination.has_next_page {
                break;
            }
            pageable.next_cursor = pagination.next_page_cursor;
        }

        Ok(outcome)
    }

    /// Runs `filter` against the search index and materializes the hits
    /// back into full event records.
    ///
    /// Index failures surface verbatim. Missing ids are silently absent
    /// from the result; the index's pagination data passes through
    /// unadjusted.
    pub async fn search(&self, filter: &Filter) -> ServiceResult<(Vec<Event>, PaginationData)> {
        let (ids, pagination) = self
            .searcher
            .search(filter)
            .await
            .map_err(|err| ServiceError::bad_request(err.to_string()))?;

        let events = self
            .event_repo
            .find_events_by_ids(&filter.project.uid, &ids)
            .await
            .map_err(|err| ServiceError::bad_request(err.to_string()))?;

        Ok((events, pagination))
    }

    /// Loads a page of events matching `filter` straight from storage.
    pub async fn get_events_paged(
        &self,
        filter: &Filter,
    ) -> ServiceResult<(Vec<Event>, PaginationData)> {
        self.event_repo
            .load_events_paged(&filter.project.uid, filter)
            .await
            .map_err(|err| ServiceError::bad_request(err.to_string()))
    }

    /// Loads a page of deliveries matching `filter`.
    pub async fn get_event_deliveries_paged(
        &self,
        filter: &Filter,
    ) -> ServiceResult<(Vec<EventDelivery>, PaginationData)> {
        self.event_delivery_repo
            .load_event_deliveries_paged(
                &filter.project.uid,
                &filter.endpoint_ids,
                filter.event_id.as_ref(),
                &filter.status,
                filter.search_params,
                &filter.pageable,
            )
            .await
            .map_err(|err| ServiceError::bad_request(err.to_string()))
    }

    /// Counts the deliveries a batch retry over `filter` would touch.
    pub async fn count_affected_event_deliveries(&self, filter: &Filter) -> ServiceResult<u64> {
        self.event_delivery_repo
            .count_event_deliveries(
                &filter.project.uid,
                &filter.endpoint_ids,
                filter.event_id.as_ref(),
                &filter.status,
                filter.search_params,
            )
            .await
            .map_err(|err| ServiceError::bad_request(err.to_string()))
    }

    async fn force_resend_event_delivery(
        &self,
        delivery: &EventDelivery,
        project: &Project,
    ) -> ServiceResult<()> {
        let endpoint = self
            .endpoint_repo
            .find_endpoint_by_id(&project.uid, &delivery.endpoint_id)
            .await
            .map_err(|_| ServiceError::bad_request("endpoint not found"))?;

        if endpoint.status != EndpointStatus::Active {
            return Err(ServiceError::bad_request(
                "force resend to an inactive or pending endpoint is not allowed",
            ));
        }

        self.requeue_event_delivery(delivery, project).await
    }

    /// Marks the delivery `Scheduled`, then enqueues it for dispatch.
    ///
    /// The two steps are not transactional: a crash in between leaves the
    /// delivery `Scheduled` with no queue entry, to be swept up outside
    /// this crate. The status write must land first so a worker that picks
    /// the job up immediately observes a consistent state.
    async fn requeue_event_delivery(
        &self,
        delivery: &EventDelivery,
        project: &Project,
    ) -> ServiceResult<()> {
        self.event_delivery_repo
            .update_status_of_event_delivery(
                &project.uid,
                &delivery.uid,
                EventDeliveryStatus::Scheduled,
            )
            .await
            .map_err(|_| {
                ServiceError::bad_request("an error occurred while trying to resend event")
            })?;

        let reference = EventDeliveryRef {
            event_delivery_id: delivery.uid.clone(),
            project_id: project.uid.clone(),
        };
        let job = Job {
            id: delivery.uid.to_string(),
            payload: serialize_payload(&reference)?,
            delay: Some(REQUEUE_DELAY),
        };
        self.queue.write(Processor::Event, QueueName::Event, job).await.map_err(|err| {
            ServiceError::bad_request(format!(
                "error occurred re-enqueing old event - {}: {}",
                delivery.uid, err
            ))
        })?;

        debug!(delivery_id = %delivery.uid, "event delivery requeued");
        Ok(())
    }

    /// Hands a freshly authored event to the fan-out queue.
    ///
    /// Authoring already succeeded from the caller's point of view, so a
    /// queue failure here is logged rather than surfaced; the event record
    /// is returned either way and can be replayed.
    async fn enqueue_authored_event(&self, processor: Processor, event: &Event) {
        let payload = match serde_json::to_vec(event) {
            Ok(bytes) => Bytes::from(bytes),
            Err(err) => {
                error!(event_id = %event.uid, error = %err, "failed to serialize authored event");
                return;
            }
        };
        let job = Job { id: event.uid.to_string(), payload, delay: None };
        if let Err(err) = self.queue.write(processor, QueueName::CreateEvent, job).await {
            error!(event_id = %event.uid, error = %err, "failed to enqueue authored event");
        }
    }
}

/// Rejects authoring calls whose project is absent or carries no retry
/// strategy. Runs before any repository lookup.
fn validate_authoring_project(project: Option<&Project>) -> Result<&Project, ServiceError> {
    let project = project.ok_or_else(|| ServiceError::bad_request(ERR_INVALID_PROJECT))?;
    if project.retry_strategy().is_none() {
        return Err(ServiceError::bad_request(ERR_NO_RETRY_STRATEGY));
    }
    Ok(project)
}

fn build_event(
    project: &Project,
    event_type: &str,
    data: &[u8],
    custom_headers: Option<&HashMap<String, String>>,
    endpoints: Vec<EndpointId>,
) -> Event {
    let now = Utc::now();
    Event {
        uid: EventId::generate(),
        event_type: event_type.to_string(),
        project_id: project.uid.clone(),
        data: data.to_vec(),
        raw: String::from_utf8_lossy(data).into_owned(),
        headers: headers_from_custom(custom_headers),
        matched_endpoints: 0,
        endpoints,
        created_at: now,
        updated_at: now,
        deleted_at: None,
    }
}

/// Copies ingress custom headers into the event's header map, one value
/// list per name.
fn headers_from_custom(custom: Option<&HashMap<String, String>>) -> HashMap<String, Vec<String>> {
    custom
        .map(|headers| {
            headers.iter().map(|(name, value)| (name.clone(), vec![value.clone()])).collect()
        })
        .unwrap_or_default()
}

fn serialize_payload<T: Serialize>(payload: &T) -> ServiceResult<Bytes> {
    serde_json::to_vec(payload)
        .map(Bytes::from)
        .map_err(|err| ServiceError::bad_request(err.to_string()))
}
