//! Delivery state-machine tests: retry, force resend, batch retry, and the
//! requeue pairing of status writes with queue traffic.

mod common;

use common::{delivery, delivery_filter, endpoint, project, provide_event_service};
use herald_core::{
    filter::PaginationData,
    models::{EndpointStatus, EventDeliveryStatus},
};
use herald_events::{
    service::ERR_INVALID_EVENT_DELIVERY_STATUS, Processor, QueueName, REQUEUE_DELAY,
};

#[tokio::test]
async fn retries_failed_delivery_to_active_endpoint() {
    let env = provide_event_service();
    env.endpoint_repo.add_endpoint(endpoint("abc", "abc", EndpointStatus::Active)).await;

    let owner = project("abc");
    let failed = delivery("123", "abc", EventDeliveryStatus::Failure);

    env.service.retry_event_delivery(&failed, &owner).await.expect("retry should succeed");

    let updates = env.event_delivery_repo.status_updates().await;
    assert_eq!(updates, vec![("123".into(), EventDeliveryStatus::Scheduled)]);

    let writes = env.queue.writes().await;
    assert_eq!(writes.len(), 1);
    assert_eq!(writes[0].processor, Processor::Event);
    assert_eq!(writes[0].queue, QueueName::Event);
    assert_eq!(writes[0].job.id, "123");
    assert_eq!(writes[0].job.delay, Some(REQUEUE_DELAY));
}

#[tokio::test]
async fn resend_follows_the_retry_flow() {
    let env = provide_event_service();
    env.endpoint_repo.add_endpoint(endpoint("abc", "abc", EndpointStatus::Active)).await;

    let owner = project("abc");
    let failed = delivery("123", "abc", EventDeliveryStatus::Failure);

    env.service.resend_event_delivery(&failed, &owner).await.expect("resend should succeed");

    assert_eq!(env.queue.write_count().await, 1);
}

#[tokio::test]
async fn rejects_retry_of_successful_delivery() {
    let env = provide_event_service();

    let owner = project("abc");
    let sent = delivery("123", "abc", EventDeliveryStatus::Success);

    let err = env
        .service
        .retry_event_delivery(&sent, &owner)
        .await
        .expect_err("successful delivery must not retry");

    assert_eq!(err.to_string(), "event already sent");
    assert_eq!(err.status_hint(), 400);

    // Guard fires before any I/O.
    assert_eq!(env.endpoint_repo.find_call_count(), 0);
    assert!(env.event_delivery_repo.status_updates().await.is_empty());
    assert_eq!(env.queue.write_count().await, 0);
}

#[tokio::test]
async fn rejects_retry_of_in_flight_deliveries() {
    let env = provide_event_service();
    let owner = project("abc");

    for status in [
        EventDeliveryStatus::Retry,
        EventDeliveryStatus::Processing,
        EventDeliveryStatus::Scheduled,
    ] {
        let in_flight = delivery("123", "abc", status);
        let err = env
            .service
            .retry_event_delivery(&in_flight, &owner)
            .await
            .expect_err("in-flight delivery must not retry");
        assert_eq!(err.to_string(), "cannot resend event that did not fail previously");
    }

    assert_eq!(env.endpoint_repo.find_call_count(), 0);
    assert_eq!(env.queue.write_count().await, 0);
}

#[tokio::test]
async fn reports_missing_endpoint_on_retry() {
    let env = provide_event_service();

    let owner = project("abc");
    let failed = delivery("123", "gone", EventDeliveryStatus::Failure);

    let err = env
        .service
        .retry_event_delivery(&failed, &owner)
        .await
        .expect_err("missing endpoint must fail");

    assert_eq!(err.to_string(), "endpoint not found");
    assert_eq!(env.queue.write_count().await, 0);
}

#[tokio::test]
async fn rejects_retry_while_endpoint_reactivates() {
    let env = provide_event_service();
    env.endpoint_repo.add_endpoint(endpoint("abc", "abc", EndpointStatus::Pending)).await;

    let owner = project("abc");
    let failed = delivery("123", "abc", EventDeliveryStatus::Failure);

    let err = env
        .service
        .retry_event_delivery(&failed, &owner)
        .await
        .expect_err("pending endpoint must fail");

    assert_eq!(err.to_string(), "endpoint is being re-activated");
    assert_eq!(env.queue.write_count().await, 0);
}

#[tokio::test]
async fn rejects_retry_of_paused_endpoint() {
    let env = provide_event_service();
    env.endpoint_repo.add_endpoint(endpoint("abc", "abc", EndpointStatus::Paused)).await;

    let owner = project("abc");
    let failed = delivery("123", "abc", EventDeliveryStatus::Failure);

    let err = env
        .service
        .retry_event_delivery(&failed, &owner)
        .await
        .expect_err("paused endpoint must fail");

    assert_eq!(err.to_string(), "endpoint is paused");
    assert!(env.endpoint_repo.status_updates().await.is_empty());
    assert_eq!(env.queue.write_count().await, 0);
}

#[tokio::test]
async fn revives_inactive_endpoint_before_requeue() {
    let env = provide_event_service();
    env.endpoint_repo.add_endpoint(endpoint("abc", "abc", EndpointStatus::Inactive)).await;

    let owner = project("abc");
    let failed = delivery("123", "abc", EventDeliveryStatus::Failure);

    env.service.retry_event_delivery(&failed, &owner).await.expect("retry should succeed");

    let endpoint_updates = env.endpoint_repo.status_updates().await;
    assert_eq!(endpoint_updates, vec![("abc".into(), EndpointStatus::Pending)]);

    let delivery_updates = env.event_delivery_repo.status_updates().await;
    assert_eq!(delivery_updates, vec![("123".into(), EventDeliveryStatus::Scheduled)]);
    assert_eq!(env.queue.write_count().await, 1);
}

#[tokio::test]
async fn fails_retry_when_endpoint_revival_fails() {
    let env = provide_event_service();
    env.endpoint_repo.add_endpoint(endpoint("abc", "abc", EndpointStatus::Inactive)).await;
    env.endpoint_repo.inject_update_status_error("failed").await;

    let owner = project("abc");
    let failed = delivery("123", "abc", EventDeliveryStatus::Failure);

    let err = env
        .service
        .retry_event_delivery(&failed, &owner)
        .await
        .expect_err("revival failure must surface");

    assert_eq!(err.to_string(), "failed to update endpoint status");
    assert!(env.event_delivery_repo.status_updates().await.is_empty());
    assert_eq!(env.queue.write_count().await, 0);
}

#[tokio::test]
async fn fails_retry_when_status_update_fails() {
    let env = provide_event_service();
    env.endpoint_repo.add_endpoint(endpoint("abc", "abc", EndpointStatus::Active)).await;
    env.event_delivery_repo.inject_update_status_error("failed").await;

    let owner = project("abc");
    let failed = delivery("123", "abc", EventDeliveryStatus::Failure);

    let err = env
        .service
        .retry_event_delivery(&failed, &owner)
        .await
        .expect_err("status write failure must surface");

    assert_eq!(err.to_string(), "an error occurred while trying to resend event");
    assert_eq!(env.queue.write_count().await, 0);
}

#[tokio::test]
async fn reports_delivery_id_when_requeue_write_fails() {
    let env = provide_event_service();
    env.endpoint_repo.add_endpoint(endpoint("abc", "abc", EndpointStatus::Active)).await;
    env.queue.inject_write_error("failed").await;

    let owner = project("abc");
    let failed = delivery("123", "abc", EventDeliveryStatus::Failure);

    let err = env
        .service
        .retry_event_delivery(&failed, &owner)
        .await
        .expect_err("queue failure must surface");

    assert_eq!(err.to_string(), "error occurred re-enqueing old event - 123: failed");

    // The status write landed before the queue write failed; the delivery
    // is stranded Scheduled for the sweeper.
    let updates = env.event_delivery_repo.status_updates().await;
    assert_eq!(updates, vec![("123".into(), EventDeliveryStatus::Scheduled)]);
}

#[tokio::test]
async fn force_resend_requeues_successful_deliveries() {
    let env = provide_event_service();
    env.endpoint_repo.add_endpoint(endpoint("abc", "123", EndpointStatus::Active)).await;
    env.event_delivery_repo.add_delivery(delivery("ref", "abc", EventDeliveryStatus::Success)).await;
    env.event_delivery_repo.add_delivery(delivery("oop", "abc", EventDeliveryStatus::Success)).await;

    let owner = project("123");
    let outcome = env
        .service
        .force_resend_event_deliveries(&["oop".into(), "ref".into()], &owner)
        .await
        .expect("force resend should succeed");

    assert_eq!(outcome.successes, 2);
    assert_eq!(outcome.failures, 0);
    assert_eq!(env.event_delivery_repo.status_updates().await.len(), 2);
    assert_eq!(env.queue.write_count().await, 2);
}

#[tokio::test]
async fn force_resend_rejects_mixed_batch() {
    let env = provide_event_service();
    env.event_delivery_repo.add_delivery(delivery("ref", "abc", EventDeliveryStatus::Success)).await;
    env.event_delivery_repo.add_delivery(delivery("oop", "abc", EventDeliveryStatus::Failure)).await;

    let owner = project("123");
    let err = env
        .service
        .force_resend_event_deliveries(&["ref".into(), "oop".into()], &owner)
        .await
        .expect_err("mixed batch must fail validation");

    assert_eq!(err.to_string(), ERR_INVALID_EVENT_DELIVERY_STATUS);
    assert_eq!(err.status_hint(), 400);

    // All-or-nothing: nothing was looked up, updated, or queued.
    assert_eq!(env.endpoint_repo.find_call_count(), 0);
    assert!(env.event_delivery_repo.status_updates().await.is_empty());
    assert_eq!(env.queue.write_count().await, 0);
}

#[tokio::test]
async fn force_resend_requires_active_endpoint() {
    let env = provide_event_service();
    env.endpoint_repo.add_endpoint(endpoint("abc", "123", EndpointStatus::Inactive)).await;
    env.event_delivery_repo.add_delivery(delivery("ref", "abc", EventDeliveryStatus::Success)).await;

    let owner = project("123");
    let outcome = env
        .service
        .force_resend_event_deliveries(&["ref".into()], &owner)
        .await
        .expect("batch should complete");

    // The ineligible endpoint fails its delivery but not the batch.
    assert_eq!(outcome.successes, 0);
    assert_eq!(outcome.failures, 1);
    assert!(env.event_delivery_repo.status_updates().await.is_empty());
    assert_eq!(env.queue.write_count().await, 0);
}

#[tokio::test]
async fn force_resend_continues_past_missing_endpoint() {
    let env = provide_event_service();
    env.endpoint_repo.add_endpoint(endpoint("abc", "123", EndpointStatus::Active)).await;
    env.event_delivery_repo.add_delivery(delivery("ref", "abc", EventDeliveryStatus::Success)).await;
    env.event_delivery_repo.add_delivery(delivery("oop", "gone", EventDeliveryStatus::Success)).await;

    let owner = project("123");
    let outcome = env
        .service
        .force_resend_event_deliveries(&["ref".into(), "oop".into()], &owner)
        .await
        .expect("batch should complete");

    assert_eq!(outcome.successes, 1);
    assert_eq!(outcome.failures, 1);
    assert_eq!(env.queue.write_count().await, 1);
}

#[tokio::test]
async fn force_resend_surfaces_fetch_failure() {
    let env = provide_event_service();
    env.event_delivery_repo.inject_find_by_ids_error("connection reset").await;

    let owner = project("123");
    let err = env
        .service
        .force_resend_event_deliveries(&["ref".into()], &owner)
        .await
        .expect_err("fetch failure must surface");

    assert_eq!(err.to_string(), "failed to fetch event deliveries");
}

#[tokio::test]
async fn batch_retry_requeues_every_failed_delivery() {
    let env = provide_event_service();
    env.endpoint_repo.add_endpoint(endpoint("abc", "123", EndpointStatus::Active)).await;
    env.event_delivery_repo
        .push_page(
            vec![
                delivery("ref", "abc", EventDeliveryStatus::Discarded),
                delivery("oop", "abc", EventDeliveryStatus::Failure),
            ],
            PaginationData::default(),
        )
        .await;

    let filter = delivery_filter(project("123"));
    let outcome = env
        .service
        .batch_retry_event_delivery(&filter)
        .await
        .expect("batch retry should succeed");

    assert_eq!(outcome.successes, 2);
    assert_eq!(outcome.failures, 0);

    let updates = env.event_delivery_repo.status_updates().await;
    assert_eq!(
        updates,
        vec![
            ("ref".into(), EventDeliveryStatus::Scheduled),
            ("oop".into(), EventDeliveryStatus::Scheduled),
        ]
    );

    let writes = env.queue.writes().await;
    assert_eq!(writes.len(), 2);
    assert!(writes.iter().all(|w| w.queue == QueueName::Event));

    // The filter's constraints reach the storage layer untouched.
    let calls = env.event_delivery_repo.paged_calls().await;
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].endpoint_ids, filter.endpoint_ids);
    assert_eq!(calls[0].event_id, filter.event_id);
    assert_eq!(calls[0].status, filter.status);
    assert_eq!(calls[0].pageable, filter.pageable);
}

#[tokio::test]
async fn batch_retry_counts_successful_delivery_as_failure() {
    let env = provide_event_service();
    env.endpoint_repo.add_endpoint(endpoint("abc", "123", EndpointStatus::Active)).await;
    env.event_delivery_repo
        .push_page(
            vec![
                delivery("ref", "abc", EventDeliveryStatus::Success),
                delivery("oop", "abc", EventDeliveryStatus::Failure),
            ],
            PaginationData::default(),
        )
        .await;

    let filter = delivery_filter(project("123"));
    let outcome = env
        .service
        .batch_retry_event_delivery(&filter)
        .await
        .expect("batch retry should succeed");

    assert_eq!(outcome.successes, 1);
    assert_eq!(outcome.failures, 1);
    assert_eq!(env.event_delivery_repo.status_updates().await.len(), 1);
    assert_eq!(env.queue.write_count().await, 1);
    assert_eq!(env.endpoint_repo.find_call_count(), 1);
}

#[tokio::test]
async fn batch_retry_walks_pagination_cursors() {
    let env = provide_event_service();
    env.endpoint_repo.add_endpoint(endpoint("abc", "123", EndpointStatus::Active)).await;
    env.event_delivery_repo
        .push_page(
            vec![delivery("one", "abc", EventDeliveryStatus::Failure)],
            PaginationData {
                has_next_page: true,
                next_page_cursor: Some("cursor-2".to_string()),
                ..PaginationData::default()
            },
        )
        .await;
    env.event_delivery_repo
        .push_page(
            vec![delivery("two", "abc", EventDeliveryStatus::Failure)],
            PaginationData::default(),
        )
        .await;

    let filter = delivery_filter(project("123"));
    let outcome = env
        .service
        .batch_retry_event_delivery(&filter)
        .await
        .expect("batch retry should succeed");

    assert_eq!(outcome.successes, 2);
    assert_eq!(env.queue.write_count().await, 2);

    let calls = env.event_delivery_repo.paged_calls().await;
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].pageable.next_cursor, None);
    assert_eq!(calls[1].pageable.next_cursor, Some("cursor-2".to_string()));
}

#[tokio::test]
async fn batch_retry_handles_empty_result() {
    let env = provide_event_service();

    let filter = delivery_filter(project("123"));
    let outcome = env
        .service
        .batch_retry_event_delivery(&filter)
        .await
        .expect("empty batch should succeed");

    assert_eq!(outcome.successes, 0);
    assert_eq!(outcome.failures, 0);
    assert_eq!(env.queue.write_count().await, 0);
}
