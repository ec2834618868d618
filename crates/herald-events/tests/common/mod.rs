//! Shared harness wiring an event service to mock collaborators.

#![allow(dead_code)]

use std::sync::Arc;

use chrono::Utc;

use herald_core::{
    filter::{Filter, Pageable, SearchParams},
    models::{
        Endpoint, EndpointStatus, EventDelivery, EventDeliveryStatus, Project, ProjectConfig,
        SignatureConfig, StrategyConfig, StrategyKind,
    },
};
use herald_events::{
    queue::mock::MockQueuer,
    repo::mock::{
        MockCache, MockDeviceRepository, MockEndpointRepository, MockEventDeliveryRepository,
        MockEventRepository, MockSourceRepository, MockSubscriptionRepository,
    },
    search::mock::MockSearcher,
    EventService,
};

/// An event service plus handles on the mocks behind it.
pub struct TestService {
    pub service: EventService,
    pub endpoint_repo: Arc<MockEndpointRepository>,
    pub event_repo: Arc<MockEventRepository>,
    pub event_delivery_repo: Arc<MockEventDeliveryRepository>,
    pub queue: Arc<MockQueuer>,
    pub searcher: Arc<MockSearcher>,
}

pub fn provide_event_service() -> TestService {
    let endpoint_repo = Arc::new(MockEndpointRepository::new());
    let event_repo = Arc::new(MockEventRepository::new());
    let event_delivery_repo = Arc::new(MockEventDeliveryRepository::new());
    let queue = Arc::new(MockQueuer::new());
    let searcher = Arc::new(MockSearcher::new());

    let service = EventService {
        endpoint_repo: endpoint_repo.clone(),
        event_repo: event_repo.clone(),
        event_delivery_repo: event_delivery_repo.clone(),
        subscription_repo: Arc::new(MockSubscriptionRepository::new()),
        source_repo: Arc::new(MockSourceRepository::new()),
        device_repo: Arc::new(MockDeviceRepository::new()),
        queue: queue.clone(),
        cache: Arc::new(MockCache::new()),
        searcher: searcher.clone(),
    };

    TestService { service, endpoint_repo, event_repo, event_delivery_repo, queue, searcher }
}

/// A project with a linear retry strategy, ready for authoring.
pub fn project(uid: &str) -> Project {
    project_with_strategy(uid, StrategyKind::Linear)
}

pub fn project_with_strategy(uid: &str, kind: StrategyKind) -> Project {
    Project {
        uid: uid.into(),
        name: "test_project".to_string(),
        config: Some(ProjectConfig {
            strategy: Some(StrategyConfig { kind, duration_ms: 1000, retry_count: 10 }),
            signature: Some(SignatureConfig::default()),
            replay_attacks: false,
        }),
    }
}

/// A project whose configuration block carries no retry strategy.
pub fn project_without_strategy(uid: &str) -> Project {
    Project {
        uid: uid.into(),
        name: "test_project".to_string(),
        config: Some(ProjectConfig::default()),
    }
}

pub fn endpoint(uid: &str, project_id: &str, status: EndpointStatus) -> Endpoint {
    let now = Utc::now();
    Endpoint {
        uid: uid.into(),
        project_id: project_id.into(),
        owner_id: String::new(),
        title: "test_endpoint".to_string(),
        support_email: Some("owner@example.com".to_string()),
        status,
        created_at: now,
        updated_at: now,
        deleted_at: None,
    }
}

pub fn delivery(uid: &str, endpoint_id: &str, status: EventDeliveryStatus) -> EventDelivery {
    let now = Utc::now();
    EventDelivery {
        uid: uid.into(),
        project_id: "abc".into(),
        event_id: "evt-1".into(),
        endpoint_id: endpoint_id.into(),
        subscription_id: "sub-1".into(),
        status,
        attempts: Vec::new(),
        created_at: now,
        updated_at: now,
    }
}

/// The filter a dashboard batch-retry request typically carries.
pub fn delivery_filter(owner: Project) -> Filter {
    Filter {
        project: owner,
        endpoint_ids: vec!["abc".into()],
        event_id: Some("13429".into()),
        status: vec![EventDeliveryStatus::Success, EventDeliveryStatus::Retry],
        search_params: SearchParams { created_at_start: 1342, created_at_end: 1332 },
        pageable: Pageable { per_page: 10, ..Pageable::default() },
    }
}
