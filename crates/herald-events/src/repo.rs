//! Repository interfaces the event service consumes.
//!
//! The service owns no persistent state; every read and mutation goes
//! through these traits. Production implementations live with the storage
//! backend, while the `mock` module provides deterministic in-memory
//! doubles so service logic can be tested without a database.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use herald_core::{
    error::StoreError,
    filter::{Filter, Pageable, PaginationData, SearchParams},
    models::{
        Device, Endpoint, EndpointId, EndpointStatus, Event, EventDelivery, EventDeliveryId,
        EventDeliveryStatus, EventId, ProjectId, Source, Subscription, SubscriptionId,
    },
};

/// Result alias for repository operations.
pub type RepoResult<T> = Result<T, StoreError>;

/// Lookup and status transitions for delivery endpoints.
#[async_trait]
pub trait EndpointRepository: Send + Sync {
    /// Finds a project's endpoint by id.
    async fn find_endpoint_by_id(
        &self,
        project_id: &ProjectId,
        endpoint_id: &EndpointId,
    ) -> RepoResult<Endpoint>;

    /// Enumerates all endpoints grouped under `owner_id` within the project.
    async fn find_endpoints_by_owner_id(
        &self,
        project_id: &ProjectId,
        owner_id: &str,
    ) -> RepoResult<Vec<Endpoint>>;

    /// Transitions an endpoint to `status`.
    async fn update_endpoint_status(
        &self,
        project_id: &ProjectId,
        endpoint_id: &EndpointId,
        status: EndpointStatus,
    ) -> RepoResult<()>;
}

/// Persistence for authored events.
#[async_trait]
pub trait EventRepository: Send + Sync {
    /// Persists an authored event.
    async fn create_event(&self, event: &Event) -> RepoResult<()>;

    /// Finds a project's event by id.
    async fn find_event_by_id(
        &self,
        project_id: &ProjectId,
        event_id: &EventId,
    ) -> RepoResult<Event>;

    /// Materializes the events behind `ids`, skipping missing ones.
    async fn find_events_by_ids(
        &self,
        project_id: &ProjectId,
        ids: &[EventId],
    ) -> RepoResult<Vec<Event>>;

    /// Loads a page of events matching `filter`.
    async fn load_events_paged(
        &self,
        project_id: &ProjectId,
        filter: &Filter,
    ) -> RepoResult<(Vec<Event>, PaginationData)>;
}

/// Persistence and paging for per-endpoint deliveries.
#[async_trait]
pub trait EventDeliveryRepository: Send + Sync {
    /// Loads the deliveries behind `ids` in one call.
    async fn find_event_deliveries_by_ids(
        &self,
        project_id: &ProjectId,
        ids: &[EventDeliveryId],
    ) -> RepoResult<Vec<EventDelivery>>;

    /// Loads a page of deliveries matching the given constraints.
    async fn load_event_deliveries_paged(
        &self,
        project_id: &ProjectId,
        endpoint_ids: &[EndpointId],
        event_id: Option<&EventId>,
        status: &[EventDeliveryStatus],
        search_params: SearchParams,
        pageable: &Pageable,
    ) -> RepoResult<(Vec<EventDelivery>, PaginationData)>;

    /// Transitions a delivery to `status`.
    ///
    /// Writing the current status again must be a no-op at the backend, so
    /// concurrent transitions to the same status stay idempotent.
    async fn update_status_of_event_delivery(
        &self,
        project_id: &ProjectId,
        delivery_id: &EventDeliveryId,
        status: EventDeliveryStatus,
    ) -> RepoResult<()>;

    /// Counts deliveries matching the given constraints.
    async fn count_event_deliveries(
        &self,
        project_id: &ProjectId,
        endpoint_ids: &[EndpointId],
        event_id: Option<&EventId>,
        status: &[EventDeliveryStatus],
        search_params: SearchParams,
    ) -> RepoResult<u64>;
}

/// Routing-rule lookups. Reserved for subscription look-aside.
#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    /// Finds a project's subscription by id.
    async fn find_subscription_by_id(
        &self,
        project_id: &ProjectId,
        subscription_id: &SubscriptionId,
    ) -> RepoResult<Subscription>;
}

/// Ingest-source lookups. Reserved for filter hydration.
#[async_trait]
pub trait SourceRepository: Send + Sync {
    /// Finds a project's source by id.
    async fn find_source_by_id(&self, project_id: &ProjectId, source_id: &str)
        -> RepoResult<Source>;
}

/// Device lookups. Reserved for stream fan-out extensions.
#[async_trait]
pub trait DeviceRepository: Send + Sync {
    /// Finds a project's device by id.
    async fn find_device_by_id(&self, project_id: &ProjectId, device_id: &str)
        -> RepoResult<Device>;
}

/// Byte-oriented look-aside cache.
#[async_trait]
pub trait Cache: Send + Sync {
    /// Reads a cached value.
    async fn get(&self, key: &str) -> RepoResult<Option<Bytes>>;

    /// Writes a value with a time-to-live.
    async fn set(&self, key: &str, value: Bytes, ttl: Duration) -> RepoResult<()>;

    /// Drops a cached value.
    async fn delete(&self, key: &str) -> RepoResult<()>;
}

pub mod mock {
    //! In-memory collaborator doubles for tests.
    //!
    //! Each mock stores state behind async locks, supports single-shot error
    //! injection for simulating backend failures, and records mutations so
    //! tests can assert on exactly what the service did.

    use std::{
        collections::{HashMap, VecDeque},
        sync::atomic::{AtomicUsize, Ordering},
        time::Duration,
    };

    use async_trait::async_trait;
    use bytes::Bytes;
    use tokio::sync::RwLock;

    use super::*;

    /// Endpoint repository double backed by in-memory maps.
    #[derive(Default)]
    pub struct MockEndpointRepository {
        endpoints: RwLock<HashMap<EndpointId, Endpoint>>,
        owner_endpoints: RwLock<HashMap<String, Vec<Endpoint>>>,
        update_status_error: RwLock<Option<String>>,
        status_updates: RwLock<Vec<(EndpointId, EndpointStatus)>>,
        find_calls: AtomicUsize,
    }

    impl MockEndpointRepository {
        /// Creates an empty repository.
        pub fn new() -> Self {
            Self::default()
        }

        /// Registers an endpoint for lookup by id.
        pub async fn add_endpoint(&self, endpoint: Endpoint) {
            self.endpoints.write().await.insert(endpoint.uid.clone(), endpoint);
        }

        /// Scripts the endpoint list returned for `owner_id`.
        pub async fn set_owner_endpoints(&self, owner_id: impl Into<String>, endpoints: Vec<Endpoint>) {
            self.owner_endpoints.write().await.insert(owner_id.into(), endpoints);
        }

        /// Makes the next status update fail with `message`. Single-shot.
        pub async fn inject_update_status_error(&self, message: impl Into<String>) {
            *self.update_status_error.write().await = Some(message.into());
        }

        /// Returns every applied status transition in order.
        pub async fn status_updates(&self) -> Vec<(EndpointId, EndpointStatus)> {
            self.status_updates.read().await.clone()
        }

        /// Returns how many by-id lookups were made.
        pub fn find_call_count(&self) -> usize {
            self.find_calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl EndpointRepository for MockEndpointRepository {
        async fn find_endpoint_by_id(
            &self,
            _project_id: &ProjectId,
            endpoint_id: &EndpointId,
        ) -> RepoResult<Endpoint> {
            self.find_calls.fetch_add(1, Ordering::SeqCst);
            self.endpoints
                .read()
                .await
                .get(endpoint_id)
                .cloned()
                .ok_or(StoreError::EndpointNotFound)
        }

        async fn find_endpoints_by_owner_id(
            &self,
            _project_id: &ProjectId,
            owner_id: &str,
        ) -> RepoResult<Vec<Endpoint>> {
            Ok(self.owner_endpoints.read().await.get(owner_id).cloned().unwrap_or_default())
        }

        async fn update_endpoint_status(
            &self,
            _project_id: &ProjectId,
            endpoint_id: &EndpointId,
            status: EndpointStatus,
        ) -> RepoResult<()> {
            if let Some(message) = self.update_status_error.write().await.take() {
                return Err(StoreError::Database(message));
            }
            if let Some(endpoint) = self.endpoints.write().await.get_mut(endpoint_id) {
                endpoint.status = status;
            }
            self.status_updates.write().await.push((endpoint_id.clone(), status));
            Ok(())
        }
    }

    /// Event repository double backed by an in-memory map.
    #[derive(Default)]
    pub struct MockEventRepository {
        events: RwLock<HashMap<EventId, Event>>,
        created: RwLock<Vec<Event>>,
        paged: RwLock<Option<(Vec<Event>, PaginationData)>>,
        find_error: RwLock<Option<String>>,
    }

    impl MockEventRepository {
        /// Creates an empty repository.
        pub fn new() -> Self {
            Self::default()
        }

        /// Registers an event for lookup by id.
        pub async fn add_event(&self, event: Event) {
            self.events.write().await.insert(event.uid.clone(), event);
        }

        /// Scripts the next paged load.
        pub async fn set_page(&self, events: Vec<Event>, pagination: PaginationData) {
            *self.paged.write().await = Some((events, pagination));
        }

        /// Makes the next by-ids lookup fail with `message`. Single-shot.
        pub async fn inject_find_error(&self, message: impl Into<String>) {
            *self.find_error.write().await = Some(message.into());
        }

        /// Returns every event persisted through `create_event`.
        pub async fn created_events(&self) -> Vec<Event> {
            self.created.read().await.clone()
        }
    }

    #[async_trait]
    impl EventRepository for MockEventRepository {
        async fn create_event(&self, event: &Event) -> RepoResult<()> {
            self.events.write().await.insert(event.uid.clone(), event.clone());
            self.created.write().await.push(event.clone());
            Ok(())
        }

        async fn find_event_by_id(
            &self,
            _project_id: &ProjectId,
            event_id: &EventId,
        ) -> RepoResult<Event> {
            self.events.read().await.get(event_id).cloned().ok_or(StoreError::EventNotFound)
        }

        async fn find_events_by_ids(
            &self,
            _project_id: &ProjectId,
            ids: &[EventId],
        ) -> RepoResult<Vec<Event>> {
            if let Some(message) = self.find_error.write().await.take() {
                return Err(StoreError::Database(message));
            }
            let events = self.events.read().await;
            Ok(ids.iter().filter_map(|id| events.get(id).cloned()).collect())
        }

        async fn load_events_paged(
            &self,
            _project_id: &ProjectId,
            _filter: &Filter,
        ) -> RepoResult<(Vec<Event>, PaginationData)> {
            Ok(self.paged.write().await.take().unwrap_or_default())
        }
    }

    /// Arguments recorded for one paged delivery load.
    #[derive(Debug, Clone)]
    pub struct PagedLoadCall {
        /// Endpoint constraint the service passed.
        pub endpoint_ids: Vec<EndpointId>,
        /// Event constraint the service passed.
        pub event_id: Option<EventId>,
        /// Status constraint the service passed.
        pub status: Vec<EventDeliveryStatus>,
        /// Cursor window the service passed.
        pub pageable: Pageable,
    }

    /// Delivery repository double with scripted pages.
    #[derive(Default)]
    pub struct MockEventDeliveryRepository {
        deliveries: RwLock<HashMap<EventDeliveryId, EventDelivery>>,
        pages: RwLock<VecDeque<(Vec<EventDelivery>, PaginationData)>>,
        paged_calls: RwLock<Vec<PagedLoadCall>>,
        find_by_ids_error: RwLock<Option<String>>,
        update_status_error: RwLock<Option<String>>,
        status_updates: RwLock<Vec<(EventDeliveryId, EventDeliveryStatus)>>,
        count: RwLock<u64>,
    }

    impl MockEventDeliveryRepository {
        /// Creates an empty repository.
        pub fn new() -> Self {
            Self::default()
        }

        /// Registers a delivery for lookup by id.
        pub async fn add_delivery(&self, delivery: EventDelivery) {
            self.deliveries.write().await.insert(delivery.uid.clone(), delivery);
        }

        /// Appends a page returned by successive paged loads, in order.
        pub async fn push_page(&self, deliveries: Vec<EventDelivery>, pagination: PaginationData) {
            self.pages.write().await.push_back((deliveries, pagination));
        }

        /// Makes the next by-ids lookup fail with `message`. Single-shot.
        pub async fn inject_find_by_ids_error(&self, message: impl Into<String>) {
            *self.find_by_ids_error.write().await = Some(message.into());
        }

        /// Makes the next status update fail with `message`. Single-shot.
        pub async fn inject_update_status_error(&self, message: impl Into<String>) {
            *self.update_status_error.write().await = Some(message.into());
        }

        /// Scripts the count returned by `count_event_deliveries`.
        pub async fn set_count(&self, count: u64) {
            *self.count.write().await = count;
        }

        /// Returns every applied status transition in order.
        pub async fn status_updates(&self) -> Vec<(EventDeliveryId, EventDeliveryStatus)> {
            self.status_updates.read().await.clone()
        }

        /// Returns the arguments of every paged load in order.
        pub async fn paged_calls(&self) -> Vec<PagedLoadCall> {
            self.paged_calls.read().await.clone()
        }
    }

    #[async_trait]
    impl EventDeliveryRepository for MockEventDeliveryRepository {
        async fn find_event_deliveries_by_ids(
            &self,
            _project_id: &ProjectId,
            ids: &[EventDeliveryId],
        ) -> RepoResult<Vec<EventDelivery>> {
            if let Some(message) = self.find_by_ids_error.write().await.take() {
                return Err(StoreError::Database(message));
            }
            let deliveries = self.deliveries.read().await;
            Ok(ids.iter().filter_map(|id| deliveries.get(id).cloned()).collect())
        }

        async fn load_event_deliveries_paged(
            &self,
            _project_id: &ProjectId,
            endpoint_ids: &[EndpointId],
            event_id: Option<&EventId>,
            status: &[EventDeliveryStatus],
            _search_params: SearchParams,
            pageable: &Pageable,
        ) -> RepoResult<(Vec<EventDelivery>, PaginationData)> {
            self.paged_calls.write().await.push(PagedLoadCall {
                endpoint_ids: endpoint_ids.to_vec(),
                event_id: event_id.cloned(),
                status: status.to_vec(),
                pageable: pageable.clone(),
            });
            Ok(self.pages.write().await.pop_front().unwrap_or_default())
        }

        async fn update_status_of_event_delivery(
            &self,
            _project_id: &ProjectId,
            delivery_id: &EventDeliveryId,
            status: EventDeliveryStatus,
        ) -> RepoResult<()> {
            if let Some(message) = self.update_status_error.write().await.take() {
                return Err(StoreError::Database(message));
            }
            if let Some(delivery) = self.deliveries.write().await.get_mut(delivery_id) {
                delivery.status = status;
            }
            self.status_updates.write().await.push((delivery_id.clone(), status));
            Ok(())
        }

        async fn count_event_deliveries(
            &self,
            _project_id: &ProjectId,
            _endpoint_ids: &[EndpointId],
            _event_id: Option<&EventId>,
            _status: &[EventDeliveryStatus],
            _search_params: SearchParams,
        ) -> RepoResult<u64> {
            Ok(*self.count.read().await)
        }
    }

    /// Subscription repository double.
    #[derive(Default)]
    pub struct MockSubscriptionRepository {
        subscriptions: RwLock<HashMap<SubscriptionId, Subscription>>,
    }

    impl MockSubscriptionRepository {
        /// Creates an empty repository.
        pub fn new() -> Self {
            Self::default()
        }

        /// Registers a subscription for lookup by id.
        pub async fn add_subscription(&self, subscription: Subscription) {
            self.subscriptions.write().await.insert(subscription.uid.clone(), subscription);
        }
    }

    #[async_trait]
    impl SubscriptionRepository for MockSubscriptionRepository {
        async fn find_subscription_by_id(
            &self,
            _project_id: &ProjectId,
            subscription_id: &SubscriptionId,
        ) -> RepoResult<Subscription> {
            self.subscriptions
                .read()
                .await
                .get(subscription_id)
                .cloned()
                .ok_or(StoreError::SubscriptionNotFound)
        }
    }

    /// Source repository double.
    #[derive(Default)]
    pub struct MockSourceRepository {
        sources: RwLock<HashMap<String, Source>>,
    }

    impl MockSourceRepository {
        /// Creates an empty repository.
        pub fn new() -> Self {
            Self::default()
        }

        /// Registers a source for lookup by id.
        pub async fn add_source(&self, source: Source) {
            self.sources.write().await.insert(source.uid.clone(), source);
        }
    }

    #[async_trait]
    impl SourceRepository for MockSourceRepository {
        async fn find_source_by_id(
            &self,
            _project_id: &ProjectId,
            source_id: &str,
        ) -> RepoResult<Source> {
            self.sources.read().await.get(source_id).cloned().ok_or(StoreError::SourceNotFound)
        }
    }

    /// Device repository double.
    #[derive(Default)]
    pub struct MockDeviceRepository {
        devices: RwLock<HashMap<String, Device>>,
    }

    impl MockDeviceRepository {
        /// Creates an empty repository.
        pub fn new() -> Self {
            Self::default()
        }

        /// Registers a device for lookup by id.
        pub async fn add_device(&self, device: Device) {
            self.devices.write().await.insert(device.uid.clone(), device);
        }
    }

    #[async_trait]
    impl DeviceRepository for MockDeviceRepository {
        async fn find_device_by_id(
            &self,
            _project_id: &ProjectId,
            device_id: &str,
        ) -> RepoResult<Device> {
            self.devices.read().await.get(device_id).cloned().ok_or(StoreError::DeviceNotFound)
        }
    }

    /// Cache double backed by a map; ttl is accepted and ignored.
    #[derive(Default)]
    pub struct MockCache {
        entries: RwLock<HashMap<String, Bytes>>,
    }

    impl MockCache {
        /// Creates an empty cache.
        pub fn new() -> Self {
            Self::default()
        }
    }

    #[async_trait]
    impl Cache for MockCache {
        async fn get(&self, key: &str) -> RepoResult<Option<Bytes>> {
            Ok(self.entries.read().await.get(key).cloned())
        }

        async fn set(&self, key: &str, value: Bytes, _ttl: Duration) -> RepoResult<()> {
            self.entries.write().await.insert(key.to_string(), value);
            Ok(())
        }

        async fn delete(&self, key: &str) -> RepoResult<()> {
            self.entries.write().await.remove(key);
            Ok(())
        }
    }
}
