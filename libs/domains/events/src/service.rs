use database::Filters;
use std::sync::Arc;
use tracing::{debug, instrument, warn};
use validator::Validate;

use crate::cache::{CacheRead, EventCache};
use crate::config::EventsConfig;
use crate::error::{EventError, EventResult};
use crate::models::{CreateEvent, Event, PendingNotification, created_message};
use crate::notifier::EventNotifier;
use crate::relay::{OutboxRelay, deliver};
use crate::repository::{EventRepository, OutboxMessage};

/// Event business rules: global name uniqueness, per-client visibility and
/// at-least-once creation notices.
pub struct EventService<R: EventRepository> {
    repository: Arc<R>,
    notifier: Arc<dyn EventNotifier>,
    cache: Option<EventCache>,
    config: EventsConfig,
}

impl<R: EventRepository> EventService<R> {
    pub fn new(repository: R, notifier: Arc<dyn EventNotifier>, config: EventsConfig) -> Self {
        Self {
            repository: Arc::new(repository),
            notifier,
            cache: None,
            config,
        }
    }

    /// Serve [`list_events`](Self::list_events) through `cache`.
    pub fn with_cache(mut self, cache: EventCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// A relay sharing this service's repository and notifier.
    pub fn outbox_relay(&self) -> OutboxRelay<R> {
        OutboxRelay::new(
            self.repository.clone(),
            self.notifier.clone(),
            self.config.relay_interval,
            self.config.relay_batch_size,
        )
    }

    /// Store a new event for `client_id` and announce it on the events topic.
    ///
    /// The event and its outbox row commit together. Publishing happens after the
    /// commit; when it fails the event is still returned and the relay retries later.
    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create_event(&self, input: CreateEvent, client_id: &str) -> EventResult<Event> {
        input
            .validate()
            .map_err(|e| EventError::Validation(e.to_string()))?;

        if self.repository.exists_by_name(&input.name).await? {
            return Err(EventError::Duplicate(input.name));
        }

        let message = OutboxMessage {
            topic: self.config.topic.clone(),
            payload: created_message(&input.name),
        };
        let (event, notification_id) = self
            .repository
            .create(input, client_id, message.clone())
            .await?;

        self.invalidate_cached(client_id).await;

        let notification = PendingNotification {
            id: notification_id,
            event_id: event.id,
            topic: message.topic,
            payload: message.payload,
            attempts: 0,
        };
        deliver(self.repository.as_ref(), self.notifier.as_ref(), &notification).await;

        tracing::info!(event_id = event.id, "Event '{}' was created", event.name);
        Ok(event)
    }

    /// Every event owned by `client_id`, possibly up to the cache TTL old.
    ///
    /// A snapshot read while a create for the same client commits is returned but not
    /// cached.
    #[instrument(skip(self))]
    pub async fn list_events(&self, client_id: &str) -> EventResult<Vec<Event>> {
        let mut seen_generation = None;
        if let Some(cache) = &self.cache {
            match cache.read(client_id).await {
                Ok(CacheRead::Hit(events)) => return Ok(events),
                Ok(CacheRead::Miss { generation }) => seen_generation = Some(generation),
                Err(e) => warn!(error = %e, "Event cache read failed, reading from database"),
            }
        }

        let events = self.repository.list_for_client(client_id).await?;

        if let (Some(cache), Some(generation)) = (&self.cache, seen_generation) {
            match cache.put(client_id, &events, generation).await {
                Ok(true) => {}
                Ok(false) => debug!("Event list changed while reading, not caching it"),
                Err(e) => warn!(error = %e, "Event cache write failed"),
            }
        }
        Ok(events)
    }

    #[instrument(skip(self))]
    pub async fn search_events(&self, filters: Filters, client_id: &str) -> EventResult<Vec<Event>> {
        self.repository.search(filters, client_id).await
    }

    pub async fn get_event(&self, id: i32, client_id: &str) -> EventResult<Event> {
        self.repository
            .get_for_client(id, client_id)
            .await?
            .ok_or(EventError::NotFound(id))
    }

    async fn invalidate_cached(&self, client_id: &str) {
        if let Some(cache) = &self.cache {
            if let Err(e) = cache.invalidate(client_id).await {
                warn!(error = %e, "Event cache invalidation failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifier::MockEventNotifier;
    use crate::repository::MockEventRepository;
    use chrono::NaiveDate;
    use messaging::BrokerError;
    use mockall::predicate::eq;

    fn launch() -> CreateEvent {
        CreateEvent {
            name: "Launch".to_string(),
            date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
        }
    }

    fn stored(id: i32, input: &CreateEvent, client: &str) -> Event {
        Event {
            id,
            name: input.name.clone(),
            date: input.date,
            client_info: Some(client.to_string()),
        }
    }

    fn service(repo: MockEventRepository, notifier: MockEventNotifier) -> EventService<MockEventRepository> {
        EventService::new(repo, Arc::new(notifier), EventsConfig::default())
    }

    #[tokio::test]
    async fn test_create_stamps_client_and_publishes() {
        let mut repo = MockEventRepository::new();
        repo.expect_exists_by_name()
            .with(eq("Launch"))
            .returning(|_| Ok(false));
        repo.expect_create()
            .withf(|input, client, message| {
                input.name == "Launch"
                    && client == "app-1"
                    && message.topic == "events"
                    && message.payload == "Launch was created"
            })
            .returning(|input, client, _| Ok((stored(1, &input, client), 11)));
        repo.expect_mark_delivered()
            .with(eq(11))
            .times(1)
            .returning(|_| Ok(()));

        let mut notifier = MockEventNotifier::new();
        notifier
            .expect_publish()
            .with(eq("events"), eq("Launch was created"))
            .times(1)
            .returning(|_, _| Ok(()));

        let event = service(repo, notifier)
            .create_event(launch(), "app-1")
            .await
            .unwrap();
        assert_eq!(event.id, 1);
        assert_eq!(event.client_info.as_deref(), Some("app-1"));
    }

    #[tokio::test]
    async fn test_duplicate_name_rejected_before_write() {
        let mut repo = MockEventRepository::new();
        repo.expect_exists_by_name().returning(|_| Ok(true));
        repo.expect_create().never();

        let mut notifier = MockEventNotifier::new();
        notifier.expect_publish().never();

        let err = service(repo, notifier)
            .create_event(launch(), "app-1")
            .await
            .unwrap_err();
        assert!(matches!(err, EventError::Duplicate(ref name) if name == "Launch"));
    }

    #[tokio::test]
    async fn test_broker_failure_keeps_event_and_outbox_row() {
        let mut repo = MockEventRepository::new();
        repo.expect_exists_by_name().returning(|_| Ok(false));
        repo.expect_create()
            .returning(|input, client, _| Ok((stored(2, &input, client), 12)));
        repo.expect_mark_delivered().never();
        repo.expect_record_failure()
            .withf(|id, error| *id == 12 && error.contains("stopped"))
            .times(1)
            .returning(|_, _| Ok(()));

        let mut notifier = MockEventNotifier::new();
        notifier
            .expect_publish()
            .returning(|_, _| Err(BrokerError::Unavailable("stopped".into())));

        let event = service(repo, notifier)
            .create_event(launch(), "app-1")
            .await
            .unwrap();
        assert_eq!(event.id, 2);
    }

    #[tokio::test]
    async fn test_invalid_name_is_validation_error() {
        let mut repo = MockEventRepository::new();
        repo.expect_exists_by_name().never();

        let input = CreateEvent {
            name: String::new(),
            ..launch()
        };
        let err = service(repo, MockEventNotifier::new())
            .create_event(input, "app-1")
            .await
            .unwrap_err();
        assert!(matches!(err, EventError::Validation(_)));
    }

    #[tokio::test]
    async fn test_get_event_of_other_client_is_not_found() {
        let mut repo = MockEventRepository::new();
        repo.expect_get_for_client()
            .with(eq(5), eq("app-2"))
            .returning(|_, _| Ok(None));

        let err = service(repo, MockEventNotifier::new())
            .get_event(5, "app-2")
            .await
            .unwrap_err();
        assert!(matches!(err, EventError::NotFound(5)));
    }

    #[tokio::test]
    async fn test_list_without_cache_reads_repository() {
        let mut repo = MockEventRepository::new();
        repo.expect_list_for_client()
            .with(eq("app-1"))
            .times(1)
            .returning(|client| Ok(vec![stored(1, &launch(), client)]));

        let events = service(repo, MockEventNotifier::new())
            .list_events("app-1")
            .await
            .unwrap();
        assert_eq!(events.len(), 1);
    }
}
