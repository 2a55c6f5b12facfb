use async_trait::async_trait;
use database::Filters;

use crate::error::EventResult;
use crate::models::{CreateEvent, Event, PendingNotification};

/// Broker message to record alongside a new event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboxMessage {
    pub topic: String,
    pub payload: String,
}

/// Persistence for events and their notification outbox.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EventRepository: Send + Sync {
    /// Exact-name lookup across every client.
    async fn exists_by_name(&self, name: &str) -> EventResult<bool>;

    /// Insert the event and its outbox row in one transaction.
    ///
    /// Returns the stored event and the outbox row id. Fails with
    /// [`EventError::Duplicate`](crate::EventError::Duplicate) when the name is taken.
    async fn create(
        &self,
        input: CreateEvent,
        client_id: &str,
        message: OutboxMessage,
    ) -> EventResult<(Event, i32)>;

    /// `None` when the event does not exist or belongs to another client.
    async fn get_for_client(&self, id: i32, client_id: &str) -> EventResult<Option<Event>>;

    /// Every event owned by `client_id`, ordered by id.
    async fn list_for_client(&self, client_id: &str) -> EventResult<Vec<Event>>;

    /// Case-insensitive substring search restricted to `client_id`'s events.
    async fn search(&self, filters: Filters, client_id: &str) -> EventResult<Vec<Event>>;

    /// Oldest undelivered outbox rows first.
    async fn pending_notifications(&self, limit: u64) -> EventResult<Vec<PendingNotification>>;

    async fn mark_delivered(&self, notification_id: i32) -> EventResult<()>;

    /// Count a failed attempt and keep the row pending.
    async fn record_failure(&self, notification_id: i32, error: &str) -> EventResult<()>;
}
