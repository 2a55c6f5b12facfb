//! Background publisher for outbox rows the request path could not deliver.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::error::EventResult;
use crate::models::PendingNotification;
use crate::notifier::EventNotifier;
use crate::repository::EventRepository;

/// Outcome of one relay pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RelayReport {
    pub delivered: usize,
    pub failed: usize,
}

/// Publish one outbox row and record the outcome on it.
///
/// Returns whether the broker accepted the message. Bookkeeping failures are logged; the
/// row then stays pending and is published again later.
pub(crate) async fn deliver<R>(
    repository: &R,
    notifier: &dyn EventNotifier,
    notification: &PendingNotification,
) -> bool
where
    R: EventRepository + ?Sized,
{
    match notifier
        .publish(&notification.topic, &notification.payload)
        .await
    {
        Ok(()) => {
            if let Err(e) = repository.mark_delivered(notification.id).await {
                warn!(notification_id = notification.id, error = %e, "Failed to mark notification delivered");
            }
            true
        }
        Err(err) => {
            warn!(
                notification_id = notification.id,
                topic = %notification.topic,
                error = %err,
                "Event notification not delivered"
            );
            if let Err(e) = repository
                .record_failure(notification.id, &err.to_string())
                .await
            {
                warn!(notification_id = notification.id, error = %e, "Failed to record delivery failure");
            }
            false
        }
    }
}

/// Re-publishes pending outbox rows on an interval until they are delivered.
pub struct OutboxRelay<R: EventRepository> {
    repository: Arc<R>,
    notifier: Arc<dyn EventNotifier>,
    interval: Duration,
    batch_size: u64,
}

impl<R: EventRepository> OutboxRelay<R> {
    pub fn new(
        repository: Arc<R>,
        notifier: Arc<dyn EventNotifier>,
        interval: Duration,
        batch_size: u64,
    ) -> Self {
        Self {
            repository,
            notifier,
            interval,
            batch_size,
        }
    }

    /// One pass over the oldest pending rows. Stops at the first broker failure so a down
    /// broker costs one attempt per pass rather than one per row.
    pub async fn relay_pending(&self) -> EventResult<RelayReport> {
        let pending = self
            .repository
            .pending_notifications(self.batch_size)
            .await?;
        let mut report = RelayReport::default();

        for notification in &pending {
            if deliver(self.repository.as_ref(), self.notifier.as_ref(), notification).await {
                report.delivered += 1;
            } else {
                report.failed += 1;
                break;
            }
        }

        if report != RelayReport::default() {
            info!(
                delivered = report.delivered,
                failed = report.failed,
                "Outbox relay pass finished"
            );
        }
        Ok(report)
    }

    /// Run passes every `interval` until `shutdown` flips to `true`.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        info!(interval = ?self.interval, batch_size = self.batch_size, "Starting outbox relay");

        loop {
            if *shutdown.borrow() {
                break;
            }

            if let Err(e) = self.relay_pending().await {
                warn!(error = %e, "Outbox relay pass failed");
            }

            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                _ = tokio::time::sleep(self.interval) => {
                    debug!("Outbox relay tick");
                }
            }
        }

        info!("Outbox relay stopped");
    }
}
