use async_trait::async_trait;
use messaging::{BrokerError, KafkaBroker};

/// Publishes event notifications to the broker.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EventNotifier: Send + Sync {
    async fn publish(&self, topic: &str, payload: &str) -> Result<(), BrokerError>;
}

/// Outside `Ready` the broker reports [`BrokerError::Unavailable`] instead of panicking, so
/// the outbox row stays pending until the relay runs against a started broker.
#[async_trait]
impl EventNotifier for KafkaBroker {
    async fn publish(&self, topic: &str, payload: &str) -> Result<(), BrokerError> {
        self.try_ready().await?.send_message(topic, payload).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use messaging::KafkaConfig;

    #[tokio::test]
    async fn test_unstarted_broker_reports_unavailable() {
        let broker = KafkaBroker::new(KafkaConfig::new("127.0.0.1:1"));
        let err = broker.publish("events", "Launch was created").await.unwrap_err();
        assert_eq!(err, BrokerError::Unavailable("uninitialized".into()));
    }
}
