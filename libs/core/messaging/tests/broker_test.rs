//! Broker lifecycle and admin operations against a real Kafka container.

use messaging::{BrokerError, BrokerState, KafkaBroker, KafkaConfig};
use std::time::Duration;
use test_utils::TestKafka;

async fn started_broker(kafka: &TestKafka) -> KafkaBroker {
    let config = KafkaConfig::new(kafka.bootstrap_servers.clone())
        .with_client_id("messaging-tests")
        .with_operation_timeout(Duration::from_secs(10))
        .with_message_timeout(Duration::from_secs(10));
    let broker = KafkaBroker::new(config);
    broker.start().await.expect("broker starts");
    broker
}

#[tokio::test]
async fn test_topic_creation_is_not_idempotent() {
    let kafka = TestKafka::new().await;
    let broker = started_broker(&kafka).await;

    broker.create_topic("launches", 1, 1).await.unwrap();
    let err = broker.create_topic("launches", 1, 1).await.unwrap_err();
    assert_eq!(err, BrokerError::TopicAlreadyExists("launches".into()));

    broker.stop().await;
}

#[tokio::test]
async fn test_list_send_and_delete() {
    let kafka = TestKafka::new().await;
    let broker = started_broker(&kafka).await;

    broker.create_topic("zeta", 1, 1).await.unwrap();
    broker.create_topic("alpha", 2, 1).await.unwrap();

    let topics = broker.list_topics().await.unwrap();
    assert!(topics.iter().all(|t| !t.starts_with("__")));
    let alpha = topics.iter().position(|t| t == "alpha").unwrap();
    let zeta = topics.iter().position(|t| t == "zeta").unwrap();
    assert!(alpha < zeta);

    broker.send_message("alpha", "Launch was created").await.unwrap();
    broker.send_message("alpha", vec![0u8, 1, 2]).await.unwrap();

    broker.delete_topic("zeta").await.unwrap();
    let err = broker.delete_topic("never-existed").await.unwrap_err();
    assert!(matches!(err, BrokerError::UnknownTopic(_)), "{err:?}");

    broker.health_check().await.unwrap();
    broker.stop().await;
}

#[tokio::test]
async fn test_stop_then_restart() {
    let kafka = TestKafka::new().await;
    let broker = started_broker(&kafka).await;
    assert_eq!(broker.state().await, BrokerState::Ready);

    broker.stop().await;
    assert_eq!(broker.state().await, BrokerState::Stopped);
    broker.stop().await;
    assert_eq!(broker.state().await, BrokerState::Stopped);

    broker.start().await.unwrap();
    assert_eq!(broker.state().await, BrokerState::Ready);
    broker.create_topic("restarted", 1, 1).await.unwrap();
    broker.send_message("restarted", "again").await.unwrap();
    broker.stop().await;
}

#[tokio::test]
async fn test_snapshot_survives_concurrent_stop() {
    let kafka = TestKafka::new().await;
    let broker = started_broker(&kafka).await;
    broker.create_topic("draining", 1, 1).await.unwrap();

    let ready = broker.try_ready().await.unwrap();
    broker.stop().await;

    // In-flight work on the snapshot finishes or fails; it never panics.
    let _ = ready.send_message("draining", "late").await;
    assert_eq!(
        broker.try_ready().await.err(),
        Some(BrokerError::Unavailable("stopped".into()))
    );
}
