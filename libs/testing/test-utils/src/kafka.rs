//! Kafka test infrastructure
//!
//! Provides a `TestKafka` helper that starts a single-node Kafka container.

use testcontainers::ContainerAsync;
use testcontainers::runners::AsyncRunner;
use testcontainers_modules::kafka::{KAFKA_PORT, Kafka};

/// Test Kafka wrapper that ensures proper cleanup
///
/// The container is automatically stopped and removed when this struct is dropped.
///
/// # Example
///
/// ```no_run
/// use test_utils::TestKafka;
///
/// # async fn example() {
/// let kafka = TestKafka::new().await;
/// let config = KafkaConfig::new(kafka.bootstrap_servers.clone());
/// # }
/// ```
pub struct TestKafka {
    #[allow(dead_code)]
    container: ContainerAsync<Kafka>,
    /// `127.0.0.1:<mapped port>`
    pub bootstrap_servers: String,
}

impl TestKafka {
    pub async fn new() -> Self {
        let container = Kafka::default()
            .start()
            .await
            .expect("Failed to start Kafka container");

        let host_port = container
            .get_host_port_ipv4(KAFKA_PORT)
            .await
            .expect("Failed to get Kafka port");

        let bootstrap_servers = format!("127.0.0.1:{}", host_port);
        tracing::info!(port = host_port, "Test Kafka ready");

        Self {
            container,
            bootstrap_servers,
        }
    }
}

impl Drop for TestKafka {
    fn drop(&mut self) {
        tracing::debug!("Cleaning up test Kafka container");
    }
}
