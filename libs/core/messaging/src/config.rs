//! Kafka connection settings.

use core_config::{env_optional, env_or_default, env_parse_or, ConfigError, FromEnv};
use rdkafka::ClientConfig;
use std::time::Duration;

/// Producer and admin client settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KafkaConfig {
    /// Comma separated `host:port` list
    pub bootstrap_servers: String,
    pub client_id: String,
    /// How long a send may wait for the broker's acknowledgement
    pub message_timeout: Duration,
    /// Deadline for admin and metadata calls
    pub operation_timeout: Duration,
}

impl KafkaConfig {
    pub fn new(bootstrap_servers: impl Into<String>) -> Self {
        Self {
            bootstrap_servers: bootstrap_servers.into(),
            client_id: "eventdesk".to_string(),
            message_timeout: Duration::from_millis(5000),
            operation_timeout: Duration::from_millis(5000),
        }
    }

    pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = client_id.into();
        self
    }

    pub fn with_message_timeout(mut self, timeout: Duration) -> Self {
        self.message_timeout = timeout;
        self
    }

    pub fn with_operation_timeout(mut self, timeout: Duration) -> Self {
        self.operation_timeout = timeout;
        self
    }

    /// librdkafka settings shared by the producer and the admin client.
    pub fn client_config(&self) -> ClientConfig {
        let mut config = ClientConfig::new();
        config
            .set("bootstrap.servers", &self.bootstrap_servers)
            .set("client.id", &self.client_id)
            .set("message.timeout.ms", self.message_timeout.as_millis().to_string())
            .set("socket.timeout.ms", self.operation_timeout.as_millis().to_string());
        config
    }
}

impl FromEnv for KafkaConfig {
    /// - KAFKA_BOOTSTRAP_SERVERS, else KAFKA_HOSTNAME:KAFKA_PORT (localhost:9092)
    /// - KAFKA_CLIENT_ID: defaults to "eventdesk"
    /// - KAFKA_MESSAGE_TIMEOUT_MS, KAFKA_OPERATION_TIMEOUT_MS: default to 5000
    fn from_env() -> Result<Self, ConfigError> {
        let bootstrap_servers = match env_optional("KAFKA_BOOTSTRAP_SERVERS") {
            Some(servers) => servers,
            None => {
                let host = env_or_default("KAFKA_HOSTNAME", "localhost");
                let port: u16 = env_parse_or("KAFKA_PORT", 9092)?;
                format!("{}:{}", host, port)
            }
        };

        Ok(Self {
            bootstrap_servers,
            client_id: env_or_default("KAFKA_CLIENT_ID", "eventdesk"),
            message_timeout: Duration::from_millis(env_parse_or("KAFKA_MESSAGE_TIMEOUT_MS", 5000)?),
            operation_timeout: Duration::from_millis(env_parse_or(
                "KAFKA_OPERATION_TIMEOUT_MS",
                5000,
            )?),
        })
    }
}
