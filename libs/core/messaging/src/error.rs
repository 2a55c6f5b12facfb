//! Broker failures.

use rdkafka::error::{KafkaError, RDKafkaErrorCode};
use thiserror::Error;

/// A broker operation failed.
///
/// Library errors are translated at the call site; callers map these onto HTTP
/// statuses (timeouts 408, existing topic 409, everything else 500).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BrokerError {
    /// The broker could not be reached while starting.
    #[error("Could not connect to Kafka: {0}")]
    Connection(String),

    /// The broker did not answer within the configured timeout.
    #[error("Kafka timed out: {0}")]
    Timeout(String),

    #[error("Topic '{0}' already exists")]
    TopicAlreadyExists(String),

    #[error("Topic '{0}' does not exist")]
    UnknownTopic(String),

    /// The broker is not serving requests (health checks outside `Ready`).
    #[error("Kafka broker is {0}")]
    Unavailable(String),

    /// Any other broker error, carrying the broker's message.
    #[error("{0}")]
    Broker(String),
}

impl BrokerError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, BrokerError::Timeout(_))
    }
}

pub(crate) fn is_timeout_code(code: RDKafkaErrorCode) -> bool {
    matches!(
        code,
        RDKafkaErrorCode::OperationTimedOut
            | RDKafkaErrorCode::RequestTimedOut
            | RDKafkaErrorCode::MessageTimedOut
    )
}

impl From<KafkaError> for BrokerError {
    fn from(err: KafkaError) -> Self {
        match err.rdkafka_error_code() {
            Some(code) if is_timeout_code(code) => BrokerError::Timeout(err.to_string()),
            _ => BrokerError::Broker(err.to_string()),
        }
    }
}
