use rdkafka::admin::{AdminClient, AdminOptions, NewTopic, TopicReplication};
use rdkafka::client::DefaultClientContext;
use rdkafka::error::RDKafkaErrorCode;
use rdkafka::producer::{FutureProducer, FutureRecord, Producer};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};

use crate::config::KafkaConfig;
use crate::error::{is_timeout_code, BrokerError};
use crate::lifecycle::BrokerState;
use crate::payload::Payload;

struct Clients {
    producer: FutureProducer,
    admin: AdminClient<DefaultClientContext>,
}

struct Inner {
    state: BrokerState,
    clients: Option<Arc<Clients>>,
}

/// Process-wide producer and admin client with an explicit lifecycle.
///
/// Construct once at startup and share behind an `Arc`. Concurrent operations run
/// in parallel; the clients serialize internally.
pub struct KafkaBroker {
    config: KafkaConfig,
    inner: RwLock<Inner>,
}

impl KafkaBroker {
    pub fn new(config: KafkaConfig) -> Self {
        Self {
            config,
            inner: RwLock::new(Inner {
                state: BrokerState::Uninitialized,
                clients: None,
            }),
        }
    }

    pub fn config(&self) -> &KafkaConfig {
        &self.config
    }

    pub async fn state(&self) -> BrokerState {
        self.inner.read().await.state
    }

    /// Create the clients and prove the broker is reachable with a metadata round trip.
    ///
    /// Fails once with a typed error and returns to the previous state; retrying is up
    /// to the caller. Calling `start` while already `Ready` is a no-op.
    ///
    /// # Panics
    /// When another `start` or `stop` is in progress.
    #[instrument(skip(self), fields(bootstrap_servers = %self.config.bootstrap_servers))]
    pub async fn start(&self) -> Result<(), BrokerError> {
        let previous = {
            let mut inner = self.inner.write().await;
            if inner.state.is_ready() {
                warn!("Kafka broker already started");
                return Ok(());
            }
            if !inner.state.can_start() {
                panic!("Kafka broker cannot start while {}", inner.state);
            }
            let previous = inner.state;
            inner.state = BrokerState::Starting;
            previous
        };

        info!("Starting Kafka broker");
        let connected = self.connect().await;

        let mut inner = self.inner.write().await;
        match connected {
            Ok(clients) => {
                inner.clients = Some(Arc::new(clients));
                inner.state = BrokerState::Ready;
                info!("Kafka broker ready");
                Ok(())
            }
            Err(err) => {
                inner.state = previous;
                warn!(error = %err, "Kafka broker failed to start");
                Err(err)
            }
        }
    }

    async fn connect(&self) -> Result<Clients, BrokerError> {
        let client_config = self.config.client_config();
        let producer: FutureProducer = client_config
            .create()
            .map_err(|e| BrokerError::Connection(e.to_string()))?;
        let admin: AdminClient<DefaultClientContext> = client_config
            .create()
            .map_err(|e| BrokerError::Connection(e.to_string()))?;

        // librdkafka connects lazily
        fetch_topic_names(producer.clone(), self.config.operation_timeout)
            .await
            .map_err(|err| match err {
                BrokerError::Timeout(msg) => BrokerError::Timeout(msg),
                other => BrokerError::Connection(other.to_string()),
            })?;

        Ok(Clients { producer, admin })
    }

    /// Flush pending messages and release the clients.
    ///
    /// Safe to call in any state; without an active connection it only logs.
    pub async fn stop(&self) {
        let clients = {
            let mut inner = self.inner.write().await;
            if !inner.state.is_ready() {
                info!(state = %inner.state, "Kafka broker already stopped");
                return;
            }
            inner.state = BrokerState::Stopping;
            inner.clients.take()
        };

        info!("Stopping Kafka broker");
        if let Some(clients) = clients {
            let timeout = self.config.message_timeout;
            match tokio::task::spawn_blocking(move || clients.producer.flush(timeout)).await {
                Ok(Ok(())) => debug!("Kafka producer flushed"),
                Ok(Err(e)) => warn!(error = %e, "Kafka producer flush failed"),
                Err(e) => warn!(error = %e, "Kafka producer flush task failed"),
            }
        }

        self.inner.write().await.state = BrokerState::Stopped;
        info!("Kafka broker stopped");
    }

    /// Snapshot of the clients, taken together with the state check under one lock.
    ///
    /// Never panics: outside [`BrokerState::Ready`] it reports
    /// [`BrokerError::Unavailable`] with the current state. A snapshot taken before
    /// `stop()` stays usable; its calls fail with broker errors once the clients close.
    pub async fn try_ready(&self) -> Result<ReadyBroker<'_>, BrokerError> {
        let inner = self.inner.read().await;
        match (inner.state, &inner.clients) {
            (BrokerState::Ready, Some(clients)) => Ok(ReadyBroker {
                config: &self.config,
                clients: clients.clone(),
            }),
            (state, _) => Err(BrokerError::Unavailable(state.to_string())),
        }
    }

    async fn ready_clients(&self, operation: &str) -> ReadyBroker<'_> {
        match self.try_ready().await {
            Ok(ready) => ready,
            Err(err) => panic!(
                "Kafka broker cannot {} while {}; call start() first",
                operation,
                match err {
                    BrokerError::Unavailable(state) => state,
                    other => other.to_string(),
                }
            ),
        }
    }

    /// Wait for the broker to acknowledge the message or for the message timeout.
    ///
    /// # Panics
    /// Outside [`BrokerState::Ready`].
    pub async fn send_message(
        &self,
        topic: &str,
        payload: impl Into<Payload>,
    ) -> Result<(), BrokerError> {
        self.ready_clients("send messages")
            .await
            .send_message(topic, payload)
            .await
    }

    /// Fails with [`BrokerError::TopicAlreadyExists`] when `name` exists.
    ///
    /// # Panics
    /// Outside [`BrokerState::Ready`].
    pub async fn create_topic(
        &self,
        name: &str,
        partitions: i32,
        replication: i32,
    ) -> Result<(), BrokerError> {
        self.ready_clients("create topics")
            .await
            .create_topic(name, partitions, replication)
            .await
    }

    /// Fails with [`BrokerError::UnknownTopic`] when `name` does not exist.
    ///
    /// # Panics
    /// Outside [`BrokerState::Ready`].
    pub async fn delete_topic(&self, name: &str) -> Result<(), BrokerError> {
        self.ready_clients("delete topics")
            .await
            .delete_topic(name)
            .await
    }

    /// Topic names, sorted, without internal `__` topics.
    ///
    /// # Panics
    /// Outside [`BrokerState::Ready`].
    pub async fn list_topics(&self) -> Result<Vec<String>, BrokerError> {
        self.ready_clients("list topics").await.list_topics().await
    }

    /// Readiness check: a metadata round trip. Unlike the other operations this never
    /// panics; outside `Ready` it reports [`BrokerError::Unavailable`].
    pub async fn health_check(&self) -> Result<(), BrokerError> {
        let ready = self.try_ready().await?;
        fetch_topic_names(ready.clients.producer.clone(), self.config.operation_timeout).await?;
        Ok(())
    }
}

/// Operations on clients captured by [`KafkaBroker::try_ready`].
pub struct ReadyBroker<'a> {
    config: &'a KafkaConfig,
    clients: Arc<Clients>,
}

impl ReadyBroker<'_> {
    #[instrument(skip(self, payload))]
    pub async fn send_message(
        &self,
        topic: &str,
        payload: impl Into<Payload>,
    ) -> Result<(), BrokerError> {
        let payload = payload.into();
        let record = FutureRecord::to(topic).payload(payload.as_bytes()).key("");

        match self
            .clients
            .producer
            .send(record, self.config.message_timeout)
            .await
        {
            Ok(delivery) => {
                debug!(bytes = payload.len(), ?delivery, "Message delivered");
                Ok(())
            }
            Err((err, _message)) => {
                warn!(error = %err, "Message delivery failed");
                Err(err.into())
            }
        }
    }

    #[instrument(skip(self))]
    pub async fn create_topic(
        &self,
        name: &str,
        partitions: i32,
        replication: i32,
    ) -> Result<(), BrokerError> {
        let topic = NewTopic::new(name, partitions, TopicReplication::Fixed(replication));

        let results = self
            .clients
            .admin
            .create_topics(&[topic], &self.admin_options())
            .await?;
        for result in results {
            let created = result.map_err(|(topic, code)| topic_error(topic, code))?;
            info!(topic = %created, "Topic created");
        }
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn delete_topic(&self, name: &str) -> Result<(), BrokerError> {
        let results = self
            .clients
            .admin
            .delete_topics(&[name], &self.admin_options())
            .await?;
        for result in results {
            let deleted = result.map_err(|(topic, code)| topic_error(topic, code))?;
            info!(topic = %deleted, "Topic deleted");
        }
        Ok(())
    }

    pub async fn list_topics(&self) -> Result<Vec<String>, BrokerError> {
        let mut topics: Vec<String> =
            fetch_topic_names(self.clients.producer.clone(), self.config.operation_timeout)
                .await?
                .into_iter()
                .filter(|name| !name.starts_with("__"))
                .collect();
        topics.sort();
        Ok(topics)
    }

    fn admin_options(&self) -> AdminOptions {
        AdminOptions::new().operation_timeout(Some(self.config.operation_timeout))
    }
}

fn topic_error(topic: String, code: RDKafkaErrorCode) -> BrokerError {
    match code {
        RDKafkaErrorCode::TopicAlreadyExists => BrokerError::TopicAlreadyExists(topic),
        RDKafkaErrorCode::UnknownTopicOrPartition | RDKafkaErrorCode::UnknownTopic => {
            BrokerError::UnknownTopic(topic)
        }
        code if is_timeout_code(code) => BrokerError::Timeout(format!("{}: {}", topic, code)),
        code => BrokerError::Broker(format!("{}: {}", topic, code)),
    }
}

/// Metadata calls block the calling thread.
async fn fetch_topic_names(
    producer: FutureProducer,
    timeout: Duration,
) -> Result<Vec<String>, BrokerError> {
    tokio::task::spawn_blocking(move || -> Result<Vec<String>, BrokerError> {
        let metadata = producer.client().fetch_metadata(None, timeout)?;
        Ok(metadata
            .topics()
            .iter()
            .map(|topic| topic.name().to_string())
            .collect())
    })
    .await
    .map_err(|e| BrokerError::Broker(format!("metadata task failed: {}", e)))?
}
