//! Event Hubs publisher over the Kafka protocol.

use crate::connection::EventHubConnection;
use crate::error::KafkaPublisherError;
use async_trait::async_trait;
use rdkafka::error::{KafkaError, RDKafkaErrorCode};
use rdkafka::producer::{FutureProducer, FutureRecord, Producer};
use rdkafka::ClientConfig;
use std::time::Duration;
use telemetry_core::Message;
use telemetry_dispatch::{PublishError, Publisher};
use tracing::{debug, info, warn};

/// Default time a send may wait in the producer queue.
pub const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(30);

/// Time allowed for outstanding messages to drain on close.
pub const FLUSH_TIMEOUT: Duration = Duration::from_secs(30);

/// Publishes JSON messages to one event hub, keyed by entity id.
pub struct EventHubPublisher {
    producer: FutureProducer,
    topic: String,
    send_timeout: Duration,
    name: String,
}

impl EventHubPublisher {
    /// Create a producer for `event_hub` in the namespace of `connection`.
    ///
    /// # Arguments
    ///
    /// * `connection` - Parsed connection string, also used as SASL password
    /// * `event_hub` - Event hub (Kafka topic) to publish to
    /// * `send_timeout` - Delivery timeout per message
    pub fn new(
        connection: &EventHubConnection,
        event_hub: impl Into<String>,
        send_timeout: Duration,
    ) -> Result<Self, KafkaPublisherError> {
        let topic = event_hub.into();
        let producer: FutureProducer = client_config(connection, send_timeout)
            .create()
            .map_err(KafkaPublisherError::Kafka)?;

        info!(
            "Created Event Hubs producer for '{}' at {}",
            topic,
            connection.bootstrap_servers()
        );

        Ok(Self {
            producer,
            name: format!("event hub '{topic}'"),
            topic,
            send_timeout,
        })
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }
}

/// Producer configuration for the Event Hubs Kafka endpoint.
pub fn client_config(connection: &EventHubConnection, send_timeout: Duration) -> ClientConfig {
    let mut config = ClientConfig::new();
    config
        .set("bootstrap.servers", connection.bootstrap_servers())
        .set("security.protocol", "SASL_SSL")
        .set("sasl.mechanism", "PLAIN")
        .set("sasl.username", "$ConnectionString")
        .set("sasl.password", connection.as_str())
        .set("client.id", "iot-telemetry-sim")
        .set("message.timeout.ms", send_timeout.as_millis().to_string())
        .set("request.timeout.ms", "60000")
        .set("linger.ms", "5");
    config
}

/// Map a Kafka error onto the dispatcher's fatal/transient split.
///
/// Authentication, authorization and "all brokers down" mean no later
/// message can succeed either.
pub fn classify(err: &KafkaError) -> PublishError {
    match err.rdkafka_error_code() {
        Some(
            RDKafkaErrorCode::Authentication
            | RDKafkaErrorCode::SaslAuthenticationFailed
            | RDKafkaErrorCode::TopicAuthorizationFailed
            | RDKafkaErrorCode::ClusterAuthorizationFailed
            | RDKafkaErrorCode::AllBrokersDown,
        ) => PublishError::fatal(err.to_string()),
        _ => PublishError::transient(err.to_string()),
    }
}

#[async_trait]
impl Publisher for EventHubPublisher {
    async fn publish(&self, message: &Message) -> Result<(), PublishError> {
        let payload = message
            .to_json_vec()
            .map_err(|e| PublishError::transient(format!("failed to encode message: {e}")))?;
        let key = message.entity_id().to_string();

        let record = FutureRecord::to(&self.topic)
            .key(key.as_str())
            .payload(payload.as_slice());
        match self.producer.send(record, self.send_timeout).await {
            Ok(_) => {
                debug!("Delivered message for entity {} to '{}'", key, self.topic);
                Ok(())
            }
            Err((err, _)) => Err(classify(&err)),
        }
    }

    async fn close(&self) -> Result<(), PublishError> {
        let producer = self.producer.clone();
        let in_flight = producer.in_flight_count();
        if in_flight > 0 {
            info!("Flushing {} outstanding message(s)", in_flight);
        }

        tokio::task::spawn_blocking(move || producer.flush(FLUSH_TIMEOUT))
            .await
            .map_err(|e| PublishError::transient(format!("flush task failed: {e}")))?
            .map_err(|e| {
                warn!("Flush of '{}' did not complete: {}", self.topic, e);
                classify(&e)
            })
    }

    fn name(&self) -> &str {
        &self.name
    }
}
