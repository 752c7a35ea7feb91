//! Azure Event Hubs publisher for the IoT telemetry simulator.
//!
//! Event Hubs speaks the Kafka protocol, so messages go out through an
//! `rdkafka` [`FutureProducer`](rdkafka::producer::FutureProducer)
//! authenticated with SASL PLAIN, using the connection string as password.
//!
//! # Example
//!
//! ```rust,ignore
//! use telemetry_publish_kafka::{EventHubConnection, EventHubPublisher};
//!
//! let connection = EventHubConnection::parse(&connection_string)?;
//! let event_hub = connection.resolve_event_hub(None)?;
//! let publisher = EventHubPublisher::new(&connection, event_hub, Duration::from_secs(30))?;
//! ```

pub mod args;
pub mod connection;
pub mod error;
pub mod publisher;

// Re-exports for convenience
pub use args::EventHubArgs;
pub use connection::{mask_connection_string, EventHubConnection, KAFKA_PORT};
pub use error::KafkaPublisherError;
pub use publisher::{classify, client_config, EventHubPublisher, DEFAULT_SEND_TIMEOUT};
