//! Error types for the Event Hubs publisher.

use thiserror::Error;

/// Errors raised while setting up the Event Hubs publisher.
#[derive(Error, Debug)]
pub enum KafkaPublisherError {
    #[error("Kafka error: {0}")]
    Kafka(#[from] rdkafka::error::KafkaError),

    #[error("Invalid connection string: {0}")]
    ConnectionString(String),

    #[error("No event hub name: set EntityPath in the connection string, azureEventHub.eventHubName, or --event-hub")]
    MissingEventHub,
}
