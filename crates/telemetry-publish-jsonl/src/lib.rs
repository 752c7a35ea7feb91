//! JSONL publisher for the IoT telemetry simulator.
//!
//! Writes one JSON object per line to a file or stdout instead of sending
//! to Event Hubs. Used for dry runs and for capturing generated telemetry.

pub mod error;
pub mod publisher;

pub use error::JsonlPublisherError;
pub use publisher::{JsonlPublisher, DEFAULT_BUFFER_SIZE, STDOUT_PATH};
