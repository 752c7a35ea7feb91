//! IoT Telemetry Simulator
//!
//! Generates synthetic telemetry for a fleet of simulated devices and
//! publishes it to Azure Event Hubs, or to a JSONL file for dry runs.
//!
//! # Crates
//!
//! - `telemetry_core` - settings model, validation, `Message`, credential chain
//! - `telemetry_generator` - value synthesis, geo jitter, message builder, task planner
//! - `telemetry_dispatch` - `Publisher` trait and the bounded-concurrency dispatcher
//! - `telemetry_publish_kafka` - Event Hubs publisher over the Kafka protocol
//! - `telemetry_publish_jsonl` - JSONL publisher
//!
//! # CLI Usage
//!
//! ```bash
//! # Send to the event hub named in the connection string
//! iot-telemetry-sim send --settings settings.yml
//!
//! # Deterministic dry run to stdout
//! iot-telemetry-sim send --settings settings.yml --seed 42 --output -
//!
//! # Check a settings file
//! iot-telemetry-sim validate --settings settings.yml
//! ```

pub mod send;

pub use send::{run_send, run_validate, SendArgs, DEFAULT_SETTINGS_FILE};
