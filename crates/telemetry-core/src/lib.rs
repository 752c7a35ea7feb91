//! Core types for the IoT telemetry simulator.
//!
//! This crate provides the foundational types shared by the generator,
//! dispatcher and publishers:
//!
//! - [`Settings`] - Raw settings document loaded from `settings.yml`
//! - [`SimulationConfig`] - Validated, read-only configuration consumed by generation
//! - [`Message`] - Ordered output record produced for one task
//! - [`CredentialChain`] - Ordered resolution of the ingestion connection string
//!
//! # Architecture
//!
//! ```text
//! telemetry-core (this crate)
//!    │
//!    ├─── telemetry-generator      (values, geo jitter, message builder, task plan)
//!    ├─── telemetry-dispatch       (bounded dispatcher, publisher trait, progress)
//!    ├─── telemetry-publish-kafka  (Event Hubs over the Kafka protocol)
//!    └─── telemetry-publish-jsonl  (JSONL capture / dry run)
//! ```
//!
//! # Example
//!
//! ```rust
//! use telemetry_core::Settings;
//!
//! let settings = Settings::from_yaml(r#"
//! entityCount: 3
//! maxMessages: 2
//! values:
//!   - name: temperature
//!     min: 18
//!     max: 30
//! "#).unwrap();
//!
//! let config = settings.validate().unwrap();
//! assert_eq!(config.total_tasks(), 6);
//! assert_eq!(config.id_key_name, "deviceId");
//! ```

pub mod credentials;
pub mod error;
pub mod message;
pub mod settings;

// Re-exports for convenience
pub use credentials::{
    CredentialChain, CredentialOrigin, CredentialSource, ResolvedCredential,
    CONNECTION_STRING_ENV,
};
pub use error::{CredentialsError, SettingsError};
pub use message::Message;
pub use settings::{
    Coordinates, EventHubSettings, GeoBounds, GeoConfig, GeoSectionKind, GeoSectionSettings,
    Settings, SimulationConfig, TimestampSettings, ValueKind, ValueSettings, ValueSpec,
    DEFAULT_ID_KEY_NAME, DEFAULT_LAT_RANGE, DEFAULT_LON_RANGE, DEFAULT_RADIUS, DEFAULT_START_ID,
};
