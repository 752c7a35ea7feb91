//! Message generation for the IoT telemetry simulator.
//!
//! This crate turns a validated [`SimulationConfig`](telemetry_core::SimulationConfig)
//! into messages:
//!
//! ```text
//! SimulationConfig
//!        │
//!        ├──────────────────────────┐
//!        ▼                          ▼
//! ┌─────────────────┐     ┌─────────────────┐
//! │    TaskPlan     │     │ MessageBuilder  │
//! │                 │     │                 │
//! │ - entity ids    │────▶│ - id field      │
//! │   in task order │     │ - timestamp     │
//! └─────────────────┘     │ - lat / lon     │
//!                         │ - values        │
//!                         └────────┬────────┘
//!                                  ▼
//!                               Message
//! ```
//!
//! # Example
//!
//! ```rust
//! use rand::rngs::StdRng;
//! use rand::SeedableRng;
//! use telemetry_core::{SimulationConfig, ValueKind, ValueSpec};
//! use telemetry_generator::{MessageBuilder, TaskPlan};
//!
//! let config = SimulationConfig {
//!     entity_count: 3,
//!     max_messages: 2,
//!     start_id: 10,
//!     values: vec![ValueSpec::new("temperature", 18.0, 30.0, ValueKind::Float)],
//!     ..SimulationConfig::default()
//! };
//!
//! let plan = TaskPlan::from_config(&config);
//! let ids: Vec<i64> = plan.entity_ids().collect();
//! assert_eq!(ids, vec![10, 10, 10, 11, 11, 11]);
//!
//! let builder = MessageBuilder::from_config(&config);
//! let mut rng = StdRng::seed_from_u64(42);
//! let message = builder.build(ids[0], &mut rng);
//! assert_eq!(message.keys().collect::<Vec<_>>(), vec!["deviceId", "temperature"]);
//! ```
//!
//! # Generators
//!
//! - `numeric` - random int/float in a configured range
//! - `geo` - coordinate jitter (`round` / `square` geo sections)
//! - `timestamp` - ISO-8601 UTC timestamps with millisecond precision

pub mod builder;
pub mod generators;
pub mod plan;

// Re-exports for convenience
pub use builder::{FieldContributor, MessageBuilder};
pub use generators::geo::{jitter, GeoPoint};
pub use generators::numeric::{synthesize, SyntheticValue};
pub use generators::{round_decimals, task_rng, DECIMAL_PRECISION};
pub use plan::{Task, TaskIter, TaskPlan};
