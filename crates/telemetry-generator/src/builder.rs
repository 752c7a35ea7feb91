//! Message builder.
//!
//! A message is assembled by an ordered list of field contributors. Each
//! contributor appends zero or more fields to the message; the list order is
//! the emission order:
//!
//! ```text
//! [Id, Timestamp?, Geo?, Value*]
//! ```

use crate::generators::geo::jitter;
use crate::generators::numeric::synthesize;
use crate::generators::timestamp::format_timestamp;
use chrono::{DateTime, Utc};
use rand::Rng;
use telemetry_core::{GeoConfig, Message, SimulationConfig, ValueSpec};

/// One step of message assembly.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldContributor {
    /// Entity id under the configured key
    Id { key: String },
    /// `timestamp` field with the build instant
    Timestamp,
    /// `lat` / `lon` fields, when the geo config yields a point
    Geo(GeoConfig),
    /// One configured value field
    Value(ValueSpec),
}

impl FieldContributor {
    fn contribute<R: Rng>(
        &self,
        message: &mut Message,
        entity_id: i64,
        now: DateTime<Utc>,
        rng: &mut R,
    ) {
        match self {
            FieldContributor::Id { key } => message.insert(key.as_str(), entity_id),
            FieldContributor::Timestamp => message.insert("timestamp", format_timestamp(now)),
            FieldContributor::Geo(config) => {
                if let Some(point) = jitter(config, rng) {
                    message.insert("lat", point.lat);
                    message.insert("lon", point.lon);
                }
            }
            FieldContributor::Value(spec) => {
                let value = synthesize(rng, spec.min, spec.max, spec.kind);
                message.insert(spec.name.as_str(), value);
            }
        }
    }
}

/// Builds messages for entity ids.
///
/// The builder holds no mutable state, so one instance can be shared by
/// every worker of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageBuilder {
    contributors: Vec<FieldContributor>,
}

impl MessageBuilder {
    /// Create a builder from an explicit contributor list.
    pub fn new(contributors: Vec<FieldContributor>) -> Self {
        Self { contributors }
    }

    /// Derive the contributor list from a validated configuration.
    pub fn from_config(config: &SimulationConfig) -> Self {
        let mut contributors = Vec::with_capacity(config.values.len() + 3);

        contributors.push(FieldContributor::Id {
            key: config.id_key_name.clone(),
        });
        if config.timestamp_enabled {
            contributors.push(FieldContributor::Timestamp);
        }
        if !matches!(config.geo, GeoConfig::None) {
            contributors.push(FieldContributor::Geo(config.geo));
        }
        contributors.extend(config.values.iter().cloned().map(FieldContributor::Value));

        Self { contributors }
    }

    pub fn contributors(&self) -> &[FieldContributor] {
        &self.contributors
    }

    /// Build a message stamped with the current time.
    pub fn build<R: Rng>(&self, entity_id: i64, rng: &mut R) -> Message {
        self.build_at(entity_id, rng, Utc::now())
    }

    /// Build a message stamped with `now`.
    pub fn build_at<R: Rng>(&self, entity_id: i64, rng: &mut R, now: DateTime<Utc>) -> Message {
        let mut message = Message::new(entity_id);
        for contributor in &self.contributors {
            contributor.contribute(&mut message, entity_id, now, rng);
        }
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use serde_json::json;
    use telemetry_core::{Coordinates, ValueKind};

    fn base_config() -> SimulationConfig {
        SimulationConfig {
            id_key_name: "sensorId".to_string(),
            values: vec![ValueSpec::new("temp", 0.0, 1.0, ValueKind::Float)],
            ..SimulationConfig::default()
        }
    }

    #[test]
    fn test_minimal_message_has_exact_keys() {
        let builder = MessageBuilder::from_config(&base_config());
        let mut rng = StdRng::seed_from_u64(42);

        let message = builder.build(7, &mut rng);

        assert_eq!(message.keys().collect::<Vec<_>>(), vec!["sensorId", "temp"]);
        assert_eq!(message.get("sensorId"), Some(&json!(7)));
        assert_eq!(message.entity_id(), 7);
        let temp = message.get("temp").and_then(|v| v.as_f64()).unwrap();
        assert!((0.0..=1.0).contains(&temp));
    }

    #[test]
    fn test_full_message_field_order() {
        let config = SimulationConfig {
            timestamp_enabled: true,
            geo: GeoConfig::Disc {
                center: Coordinates { lat: 10.0, lon: 20.0 },
                radius: 1.0,
            },
            values: vec![
                ValueSpec::new("temperature", -10.0, 40.0, ValueKind::Float),
                ValueSpec::new("battery", 0.0, 100.0, ValueKind::Int),
            ],
            ..SimulationConfig::default()
        };
        let builder = MessageBuilder::from_config(&config);
        let mut rng = StdRng::seed_from_u64(42);
        let now = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();

        let message = builder.build_at(3, &mut rng, now);

        assert_eq!(
            message.keys().collect::<Vec<_>>(),
            vec!["deviceId", "timestamp", "lat", "lon", "temperature", "battery"]
        );
        assert_eq!(
            message.get("timestamp"),
            Some(&json!("2024-01-02T03:04:05.000Z"))
        );
        assert!(message.get("battery").unwrap().is_i64());
        assert!(message.get("temperature").unwrap().is_f64());
    }

    #[test]
    fn test_contributor_list_from_config() {
        let config = SimulationConfig {
            timestamp_enabled: true,
            ..base_config()
        };
        let builder = MessageBuilder::from_config(&config);

        assert_eq!(
            builder.contributors(),
            &[
                FieldContributor::Id {
                    key: "sensorId".to_string()
                },
                FieldContributor::Timestamp,
                FieldContributor::Value(ValueSpec::new("temp", 0.0, 1.0, ValueKind::Float)),
            ]
        );
    }

    #[test]
    fn test_same_seed_same_message() {
        let builder = MessageBuilder::from_config(&base_config());
        let now = Utc::now();

        let a = builder.build_at(1, &mut StdRng::seed_from_u64(5), now);
        let b = builder.build_at(1, &mut StdRng::seed_from_u64(5), now);

        assert_eq!(a, b);
    }

    #[test]
    fn test_messages_are_independent() {
        let builder = MessageBuilder::from_config(&base_config());
        let mut rng = StdRng::seed_from_u64(11);

        let first = builder.build(1, &mut rng);
        let second = builder.build(2, &mut rng);

        assert_eq!(first.get("sensorId"), Some(&json!(1)));
        assert_eq!(second.get("sensorId"), Some(&json!(2)));
        assert_eq!(first.len(), second.len());
    }
}
