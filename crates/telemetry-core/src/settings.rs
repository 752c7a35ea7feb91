//! Settings definitions for the telemetry simulator.
//!
//! This module defines two layers:
//!
//! **Raw settings** (deserialized straight from `settings.yml`):
//! - `Settings` - the whole document, camelCase keys
//! - `GeoSectionSettings`, `ValueSettings`, `EventHubSettings` - nested sections
//!
//! **Validated configuration** (what the generator consumes):
//! - `SimulationConfig` - defaults applied, invariants checked
//! - `GeoConfig` - geo section as a closed variant
//! - `ValueSpec` - one value field with its range and kind

use crate::error::SettingsError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Default output field carrying the entity id.
pub const DEFAULT_ID_KEY_NAME: &str = "deviceId";

/// Default first entity id.
pub const DEFAULT_START_ID: i64 = 1;

/// Default jitter size for `round` geo sections.
pub const DEFAULT_RADIUS: f64 = 1.0;

/// Default latitude range for `square` geo sections.
pub const DEFAULT_LAT_RANGE: (f64, f64) = (-90.0, 90.0);

/// Default longitude range for `square` geo sections.
pub const DEFAULT_LON_RANGE: (f64, f64) = (-180.0, 180.0);

/// 2^63. `int` bounds must lie in `[-2^63, 2^63)`.
const I64_BOUND: f64 = 9_223_372_036_854_775_808.0;

/// Largest `float` bound that still rounds to five decimals without overflow.
const MAX_FLOAT_MAGNITUDE: f64 = 1e300;

// ============================================================================
// Raw Settings
// ============================================================================

/// Settings document as written in `settings.yml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Number of simulated devices
    pub entity_count: u64,

    /// Messages per device
    pub max_messages: u64,

    /// First entity id (defaults to 1)
    #[serde(default)]
    pub start_id: Option<i64>,

    /// Output field name carrying the entity id (defaults to `deviceId`)
    #[serde(default)]
    pub id_key_name: Option<String>,

    /// Pacing delay in milliseconds, only used by sequential mode
    #[serde(default)]
    pub delay: Option<u64>,

    /// Maximum simultaneous publish operations (defaults to CPU count)
    #[serde(default)]
    pub concurrency_limit: Option<i64>,

    /// Timestamp section
    #[serde(default)]
    pub timestamp: Option<TimestampSettings>,

    /// Geo section
    #[serde(default)]
    pub geosection: Option<GeoSectionSettings>,

    /// Value fields, in emission order
    pub values: Vec<ValueSettings>,

    /// Ingestion endpoint section
    #[serde(default)]
    pub azure_event_hub: Option<EventHubSettings>,
}

/// `timestamp:` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TimestampSettings {
    #[serde(default)]
    pub enabled: bool,
}

/// `geosection:` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeoSectionSettings {
    /// Section type: `none`, `round` or `square`
    #[serde(rename = "type")]
    pub kind: GeoSectionKind,

    /// Center point, required for `round`
    #[serde(default)]
    pub center: Option<Coordinates>,

    /// Radius or lat/lon ranges
    #[serde(default)]
    pub bounds: Option<GeoBounds>,
}

/// Geo section type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeoSectionKind {
    None,
    Round,
    Square,
}

/// A latitude/longitude pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

/// `geosection.bounds:` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeoBounds {
    #[serde(default)]
    pub radius: Option<f64>,
    #[serde(default)]
    pub lat_range: Option<[f64; 2]>,
    #[serde(default)]
    pub lon_range: Option<[f64; 2]>,
}

/// One entry of the `values:` list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValueSettings {
    pub name: String,
    pub min: f64,
    pub max: f64,
    /// `int` or `float`, defaults to `float`
    #[serde(rename = "type", default)]
    pub kind: Option<ValueKind>,
}

/// Numeric kind of a value field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    Int,
    #[default]
    Float,
}

/// `azureEventHub:` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventHubSettings {
    /// Namespace connection string (may be empty; the environment is tried next)
    #[serde(default)]
    pub connection_string: Option<String>,

    /// Event hub name, when the connection string carries no `EntityPath`
    #[serde(default)]
    pub event_hub_name: Option<String>,
}

impl Settings {
    /// Load settings from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse settings from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, SettingsError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Connection string from the settings file, if any.
    pub fn connection_string(&self) -> Option<&str> {
        self.azure_event_hub
            .as_ref()
            .and_then(|hub| hub.connection_string.as_deref())
    }

    /// Event hub name from the settings file, if any.
    pub fn event_hub_name(&self) -> Option<&str> {
        self.azure_event_hub
            .as_ref()
            .and_then(|hub| hub.event_hub_name.as_deref())
    }

    /// Apply defaults and check invariants.
    ///
    /// Either the whole document is accepted or a single descriptive error
    /// is returned; nothing is partially consumed.
    pub fn validate(&self) -> Result<SimulationConfig, SettingsError> {
        if self.entity_count == 0 {
            return Err(SettingsError::InvariantViolation(
                "entityCount must be greater than 0".to_string(),
            ));
        }
        if self.max_messages == 0 {
            return Err(SettingsError::InvariantViolation(
                "maxMessages must be greater than 0".to_string(),
            ));
        }
        if self.entity_count.checked_mul(self.max_messages).is_none() {
            return Err(SettingsError::InvariantViolation(format!(
                "entityCount ({}) x maxMessages ({}) overflows",
                self.entity_count, self.max_messages
            )));
        }

        let start_id = self.start_id.unwrap_or(DEFAULT_START_ID);
        let last_offset = i64::try_from(self.max_messages - 1).ok();
        if last_offset.and_then(|n| start_id.checked_add(n)).is_none() {
            return Err(SettingsError::InvariantViolation(format!(
                "startId ({}) + maxMessages ({}) overflows the entity id range",
                start_id, self.max_messages
            )));
        }

        let id_key_name = match self.id_key_name.as_deref() {
            None => DEFAULT_ID_KEY_NAME.to_string(),
            Some(name) if name.trim().is_empty() => {
                return Err(SettingsError::Configuration(
                    "idKeyName must not be empty".to_string(),
                ))
            }
            Some(name) => name.to_string(),
        };

        let concurrency_limit = match self.concurrency_limit {
            None => None,
            Some(limit) if limit < 1 => {
                return Err(SettingsError::InvariantViolation(format!(
                    "concurrencyLimit must be at least 1, got {limit}"
                )))
            }
            Some(limit) => Some(usize::try_from(limit).map_err(|_| {
                SettingsError::InvariantViolation(format!("concurrencyLimit {limit} is too large"))
            })?),
        };

        let timestamp_enabled = self.timestamp.as_ref().is_some_and(|ts| ts.enabled);

        let geo = match &self.geosection {
            Some(section) => section.to_geo_config()?,
            None => GeoConfig::None,
        };

        let values = self.validate_values(&id_key_name, timestamp_enabled, &geo)?;

        Ok(SimulationConfig {
            entity_count: self.entity_count,
            max_messages: self.max_messages,
            start_id,
            id_key_name,
            delay: Duration::from_millis(self.delay.unwrap_or(0)),
            concurrency_limit,
            timestamp_enabled,
            geo,
            values,
        })
    }

    fn validate_values(
        &self,
        id_key_name: &str,
        timestamp_enabled: bool,
        geo: &GeoConfig,
    ) -> Result<Vec<ValueSpec>, SettingsError> {
        let mut reserved: HashSet<&str> = HashSet::from([id_key_name]);
        if timestamp_enabled {
            reserved.insert("timestamp");
        }
        if !matches!(geo, GeoConfig::None) {
            reserved.insert("lat");
            reserved.insert("lon");
        }

        let mut seen = HashSet::new();
        let mut specs = Vec::with_capacity(self.values.len());

        for value in &self.values {
            if value.name.is_empty() {
                return Err(SettingsError::Configuration(
                    "value name must not be empty".to_string(),
                ));
            }
            if reserved.contains(value.name.as_str()) {
                return Err(SettingsError::InvariantViolation(format!(
                    "value '{}' collides with a generated field",
                    value.name
                )));
            }
            if !seen.insert(value.name.as_str()) {
                return Err(SettingsError::InvariantViolation(format!(
                    "duplicate value name '{}'",
                    value.name
                )));
            }
            if !value.min.is_finite() || !value.max.is_finite() {
                return Err(SettingsError::InvariantViolation(format!(
                    "value '{}' has a non-finite bound",
                    value.name
                )));
            }
            if value.max < value.min {
                return Err(SettingsError::InvariantViolation(format!(
                    "value '{}' has max ({}) < min ({})",
                    value.name, value.max, value.min
                )));
            }
            if !(value.max - value.min).is_finite() {
                return Err(SettingsError::InvariantViolation(format!(
                    "value '{}' range is too wide",
                    value.name
                )));
            }

            let kind = value.kind.unwrap_or_default();
            let (representable, kind_name) = match kind {
                ValueKind::Int => (value.min >= -I64_BOUND && value.max < I64_BOUND, "int"),
                ValueKind::Float => (
                    value.min.abs().max(value.max.abs()) <= MAX_FLOAT_MAGNITUDE,
                    "float",
                ),
            };
            if !representable {
                return Err(SettingsError::InvariantViolation(format!(
                    "value '{}' bounds are outside the {} range",
                    value.name, kind_name
                )));
            }

            specs.push(ValueSpec {
                name: value.name.clone(),
                min: value.min,
                max: value.max,
                kind,
            });
        }

        Ok(specs)
    }
}

impl GeoSectionSettings {
    /// Convert the raw section into a [`GeoConfig`], applying defaults.
    pub fn to_geo_config(&self) -> Result<GeoConfig, SettingsError> {
        let bounds = self.bounds.clone().unwrap_or_default();

        match self.kind {
            GeoSectionKind::None => Ok(GeoConfig::None),

            GeoSectionKind::Round => {
                let center = self.center.ok_or_else(|| {
                    SettingsError::Configuration(
                        "geosection of type 'round' requires a center".to_string(),
                    )
                })?;
                if !center.lat.is_finite() || !center.lon.is_finite() {
                    return Err(SettingsError::InvariantViolation(
                        "geosection center must be finite".to_string(),
                    ));
                }
                let radius = bounds.radius.unwrap_or(DEFAULT_RADIUS);
                if !radius.is_finite() || radius < 0.0 {
                    return Err(SettingsError::InvariantViolation(format!(
                        "geosection radius must be a non-negative number, got {radius}"
                    )));
                }
                Ok(GeoConfig::Disc { center, radius })
            }

            GeoSectionKind::Square => {
                let lat_range = check_range("lat_range", bounds.lat_range, DEFAULT_LAT_RANGE)?;
                let lon_range = check_range("lon_range", bounds.lon_range, DEFAULT_LON_RANGE)?;
                Ok(GeoConfig::Box {
                    lat_range,
                    lon_range,
                })
            }
        }
    }
}

fn check_range(
    name: &str,
    range: Option<[f64; 2]>,
    default: (f64, f64),
) -> Result<(f64, f64), SettingsError> {
    let (min, max) = range.map_or(default, |[min, max]| (min, max));
    if !min.is_finite() || !max.is_finite() {
        return Err(SettingsError::InvariantViolation(format!(
            "geosection {name} must be finite"
        )));
    }
    if max < min {
        return Err(SettingsError::InvariantViolation(format!(
            "geosection {name} is reversed: [{min}, {max}]"
        )));
    }
    Ok((min, max))
}

// ============================================================================
// Validated Configuration
// ============================================================================

/// Geo jitter configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GeoConfig {
    /// No coordinates are emitted
    None,

    /// Jitter around a center point
    Disc { center: Coordinates, radius: f64 },

    /// Uniform position inside a lat/lon box
    Box {
        lat_range: (f64, f64),
        lon_range: (f64, f64),
    },
}

/// One configured value field.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueSpec {
    pub name: String,
    pub min: f64,
    pub max: f64,
    pub kind: ValueKind,
}

impl ValueSpec {
    pub fn new(name: impl Into<String>, min: f64, max: f64, kind: ValueKind) -> Self {
        Self {
            name: name.into(),
            min,
            max,
            kind,
        }
    }
}

/// Validated simulation configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    /// Number of simulated devices
    pub entity_count: u64,
    /// Messages per device
    pub max_messages: u64,
    /// First entity id
    pub start_id: i64,
    /// Output field name carrying the entity id
    pub id_key_name: String,
    /// Pacing delay for sequential mode
    pub delay: Duration,
    /// Explicit concurrency limit; `None` means detected parallelism
    pub concurrency_limit: Option<usize>,
    /// Whether messages carry a `timestamp` field
    pub timestamp_enabled: bool,
    /// Geo jitter configuration
    pub geo: GeoConfig,
    /// Value fields in emission order
    pub values: Vec<ValueSpec>,
}

impl SimulationConfig {
    /// Total number of tasks (`entity_count * max_messages`).
    pub fn total_tasks(&self) -> u64 {
        self.entity_count.saturating_mul(self.max_messages)
    }

    /// Concurrency limit to use, falling back to `detected` when unset.
    pub fn effective_concurrency(&self, detected: usize) -> usize {
        self.concurrency_limit.unwrap_or(detected).max(1)
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            entity_count: 1,
            max_messages: 1,
            start_id: DEFAULT_START_ID,
            id_key_name: DEFAULT_ID_KEY_NAME.to_string(),
            delay: Duration::ZERO,
            concurrency_limit: None,
            timestamp_enabled: false,
            geo: GeoConfig::None,
            values: Vec::new(),
        }
    }
}
