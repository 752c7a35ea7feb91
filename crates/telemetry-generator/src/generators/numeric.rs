//! Numeric value generators.

use super::round_decimals;
use rand::Rng;
use serde_json::Value;
use telemetry_core::ValueKind;

/// A synthesized value field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SyntheticValue {
    Int(i64),
    Float(f64),
}

impl SyntheticValue {
    pub fn as_f64(&self) -> f64 {
        match self {
            SyntheticValue::Int(v) => *v as f64,
            SyntheticValue::Float(v) => *v,
        }
    }
}

impl From<SyntheticValue> for Value {
    fn from(value: SyntheticValue) -> Self {
        match value {
            SyntheticValue::Int(v) => Value::from(v),
            SyntheticValue::Float(v) => Value::from(v),
        }
    }
}

/// Draw one value in `[min, max)`.
///
/// `Int` floors the raw draw; `Float` rounds it to five decimals.
/// Callers guarantee `max >= min` and finite bounds (settings validation
/// enforces both).
pub fn synthesize<R: Rng>(rng: &mut R, min: f64, max: f64, kind: ValueKind) -> SyntheticValue {
    let u: f64 = rng.random();
    let raw = min + u * (max - min);

    match kind {
        ValueKind::Int => SyntheticValue::Int(raw.floor() as i64),
        ValueKind::Float => SyntheticValue::Float(round_decimals(raw)),
    }
}
