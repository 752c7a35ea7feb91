//! Timestamp value generators.

use chrono::{DateTime, SecondsFormat, Utc};

/// Format an instant as ISO-8601 with millisecond precision and a `Z` offset,
/// e.g. `2024-05-01T12:30:00.123Z`.
pub fn format_timestamp(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Current UTC time, formatted with [`format_timestamp`].
///
/// This is NOT deterministic - each call returns the current time.
pub fn generate_timestamp_now() -> String {
    format_timestamp(Utc::now())
}
