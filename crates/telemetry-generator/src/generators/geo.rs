//! Coordinate jitter.

use super::round_decimals;
use rand::Rng;
use telemetry_core::GeoConfig;

/// A generated position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

/// Produce a position for the configured geo section.
///
/// `Disc` offsets each axis by `u * radius - radius / 2` around the center.
/// This is a square jitter, not a true disc.
/// `Box` draws each axis uniformly inside its range.
/// Both round to five decimals.
pub fn jitter<R: Rng>(config: &GeoConfig, rng: &mut R) -> Option<GeoPoint> {
    let (lat, lon) = match config {
        GeoConfig::None => return None,

        GeoConfig::Disc { center, radius } => {
            let u1: f64 = rng.random();
            let u2: f64 = rng.random();
            (
                center.lat + u1 * radius - radius / 2.0,
                center.lon + u2 * radius - radius / 2.0,
            )
        }

        GeoConfig::Box {
            lat_range: (lat_min, lat_max),
            lon_range: (lon_min, lon_max),
        } => {
            let u1: f64 = rng.random();
            let u2: f64 = rng.random();
            (
                lat_min + u1 * (lat_max - lat_min),
                lon_min + u2 * (lon_max - lon_min),
            )
        }
    };

    Some(GeoPoint {
        lat: round_decimals(lat),
        lon: round_decimals(lon),
    })
}
