//! Individual value generators.
//!
//! This module provides the generation logic for each kind of field a
//! message can carry, plus the shared rounding and seeding helpers.

pub mod geo;
pub mod numeric;
pub mod timestamp;

use rand::rngs::StdRng;
use rand::SeedableRng;

/// Number of decimal digits kept for real values and coordinates.
pub const DECIMAL_PRECISION: i32 = 5;

/// Round to [`DECIMAL_PRECISION`] digits, half away from zero.
pub fn round_decimals(value: f64) -> f64 {
    let factor = 10f64.powi(DECIMAL_PRECISION);
    (value * factor).round() / factor
}

/// RNG for one task.
///
/// With a base seed the RNG depends only on the seed and the task index, so
/// the content of a message does not depend on which worker built it or when.
/// Without a seed the RNG is seeded from the thread-local generator.
pub fn task_rng(seed: Option<u64>, task_index: u64) -> StdRng {
    match seed {
        Some(base) => {
            let mixed = base.wrapping_add(task_index.wrapping_mul(0x9E37_79B9_7F4A_7C15));
            StdRng::seed_from_u64(mixed)
        }
        None => StdRng::from_rng(&mut rand::rng()),
    }
}
