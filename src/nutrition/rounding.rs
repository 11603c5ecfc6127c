//! Shared rounding for every derived or reported nutrient figure.

use super::dto::Nutrient;

/// Decimal places used for gram and kcal figures.
pub const DEFAULT_PRECISION: u32 = 2;
/// Water is tracked in litres, so it keeps one more place.
pub const WATER_PRECISION: u32 = 3;

/// Rounds to `precision` decimal places, halves going towards +inf.
pub fn round_to(value: f64, precision: u32) -> f64 {
    let factor = 10f64.powi(precision as i32);
    let rounded = (value * factor + 0.5).floor() / factor;
    // keep -0.0 out of the wire format
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

pub fn precision(nutrient: Nutrient) -> u32 {
    match nutrient {
        Nutrient::Water => WATER_PRECISION,
        _ => DEFAULT_PRECISION,
    }
}

pub fn round_nutrient(nutrient: Nutrient, value: f64) -> f64 {
    round_to(value, precision(nutrient))
}
