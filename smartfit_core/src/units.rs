//! Unit systems and physiological range rules.
//!
//! Heights and weights are stored in centimetres and kilograms. The
//! accepted windows are defined once in those units; imperial input is
//! converted into them before it is checked, so the two systems always
//! agree on what is in range.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

/// Centimetres per inch
pub const CM_PER_INCH: f64 = 2.54;

/// Kilograms per pound
pub const KG_PER_LB: f64 = 0.453592;

/// Accepted height window, cm
pub const HEIGHT_CM: RangeInclusive<f64> = 100.0..=250.0;

/// Accepted weight window, kg
pub const WEIGHT_KG: RangeInclusive<f64> = 30.0..=250.0;

/// Accepted age window, years
pub const AGE_YEARS: RangeInclusive<i64> = 10..=100;

/// Accepted training days per week
pub const WEEKLY_FREQUENCY: RangeInclusive<i64> = 1..=7;

/// Absorbs floating-point noise from a metric → imperial → metric trip.
const BOUND_TOLERANCE: f64 = 1e-9;

/// Display/input unit system
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UnitSystem {
    #[default]
    Metric,
    Imperial,
}

impl UnitSystem {
    pub fn height_unit(self) -> &'static str {
        match self {
            UnitSystem::Metric => "cm",
            UnitSystem::Imperial => "inches",
        }
    }

    pub fn weight_unit(self) -> &'static str {
        match self {
            UnitSystem::Metric => "kg",
            UnitSystem::Imperial => "lb",
        }
    }
}

impl fmt::Display for UnitSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnitSystem::Metric => f.write_str("metric"),
            UnitSystem::Imperial => f.write_str("imperial"),
        }
    }
}

impl FromStr for UnitSystem {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "metric" => Ok(UnitSystem::Metric),
            "imperial" => Ok(UnitSystem::Imperial),
            other => Err(crate::Error::InvalidChoice(format!(
                "unknown unit system: {}",
                other
            ))),
        }
    }
}

/// Convert a height entered in `system` to centimetres.
pub fn height_to_cm(value: f64, system: UnitSystem) -> f64 {
    match system {
        UnitSystem::Metric => value,
        UnitSystem::Imperial => value * CM_PER_INCH,
    }
}

/// Convert a stored height in centimetres to `system`.
pub fn height_from_cm(cm: f64, system: UnitSystem) -> f64 {
    match system {
        UnitSystem::Metric => cm,
        UnitSystem::Imperial => cm / CM_PER_INCH,
    }
}

/// Convert a weight entered in `system` to kilograms.
pub fn weight_to_kg(value: f64, system: UnitSystem) -> f64 {
    match system {
        UnitSystem::Metric => value,
        UnitSystem::Imperial => value * KG_PER_LB,
    }
}

/// Convert a stored weight in kilograms to `system`.
pub fn weight_from_kg(kg: f64, system: UnitSystem) -> f64 {
    match system {
        UnitSystem::Metric => kg,
        UnitSystem::Imperial => kg / KG_PER_LB,
    }
}

fn within(value: f64, window: &RangeInclusive<f64>) -> bool {
    value >= window.start() - BOUND_TOLERANCE && value <= window.end() + BOUND_TOLERANCE
}

/// Whether a height entered in `system` falls in the canonical window.
pub fn height_in_range(value: f64, system: UnitSystem) -> bool {
    within(height_to_cm(value, system), &HEIGHT_CM)
}

/// Whether a weight entered in `system` falls in the canonical window.
pub fn weight_in_range(value: f64, system: UnitSystem) -> bool {
    within(weight_to_kg(value, system), &WEIGHT_KG)
}

/// Height window projected into `system`, rounded for display.
pub fn height_bounds(system: UnitSystem) -> (f64, f64) {
    (
        height_from_cm(*HEIGHT_CM.start(), system).round(),
        height_from_cm(*HEIGHT_CM.end(), system).round(),
    )
}

/// Weight window projected into `system`, rounded for display.
pub fn weight_bounds(system: UnitSystem) -> (f64, f64) {
    (
        weight_from_kg(*WEIGHT_KG.start(), system).round(),
        weight_from_kg(*WEIGHT_KG.end(), system).round(),
    )
}
