//! Water level (distance) validation
//!
//! The ultrasonic sensor reports the distance from the sensor head to the
//! water surface in centimetres. Anything outside the configured physical
//! range is an echo glitch or a wiring fault, not a drain condition.

use crate::constants::sensors::{WATER_LEVEL_MAX_CM, WATER_LEVEL_MIN_CM};
use crate::errors::ValidationResult;
use crate::traits::{Validator, ValidatorConstraints};

use super::utils;

/// Field name used in errors and hardware records
pub const WATER_FIELD: &str = "water_level";

/// Validator for water distance readings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaterLevelValidator {
    min_cm: f64,
    max_cm: f64,
}

impl Default for WaterLevelValidator {
    fn default() -> Self {
        Self {
            min_cm: WATER_LEVEL_MIN_CM,
            max_cm: WATER_LEVEL_MAX_CM,
        }
    }
}

impl WaterLevelValidator {
    /// Create validator with custom limits
    pub fn new_with_limits(min_cm: f64, max_cm: f64) -> Self {
        Self { min_cm, max_cm }
    }
}

impl Validator for WaterLevelValidator {
    type Value = f64;

    fn field(&self) -> &'static str {
        WATER_FIELD
    }

    fn validate(&self, raw: f64) -> ValidationResult<f64> {
        utils::check_finite(WATER_FIELD, raw)?;
        utils::check_range(WATER_FIELD, raw, self.min_cm, self.max_cm)?;
        Ok(raw)
    }

    fn constraints(&self) -> ValidatorConstraints {
        ValidatorConstraints {
            min_value: self.min_cm,
            max_value: self.max_cm,
        }
    }
}
