//! Gas concentration validation
//!
//! Gas arrives as a raw 12-bit ADC count. Hardware links sometimes send it
//! as a float, so the value is rounded to the nearest integer before the
//! upper range check. Values below the minimum are rejected before rounding.

use crate::constants::sensors::{GAS_LEVEL_MAX, GAS_LEVEL_MIN};
use crate::errors::{ValidationError, ValidationResult};
use crate::traits::{Validator, ValidatorConstraints};

use super::utils;

/// Field name used in errors and hardware records
pub const GAS_FIELD: &str = "gas_level";

/// Validator for gas ADC readings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GasLevelValidator {
    min: u16,
    max: u16,
}

impl Default for GasLevelValidator {
    fn default() -> Self {
        Self {
            min: GAS_LEVEL_MIN,
            max: GAS_LEVEL_MAX,
        }
    }
}

impl GasLevelValidator {
    /// Create validator with custom limits
    pub fn new_with_limits(min: u16, max: u16) -> Self {
        Self { min, max }
    }
}

impl Validator for GasLevelValidator {
    type Value = u16;

    fn field(&self) -> &'static str {
        GAS_FIELD
    }

    fn validate(&self, raw: f64) -> ValidationResult<u16> {
        utils::check_finite(GAS_FIELD, raw)?;
        let (min, max) = (f64::from(self.min), f64::from(self.max));
        if raw < min {
            return Err(ValidationError::OutOfRange {
                field: GAS_FIELD,
                value: raw,
                min,
                max,
            });
        }
        let rounded = raw.round();
        utils::check_range(GAS_FIELD, rounded, min, max)?;
        // In range of a u16 after the check above.
        Ok(rounded as u16)
    }

    fn constraints(&self) -> ValidatorConstraints {
        ValidatorConstraints {
            min_value: f64::from(self.min),
            max_value: f64::from(self.max),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_before_range_check() {
        let validator = GasLevelValidator::default();
        assert_eq!(validator.validate(399.6), Ok(400));
        assert_eq!(validator.validate(4095.4), Ok(4095));
        assert!(validator.validate(4095.6).is_err());
    }

    #[test]
    fn rejects_negative_and_nan() {
        let validator = GasLevelValidator::default();
        assert!(matches!(
            validator.validate(-3.0),
            Err(ValidationError::OutOfRange { field: "gas_level", .. })
        ));
        assert!(matches!(
            validator.validate(-0.4),
            Err(ValidationError::OutOfRange { field: "gas_level", value, .. }) if value == -0.4
        ));
        assert_eq!(validator.validate(0.0), Ok(0));
        assert_eq!(
            validator.validate(f64::INFINITY),
            Err(ValidationError::InvalidValue { field: "gas_level" })
        );
    }
}
