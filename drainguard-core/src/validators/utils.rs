//! Shared validation helpers
//!
//! Pure functions used by every channel validator so that all of them
//! report failures the same way.

use crate::errors::{ValidationError, ValidationResult};
use crate::traits::Validatable;

/// Check that a value is a finite number
pub fn check_finite(field: &'static str, value: f64) -> ValidationResult<()> {
    if value.is_valid() {
        Ok(())
    } else {
        Err(ValidationError::InvalidValue { field })
    }
}

/// Check if a value is within the closed range `[min, max]`
pub fn check_range(field: &'static str, value: f64, min: f64, max: f64) -> ValidationResult<()> {
    if value < min || value > max {
        Err(ValidationError::OutOfRange {
            field,
            value,
            min,
            max,
        })
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_check() {
        assert!(check_range("x", 5.0, 0.0, 10.0).is_ok());
        assert!(check_range("x", 0.0, 0.0, 10.0).is_ok());
        assert!(check_range("x", 10.0, 0.0, 10.0).is_ok());
        assert!(check_range("x", -1.0, 0.0, 10.0).is_err());
        assert!(check_range("x", 11.0, 0.0, 10.0).is_err());
    }

    #[test]
    fn finite_check() {
        assert!(check_finite("x", 5.0).is_ok());
        assert_eq!(
            check_finite("x", f64::NAN),
            Err(ValidationError::InvalidValue { field: "x" })
        );
        assert!(check_finite("x", f64::INFINITY).is_err());
    }
}
