//! Core traits for validators
//!
//! Every sensor value entering the pipeline passes through a `Validator`.
//! Keep them simple: a validator knows its physical range and how to turn a
//! raw number into the typed value stored in a `Reading`.

use crate::errors::ValidationResult;

/// Boundary validator for one sensor channel
pub trait Validator {
    /// Typed value produced once the raw number is accepted
    type Value;

    /// Name of the field, used in error messages
    fn field(&self) -> &'static str;

    /// Validate a raw number and convert it to the typed value
    fn validate(&self, raw: f64) -> ValidationResult<Self::Value>;

    /// Physical constraints enforced by this validator
    fn constraints(&self) -> ValidatorConstraints;

    /// Validate an optional raw number, failing when it is absent
    fn validate_field(&self, raw: Option<f64>) -> ValidationResult<Self::Value> {
        match raw {
            Some(raw) => self.validate(raw),
            None => Err(crate::errors::ValidationError::MissingField { field: self.field() }),
        }
    }
}

/// Physical constraints for a validator
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValidatorConstraints {
    /// Minimum valid value (sensor limit)
    pub min_value: f64,

    /// Maximum valid value (sensor limit)
    pub max_value: f64,
}

impl ValidatorConstraints {
    /// Whether `value` lies inside the closed range
    pub fn contains(&self, value: f64) -> bool {
        self.min_value <= value && value <= self.max_value
    }
}

/// Trait for values that can be validated
pub trait Validatable {
    /// Check if the value is a usable number (not NaN, infinite)
    fn is_valid(&self) -> bool;
}

impl Validatable for f32 {
    fn is_valid(&self) -> bool {
        self.is_finite()
    }
}

impl Validatable for f64 {
    fn is_valid(&self) -> bool {
        self.is_finite()
    }
}
