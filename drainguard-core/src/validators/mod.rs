//! Boundary Validators for Drain Sensor Samples
//!
//! ## Overview
//!
//! Every sample a telemetry source produces passes through a
//! `ReadingValidator` before it may enter the queue. Invalid samples are
//! counted and discarded; they never reach the detector's history.
//!
//! ```text
//! raw sample (water?, gas?)
//!      ↓
//! ┌──────────────────────┐
//! │ both fields present? │── no ──→ MissingField
//! └──────────────────────┘
//!      ↓
//! ┌──────────────────────┐
//! │ finite numbers?      │── no ──→ InvalidValue
//! └──────────────────────┘
//!      ↓
//! ┌──────────────────────┐
//! │ inside sensor range? │── no ──→ OutOfRange
//! └──────────────────────┘
//!      ↓
//!   Reading (stamped with local time)
//! ```
//!
//! ## Usage Example
//!
//! ```rust
//! use drainguard_core::validators::ReadingValidator;
//!
//! let validator = ReadingValidator::default();
//!
//! let reading = validator.validate_sample(Some(42.0), Some(612.4)).unwrap();
//! assert_eq!(reading.gas_level, 612);
//!
//! assert!(validator.validate_sample(Some(42.0), None).is_err());
//! assert!(validator.validate_sample(Some(-5.0), Some(400.0)).is_err());
//! ```

mod gas;
mod utils;
mod water;

pub use gas::{GasLevelValidator, GAS_FIELD};
pub use utils::{check_finite, check_range};
pub use water::{WaterLevelValidator, WATER_FIELD};

use chrono::{DateTime, Local};

use crate::config::SensorSettings;
use crate::errors::ValidationResult;
use crate::reading::Reading;
use crate::traits::Validator;

/// Validates both channels of a sample and builds the `Reading`
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ReadingValidator {
    water: WaterLevelValidator,
    gas: GasLevelValidator,
}

impl ReadingValidator {
    /// Validator enforcing the configured physical ranges
    pub fn from_settings(sensors: &SensorSettings) -> Self {
        Self {
            water: WaterLevelValidator::new_with_limits(sensors.water_min_cm, sensors.water_max_cm),
            gas: GasLevelValidator::new_with_limits(sensors.gas_min, sensors.gas_max),
        }
    }

    /// Validate a sample and stamp it with the current local time
    pub fn validate_sample(&self, water: Option<f64>, gas: Option<f64>) -> ValidationResult<Reading> {
        self.validate_sample_at(Local::now(), water, gas)
    }

    /// Validate a sample with an explicit timestamp
    pub fn validate_sample_at(
        &self,
        timestamp: DateTime<Local>,
        water: Option<f64>,
        gas: Option<f64>,
    ) -> ValidationResult<Reading> {
        let water_level_cm = self.water.validate_field(water)?;
        let gas_level = self.gas.validate_field(gas)?;
        Ok(Reading::at(timestamp, water_level_cm, gas_level))
    }

    /// Water channel validator
    pub fn water(&self) -> &WaterLevelValidator {
        &self.water
    }

    /// Gas channel validator
    pub fn gas(&self) -> &GasLevelValidator {
        &self.gas
    }
}
