//! Error Types for DrainGuard Core
//!
//! ## Error Categories
//!
//! ### Validation
//! - `OutOfRange`: value outside the sensor's physical range
//! - `InvalidValue`: NaN or infinity
//! - `MissingField`: a sample lacks one of the two required readings
//!
//! Validation errors never leave a telemetry source. They are counted and
//! the sample is discarded.
//!
//! ### Storage
//! - `Io`: the log file could not be created, opened or appended to
//! - `Rotation`: archiving the live log failed; the live file stays in place
//!
//! ### Settings
//! - `Io` / `Parse`: the settings file could not be read or decoded
//! - `Invalid`: the settings are internally inconsistent
//!
//! Settings errors are the only errors allowed to stop the process, and only
//! at startup before any thread is spawned.
//!
//! ## Error Handling Strategy
//!
//! ```rust
//! use drainguard_core::{ValidationError, ReadingValidator};
//!
//! let validator = ReadingValidator::default();
//! match validator.validate_sample(Some(250.0), Some(400.0)) {
//!     Ok(_reading) => {}
//!     Err(ValidationError::OutOfRange { .. }) => {
//!         // count and discard
//!     }
//!     Err(_) => {}
//! }
//! ```

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for validation operations
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Result type for log storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Validation errors raised at the source boundary
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum ValidationError {
    /// Value outside physical limits
    #[error("{field} value {value} outside range [{min}, {max}]")]
    OutOfRange {
        /// Which reading failed
        field: &'static str,
        /// The offending value
        value: f64,
        /// Minimum physical value
        min: f64,
        /// Maximum physical value
        max: f64,
    },

    /// Value makes no physical sense (NaN, infinity)
    #[error("{field} is not a valid number")]
    InvalidValue {
        /// Which reading failed
        field: &'static str,
    },

    /// A required reading is absent
    #[error("missing required field {field}")]
    MissingField {
        /// Name of the absent field
        field: &'static str,
    },
}

/// Errors from the CSV data logger
#[derive(Error, Debug)]
pub enum StorageError {
    /// File system operation failed
    #[error("I/O error on {path}: {source}")]
    Io {
        /// File being accessed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: io::Error,
    },

    /// Live log could not be archived
    #[error("rotation of {path} failed: {source}")]
    Rotation {
        /// Live log path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: io::Error,
    },
}

impl StorageError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }
}

/// Errors loading or validating settings
#[derive(Error, Debug)]
pub enum SettingsError {
    /// Settings file could not be read
    #[error("cannot read settings {path}: {source}")]
    Io {
        /// Settings file
        path: PathBuf,
        /// Underlying error
        #[source]
        source: io::Error,
    },

    /// Settings file is not valid JSON for `Settings`
    #[error("cannot parse settings: {0}")]
    Parse(#[from] serde_json::Error),

    /// Settings are inconsistent
    #[error("invalid settings: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_field() {
        let err = ValidationError::OutOfRange {
            field: "water_level",
            value: 250.0,
            min: 0.0,
            max: 200.0,
        };
        assert_eq!(err.to_string(), "water_level value 250 outside range [0, 200]");

        let err = ValidationError::MissingField { field: "gas_level" };
        assert_eq!(err.to_string(), "missing required field gas_level");
    }
}
