//! Core data model and plumbing for DrainGuard
//!
//! Everything the telemetry sources, the detector and the orchestrator share:
//! sensor readings and their boundary validation, the risk taxonomy, the
//! reading history ring buffer, the drop-oldest queue between producer and
//! consumer, cancellation and worker threads, settings, and the CSV data
//! logger.
//!
//! Key constraints:
//! - Runs unattended for months against an unbounded input stream
//! - Bounded memory: history, queue and live log all have ceilings
//! - Nothing here panics on bad input; invalid samples are rejected
//!
//! ```no_run
//! use drainguard_core::{ReadingValidator, ValidationError};
//!
//! let validator = ReadingValidator::default();
//!
//! match validator.validate_sample(Some(42.0), Some(400.0)) {
//!     Ok(reading) => println!("{}", reading.timestamp_string()),
//!     Err(ValidationError::OutOfRange { field, .. }) => eprintln!("{field} out of range"),
//!     Err(e) => eprintln!("{e}"),
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod buffer;
pub mod cancel;
pub mod config;
pub mod constants;
pub mod datalog;
pub mod errors;
pub mod queue;
pub mod reading;
pub mod record;
pub mod risk;
pub mod time;
pub mod traits;
pub mod validators;
pub mod worker;

// Public API
pub use buffer::CircularBuffer;
pub use cancel::CancellationToken;
pub use config::Settings;
pub use datalog::DataLogger;
pub use errors::{SettingsError, StorageError, StorageResult, ValidationError, ValidationResult};
pub use queue::BoundedQueue;
pub use reading::Reading;
pub use record::{Alert, EnrichedReading};
pub use risk::{Detection, InferenceMode, RiskLevel, RiskType};
pub use time::{TimeSource, Timestamp};
pub use traits::{Validatable, Validator, ValidatorConstraints};
pub use validators::ReadingValidator;
pub use worker::{JoinOutcome, Worker};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_exists() {
        assert!(!VERSION.is_empty());
    }
}
