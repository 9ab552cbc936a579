//! DrainGuard Pipeline Service
//!
//! ## Overview
//!
//! Wires one telemetry source, one anomaly detector and one data logger
//! into a running pipeline:
//!
//! ```text
//!   producer thread          consumer thread                 reporter thread
//!  ┌───────────────┐       ┌───────────────────────────┐     ┌──────────────┐
//!  │ Simulated or  │ queue │ predict → enrich → log    │     │ every 10 s:  │
//!  │ Hardware      │──────→│   └─ alert? → alert log   │     │ [STATUS] ... │
//!  │ source        │ drop- │           → observers     │     │ (read-only)  │
//!  └───────────────┘ oldest└───────────────────────────┘     └──────────────┘
//! ```
//!
//! The bounded queue is the only point of contact between producer and
//! consumer. The detector's history is owned by the consumer thread. The
//! reporter only reads atomics.
//!
//! ## Lifecycle
//!
//! ```text
//! Init ──start()──→ Running ──stop()──→ Stopping ──joined──→ Stopped
//! ```
//!
//! A pipeline runs once. Starting a stopped pipeline is an error, stopping
//! a stopped one is a no-op.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use drainguard_connectors::{SimulatedSource, SimulatorConfig};
//! use drainguard_core::Settings;
//! use drainguard_service::Pipeline;
//! use std::time::Duration;
//!
//! let settings = Settings::default();
//! let source = SimulatedSource::new(SimulatorConfig::from_settings(&settings));
//! let mut pipeline = Pipeline::from_settings(&settings, Box::new(source))?;
//!
//! let report = pipeline.run_for(Duration::from_secs(30))?;
//! println!("{}", report);
//! # Ok::<(), drainguard_service::PipelineError>(())
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

use std::io;

use drainguard_connectors::SourceError;
use drainguard_core::StorageError;
use thiserror::Error;

pub mod observer;
pub mod pipeline;
pub mod report;

pub use observer::{AlertObserver, LogObserver};
pub use pipeline::{Pipeline, PipelineConfig, PipelineState};
pub use report::StatusReport;

/// Pipeline errors
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Operation not allowed in the current lifecycle state
    #[error("cannot {action} a pipeline in state {state}")]
    InvalidState {
        /// Attempted operation
        action: &'static str,
        /// State at the time
        state: PipelineState,
    },

    /// Telemetry source failed to start
    #[error("source error: {0}")]
    Source(#[from] SourceError),

    /// Data logger could not be opened or reset
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Worker thread could not be spawned
    #[error("cannot spawn {thread} thread: {source}")]
    Spawn {
        /// Thread role
        thread: &'static str,
        /// Underlying error
        #[source]
        source: io::Error,
    },
}

/// Result type for pipeline operations
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_exists() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn state_error_message() {
        let err = PipelineError::InvalidState {
            action: "start",
            state: PipelineState::Stopped,
        };
        assert_eq!(err.to_string(), "cannot start a pipeline in state STOPPED");
    }
}
