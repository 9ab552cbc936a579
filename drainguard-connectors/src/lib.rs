//! Telemetry Sources
//!
//! ## Overview
//!
//! A telemetry source produces validated [`Reading`]s on its own thread and
//! hands them to the pipeline through a bounded drop-oldest queue. Two
//! implementations share one contract:
//!
//! ### Simulated
//!
//! **When to use:**
//! - Demos and development without hardware
//! - Exercising the alert path on demand (`trigger_anomaly`)
//! - Reproducible runs (fixed seed)
//!
//! Smooth oscillating normal values with Gaussian jitter, interrupted by
//! anomaly bursts drawn from four named profiles.
//!
//! ### Hardware
//!
//! **When to use:**
//! - A deployed installation streaming one JSON record per line
//!
//! **Characteristics:**
//! - Persistent link, reconnect with a fixed retry delay
//! - Control records (`{"event": ...}`) logged and skipped
//! - Malformed or out-of-range records counted, never fatal
//!
//! ## Source Contract
//!
//! ```text
//! start()  → spawn the producer thread         (AlreadyRunning if called twice)
//! stop()   → cancel, bounded join, release link (idempotent)
//! stats()  → atomics snapshot, never blocks on the producer
//! readings → Arc<BoundedQueue<Reading>>, capacity from settings
//! ```
//!
//! Every sample passes the same boundary validation before it is queued.
//! Rejected samples only increment the `errors` counter.
//!
//! ## Example Usage
//!
//! ```rust
//! use drainguard_connectors::{SimulatedSource, SimulatorConfig, TelemetrySource};
//! use std::time::Duration;
//!
//! let config = SimulatorConfig::default()
//!     .with_interval(Duration::from_millis(5))
//!     .with_seed(42);
//! let mut source = SimulatedSource::new(config);
//! source.start()?;
//!
//! let queue = source.readings();
//! let reading = queue.pop_timeout(Duration::from_secs(1));
//! assert!(reading.is_some());
//!
//! source.stop();
//! # Ok::<(), drainguard_connectors::SourceError>(())
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

use std::io;
use std::sync::Arc;

use drainguard_core::{BoundedQueue, Reading};
use thiserror::Error;

pub mod hardware;
pub mod monitor;
pub mod simulator;

pub use hardware::{
    link_for_port, HardwareConfig, HardwareSource, LinkConnector, LinkError, SerialLink, TcpLink,
};
pub use monitor::{SourceMonitor, SourceStats};
pub use simulator::{
    AnomalyTrigger, BurstRequest, SignalGenerator, SimulatedSource, SimulatorConfig, Tick,
};

/// Errors starting a source
#[derive(Debug, Error)]
pub enum SourceError {
    /// `start` called on a running source
    #[error("source already running")]
    AlreadyRunning,

    /// Producer thread could not be spawned
    #[error("cannot spawn producer thread: {0}")]
    Spawn(#[from] io::Error),
}

/// Capability set shared by every telemetry source
pub trait TelemetrySource: Send {
    /// Short name for logs
    fn name(&self) -> &'static str;

    /// Spawn the producer thread
    fn start(&mut self) -> Result<(), SourceError>;

    /// Signal the producer to stop and join it within the configured timeout
    fn stop(&mut self);

    /// Whether the producer thread is running
    fn is_running(&self) -> bool;

    /// Non-blocking statistics snapshot
    fn stats(&self) -> SourceStats;

    /// Queue the producer pushes validated readings into
    fn readings(&self) -> Arc<BoundedQueue<Reading>>;
}

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
    fn sources_are_object_safe() {
        let sources: Vec<Box<dyn TelemetrySource>> = vec![
            Box::new(SimulatedSource::new(SimulatorConfig::default())),
            Box::new(HardwareSource::new(
                HardwareConfig::default(),
                TcpLink::new("127.0.0.1:9", std::time::Duration::from_millis(10)),
            )),
        ];
        let names: Vec<_> = sources.iter().map(|s| s.name()).collect();
        assert_eq!(names, ["simulator", "hardware"]);
        assert!(sources.iter().all(|s| !s.is_running()));
    }
}
