//! Periodic status reporting

use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use drainguard_connectors::{SourceStats, TelemetrySource};
use drainguard_core::datalog::LoggerStatsSnapshot;
use drainguard_core::{CancellationToken, DataLogger};
use drainguard_ml::{DetectorStats, DetectorStatsSnapshot};
use serde::Serialize;

use crate::pipeline::PipelineState;

/// Counters owned by the consumer loop
#[derive(Debug, Default)]
pub(crate) struct PipelineCounters {
    pub processed: AtomicU64,
    pub alerts: AtomicU64,
    pub iteration_errors: AtomicU64,
    pub state: AtomicU8,
}

impl PipelineCounters {
    pub fn state(&self) -> PipelineState {
        PipelineState::from_code(self.state.load(Ordering::SeqCst))
    }

    pub fn set_state(&self, state: PipelineState) {
        self.state.store(state as u8, Ordering::SeqCst);
    }
}

/// Pipeline-wide snapshot, as logged by the reporter
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StatusReport {
    /// Lifecycle state
    pub state: PipelineState,
    /// Source counters
    pub source: SourceStats,
    /// Logger counters
    pub logger: LoggerStatsSnapshot,
    /// Detector counters
    pub detector: DetectorStatsSnapshot,
    /// Readings fully processed by the consumer
    pub processed: u64,
    /// Alerts raised by the consumer
    pub alerts: u64,
    /// Iterations that failed and backed off
    pub iteration_errors: u64,
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[STATUS] Readings: {} | Logged: {} | Alerts: {} | Queue: {}",
            self.source.readings, self.logger.live_rows, self.logger.alert_count, self.source.queue_depth
        )
    }
}

/// Read-only handles to every component's counters
#[derive(Clone)]
pub(crate) struct StatusProbe {
    pub source: Arc<Mutex<Box<dyn TelemetrySource>>>,
    pub logger: Arc<DataLogger>,
    pub detector: Arc<DetectorStats>,
    pub counters: Arc<PipelineCounters>,
}

impl StatusProbe {
    pub fn report(&self) -> StatusReport {
        let source = self
            .source
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .stats();
        StatusReport {
            state: self.counters.state(),
            source,
            logger: self.logger.stats().snapshot(),
            detector: self.detector.snapshot(),
            processed: self.counters.processed.load(Ordering::Relaxed),
            alerts: self.counters.alerts.load(Ordering::Relaxed),
            iteration_errors: self.counters.iteration_errors.load(Ordering::Relaxed),
        }
    }
}

/// Reporter thread body: one report per interval until cancelled
pub(crate) fn run_reporter(probe: StatusProbe, interval: Duration, token: CancellationToken) {
    while token.sleep(interval) {
        let report = probe.report();
        log::info!("{}", report);
        if log::log_enabled!(log::Level::Debug) {
            match serde_json::to_string(&report) {
                Ok(json) => log::debug!("status {}", json),
                Err(err) => log::debug!("status not serializable: {}", err),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_line() {
        let report = StatusReport {
            state: PipelineState::Running,
            source: SourceStats {
                readings: 120,
                queue_depth: 3,
                ..SourceStats::default()
            },
            logger: LoggerStatsSnapshot {
                live_rows: 117,
                alert_count: 4,
                rotations: 0,
            },
            detector: DetectorStatsSnapshot::default(),
            processed: 117,
            alerts: 4,
            iteration_errors: 0,
        };
        assert_eq!(
            report.to_string(),
            "[STATUS] Readings: 120 | Logged: 117 | Alerts: 4 | Queue: 3"
        );

        let json = serde_json::to_value(report).unwrap();
        assert_eq!(json["state"], "RUNNING");
        assert_eq!(json["source"]["readings"], 120);
    }
}
