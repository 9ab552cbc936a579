//! Pipeline orchestrator
//!
//! ## Consumer Loop
//!
//! ```text
//! while not cancelled:
//!     queue empty?  → sleep(poll), retry
//!     pop (bounded wait)
//!     detection = detector.predict(reading)
//!     log_reading(reading + detection)
//!     raises alert? → log_alert, notify observers
//!     failure/panic → error!, sleep(backoff), continue
//! ```
//!
//! A failed iteration loses at most the reading being processed. A panic in
//! the detector or an observer is caught at the iteration boundary and
//! counted like any other failure.

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use drainguard_connectors::TelemetrySource;
use drainguard_core::config::PipelineSettings;
use drainguard_core::{
    Alert, BoundedQueue, CancellationToken, DataLogger, EnrichedReading, Reading, Settings,
    StorageResult, Worker,
};
use drainguard_ml::{AnomalyDetector, DetectorConfig};
use serde::Serialize;

use crate::observer::{AlertObserver, LogObserver};
use crate::report::{run_reporter, PipelineCounters, StatusProbe, StatusReport};
use crate::{PipelineError, PipelineResult};

/// Lifecycle state
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PipelineState {
    /// Wired, not started
    Init = 0,
    /// Source and consumer running
    Running = 1,
    /// Stop requested, threads joining
    Stopping = 2,
    /// Threads joined, source released
    Stopped = 3,
}

impl PipelineState {
    pub(crate) fn from_code(code: u8) -> Self {
        match code {
            0 => PipelineState::Init,
            1 => PipelineState::Running,
            2 => PipelineState::Stopping,
            _ => PipelineState::Stopped,
        }
    }

    /// Label for logs
    pub const fn as_str(self) -> &'static str {
        match self {
            PipelineState::Init => "INIT",
            PipelineState::Running => "RUNNING",
            PipelineState::Stopping => "STOPPING",
            PipelineState::Stopped => "STOPPED",
        }
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Consumer and reporter timing
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Sleep when the queue is empty
    pub empty_queue_poll: Duration,
    /// Bounded wait for one reading
    pub dequeue_timeout: Duration,
    /// Sleep after a failed iteration
    pub iteration_backoff: Duration,
    /// Interval between status reports
    pub status_interval: Duration,
    /// Bounded join for each thread on stop
    pub join_timeout: Duration,
    /// Truncate the readings log on start
    pub clear_on_start: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::from_settings(&PipelineSettings::default())
    }
}

impl PipelineConfig {
    /// Build from the pipeline settings section
    pub fn from_settings(settings: &PipelineSettings) -> Self {
        Self {
            empty_queue_poll: Duration::from_millis(settings.empty_queue_poll_ms),
            dequeue_timeout: Duration::from_millis(settings.dequeue_timeout_ms),
            iteration_backoff: Duration::from_millis(settings.iteration_backoff_ms),
            status_interval: Duration::from_millis(settings.status_interval_ms),
            join_timeout: Duration::from_millis(settings.join_timeout_ms),
            clear_on_start: settings.clear_on_start,
        }
    }

    /// Set the empty-queue poll interval
    pub fn with_empty_queue_poll(mut self, poll: Duration) -> Self {
        self.empty_queue_poll = poll;
        self
    }

    /// Set the dequeue wait
    pub fn with_dequeue_timeout(mut self, timeout: Duration) -> Self {
        self.dequeue_timeout = timeout;
        self
    }

    /// Set the failed-iteration backoff
    pub fn with_iteration_backoff(mut self, backoff: Duration) -> Self {
        self.iteration_backoff = backoff;
        self
    }

    /// Set the status report interval
    pub fn with_status_interval(mut self, interval: Duration) -> Self {
        self.status_interval = interval;
        self
    }

    /// Set the per-thread join timeout
    pub fn with_join_timeout(mut self, timeout: Duration) -> Self {
        self.join_timeout = timeout;
        self
    }

    /// Enable or disable clearing the readings log on start
    pub fn with_clear_on_start(mut self, clear: bool) -> Self {
        self.clear_on_start = clear;
        self
    }
}

/// Source → detector → logger orchestration
pub struct Pipeline {
    config: PipelineConfig,
    probe: StatusProbe,
    detector: Option<AnomalyDetector>,
    observers: Vec<Arc<dyn AlertObserver>>,
    token: CancellationToken,
    consumer: Option<Worker>,
    reporter: Option<Worker>,
}

impl Pipeline {
    /// Wire a pipeline in the `Init` state
    pub fn new(
        source: Box<dyn TelemetrySource>,
        detector: AnomalyDetector,
        logger: DataLogger,
        config: PipelineConfig,
    ) -> Self {
        let probe = StatusProbe {
            source: Arc::new(Mutex::new(source)),
            logger: Arc::new(logger),
            detector: detector.stats_handle(),
            counters: Arc::new(PipelineCounters::default()),
        };
        probe.counters.set_state(PipelineState::Init);

        Self {
            config,
            probe,
            detector: Some(detector),
            observers: vec![Arc::new(LogObserver)],
            token: CancellationToken::new(),
            consumer: None,
            reporter: None,
        }
    }

    /// Build the detector and logger from settings around `source`
    pub fn from_settings(settings: &Settings, source: Box<dyn TelemetrySource>) -> PipelineResult<Self> {
        let logger = DataLogger::from_settings(&settings.paths, &settings.pipeline)?;
        let detector = AnomalyDetector::new(DetectorConfig::from_settings(settings));
        Ok(Self::new(
            source,
            detector,
            logger,
            PipelineConfig::from_settings(&settings.pipeline),
        ))
    }

    /// Register an observer; only allowed before `start`
    pub fn add_observer(&mut self, observer: Arc<dyn AlertObserver>) -> PipelineResult<()> {
        self.expect_state("add an observer to", PipelineState::Init)?;
        self.observers.push(observer);
        Ok(())
    }

    /// Current lifecycle state
    pub fn state(&self) -> PipelineState {
        self.probe.counters.state()
    }

    /// Snapshot of every component's counters
    pub fn status(&self) -> StatusReport {
        self.probe.report()
    }

    /// Shared data logger
    pub fn logger(&self) -> &DataLogger {
        &self.probe.logger
    }

    /// Start the source, the consumer and the reporter
    pub fn start(&mut self) -> PipelineResult<()> {
        self.expect_state("start", PipelineState::Init)?;

        if self.config.clear_on_start {
            self.probe.logger.clear_live_data()?;
        }

        let (name, queue) = {
            let mut source = self.lock_source();
            source.start()?;
            (source.name(), source.readings())
        };

        // Present for as long as the state is Init
        let Some(detector) = self.detector.take() else {
            self.lock_source().stop();
            return Err(PipelineError::InvalidState {
                action: "start",
                state: self.state(),
            });
        };

        let consumer = Consumer {
            config: self.config.clone(),
            queue,
            detector,
            logger: Arc::clone(&self.probe.logger),
            observers: self.observers.clone(),
            counters: Arc::clone(&self.probe.counters),
            token: self.token.clone(),
        };
        match Worker::spawn("drainguard-consumer", move || consumer.run()) {
            Ok(worker) => self.consumer = Some(worker),
            Err(source) => {
                self.lock_source().stop();
                self.probe.counters.set_state(PipelineState::Stopped);
                return Err(PipelineError::Spawn {
                    thread: "consumer",
                    source,
                });
            }
        }

        let probe = self.probe.clone();
        let interval = self.config.status_interval;
        let token = self.token.clone();
        match Worker::spawn("drainguard-reporter", move || run_reporter(probe, interval, token)) {
            Ok(worker) => self.reporter = Some(worker),
            // The pipeline works without reports
            Err(err) => log::error!("status reporter not started: {}", err),
        }

        self.probe.counters.set_state(PipelineState::Running);
        log::info!("Pipeline started with {} source", name);
        Ok(())
    }

    /// Stop every thread and release the source.
    ///
    /// Idempotent once stopped.
    pub fn stop(&mut self) -> PipelineResult<()> {
        match self.state() {
            PipelineState::Stopped => return Ok(()),
            PipelineState::Running => {}
            state => return Err(PipelineError::InvalidState { action: "stop", state }),
        }

        self.probe.counters.set_state(PipelineState::Stopping);
        log::info!("Shutting down...");
        self.token.cancel();
        self.lock_source().stop();

        for worker in [self.consumer.take(), self.reporter.take()].into_iter().flatten() {
            worker.join_timeout(self.config.join_timeout);
        }

        self.probe.counters.set_state(PipelineState::Stopped);
        log::info!("Pipeline stopped");
        Ok(())
    }

    /// Run for `duration`, stop, and return the final status
    pub fn run_for(&mut self, duration: Duration) -> PipelineResult<StatusReport> {
        self.start()?;
        std::thread::sleep(duration);
        self.stop()?;
        Ok(self.status())
    }

    fn expect_state(&self, action: &'static str, expected: PipelineState) -> PipelineResult<()> {
        let state = self.state();
        if state == expected {
            Ok(())
        } else {
            Err(PipelineError::InvalidState { action, state })
        }
    }

    fn lock_source(&self) -> std::sync::MutexGuard<'_, Box<dyn TelemetrySource>> {
        self.probe.source.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for Pipeline {
    fn drop(&mut self) {
        if self.state() == PipelineState::Running {
            // Only fails for non-running states
            let _ = self.stop();
        }
    }
}

/// State moved into the consumer thread
struct Consumer {
    config: PipelineConfig,
    queue: Arc<BoundedQueue<Reading>>,
    detector: AnomalyDetector,
    logger: Arc<DataLogger>,
    observers: Vec<Arc<dyn AlertObserver>>,
    counters: Arc<PipelineCounters>,
    token: CancellationToken,
}

impl Consumer {
    fn run(mut self) {
        log::info!("Inference loop started");

        while !self.token.is_cancelled() {
            if self.queue.is_empty() {
                self.token.sleep(self.config.empty_queue_poll);
                continue;
            }

            let Some(reading) = self.queue.pop_timeout(self.config.dequeue_timeout) else {
                continue;
            };

            let failure = match panic::catch_unwind(AssertUnwindSafe(|| self.process(reading))) {
                Ok(Ok(())) => continue,
                Ok(Err(err)) => err.to_string(),
                Err(payload) => format!("panic: {}", panic_message(payload.as_ref())),
            };
            log::error!("Inference error: {}", failure);
            self.counters.iteration_errors.fetch_add(1, Ordering::Relaxed);
            self.token.sleep(self.config.iteration_backoff);
        }

        log::info!("Inference loop stopped");
    }

    fn process(&mut self, reading: Reading) -> StorageResult<()> {
        let detection = self.detector.predict_reading(&reading);
        let record = EnrichedReading::new(reading, &detection);

        self.logger.log_reading(&record)?;
        self.counters.processed.fetch_add(1, Ordering::Relaxed);

        if let Some(alert) = Alert::from_detection(&record, &detection) {
            self.logger.log_alert(&alert)?;
            self.counters.alerts.fetch_add(1, Ordering::Relaxed);
            for observer in &self.observers {
                observer.on_alert(&alert);
            }
        }
        Ok(())
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "unknown panic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use drainguard_connectors::{SimulatedSource, SimulatorConfig};

    fn pipeline(dir: &std::path::Path) -> Pipeline {
        let source = SimulatedSource::new(
            SimulatorConfig::default()
                .with_interval(Duration::from_millis(2))
                .with_seed(3),
        );
        let logger = DataLogger::new(dir.join("live.csv"), dir.join("alerts.csv"), 1000).unwrap();
        let detector = AnomalyDetector::new(DetectorConfig::default().without_model());
        let config = PipelineConfig::default()
            .with_empty_queue_poll(Duration::from_millis(2))
            .with_dequeue_timeout(Duration::from_millis(20))
            .with_status_interval(Duration::from_millis(20))
            .with_join_timeout(Duration::from_secs(2));
        Pipeline::new(Box::new(source), detector, logger, config)
    }

    #[test]
    fn lifecycle_transitions() {
        let dir = tempfile::tempdir().unwrap();
        let mut pipeline = pipeline(dir.path());
        assert_eq!(pipeline.state(), PipelineState::Init);
        assert!(matches!(
            pipeline.stop(),
            Err(PipelineError::InvalidState { action: "stop", state: PipelineState::Init })
        ));

        pipeline.start().unwrap();
        assert_eq!(pipeline.state(), PipelineState::Running);
        assert!(matches!(pipeline.start(), Err(PipelineError::InvalidState { .. })));
        assert!(pipeline.add_observer(Arc::new(LogObserver)).is_err());

        pipeline.stop().unwrap();
        assert_eq!(pipeline.state(), PipelineState::Stopped);
        pipeline.stop().unwrap();
        assert!(matches!(
            pipeline.start(),
            Err(PipelineError::InvalidState { state: PipelineState::Stopped, .. })
        ));
    }

    #[test]
    fn run_for_processes_readings() {
        let dir = tempfile::tempdir().unwrap();
        let mut pipeline = pipeline(dir.path());
        let report = pipeline.run_for(Duration::from_millis(200)).unwrap();

        assert_eq!(report.state, PipelineState::Stopped);
        assert!(report.processed > 0);
        assert_eq!(report.processed, report.logger.live_rows as u64);
        assert_eq!(report.alerts, report.logger.alert_count);
        assert_eq!(report.detector.predictions, report.processed);
        assert_eq!(report.iteration_errors, 0);
        assert!(report.source.readings >= report.processed);
    }

    #[test]
    fn state_codes_round_trip() {
        for state in [
            PipelineState::Init,
            PipelineState::Running,
            PipelineState::Stopping,
            PipelineState::Stopped,
        ] {
            assert_eq!(PipelineState::from_code(state as u8), state);
        }
    }

    #[test]
    fn panic_payloads_are_described() {
        let text = panic::catch_unwind(|| panic!("boom")).unwrap_err();
        assert_eq!(panic_message(text.as_ref()), "boom");

        let formatted = panic::catch_unwind(|| panic!("sensor {}", 7)).unwrap_err();
        assert_eq!(panic_message(formatted.as_ref()), "sensor 7");

        let other = panic::catch_unwind(|| panic::panic_any(42u8)).unwrap_err();
        assert_eq!(panic_message(other.as_ref()), "unknown panic");
    }
}
