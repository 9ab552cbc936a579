//! Pipeline sessions over a replayed source

use std::fs;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use drainguard_connectors::{SourceError, SourceMonitor, SourceStats, TelemetrySource};
use drainguard_core::{Alert, BoundedQueue, DataLogger, Reading, RiskType};
use drainguard_ml::{AnomalyDetector, DetectorConfig};
use drainguard_service::{Pipeline, PipelineConfig, PipelineState, StatusReport};

/// Pushes a fixed set of readings on start
struct ReplaySource {
    readings: Vec<Reading>,
    queue: Arc<BoundedQueue<Reading>>,
    monitor: SourceMonitor,
    running: bool,
}

impl ReplaySource {
    fn new(samples: &[(f64, u16)]) -> Self {
        Self {
            readings: samples.iter().map(|&(w, g)| Reading::now(w, g)).collect(),
            queue: Arc::new(BoundedQueue::new(64)),
            monitor: SourceMonitor::default(),
            running: false,
        }
    }
}

impl TelemetrySource for ReplaySource {
    fn name(&self) -> &'static str {
        "replay"
    }

    fn start(&mut self) -> Result<(), SourceError> {
        if self.running {
            return Err(SourceError::AlreadyRunning);
        }
        self.running = true;
        self.monitor.set_running(true);
        for reading in self.readings.drain(..) {
            self.monitor.publish(&self.queue, reading);
        }
        Ok(())
    }

    fn stop(&mut self) {
        self.running = false;
        self.monitor.set_running(false);
    }

    fn is_running(&self) -> bool {
        self.running
    }

    fn stats(&self) -> SourceStats {
        self.monitor.snapshot(&self.queue)
    }

    fn readings(&self) -> Arc<BoundedQueue<Reading>> {
        Arc::clone(&self.queue)
    }
}

fn fast_config() -> PipelineConfig {
    PipelineConfig::default()
        .with_empty_queue_poll(Duration::from_millis(2))
        .with_dequeue_timeout(Duration::from_millis(20))
        .with_iteration_backoff(Duration::from_millis(2))
        .with_status_interval(Duration::from_millis(25))
        .with_join_timeout(Duration::from_secs(2))
}

fn run_until(pipeline: &mut Pipeline, done: impl Fn(&StatusReport) -> bool) -> StatusReport {
    pipeline.start().unwrap();
    let deadline = Instant::now() + Duration::from_secs(5);
    while !done(&pipeline.status()) && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(5));
    }
    pipeline.stop().unwrap();
    pipeline.status()
}

#[test]
fn alerts_are_logged_once_per_cooldown() {
    let dir = tempfile::tempdir().unwrap();
    let logger = DataLogger::new(dir.path().join("live.csv"), dir.path().join("alerts.csv"), 100).unwrap();
    let detector = AnomalyDetector::new(
        DetectorConfig::default()
            .without_model()
            .with_cooldown(Duration::from_secs(60)),
    );
    let source = ReplaySource::new(&[(40.0, 400), (5.0, 200), (5.0, 210), (45.0, 3000), (41.0, 390)]);

    let mut pipeline = Pipeline::new(Box::new(source), detector, logger, fast_config());
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    pipeline
        .add_observer(Arc::new(move |alert: &Alert| {
            sink.lock().unwrap().push(alert.record.anomaly_type)
        }))
        .unwrap();

    let report = run_until(&mut pipeline, |status| status.processed == 5);

    assert_eq!(report.state, PipelineState::Stopped);
    assert_eq!(report.processed, 5);
    assert_eq!(report.alerts, 1);
    assert_eq!(report.detector.anomalies, 3);
    assert_eq!(report.detector.suppressed, 2);
    assert_eq!(report.logger.live_rows, 5);
    assert_eq!(report.logger.alert_count, 1);
    assert_eq!(*seen.lock().unwrap(), vec![RiskType::Blockage]);

    let live = fs::read_to_string(dir.path().join("live.csv")).unwrap();
    let rows: Vec<&str> = live.lines().skip(1).collect();
    assert_eq!(rows.len(), 5);
    assert!(rows[0].ends_with(",0,NORMAL,0.0,NORMAL"));
    assert!(rows[3].contains(",1,GAS_HAZARD,"));

    let alerts = fs::read_to_string(dir.path().join("alerts.csv")).unwrap();
    let alert_rows: Vec<&str> = alerts.lines().skip(1).collect();
    assert_eq!(alert_rows.len(), 1);
    assert!(alert_rows[0].contains(",BLOCKAGE,"));
}

#[test]
fn storage_failures_do_not_stop_the_loop() {
    let dir = tempfile::tempdir().unwrap();
    let logs = dir.path().join("logs");
    let logger = DataLogger::new(logs.join("live.csv"), logs.join("alerts.csv"), 100).unwrap();
    fs::remove_dir_all(&logs).unwrap();

    let detector = AnomalyDetector::new(DetectorConfig::default().without_model());
    let source = ReplaySource::new(&[(40.0, 400), (42.0, 410), (44.0, 405)]);
    let mut pipeline = Pipeline::new(
        Box::new(source),
        detector,
        logger,
        fast_config().with_clear_on_start(false),
    );

    let report = run_until(&mut pipeline, |status| status.iteration_errors == 3);

    assert_eq!(report.iteration_errors, 3);
    assert_eq!(report.processed, 0);
    assert_eq!(report.detector.predictions, 3);
    assert_eq!(report.source.queue_depth, 0);
}

#[test]
fn panicking_observer_does_not_stop_the_loop() {
    let dir = tempfile::tempdir().unwrap();
    let logger = DataLogger::new(dir.path().join("live.csv"), dir.path().join("alerts.csv"), 100).unwrap();
    let detector = AnomalyDetector::new(
        DetectorConfig::default()
            .without_model()
            .with_cooldown(Duration::from_secs(60)),
    );
    let source = ReplaySource::new(&[(5.0, 200), (40.0, 400), (41.0, 400)]);

    let mut pipeline = Pipeline::new(Box::new(source), detector, logger, fast_config());
    pipeline
        .add_observer(Arc::new(|alert: &Alert| panic!("observer rejected {}", alert.summary())))
        .unwrap();

    pipeline.start().unwrap();
    let deadline = Instant::now() + Duration::from_secs(5);
    while pipeline.status().processed < 3 && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(5));
    }
    assert_eq!(pipeline.state(), PipelineState::Running);
    pipeline.stop().unwrap();

    let report = pipeline.status();
    assert_eq!(report.state, PipelineState::Stopped);
    assert_eq!(report.processed, 3);
    assert_eq!(report.alerts, 1);
    assert_eq!(report.iteration_errors, 1);
    assert_eq!(report.logger.alert_count, 1);
}

#[test]
fn clear_on_start_failure_leaves_pipeline_startable() {
    let dir = tempfile::tempdir().unwrap();
    let logs = dir.path().join("logs");
    let logger = DataLogger::new(logs.join("live.csv"), logs.join("alerts.csv"), 100).unwrap();
    fs::remove_dir_all(&logs).unwrap();

    let detector = AnomalyDetector::new(DetectorConfig::default().without_model());
    let mut pipeline = Pipeline::new(Box::new(ReplaySource::new(&[])), detector, logger, fast_config());

    assert!(pipeline.start().is_err());
    assert_eq!(pipeline.state(), PipelineState::Init);

    fs::create_dir_all(&logs).unwrap();
    pipeline.start().unwrap();
    assert_eq!(pipeline.state(), PipelineState::Running);
    pipeline.stop().unwrap();
}
