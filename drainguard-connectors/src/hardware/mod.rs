//! Hardware Telemetry Source
//!
//! ## Overview
//!
//! Reads line-delimited JSON records from the sensor device over a
//! [`LinkConnector`] and queues every accepted sample:
//!
//! ```text
//!        ┌────────────── connect() fails ──→ warn, sleep retry delay ─┐
//!        ↓                                                            │
//!   connect ──→ settle ──→ read line ──→ parse ──→ validate ──→ queue │
//!                              │            │          │              │
//!                              │            │          └─ warn, count │
//!                              │            └─ control: info, skip    │
//!                              │               malformed: count       │
//!                              └─ EOF / I/O error ──→ error, backoff ─┘
//! ```
//!
//! ## Failure Handling
//!
//! Nothing on the link is fatal to the process. Record-level problems
//! increment the `errors` counter. Link-level problems drop the link and
//! re-enter the connect loop after a fixed delay. A read timeout only
//! gives the loop a chance to observe cancellation.
//!
//! ## Stopping
//!
//! `stop()` cancels the token and joins within the configured timeout.
//! Both links apply the configured read timeout, so the producer observes
//! cancellation within one timeout; a thread still blocked at the join
//! deadline is detached.

mod link;
pub mod record;

use std::sync::Arc;
use std::time::Duration;

use drainguard_core::config::{SensorSettings, Settings};
use drainguard_core::constants::READING_QUEUE_CAPACITY;
use drainguard_core::{BoundedQueue, CancellationToken, Reading, ReadingValidator, Worker};

pub use link::{link_for_port, LineReader, LinkConnector, LinkError, SerialLink, TcpLink};
pub use record::{Record, RecordError};

use crate::monitor::{SourceMonitor, SourceStats};
use crate::{SourceError, TelemetrySource};

/// Hardware source configuration
#[derive(Debug, Clone, PartialEq)]
pub struct HardwareConfig {
    /// Physical ranges enforced on every sample
    pub sensors: SensorSettings,
    /// Reading queue capacity
    pub queue_capacity: usize,
    /// Delay between failed connection attempts
    pub connect_retry: Duration,
    /// Backoff after a link error
    pub error_backoff: Duration,
    /// Wait after connecting before reading
    pub settle: Duration,
    /// Bounded join on stop
    pub join_timeout: Duration,
}

impl Default for HardwareConfig {
    fn default() -> Self {
        Self::from_settings(&Settings::default())
    }
}

impl HardwareConfig {
    /// Build from deployment settings
    pub fn from_settings(settings: &Settings) -> Self {
        let serial = &settings.serial;
        Self {
            sensors: settings.sensors.clone(),
            queue_capacity: settings.pipeline.queue_capacity,
            connect_retry: Duration::from_millis(serial.connect_retry_ms),
            error_backoff: Duration::from_millis(serial.error_backoff_ms),
            settle: Duration::from_millis(serial.settle_ms),
            join_timeout: Duration::from_millis(settings.pipeline.join_timeout_ms),
        }
    }

    /// Set the connect retry delay
    pub fn with_connect_retry(mut self, delay: Duration) -> Self {
        self.connect_retry = delay;
        self
    }

    /// Set the link error backoff
    pub fn with_error_backoff(mut self, delay: Duration) -> Self {
        self.error_backoff = delay;
        self
    }

    /// Set the post-connect settle delay
    pub fn with_settle(mut self, delay: Duration) -> Self {
        self.settle = delay;
        self
    }

    /// Set the stop timeout
    pub fn with_join_timeout(mut self, timeout: Duration) -> Self {
        self.join_timeout = timeout;
        self
    }

    /// Set the reading queue capacity
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }
}

/// Telemetry source backed by a device link
pub struct HardwareSource {
    config: HardwareConfig,
    connector: Arc<dyn LinkConnector>,
    validator: ReadingValidator,
    queue: Arc<BoundedQueue<Reading>>,
    monitor: Arc<SourceMonitor>,
    token: CancellationToken,
    worker: Option<Worker>,
}

impl HardwareSource {
    /// Create a stopped source reading from `connector`
    pub fn new(config: HardwareConfig, connector: impl LinkConnector + 'static) -> Self {
        let capacity = if config.queue_capacity == 0 {
            READING_QUEUE_CAPACITY
        } else {
            config.queue_capacity
        };
        Self {
            validator: ReadingValidator::from_settings(&config.sensors),
            queue: Arc::new(BoundedQueue::new(capacity)),
            monitor: Arc::new(SourceMonitor::default()),
            connector: Arc::new(connector),
            token: CancellationToken::new(),
            worker: None,
            config,
        }
    }

    /// Source for the configured serial port
    pub fn from_settings(settings: &Settings) -> Self {
        let serial = &settings.serial;
        let link = link_for_port(
            &serial.port,
            serial.baud_rate,
            Duration::from_millis(serial.read_timeout_ms),
        );
        Self::new(HardwareConfig::from_settings(settings), link)
    }

    /// Link target
    pub fn describe(&self) -> String {
        self.connector.describe()
    }
}

/// State moved into the producer thread
struct LinkLoop {
    config: HardwareConfig,
    connector: Arc<dyn LinkConnector>,
    validator: ReadingValidator,
    queue: Arc<BoundedQueue<Reading>>,
    monitor: Arc<SourceMonitor>,
    token: CancellationToken,
}

impl LinkLoop {
    fn run(self) {
        let target = self.connector.describe();
        let mut connected_before = false;

        while !self.token.is_cancelled() {
            let reader = match self.connector.connect() {
                Ok(reader) => reader,
                Err(err) => {
                    log::warn!(
                        "Cannot open {} ({}), retrying in {}ms",
                        target,
                        err,
                        self.config.connect_retry.as_millis()
                    );
                    if !self.token.sleep(self.config.connect_retry) {
                        break;
                    }
                    continue;
                }
            };

            log::info!("Connected to {}", target);
            if connected_before {
                self.monitor.record_reconnect();
            }
            connected_before = true;
            self.monitor.set_link_up(true);

            if !self.token.sleep(self.config.settle) {
                break;
            }

            let result = self.pump(LineReader::new(reader, target.clone()));
            self.monitor.set_link_up(false);

            match result {
                Ok(()) => break,
                Err(err) => {
                    log::error!("Link error: {}", err);
                    if !self.token.sleep(self.config.error_backoff) {
                        break;
                    }
                }
            }
        }

        self.monitor.set_link_up(false);
        self.monitor.set_running(false);
    }

    /// Read until cancelled (`Ok`) or the link fails (`Err`)
    fn pump<R: std::io::Read>(&self, mut lines: LineReader<R>) -> Result<(), LinkError> {
        while !self.token.is_cancelled() {
            match lines.next_line() {
                Ok(Some(line)) => self.handle_line(&line),
                Ok(None) => {}
                Err(err) if !err.is_fatal() => {
                    log::debug!("{}", err);
                    self.monitor.record_error();
                }
                Err(err) => return Err(err),
            }
        }
        Ok(())
    }

    fn handle_line(&self, line: &str) {
        if line.is_empty() {
            return;
        }

        match Record::parse(line) {
            Ok(Record::Control(event)) => {
                log::info!("Device event: {}", serde_json::Value::Object(event));
            }
            Ok(Record::Sample { water, gas }) => {
                match record::to_reading(&self.validator, water, gas) {
                    Ok(reading) => self.monitor.publish(&self.queue, reading),
                    Err(err) => {
                        log::warn!("Rejected reading water={:?} gas={:?}: {}", water, gas, err);
                        self.monitor.record_error();
                    }
                }
            }
            Err(err) => {
                log::debug!("Malformed record: {}", err);
                self.monitor.record_error();
            }
        }
    }
}

impl TelemetrySource for HardwareSource {
    fn name(&self) -> &'static str {
        "hardware"
    }

    fn start(&mut self) -> Result<(), SourceError> {
        if self.worker.is_some() {
            return Err(SourceError::AlreadyRunning);
        }

        self.token = CancellationToken::new();
        let link_loop = LinkLoop {
            config: self.config.clone(),
            connector: Arc::clone(&self.connector),
            validator: self.validator,
            queue: Arc::clone(&self.queue),
            monitor: Arc::clone(&self.monitor),
            token: self.token.clone(),
        };

        self.monitor.set_running(true);
        match Worker::spawn("drainguard-hardware", move || link_loop.run()) {
            Ok(worker) => self.worker = Some(worker),
            Err(err) => {
                self.monitor.set_running(false);
                return Err(SourceError::Spawn(err));
            }
        }

        log::info!("Hardware reader started on {}", self.connector.describe());
        Ok(())
    }

    fn stop(&mut self) {
        let Some(worker) = self.worker.take() else {
            return;
        };
        self.token.cancel();
        worker.join_timeout(self.config.join_timeout);
        self.monitor.set_link_up(false);
        self.monitor.set_running(false);
        log::info!("Hardware reader stopped");
    }

    fn is_running(&self) -> bool {
        self.worker.is_some()
    }

    fn stats(&self) -> SourceStats {
        self.monitor.snapshot(&self.queue)
    }

    fn readings(&self) -> Arc<BoundedQueue<Reading>> {
        Arc::clone(&self.queue)
    }
}

impl Drop for HardwareSource {
    fn drop(&mut self) {
        self.stop();
    }
}
