//! Runtime Settings
//!
//! ## Overview
//!
//! One `Settings` value describes a deployment: where the logs and the
//! model live, the physical sensor ranges and hazard thresholds, detector
//! tuning, simulator behaviour, the serial link and pipeline timings.
//!
//! Settings are read from a JSON file. Every field has a default taken from
//! [`crate::constants`], so a file only needs to name what differs:
//!
//! ```json
//! {
//!   "serial": { "port": "/dev/ttyUSB0" },
//!   "detector": { "cooldown_secs": 30 }
//! }
//! ```
//!
//! `validate()` rejects impossible combinations. It runs at startup, before
//! any thread is spawned; a failure there is the only error allowed to stop
//! the process.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{buffers, sensors, time};
use crate::errors::SettingsError;

/// Complete deployment settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// File locations
    pub paths: PathSettings,
    /// Sensor ranges and hazard thresholds
    pub sensors: SensorSettings,
    /// Anomaly detector tuning
    pub detector: DetectorSettings,
    /// Simulated source behaviour
    pub simulator: SimulatorSettings,
    /// Hardware link
    pub serial: SerialSettings,
    /// Orchestrator timings and log limits
    pub pipeline: PipelineSettings,
}

impl Settings {
    /// Load settings from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    /// Parse settings from a JSON document
    pub fn from_json(text: &str) -> Result<Self, SettingsError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Reject settings that cannot describe a working deployment
    pub fn validate(&self) -> Result<(), SettingsError> {
        let s = &self.sensors;
        if s.water_min_cm >= s.water_max_cm {
            return Err(invalid(format!(
                "water range [{}, {}] is empty",
                s.water_min_cm, s.water_max_cm
            )));
        }
        if s.gas_min >= s.gas_max {
            return Err(invalid(format!("gas range [{}, {}] is empty", s.gas_min, s.gas_max)));
        }
        if s.water_normal_low_cm >= s.water_normal_high_cm {
            return Err(invalid("water normal band is empty".into()));
        }
        if s.water_blockage_cm >= s.water_leakage_cm {
            return Err(invalid("blockage threshold must be below leakage threshold".into()));
        }
        if s.gas_warning >= s.gas_danger {
            return Err(invalid(format!(
                "gas warning {} must be below danger {}",
                s.gas_warning, s.gas_danger
            )));
        }
        if self.detector.rolling_window == 0 {
            return Err(invalid("rolling window must be at least 1".into()));
        }
        if self.pipeline.queue_capacity == 0 {
            return Err(invalid("queue capacity must be at least 1".into()));
        }
        if self.pipeline.max_live_rows == 0 {
            return Err(invalid("rotation ceiling must be at least 1".into()));
        }
        if !(0.0..=1.0).contains(&self.simulator.anomaly_rate) {
            return Err(invalid(format!(
                "anomaly rate {} outside [0, 1]",
                self.simulator.anomaly_rate
            )));
        }
        if self.paths.live_log == self.paths.alert_log {
            return Err(invalid("live log and alert log must be different files".into()));
        }
        Ok(())
    }
}

fn invalid(reason: String) -> SettingsError {
    SettingsError::Invalid(reason)
}

/// File locations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathSettings {
    /// Directory holding the logs and their archives
    pub data_dir: PathBuf,
    /// Readings log
    pub live_log: PathBuf,
    /// Alert log
    pub alert_log: PathBuf,
    /// Model artifact
    pub model: PathBuf,
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            live_log: PathBuf::from("data/live_data.csv"),
            alert_log: PathBuf::from("data/alert_log.csv"),
            model: PathBuf::from("ai_model/model.json"),
        }
    }
}

/// Physical sensor ranges and hazard thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorSettings {
    /// Minimum physical water distance (cm)
    pub water_min_cm: f64,
    /// Maximum physical water distance (cm)
    pub water_max_cm: f64,
    /// Lower edge of the normal water band (cm)
    pub water_normal_low_cm: f64,
    /// Upper edge of the normal water band (cm)
    pub water_normal_high_cm: f64,
    /// Blockage below this distance (cm)
    pub water_blockage_cm: f64,
    /// Leakage above this distance (cm)
    pub water_leakage_cm: f64,
    /// Flood risk requires water below this distance (cm)
    pub flood_water_floor_cm: f64,
    /// Minimum gas ADC value
    pub gas_min: u16,
    /// Maximum gas ADC value
    pub gas_max: u16,
    /// Upper edge of normal gas background
    pub gas_normal_max: u16,
    /// Gas warning threshold
    pub gas_warning: u16,
    /// Gas danger threshold
    pub gas_danger: u16,
    /// Flood risk requires gas above this value
    pub flood_gas_floor: u16,
}

impl Default for SensorSettings {
    fn default() -> Self {
        Self {
            water_min_cm: sensors::WATER_LEVEL_MIN_CM,
            water_max_cm: sensors::WATER_LEVEL_MAX_CM,
            water_normal_low_cm: sensors::WATER_NORMAL_LOW_CM,
            water_normal_high_cm: sensors::WATER_NORMAL_HIGH_CM,
            water_blockage_cm: sensors::WATER_BLOCKAGE_THRESHOLD_CM,
            water_leakage_cm: sensors::WATER_LEAKAGE_THRESHOLD_CM,
            flood_water_floor_cm: sensors::FLOOD_WATER_FLOOR_CM,
            gas_min: sensors::GAS_LEVEL_MIN,
            gas_max: sensors::GAS_LEVEL_MAX,
            gas_normal_max: sensors::GAS_NORMAL_MAX,
            gas_warning: sensors::GAS_WARNING_THRESHOLD,
            gas_danger: sensors::GAS_DANGER_THRESHOLD,
            flood_gas_floor: sensors::FLOOD_GAS_FLOOR,
        }
    }
}

/// Anomaly detector tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorSettings {
    /// Rolling window when no model artifact overrides it
    pub rolling_window: usize,
    /// Minimum seconds between two raised alerts
    pub cooldown_secs: u64,
    /// Score threshold when the artifact does not carry one
    pub score_threshold: f64,
    /// History length required before the model path is used
    pub min_model_history: usize,
}

impl Default for DetectorSettings {
    fn default() -> Self {
        Self {
            rolling_window: buffers::DEFAULT_ROLLING_WINDOW,
            cooldown_secs: time::DEFAULT_COOLDOWN_SECS,
            score_threshold: -0.1,
            min_model_history: buffers::MIN_MODEL_HISTORY,
        }
    }
}

impl DetectorSettings {
    /// Cooldown as a duration
    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_secs)
    }
}

/// Simulated source behaviour
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatorSettings {
    /// Tick interval (ms)
    pub interval_ms: u64,
    /// Anomaly rate; the burst start probability per tick is a tenth of it
    pub anomaly_rate: f64,
    /// Maximum extra ticks in a burst; bursts last at least half of it
    pub burst_duration: u32,
    /// Seed for reproducible runs
    pub seed: Option<u64>,
}

impl Default for SimulatorSettings {
    fn default() -> Self {
        Self {
            interval_ms: time::SIMULATOR_INTERVAL_MS,
            anomaly_rate: 0.08,
            burst_duration: 10,
            seed: None,
        }
    }
}

impl SimulatorSettings {
    /// Tick interval as a duration
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

/// Hardware link settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialSettings {
    /// Device path, or `host:port` of a serial-to-TCP bridge
    pub port: String,
    /// Baud rate configured on the device side
    pub baud_rate: u32,
    /// Read timeout (ms)
    pub read_timeout_ms: u64,
    /// Delay between failed connection attempts (ms)
    pub connect_retry_ms: u64,
    /// Backoff after a link error (ms)
    pub error_backoff_ms: u64,
    /// Wait after connecting before reading (ms)
    pub settle_ms: u64,
}

impl Default for SerialSettings {
    fn default() -> Self {
        Self {
            port: "COM3".into(),
            baud_rate: 115_200,
            read_timeout_ms: time::SERIAL_READ_TIMEOUT_MS,
            connect_retry_ms: time::SERIAL_CONNECT_RETRY_MS,
            error_backoff_ms: time::SERIAL_ERROR_BACKOFF_MS,
            settle_ms: time::SERIAL_SETTLE_MS,
        }
    }
}

/// Orchestrator timings and log limits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    /// Reading queue capacity
    pub queue_capacity: usize,
    /// Readings log rotation ceiling (rows)
    pub max_live_rows: usize,
    /// Sleep when the queue is empty (ms)
    pub empty_queue_poll_ms: u64,
    /// Bounded dequeue wait (ms)
    pub dequeue_timeout_ms: u64,
    /// Backoff after a failed iteration (ms)
    pub iteration_backoff_ms: u64,
    /// Interval between status reports (ms)
    pub status_interval_ms: u64,
    /// Bounded join when stopping threads (ms)
    pub join_timeout_ms: u64,
    /// Truncate the readings log when a session starts
    pub clear_on_start: bool,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            queue_capacity: buffers::READING_QUEUE_CAPACITY,
            max_live_rows: buffers::MAX_LIVE_ROWS,
            empty_queue_poll_ms: time::EMPTY_QUEUE_POLL_MS,
            dequeue_timeout_ms: time::DEQUEUE_TIMEOUT_MS,
            iteration_backoff_ms: time::ITERATION_ERROR_BACKOFF_MS,
            status_interval_ms: time::STATUS_INTERVAL_MS,
            join_timeout_ms: time::DEFAULT_JOIN_TIMEOUT_MS,
            clear_on_start: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_valid() {
        let settings = Settings::default();
        settings.validate().unwrap();
        assert_eq!(settings.pipeline.queue_capacity, 1000);
        assert_eq!(settings.pipeline.max_live_rows, 10_000);
        assert_eq!(settings.detector.cooldown(), Duration::from_secs(60));
        assert_eq!(settings.serial.baud_rate, 115_200);
    }

    #[test]
    fn partial_json_overrides_only_named_fields() {
        let settings = Settings::from_json(
            r#"{ "serial": { "port": "/dev/ttyUSB0" }, "detector": { "cooldown_secs": 30 } }"#,
        )
        .unwrap();

        assert_eq!(settings.serial.port, "/dev/ttyUSB0");
        assert_eq!(settings.serial.read_timeout_ms, 2000);
        assert_eq!(settings.detector.cooldown_secs, 30);
        assert_eq!(settings.detector.rolling_window, 10);
        assert_eq!(settings.sensors, SensorSettings::default());
    }

    #[test]
    fn rejects_inverted_gas_thresholds() {
        let mut settings = Settings::default();
        settings.sensors.gas_warning = 3000;
        assert!(matches!(settings.validate(), Err(SettingsError::Invalid(_))));
    }

    #[test]
    fn rejects_zero_window_and_capacity() {
        let mut settings = Settings::default();
        settings.detector.rolling_window = 0;
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.pipeline.queue_capacity = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "pipeline": {{ "clear_on_start": false }} }}"#).unwrap();

        let settings = Settings::load(file.path()).unwrap();
        assert!(!settings.pipeline.clear_on_start);

        let err = Settings::load(file.path().with_extension("missing")).unwrap_err();
        assert!(matches!(err, SettingsError::Io { .. }));
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(matches!(Settings::from_json("{ nope"), Err(SettingsError::Parse(_))));
    }
}
