//! Anomaly Detector
//!
//! ## Overview
//!
//! `AnomalyDetector` owns everything that makes a prediction stateful:
//!
//! - the rolling history (a ring buffer of twice the rolling window)
//! - the optional model artifact, loaded once at construction
//! - the cooldown state: time of the last raised alert and the alert count
//!
//! It is owned and mutated by the pipeline's consumer thread only. Other
//! threads observe it through the [`DetectorStats`] handle, which is a set
//! of atomics.
//!
//! ## Cooldown
//!
//! ```text
//! anomalous detection at t
//!      ↓
//! last_alert = None or t − last_alert ≥ cooldown ?
//!      ├─ yes → raise: last_alert = t, total_alerts += 1
//!      └─ no  → alert_suppressed = true, last_alert unchanged
//! ```
//!
//! Suppressed detections are still logged as readings; they only do not
//! raise an alert. Time comes from an injected [`TimeSource`] so tests can
//! drive the cooldown without sleeping.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use drainguard_core::buffer::CircularBuffer;
use drainguard_core::constants::buffers::{HISTORY_WINDOWS, MIN_MODEL_HISTORY};
use drainguard_core::constants::DEFAULT_ROLLING_WINDOW;
use drainguard_core::reading::round_to;
use drainguard_core::time::{delta_ms, MonotonicTime};
use drainguard_core::{Detection, InferenceMode, Reading, RiskLevel, Settings, TimeSource, Timestamp};
use serde::Serialize;

use crate::artifact::ModelArtifact;
use crate::features::{FeatureVector, Sample};
use crate::inference::{self, Assessment, Thresholds};

/// Detector configuration
#[derive(Debug, Clone, PartialEq)]
pub struct DetectorConfig {
    /// Thresholds for rules and model-path classification
    pub thresholds: Thresholds,
    /// Rolling window used when no artifact overrides it
    pub rolling_window: usize,
    /// Minimum time between two raised alerts
    pub cooldown: Duration,
    /// History length required before the model path is used
    pub min_model_history: usize,
    /// Score threshold reported when the artifact carries none
    pub score_threshold: f64,
    /// Artifact to load at construction
    pub model_path: Option<PathBuf>,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            thresholds: Thresholds::default(),
            rolling_window: DEFAULT_ROLLING_WINDOW,
            cooldown: Duration::from_secs(drainguard_core::constants::DEFAULT_COOLDOWN_SECS),
            min_model_history: MIN_MODEL_HISTORY,
            score_threshold: -0.1,
            model_path: None,
        }
    }
}

impl DetectorConfig {
    /// Build from deployment settings, including the model path
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            thresholds: Thresholds::from_settings(&settings.sensors),
            rolling_window: settings.detector.rolling_window,
            cooldown: settings.detector.cooldown(),
            min_model_history: settings.detector.min_model_history,
            score_threshold: settings.detector.score_threshold,
            model_path: Some(settings.paths.model.clone()),
        }
    }

    /// Set the thresholds
    pub fn with_thresholds(mut self, thresholds: Thresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    /// Set the rolling window
    pub fn with_rolling_window(mut self, window: usize) -> Self {
        self.rolling_window = window;
        self
    }

    /// Set the alert cooldown
    pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }

    /// Set the history length required for the model path
    pub fn with_min_model_history(mut self, samples: usize) -> Self {
        self.min_model_history = samples;
        self
    }

    /// Set the artifact to load
    pub fn with_model_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.model_path = Some(path.into());
        self
    }

    /// Run rule-based only
    pub fn without_model(mut self) -> Self {
        self.model_path = None;
        self
    }
}

const MODE_NONE: u8 = 0;
const MODE_MODEL: u8 = 1;
const MODE_RULES: u8 = 2;

/// Detector statistics, shared with observer threads
#[derive(Debug, Default)]
pub struct DetectorStats {
    /// An artifact is loaded
    pub model_loaded: AtomicBool,
    /// Samples currently in history
    pub history_length: AtomicUsize,
    /// Predictions made
    pub predictions: AtomicU64,
    /// Anomalous detections
    pub anomalies: AtomicU64,
    /// Alerts raised (not suppressed)
    pub total_alerts: AtomicU64,
    /// Alerts suppressed by the cooldown
    pub suppressed: AtomicU64,
    last_mode: AtomicU8,
}

impl DetectorStats {
    /// Plain snapshot of the counters
    pub fn snapshot(&self) -> DetectorStatsSnapshot {
        DetectorStatsSnapshot {
            model_loaded: self.model_loaded.load(Ordering::Relaxed),
            history_length: self.history_length.load(Ordering::Relaxed),
            predictions: self.predictions.load(Ordering::Relaxed),
            anomalies: self.anomalies.load(Ordering::Relaxed),
            total_alerts: self.total_alerts.load(Ordering::Relaxed),
            suppressed: self.suppressed.load(Ordering::Relaxed),
            mode: match self.last_mode.load(Ordering::Relaxed) {
                MODE_MODEL => Some(InferenceMode::Model),
                MODE_RULES => Some(InferenceMode::Rules),
                _ => None,
            },
        }
    }

    fn record_mode(&self, mode: InferenceMode) {
        let code = match mode {
            InferenceMode::Model => MODE_MODEL,
            InferenceMode::Rules => MODE_RULES,
        };
        self.last_mode.store(code, Ordering::Relaxed);
    }
}

/// Copy of [`DetectorStats`] at one instant
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DetectorStatsSnapshot {
    /// An artifact is loaded
    pub model_loaded: bool,
    /// Samples currently in history
    pub history_length: usize,
    /// Predictions made
    pub predictions: u64,
    /// Anomalous detections
    pub anomalies: u64,
    /// Alerts raised
    pub total_alerts: u64,
    /// Alerts suppressed by the cooldown
    pub suppressed: u64,
    /// Path used by the last prediction; `None` before the first
    pub mode: Option<InferenceMode>,
}

/// Stateful anomaly detector
pub struct AnomalyDetector {
    config: DetectorConfig,
    artifact: Option<ModelArtifact>,
    window: usize,
    history: CircularBuffer<Sample>,
    clock: Arc<dyn TimeSource>,
    last_alert: Option<Timestamp>,
    stats: Arc<DetectorStats>,
}

impl AnomalyDetector {
    /// Create a detector on a monotonic clock, loading the configured artifact
    pub fn new(config: DetectorConfig) -> Self {
        Self::with_clock(config, Arc::new(MonotonicTime::new()))
    }

    /// Create a detector with an explicit clock.
    ///
    /// A missing or invalid artifact is reported once here and the detector
    /// stays rule-based for its whole lifetime.
    pub fn with_clock(config: DetectorConfig, clock: Arc<dyn TimeSource>) -> Self {
        let artifact = config.model_path.as_deref().and_then(load_artifact);
        Self::build(config, artifact, clock)
    }

    /// Create a detector around an already loaded artifact
    pub fn with_artifact(
        config: DetectorConfig,
        artifact: ModelArtifact,
        clock: Arc<dyn TimeSource>,
    ) -> Self {
        Self::build(config, Some(artifact), clock)
    }

    fn build(
        config: DetectorConfig,
        artifact: Option<ModelArtifact>,
        clock: Arc<dyn TimeSource>,
    ) -> Self {
        let window = artifact
            .as_ref()
            .map_or(config.rolling_window, ModelArtifact::rolling_window)
            .max(1);
        let stats = Arc::new(DetectorStats::default());
        stats.model_loaded.store(artifact.is_some(), Ordering::Relaxed);

        Self {
            config,
            artifact,
            window,
            history: CircularBuffer::with_capacity(window * HISTORY_WINDOWS),
            clock,
            last_alert: None,
            stats,
        }
    }

    /// Score one sample.
    ///
    /// The sample joins the history first, so it is part of its own rolling
    /// statistics.
    pub fn predict(&mut self, water: f64, gas: u16) -> Detection {
        let gas_value = f64::from(gas);
        self.history.push(Sample::new(water, gas_value));
        self.stats
            .history_length
            .store(self.history.len(), Ordering::Relaxed);

        let assessment = self.assess(water, gas_value);
        self.stats.predictions.fetch_add(1, Ordering::Relaxed);
        self.stats.record_mode(assessment.mode);

        let alert_suppressed = assessment.is_anomaly && !self.try_raise_alert();
        self.to_detection(assessment, water, gas, alert_suppressed)
    }

    /// Score a validated reading
    pub fn predict_reading(&mut self, reading: &Reading) -> Detection {
        self.predict(reading.water_level_cm, reading.gas_level)
    }

    fn assess(&self, water: f64, gas: f64) -> Assessment {
        let model_ready = self.history.len() >= self.config.min_model_history;
        match (&self.artifact, model_ready) {
            (Some(artifact), true) => {
                match FeatureVector::from_history(&self.history, self.window) {
                    Some(features) => {
                        inference::model_predict(&features, artifact, &self.config.thresholds)
                    }
                    None => inference::rule_predict(water, gas, &self.config.thresholds),
                }
            }
            _ => inference::rule_predict(water, gas, &self.config.thresholds),
        }
    }

    /// Cooldown gate. Returns true when the alert is raised.
    fn try_raise_alert(&mut self) -> bool {
        self.stats.anomalies.fetch_add(1, Ordering::Relaxed);
        let now = self.clock.now();
        let cooldown_ms = self.config.cooldown.as_millis() as u64;

        if let Some(last) = self.last_alert {
            if delta_ms(last, now) < cooldown_ms {
                self.stats.suppressed.fetch_add(1, Ordering::Relaxed);
                return false;
            }
        }

        self.last_alert = Some(now);
        self.stats.total_alerts.fetch_add(1, Ordering::Relaxed);
        true
    }

    fn to_detection(
        &self,
        assessment: Assessment,
        water: f64,
        gas: u16,
        alert_suppressed: bool,
    ) -> Detection {
        let risk_score = round_to(assessment.risk_score, 1);
        Detection {
            is_anomaly: assessment.is_anomaly,
            risk_score,
            risk_level: RiskLevel::from_score(risk_score),
            risk_type: assessment.risk_type,
            confidence: round_to(assessment.confidence, 1),
            raw_score: assessment.raw_score.map(|raw| round_to(raw, 4)),
            details: inference::details(assessment.risk_type, water, gas, risk_score),
            alert_suppressed,
            mode: assessment.mode,
        }
    }

    /// Shared statistics handle
    pub fn stats_handle(&self) -> Arc<DetectorStats> {
        Arc::clone(&self.stats)
    }

    /// Statistics snapshot
    pub fn stats(&self) -> DetectorStatsSnapshot {
        self.stats.snapshot()
    }

    /// Whether an artifact is loaded
    pub fn is_model_loaded(&self) -> bool {
        self.artifact.is_some()
    }

    /// The loaded artifact
    pub fn artifact(&self) -> Option<&ModelArtifact> {
        self.artifact.as_ref()
    }

    /// Rolling window in effect
    pub fn rolling_window(&self) -> usize {
        self.window
    }

    /// Samples currently in history
    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Alerts raised so far
    pub fn total_alerts(&self) -> u64 {
        self.stats.total_alerts.load(Ordering::Relaxed)
    }

    /// Score threshold in effect: the artifact's, else the configured one
    pub fn score_threshold(&self) -> f64 {
        self.artifact
            .as_ref()
            .and_then(ModelArtifact::score_threshold)
            .unwrap_or(self.config.score_threshold)
    }

    /// Configuration
    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }
}

fn load_artifact(path: &Path) -> Option<ModelArtifact> {
    match ModelArtifact::load(path) {
        Ok(artifact) => {
            log::info!(
                "Model loaded from {} ({} features, window {})",
                path.display(),
                artifact.features().len(),
                artifact.rolling_window()
            );
            Some(artifact)
        }
        Err(err) => {
            log::warn!("Model unavailable ({}); using rule-based detection", err);
            None
        }
    }
}
