//! Anomaly Scoring for Drain Telemetry
//!
//! ## Overview
//!
//! Every reading accepted by the pipeline goes through the
//! [`AnomalyDetector`]. It keeps a short rolling history, derives nine
//! features from it, and scores the reading along one of two paths:
//!
//! ```text
//! predict(water, gas)
//!      ↓
//! history.push(sample)               (current sample is part of its own window)
//!      ↓
//! FeatureVector::from_history
//!      ↓
//! artifact loaded && history ≥ 3 ?
//!      ├─ yes → scaler → isolation forest → score_to_risk → classify_risk_type
//!      └─ no  → fixed-threshold rules (max score wins, flood override)
//!      ↓
//! cooldown check → Detection
//! ```
//!
//! ## Why Two Paths?
//!
//! The model path catches unusual *combinations* and *dynamics* (sudden
//! deltas, volatility) that fixed thresholds miss. It needs a trained
//! artifact and a few samples of context. Until both are available, or
//! for the whole process lifetime when the artifact is missing or corrupt,
//! the rule path keeps the installation protected with reduced confidence.
//!
//! ## Isolation Forest
//!
//! Anomalies are few and different, so random partitioning isolates them
//! in fewer splits than normal points:
//!
//! ```text
//! s(x)     = 2^(−E[h(x)] / c(n))
//! decision = −s(x) − offset          (< 0 → anomalous)
//! ```
//!
//! Trees are trained offline and shipped in the JSON artifact (see
//! [`artifact`]); this crate only scores.
//!
//! ## Example
//!
//! ```rust
//! use drainguard_ml::{AnomalyDetector, DetectorConfig};
//! use drainguard_core::{RiskType};
//!
//! let mut detector = AnomalyDetector::new(DetectorConfig::default());
//! let detection = detector.predict(5.0, 200);
//! assert_eq!(detection.risk_type, RiskType::Blockage);
//! assert!(detection.is_anomaly);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub mod artifact;
pub mod detector;
pub mod features;
pub mod forest;
pub mod inference;
pub mod node;
pub mod scaler;
pub mod scoring;
pub mod tree;

pub use artifact::{ModelArtifact, TrainingStats};
pub use detector::{AnomalyDetector, DetectorConfig, DetectorStats, DetectorStatsSnapshot};
pub use features::{Feature, FeatureVector, Sample};
pub use forest::{ForestScore, IsolationForest};
pub use inference::{Assessment, Thresholds};
pub use node::{c_factor, Node};
pub use scaler::StandardScaler;
pub use scoring::{confidence_from_score, score_to_risk};
pub use tree::IsolationTree;

/// Result type for model operations
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors loading or validating a model artifact
#[derive(Error, Debug)]
pub enum ModelError {
    /// Artifact file could not be read
    #[error("cannot read model {path}: {source}")]
    Io {
        /// Artifact path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: io::Error,
    },

    /// Artifact is not valid JSON for the expected layout
    #[error("cannot parse model: {0}")]
    Parse(#[from] serde_json::Error),

    /// Feature name the detector does not compute
    #[error("unknown feature {0}")]
    UnknownFeature(String),

    /// Array length disagrees with the feature count
    #[error("{what} has {actual} entries, expected {expected}")]
    DimensionMismatch {
        /// Which array
        what: &'static str,
        /// Expected length
        expected: usize,
        /// Actual length
        actual: usize,
    },

    /// Scaler contains NaN or infinity
    #[error("{0} contains a non-finite value")]
    InvalidScaler(&'static str),

    /// Forest has no trees
    #[error("forest has no trees")]
    EmptyForest,

    /// Rolling window of zero
    #[error("rolling window must be at least 1")]
    InvalidWindow,

    /// Structurally invalid tree
    #[error("tree {tree}: {reason}")]
    InvalidTree {
        /// Tree index in the forest
        tree: usize,
        /// What is wrong
        reason: String,
    },
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
    fn error_messages() {
        let err = ModelError::DimensionMismatch {
            what: "scaler mean",
            expected: 9,
            actual: 2,
        };
        assert_eq!(err.to_string(), "scaler mean has 2 entries, expected 9");
        assert_eq!(
            ModelError::UnknownFeature("humidity".into()).to_string(),
            "unknown feature humidity"
        );
    }
}
