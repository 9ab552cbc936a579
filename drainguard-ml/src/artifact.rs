//! Model Artifact Loading
//!
//! ## Overview
//!
//! The detector consumes a model trained offline. The artifact is a JSON
//! document bundling everything inference needs:
//!
//! ```json
//! {
//!   "feature_names": ["water_level_cm", "gas_level", "..."],
//!   "rolling_window": 10,
//!   "score_threshold": -0.1,
//!   "scaler": { "mean": [...], "scale": [...] },
//!   "forest": { "max_samples": 256, "offset": -0.52, "trees": [ { "nodes": [...] } ] },
//!   "training_stats": { "samples": 5000, "anomalies_detected": 250 }
//! }
//! ```
//!
//! ## Validation
//!
//! Loading is all-or-nothing. A file that cannot be read, parsed or
//! validated yields a `ModelError`; the detector then runs rule-based for
//! the rest of the process lifetime. Checks:
//!
//! - every feature name is one the detector computes
//! - scaler arrays match the feature count
//! - the forest has at least one tree, and every split references a valid
//!   feature and forward child indices
//! - the rolling window is at least 1

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::features::{Feature, FeatureVector};
use crate::forest::{ForestScore, IsolationForest};
use crate::scaler::StandardScaler;
use crate::{ModelError, ModelResult};

/// Training metadata carried through for downstream readers
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingStats {
    /// Training samples
    pub samples: usize,
    /// Training samples labelled anomalous by the model
    pub anomalies_detected: usize,
    /// Precision against the labelled set, if evaluated
    pub precision: Option<f64>,
    /// Recall against the labelled set, if evaluated
    pub recall: Option<f64>,
    /// Mean decision value over the training set
    pub score_mean: Option<f64>,
    /// Std of the decision value over the training set
    pub score_std: Option<f64>,
}

/// On-disk layout
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ArtifactFile {
    feature_names: Vec<String>,
    rolling_window: usize,
    #[serde(default)]
    score_threshold: Option<f64>,
    scaler: StandardScaler,
    forest: IsolationForest,
    #[serde(default)]
    training_stats: Option<TrainingStats>,
}

/// Validated, immutable model artifact
#[derive(Debug, Clone, PartialEq)]
pub struct ModelArtifact {
    features: Vec<Feature>,
    rolling_window: usize,
    score_threshold: Option<f64>,
    scaler: StandardScaler,
    forest: IsolationForest,
    training_stats: Option<TrainingStats>,
}

impl ModelArtifact {
    /// Read and validate an artifact file
    pub fn load(path: impl AsRef<Path>) -> ModelResult<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ModelError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    /// Parse and validate an artifact document
    pub fn from_json(text: &str) -> ModelResult<Self> {
        let file: ArtifactFile = serde_json::from_str(text)?;
        Self::from_parts(
            &file.feature_names,
            file.rolling_window,
            file.score_threshold,
            file.scaler,
            file.forest,
            file.training_stats,
        )
    }

    /// Build from components, applying every load-time check
    pub fn from_parts(
        feature_names: &[String],
        rolling_window: usize,
        score_threshold: Option<f64>,
        scaler: StandardScaler,
        forest: IsolationForest,
        training_stats: Option<TrainingStats>,
    ) -> ModelResult<Self> {
        let features = feature_names
            .iter()
            .map(|name| name.parse::<Feature>().map_err(ModelError::UnknownFeature))
            .collect::<ModelResult<Vec<_>>>()?;
        if features.is_empty() {
            return Err(ModelError::DimensionMismatch {
                what: "feature_names",
                expected: Feature::ALL.len(),
                actual: 0,
            });
        }
        if rolling_window == 0 {
            return Err(ModelError::InvalidWindow);
        }
        scaler.validate(features.len())?;
        forest.validate(features.len())?;

        Ok(Self {
            features,
            rolling_window,
            score_threshold,
            scaler,
            forest,
            training_stats,
        })
    }

    /// Serialize back to the on-disk layout
    pub fn to_json(&self) -> ModelResult<String> {
        let file = ArtifactFile {
            feature_names: self.features.iter().map(|f| f.name().to_string()).collect(),
            rolling_window: self.rolling_window,
            score_threshold: self.score_threshold,
            scaler: self.scaler.clone(),
            forest: self.forest.clone(),
            training_stats: self.training_stats.clone(),
        };
        Ok(serde_json::to_string_pretty(&file)?)
    }

    /// Score a feature vector: order, scale, run the forest
    pub fn score(&self, features: &FeatureVector) -> ForestScore {
        let ordered = features.ordered(&self.features);
        let scaled = self.scaler.transform(&ordered);
        self.forest.score(&scaled)
    }

    /// Features in the order the model expects
    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    /// Rolling window the model was trained with
    pub fn rolling_window(&self) -> usize {
        self.rolling_window
    }

    /// Score threshold recorded at training time
    pub fn score_threshold(&self) -> Option<f64> {
        self.score_threshold
    }

    /// Training metadata, if recorded
    pub fn training_stats(&self) -> Option<&TrainingStats> {
        self.training_stats.as_ref()
    }

    /// The forest
    pub fn forest(&self) -> &IsolationForest {
        &self.forest
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Two-feature artifact: one tree isolating low scaled water quickly.
    pub(crate) const SMALL_ARTIFACT: &str = r#"{
        "feature_names": ["water_level_cm", "gas_level"],
        "rolling_window": 5,
        "score_threshold": -0.1,
        "scaler": { "mean": [40.0, 400.0], "scale": [10.0, 100.0] },
        "forest": {
            "max_samples": 9,
            "offset": -0.5,
            "trees": [
                { "nodes": [
                    { "split": { "feature": 0, "threshold": -2.0, "left": 1, "right": 2 } },
                    { "leaf": { "size": 1 } },
                    { "leaf": { "size": 8 } }
                ] }
            ]
        },
        "training_stats": { "samples": 9, "anomalies_detected": 1, "precision": 0.9 }
    }"#;

    #[test]
    fn loads_valid_artifact() {
        let artifact = ModelArtifact::from_json(SMALL_ARTIFACT).unwrap();
        assert_eq!(artifact.features(), &[Feature::WaterLevel, Feature::GasLevel]);
        assert_eq!(artifact.rolling_window(), 5);
        assert_eq!(artifact.score_threshold(), Some(-0.1));
        let stats = artifact.training_stats().unwrap();
        assert_eq!(stats.samples, 9);
        assert_eq!(stats.precision, Some(0.9));
        assert_eq!(stats.recall, None);
    }

    #[test]
    fn scores_in_feature_order() {
        let artifact = ModelArtifact::from_json(SMALL_ARTIFACT).unwrap();
        let low = FeatureVector {
            water_level_cm: 5.0,
            gas_level: 400.0,
            ..FeatureVector::default()
        };
        let normal = FeatureVector {
            water_level_cm: 42.0,
            gas_level: 400.0,
            ..FeatureVector::default()
        };
        assert!(artifact.score(&low).is_anomaly());
        assert!(!artifact.score(&normal).is_anomaly());
    }

    #[test]
    fn rejects_unknown_feature() {
        let text = SMALL_ARTIFACT.replace("\"gas_level\"]", "\"humidity\"]");
        assert!(matches!(
            ModelArtifact::from_json(&text),
            Err(ModelError::UnknownFeature(name)) if name == "humidity"
        ));
    }

    #[test]
    fn rejects_zero_window() {
        let text = SMALL_ARTIFACT.replace("\"rolling_window\": 5", "\"rolling_window\": 0");
        assert!(matches!(ModelArtifact::from_json(&text), Err(ModelError::InvalidWindow)));
    }

    #[test]
    fn rejects_scaler_mismatch() {
        let text = SMALL_ARTIFACT.replace("[40.0, 400.0]", "[40.0]");
        assert!(matches!(
            ModelArtifact::from_json(&text),
            Err(ModelError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(ModelArtifact::from_json("not json"), Err(ModelError::Parse(_))));
        assert!(matches!(
            ModelArtifact::load("/nonexistent/model.json"),
            Err(ModelError::Io { .. })
        ));
    }

    #[test]
    fn json_round_trip_preserves_scoring() {
        let artifact = ModelArtifact::from_json(SMALL_ARTIFACT).unwrap();
        let again = ModelArtifact::from_json(&artifact.to_json().unwrap()).unwrap();
        assert_eq!(artifact, again);
    }
}
