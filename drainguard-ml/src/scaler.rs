//! Standard scaler fitted on the training features

use serde::{Deserialize, Serialize};

use crate::{ModelError, ModelResult};

/// Per-feature standardization: `(x - mean) / scale`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    /// Training mean of each feature
    pub mean: Vec<f64>,
    /// Training standard deviation of each feature
    pub scale: Vec<f64>,
}

impl StandardScaler {
    /// Check the scaler against the expected feature count
    pub fn validate(&self, num_features: usize) -> ModelResult<()> {
        for (what, values) in [("scaler mean", &self.mean), ("scaler scale", &self.scale)] {
            if values.len() != num_features {
                return Err(ModelError::DimensionMismatch {
                    what,
                    expected: num_features,
                    actual: values.len(),
                });
            }
            if values.iter().any(|v| !v.is_finite()) {
                return Err(ModelError::InvalidScaler(what));
            }
        }
        Ok(())
    }

    /// Scale a feature vector. A zero scale leaves the centred value as is.
    pub fn transform(&self, features: &[f64]) -> Vec<f64> {
        features
            .iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(x, (mean, scale))| {
                let scale = if *scale == 0.0 { 1.0 } else { *scale };
                (x - mean) / scale
            })
            .collect()
    }
}
