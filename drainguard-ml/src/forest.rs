//! Isolation Forest scoring
//!
//! Combines the path lengths of every tree into one decision value:
//!
//! ```text
//! mean_path = average of tree.path_length(x)
//! s         = 2^(−mean_path / c(max_samples))     (0.5 ≈ normal, → 1 anomalous)
//! decision  = −s − offset                          (< 0 means anomalous)
//! ```
//!
//! `offset` is fixed at training time so that the expected share of
//! training samples falls below zero.

use serde::{Deserialize, Serialize};

use crate::node::c_factor;
use crate::tree::IsolationTree;
use crate::{ModelError, ModelResult};

/// Trained isolation forest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IsolationForest {
    /// Sub-sample size each tree was built from
    pub max_samples: usize,
    /// Decision offset fixed at training time
    pub offset: f64,
    /// Individual trees
    pub trees: Vec<IsolationTree>,
}

/// Scored sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForestScore {
    /// Decision value; more negative is more anomalous
    pub decision: f64,
    /// Anomaly score `s` in (0, 1]
    pub score: f64,
    /// Average path length across trees
    pub avg_path_length: f64,
}

impl ForestScore {
    /// Check if the decision marks the sample anomalous
    pub fn is_anomaly(&self) -> bool {
        self.decision < 0.0
    }
}

impl IsolationForest {
    /// Check structural invariants for `num_features` inputs
    pub fn validate(&self, num_features: usize) -> ModelResult<()> {
        if self.trees.is_empty() {
            return Err(ModelError::EmptyForest);
        }
        if self.max_samples < 2 {
            return Err(ModelError::InvalidTree {
                tree: 0,
                reason: format!("max_samples {} is below 2", self.max_samples),
            });
        }
        if !self.offset.is_finite() {
            return Err(ModelError::InvalidTree {
                tree: 0,
                reason: "offset is not finite".into(),
            });
        }
        for (index, tree) in self.trees.iter().enumerate() {
            tree.validate(index, num_features)?;
        }
        Ok(())
    }

    /// Score one (scaled) sample
    pub fn score(&self, sample: &[f64]) -> ForestScore {
        if self.trees.is_empty() {
            return ForestScore {
                decision: 0.0,
                score: 0.5,
                avg_path_length: 0.0,
            };
        }

        let total: f64 = self.trees.iter().map(|tree| tree.path_length(sample)).sum();
        let avg_path_length = total / self.trees.len() as f64;
        let score = calculate_anomaly_score(avg_path_length, self.max_samples);

        ForestScore {
            decision: -score - self.offset,
            score,
            avg_path_length,
        }
    }

    /// Get forest statistics
    pub fn stats(&self) -> ForestStats {
        ForestStats {
            num_trees: self.trees.len(),
            total_nodes: self.trees.iter().map(IsolationTree::node_count).sum(),
            max_depth: self.trees.iter().map(IsolationTree::depth).max().unwrap_or(0),
            max_samples: self.max_samples,
        }
    }
}

/// Calculate anomaly score from path lengths
///
/// Uses the formula: score = 2^(-E(h(x))/c(n))
/// where E(h(x)) is expected path length and c(n) is average path length
pub fn calculate_anomaly_score(avg_path_length: f64, num_samples: usize) -> f64 {
    let expected_path = c_factor(num_samples);
    if expected_path == 0.0 {
        return 0.5;
    }
    2.0_f64.powf(-avg_path_length / expected_path)
}

/// Forest statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForestStats {
    /// Number of trees
    pub num_trees: usize,
    /// Total nodes across all trees
    pub total_nodes: usize,
    /// Maximum tree depth
    pub max_depth: usize,
    /// Sub-sample size per tree
    pub max_samples: usize,
}
