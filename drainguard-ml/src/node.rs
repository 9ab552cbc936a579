//! Isolation tree node representation
//!
//! Nodes are stored in a flat array per tree, children always after their
//! parent. The serialized form is externally tagged:
//!
//! ```json
//! {"split": {"feature": 0, "threshold": -0.42, "left": 1, "right": 2}}
//! {"leaf": {"size": 3}}
//! ```

use serde::{Deserialize, Serialize};

/// Node in an isolation tree
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Node {
    /// Internal node with split condition
    Split {
        /// Feature index to split on
        feature: usize,
        /// Samples with `x[feature] <= threshold` go left
        threshold: f64,
        /// Left child index
        left: usize,
        /// Right child index
        right: usize,
    },
    /// Leaf node (external)
    Leaf {
        /// Number of training samples that reached this leaf
        size: usize,
    },
}

impl Node {
    /// Check if node is a leaf
    pub fn is_leaf(&self) -> bool {
        matches!(self, Node::Leaf { .. })
    }

    /// Child index to visit next, `None` at a leaf.
    ///
    /// A missing feature value sends the sample right, like a NaN would.
    pub fn traverse(&self, sample: &[f64]) -> Option<usize> {
        match *self {
            Node::Split {
                feature,
                threshold,
                left,
                right,
            } => match sample.get(feature) {
                Some(value) if *value <= threshold => Some(left),
                _ => Some(right),
            },
            Node::Leaf { .. } => None,
        }
    }
}

/// Average path length of an unsuccessful search in a binary search tree
/// built from `n` samples.
///
/// `c(n) = 2·H(n−1) − 2(n−1)/n`, with `c(1) = 0` and `c(2) = 1`.
pub fn c_factor(n: usize) -> f64 {
    match n {
        0 | 1 => 0.0,
        2 => 1.0,
        _ => {
            let n = n as f64;
            2.0 * harmonic_approx(n - 1.0) - 2.0 * (n - 1.0) / n
        }
    }
}

/// Harmonic number approximation: ln(i) + Euler's constant
fn harmonic_approx(i: f64) -> f64 {
    const EULER: f64 = 0.5772156649;
    i.ln() + EULER
}
