//! Isolation tree scoring
//!
//! Trees arrive fully built inside a model artifact; this module only walks
//! them. Validation at load time guarantees that every child index points
//! forward in the node array, so traversal always terminates.

use serde::{Deserialize, Serialize};

use crate::node::{c_factor, Node};
use crate::{ModelError, ModelResult};

/// Isolation tree in array representation (root at index 0)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IsolationTree {
    /// Tree nodes, parents before children
    pub nodes: Vec<Node>,
}

impl IsolationTree {
    /// Check structural invariants for a tree scored with `num_features` inputs
    pub fn validate(&self, index: usize, num_features: usize) -> ModelResult<()> {
        let invalid = |reason: String| ModelError::InvalidTree { tree: index, reason };

        if self.nodes.is_empty() {
            return Err(invalid("no nodes".into()));
        }

        for (i, node) in self.nodes.iter().enumerate() {
            if let Node::Split {
                feature,
                threshold,
                left,
                right,
            } = *node
            {
                if feature >= num_features {
                    return Err(invalid(format!(
                        "node {} splits on feature {} of {}",
                        i, feature, num_features
                    )));
                }
                if !threshold.is_finite() {
                    return Err(invalid(format!("node {} has a non-finite threshold", i)));
                }
                for child in [left, right] {
                    if child <= i || child >= self.nodes.len() {
                        return Err(invalid(format!("node {} has invalid child {}", i, child)));
                    }
                }
            }
        }
        Ok(())
    }

    /// Path length of `sample`: depth of the leaf reached plus `c(size)`
    pub fn path_length(&self, sample: &[f64]) -> f64 {
        let mut index = 0;
        let mut depth = 0usize;

        while let Some(node) = self.nodes.get(index) {
            match node.traverse(sample) {
                Some(child) => {
                    index = child;
                    depth += 1;
                }
                None => {
                    let size = match node {
                        Node::Leaf { size } => *size,
                        Node::Split { .. } => 1,
                    };
                    return depth as f64 + c_factor(size);
                }
            }
        }

        depth as f64
    }

    /// Number of nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Depth of the deepest leaf
    pub fn depth(&self) -> usize {
        let mut depths = vec![0usize; self.nodes.len()];
        let mut max_depth = 0;
        for (i, node) in self.nodes.iter().enumerate() {
            if let Node::Split { left, right, .. } = *node {
                let child_depth = depths[i] + 1;
                for child in [left, right] {
                    if let Some(slot) = depths.get_mut(child) {
                        *slot = child_depth;
                        max_depth = max_depth.max(child_depth);
                    }
                }
            }
        }
        max_depth
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Root splits feature 0 at 0.0; the left side isolates quickly, the
    /// right side holds most of the training data.
    pub(crate) fn stump() -> IsolationTree {
        IsolationTree {
            nodes: vec![
                Node::Split {
                    feature: 0,
                    threshold: 0.0,
                    left: 1,
                    right: 2,
                },
                Node::Leaf { size: 1 },
                Node::Leaf { size: 8 },
            ],
        }
    }

    #[test]
    fn path_lengths() {
        let tree = stump();
        assert_eq!(tree.path_length(&[-1.0]), 1.0);
        let expected = 1.0 + c_factor(8);
        assert!((tree.path_length(&[1.0]) - expected).abs() < 1e-12);
    }

    #[test]
    fn single_leaf_tree() {
        let tree = IsolationTree {
            nodes: vec![Node::Leaf { size: 2 }],
        };
        tree.validate(0, 1).unwrap();
        assert_eq!(tree.path_length(&[5.0]), 1.0);
        assert_eq!(tree.depth(), 0);
    }

    #[test]
    fn rejects_backward_child() {
        let tree = IsolationTree {
            nodes: vec![
                Node::Split {
                    feature: 0,
                    threshold: 0.0,
                    left: 0,
                    right: 1,
                },
                Node::Leaf { size: 1 },
            ],
        };
        assert!(matches!(tree.validate(3, 1), Err(ModelError::InvalidTree { tree: 3, .. })));
    }

    #[test]
    fn rejects_out_of_range_feature() {
        assert!(stump().validate(0, 1).is_ok());
        let mut tree = stump();
        tree.nodes[0] = Node::Split {
            feature: 4,
            threshold: 0.0,
            left: 1,
            right: 2,
        };
        assert!(tree.validate(0, 2).is_err());
    }

    #[test]
    fn depth_and_count() {
        assert_eq!(stump().node_count(), 3);
        assert_eq!(stump().depth(), 1);
    }
}
