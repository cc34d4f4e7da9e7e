//! Estimators that can be exported from the training pipeline as JSON.
//!
//! Both kinds produce a positive-class probability; thresholding happens in
//! the caller.

use serde::{Deserialize, Serialize};

use super::ModelError;
use crate::domain::MARKER_COUNT;

/// The trained estimator, tagged by `kind`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Estimator {
    /// `p = sigmoid(intercept + coefficients . x)`
    Logistic {
        coefficients: Vec<f64>,
        intercept: f64,
    },
    /// Mean of per-tree leaf probabilities (random forest style)
    TreeEnsemble { trees: Vec<Tree> },
}

/// One decision tree as a flat node array rooted at index 0.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tree {
    pub nodes: Vec<TreeNode>,
}

/// A tree node. Splits send `x[feature] <= threshold` left.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TreeNode {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: f64,
    },
}

impl Tree {
    /// Check the node array is a well-formed tree.
    ///
    /// Children must point strictly forward, which rules out cycles and
    /// guarantees every walk ends at a leaf.
    fn validate(&self, tree_idx: usize) -> Result<(), ModelError> {
        if self.nodes.is_empty() {
            return Err(ModelError::Format(format!("tree {tree_idx} has no nodes")));
        }
        let len = self.nodes.len();
        for (idx, node) in self.nodes.iter().enumerate() {
            match *node {
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    if feature >= MARKER_COUNT {
                        return Err(ModelError::Format(format!(
                            "tree {tree_idx} node {idx}: feature {feature} out of range"
                        )));
                    }
                    if !threshold.is_finite() {
                        return Err(ModelError::Format(format!(
                            "tree {tree_idx} node {idx}: threshold is not finite"
                        )));
                    }
                    for child in [left, right] {
                        if child <= idx || child >= len {
                            return Err(ModelError::Format(format!(
                                "tree {tree_idx} node {idx}: child {child} must point forward inside the tree"
                            )));
                        }
                    }
                }
                TreeNode::Leaf { value } => {
                    if !(0.0..=1.0).contains(&value) {
                        return Err(ModelError::Format(format!(
                            "tree {tree_idx} node {idx}: leaf probability {value} outside [0, 1]"
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    fn leaf_probability(&self, x: &[f64; MARKER_COUNT]) -> Option<f64> {
        let mut idx = 0;
        loop {
            match *self.nodes.get(idx)? {
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if *x.get(feature)? <= threshold { left } else { right };
                }
                TreeNode::Leaf { value } => return Some(value),
            }
        }
    }
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

impl Estimator {
    pub(super) fn validate(&self) -> Result<(), ModelError> {
        match self {
            Self::Logistic {
                coefficients,
                intercept,
            } => {
                if coefficients.len() != MARKER_COUNT {
                    return Err(ModelError::Format(format!(
                        "logistic model has {} coefficients, expected {MARKER_COUNT}",
                        coefficients.len()
                    )));
                }
                if !intercept.is_finite() || coefficients.iter().any(|c| !c.is_finite()) {
                    return Err(ModelError::Format(
                        "logistic parameters must be finite".into(),
                    ));
                }
            }
            Self::TreeEnsemble { trees } => {
                if trees.is_empty() {
                    return Err(ModelError::Format("tree ensemble has no trees".into()));
                }
                for (i, tree) in trees.iter().enumerate() {
                    tree.validate(i)?;
                }
            }
        }
        Ok(())
    }

    /// Positive-class probability for one encoded row.
    pub(super) fn probability(&self, x: &[f64; MARKER_COUNT]) -> Option<f64> {
        match self {
            Self::Logistic {
                coefficients,
                intercept,
            } => {
                let z = coefficients
                    .iter()
                    .zip(x)
                    .fold(*intercept, |acc, (c, v)| acc + c * v);
                Some(sigmoid(z))
            }
            Self::TreeEnsemble { trees } => {
                let mut sum = 0.0;
                for tree in trees {
                    sum += tree.leaf_probability(x)?;
                }
                Some(sum / trees.len() as f64)
            }
        }
    }

    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Logistic { .. } => "logistic regression".to_string(),
            Self::TreeEnsemble { trees } => format!("tree ensemble ({} trees)", trees.len()),
        }
    }
}
