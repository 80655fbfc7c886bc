//! Tree ensemble scorer
//!
//! Covers random forests (averaged leaf probabilities) and gradient boosted
//! trees (summed leaf margins passed through a sigmoid). Nodes are stored
//! flat with the root at index 0.

use super::encoding::Preprocessing;
use super::{sigmoid, Scorer};
use crate::models::FeatureVector;
use anyhow::{ensure, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum TreeNode {
    /// Goes left when `x[feature] <= threshold`
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

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    pub nodes: Vec<TreeNode>,
}

impl Tree {
    /// Children always follow their parent, so traversal terminates.
    fn validate(&self, width: usize) -> Result<()> {
        ensure!(!self.nodes.is_empty(), "tree has no nodes");
        for (idx, node) in self.nodes.iter().enumerate() {
            match *node {
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    ensure!(feature < width, "node {} splits on feature {} >= {}", idx, feature, width);
                    ensure!(!threshold.is_nan(), "node {} has NaN threshold", idx);
                    for child in [left, right] {
                        ensure!(
                            child > idx && child < self.nodes.len(),
                            "node {} has invalid child {}",
                            idx,
                            child
                        );
                    }
                }
                TreeNode::Leaf { value } => {
                    ensure!(value.is_finite(), "leaf {} has non-finite value", idx);
                }
            }
        }
        Ok(())
    }

    fn evaluate(&self, x: &[f64]) -> f64 {
        let mut idx = 0;
        loop {
            match self.nodes[idx] {
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if x[feature] <= threshold { left } else { right };
                }
                TreeNode::Leaf { value } => return value,
            }
        }
    }
}

fn default_learning_rate() -> f64 {
    1.0
}

/// How leaf values combine into a probability
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum Aggregation {
    /// Leaves hold class-1 probabilities; the ensemble averages them
    MeanProbability,
    /// Leaves hold margins; `sigmoid(base_score + learning_rate * sum)`
    LogitSum {
        #[serde(default)]
        base_score: f64,
        #[serde(default = "default_learning_rate")]
        learning_rate: f64,
    },
}

pub struct TreeEnsembleScorer {
    preprocessing: Preprocessing,
    aggregation: Aggregation,
    trees: Vec<Tree>,
}

impl TreeEnsembleScorer {
    pub fn new(preprocessing: Preprocessing, aggregation: Aggregation, trees: Vec<Tree>) -> Result<Self> {
        preprocessing.validate()?;
        ensure!(!trees.is_empty(), "tree ensemble has no trees");

        let width = preprocessing.width();
        for (i, tree) in trees.iter().enumerate() {
            tree.validate(width).map_err(|e| e.context(format!("tree {}", i)))?;
        }

        match aggregation {
            Aggregation::MeanProbability => {
                let leaves_in_range = trees.iter().flat_map(|t| &t.nodes).all(|n| match n {
                    TreeNode::Leaf { value } => (0.0..=1.0).contains(value),
                    TreeNode::Split { .. } => true,
                });
                ensure!(leaves_in_range, "mean_probability leaves must lie in [0, 1]");
            }
            Aggregation::LogitSum {
                base_score,
                learning_rate,
            } => {
                ensure!(
                    base_score.is_finite() && learning_rate.is_finite(),
                    "logit_sum parameters must be finite"
                );
            }
        }

        Ok(Self {
            preprocessing,
            aggregation,
            trees,
        })
    }
}

impl Scorer for TreeEnsembleScorer {
    fn score(&self, features: &FeatureVector) -> Result<f64> {
        let x = self.preprocessing.encode(features);
        let total: f64 = self.trees.iter().map(|t| t.evaluate(&x)).sum();

        let probability = match self.aggregation {
            Aggregation::MeanProbability => total / self.trees.len() as f64,
            Aggregation::LogitSum {
                base_score,
                learning_rate,
            } => sigmoid(base_score + learning_rate * total),
        };
        Ok(probability)
    }

    fn estimator(&self) -> &'static str {
        "tree_ensemble"
    }
}
