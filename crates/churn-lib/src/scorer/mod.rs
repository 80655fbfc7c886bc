//! Scorer artifacts and estimator implementations

mod artifact;
mod encoding;
mod linear;
mod onnx;
mod trees;

pub use artifact::{load_artifact, EstimatorSpec, LoadedArtifact, ScorerArtifact, FORMAT_VERSION};
pub use encoding::{CategoryVocabulary, MinMaxRange, Preprocessing};
pub use linear::LogisticScorer;
pub use onnx::OnnxScorer;
pub use trees::{Aggregation, Tree, TreeEnsembleScorer, TreeNode};

use crate::models::FeatureVector;
use anyhow::Result;

/// A trained model mapping a feature vector to a churn probability
pub trait Scorer: Send + Sync {
    /// Probability of churn, expected in `[0, 1]`
    fn score(&self, features: &FeatureVector) -> Result<f64>;

    /// Estimator family, for reporting
    fn estimator(&self) -> &'static str;
}

pub(crate) fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}
