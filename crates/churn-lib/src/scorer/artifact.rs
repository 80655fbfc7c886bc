//! Scorer artifact format
//!
//! An artifact is a JSON document holding the trained preprocessing stage,
//! an estimator, and optionally the quantile thresholds the trainer used.

use super::encoding::Preprocessing;
use super::linear::LogisticScorer;
use super::onnx::OnnxScorer;
use super::trees::{Aggregation, Tree, TreeEnsembleScorer};
use super::Scorer;
use crate::models::QuantileSet;
use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Artifact format version understood by this build
pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EstimatorSpec {
    Logistic {
        coefficients: Vec<f64>,
        intercept: f64,
    },
    TreeEnsemble {
        aggregation: Aggregation,
        trees: Vec<Tree>,
    },
    Onnx {
        /// Graph file, relative paths resolve against the artifact's directory
        graph: PathBuf,
        /// Index of the probability output; defaults to the last output
        #[serde(default)]
        probability_output: Option<usize>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScorerArtifact {
    pub format_version: u32,
    pub preprocessing: Preprocessing,
    pub estimator: EstimatorSpec,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantiles: Option<QuantileSet>,
}

impl ScorerArtifact {
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let artifact: Self = serde_json::from_slice(bytes).context("Failed to parse scorer artifact")?;
        ensure!(
            artifact.format_version == FORMAT_VERSION,
            "unsupported artifact format version {} (expected {})",
            artifact.format_version,
            FORMAT_VERSION
        );
        Ok(artifact)
    }

    /// Build the scorer described by this artifact
    pub fn into_scorer(self, base_dir: &Path) -> Result<Box<dyn Scorer>> {
        let scorer: Box<dyn Scorer> = match self.estimator {
            EstimatorSpec::Logistic {
                coefficients,
                intercept,
            } => Box::new(LogisticScorer::new(self.preprocessing, coefficients, intercept)?),
            EstimatorSpec::TreeEnsemble { aggregation, trees } => {
                Box::new(TreeEnsembleScorer::new(self.preprocessing, aggregation, trees)?)
            }
            EstimatorSpec::Onnx {
                graph,
                probability_output,
            } => {
                let graph_path = base_dir.join(graph);
                let bytes = fs::read(&graph_path)
                    .with_context(|| format!("Failed to read ONNX graph {:?}", graph_path))?;
                Box::new(OnnxScorer::new(&bytes, self.preprocessing, probability_output)?)
            }
        };
        Ok(scorer)
    }
}

/// A scorer built from an artifact file, with provenance
pub struct LoadedArtifact {
    pub scorer: Box<dyn Scorer>,
    /// Hex SHA-256 of the artifact bytes
    pub checksum: String,
    pub quantiles: Option<QuantileSet>,
}

/// Read, verify and build the scorer stored at `path`
pub fn load_artifact(path: &Path) -> Result<LoadedArtifact> {
    let bytes = fs::read(path).with_context(|| format!("Failed to read artifact {:?}", path))?;
    let checksum = hex::encode(Sha256::digest(&bytes));

    let artifact = ScorerArtifact::from_slice(&bytes)?;
    let quantiles = artifact.quantiles;
    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    let scorer = artifact.into_scorer(base_dir)?;

    debug!(path = ?path, checksum = %checksum, estimator = scorer.estimator(), "Scorer artifact loaded");

    Ok(LoadedArtifact {
        scorer,
        checksum,
        quantiles,
    })
}
