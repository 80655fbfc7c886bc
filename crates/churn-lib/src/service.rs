//! Inference service
//!
//! Resolves the requested model, builds features against the frozen
//! quantile thresholds, scores and labels. Holds no mutable state, so one
//! instance can be shared by any number of concurrent callers.

use crate::error::{ChurnError, Result};
use crate::features::FeatureBuilder;
use crate::models::{ChurnRequest, PredictionResult, QuantileSet};
use crate::quantiles::QuantileStore;
use crate::registry::{ModelHandle, ModelKey, ModelRegistry};

/// Relative tolerance when comparing persisted and computed thresholds
const SKEW_TOLERANCE: f64 = 1e-9;

/// A model whose training-time thresholds differ from the serving ones
#[derive(Debug, Clone, PartialEq)]
pub struct QuantileSkew {
    pub key: ModelKey,
    pub training: QuantileSet,
    pub serving: QuantileSet,
}

pub struct InferenceService {
    quantiles: QuantileStore,
    registry: ModelRegistry,
}

impl InferenceService {
    pub fn new(quantiles: QuantileStore, registry: ModelRegistry) -> Self {
        Self {
            quantiles,
            registry,
        }
    }

    pub fn quantiles(&self) -> &QuantileSet {
        self.quantiles.get()
    }

    pub fn quantile_store(&self) -> &QuantileStore {
        &self.quantiles
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    pub fn available_keys(&self) -> Vec<String> {
        self.registry
            .available_keys()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    /// Resolve a model name, failing with the list of loaded keys
    pub fn resolve(&self, model_key: &str) -> Result<&ModelHandle> {
        self.registry
            .get(model_key)
            .ok_or_else(|| ChurnError::InvalidModelType {
                requested: model_key.to_string(),
                available: self.available_keys(),
            })
    }

    /// Score a validated request with the named model
    pub fn predict(&self, request: &ChurnRequest, model_key: &str) -> Result<PredictionResult> {
        let handle = self.resolve(model_key)?;
        let features = FeatureBuilder::build(request, self.quantiles.get());

        let scoring_failed = |reason: String| ChurnError::ScoringFailed {
            key: handle.key().to_string(),
            reason,
        };
        let probability = handle
            .scorer()
            .score(&features)
            .map_err(|e| scoring_failed(format!("{:#}", e)))?;

        if !(0.0..=1.0).contains(&probability) {
            return Err(scoring_failed(format!("probability {} outside [0, 1]", probability)));
        }

        Ok(PredictionResult::from_probability(probability))
    }

    /// Models whose persisted training thresholds disagree with the serving ones
    pub fn quantile_skew(&self) -> Vec<QuantileSkew> {
        let serving = *self.quantiles.get();
        self.registry
            .handles()
            .filter_map(|handle| {
                let training = *handle.training_quantiles()?;
                (!quantiles_match(&training, &serving)).then_some(QuantileSkew {
                    key: handle.key(),
                    training,
                    serving,
                })
            })
            .collect()
    }
}

fn quantiles_match(a: &QuantileSet, b: &QuantileSet) -> bool {
    let close = |x: f64, y: f64| (x - y).abs() <= SKEW_TOLERANCE * x.abs().max(y.abs()).max(1.0);
    close(a.skip_rate_q75, b.skip_rate_q75)
        && close(a.listening_time_q25, b.listening_time_q25)
        && close(a.age_q70, b.age_q70)
}
