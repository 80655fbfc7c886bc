//! ONNX estimators run with tract
//!
//! The graph receives the already-encoded `[1, width]` f32 tensor, so it
//! must be exported without its own preprocessing and without a ZipMap on
//! the probability output.

use super::encoding::Preprocessing;
use super::Scorer;
use crate::models::FeatureVector;
use anyhow::{bail, Context, Result};
use std::time::Instant;
use tract_onnx::prelude::*;
use tracing::warn;

/// Inference latency above which a warning is logged
const MAX_INFERENCE_MS: u128 = 5;

type TractModel = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

pub struct OnnxScorer {
    model: TractModel,
    preprocessing: Preprocessing,
    probability_output: Option<usize>,
}

impl OnnxScorer {
    /// Create a scorer from ONNX model bytes
    pub fn new(
        model_bytes: &[u8],
        preprocessing: Preprocessing,
        probability_output: Option<usize>,
    ) -> Result<Self> {
        preprocessing.validate()?;
        let model = Self::load_model(model_bytes, preprocessing.width())?;

        let outputs = model.model().outputs.len();
        if let Some(index) = probability_output {
            if index >= outputs {
                bail!(
                    "probability_output {} out of range, graph has {} outputs",
                    index,
                    outputs
                );
            }
        }

        Ok(Self {
            model,
            preprocessing,
            probability_output,
        })
    }

    /// Load and optimize an ONNX model from bytes
    fn load_model(model_bytes: &[u8], width: usize) -> Result<TractModel> {
        let model = tract_onnx::onnx()
            .model_for_read(&mut std::io::Cursor::new(model_bytes))
            .context("Failed to parse ONNX model")?
            .with_input_fact(0, f32::fact([1, width]).into())
            .context("Failed to set input shape")?
            .into_optimized()
            .context("Failed to optimize model")?
            .into_runnable()
            .context("Failed to create runnable model")?;
        Ok(model)
    }

    fn features_to_tensor(&self, features: &FeatureVector) -> Result<Tensor> {
        let data: Vec<f32> = self
            .preprocessing
            .encode(features)
            .into_iter()
            .map(|v| v as f32)
            .collect();
        let width = data.len();
        let array = tract_ndarray::Array2::from_shape_vec((1, width), data)
            .context("Failed to shape input tensor")?;
        Ok(array.into())
    }

    /// Class-1 probability from a `[1, 2]` tensor, or the single value of a `[1]`/`[1, 1]` tensor
    fn tensor_to_probability(output: &Tensor) -> Result<f64> {
        let view = output.to_array_view::<f32>()?;
        let values: Vec<f32> = view.iter().copied().collect();
        match values.len() {
            1 => Ok(values[0] as f64),
            2 => Ok(values[1] as f64),
            n => bail!("Model probability output has {} values, expected 1 or 2", n),
        }
    }
}

impl Scorer for OnnxScorer {
    fn score(&self, features: &FeatureVector) -> Result<f64> {
        let start = Instant::now();
        let input = self.features_to_tensor(features)?;

        let result = self.model.run(tvec!(input.into()))?;
        let index = self
            .probability_output
            .unwrap_or_else(|| result.len().saturating_sub(1));
        let output = result.get(index).context("No probability output from model")?;

        let elapsed = start.elapsed();
        if elapsed.as_millis() > MAX_INFERENCE_MS {
            warn!(elapsed_ms = elapsed.as_millis(), "Inference exceeded {}ms target", MAX_INFERENCE_MS);
        }

        Self::tensor_to_probability(output)
    }

    fn estimator(&self) -> &'static str {
        "onnx"
    }
}
