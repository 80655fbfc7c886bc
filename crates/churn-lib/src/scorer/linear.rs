//! Logistic regression scorer

use super::encoding::Preprocessing;
use super::{sigmoid, Scorer};
use crate::models::FeatureVector;
use anyhow::{ensure, Result};

pub struct LogisticScorer {
    preprocessing: Preprocessing,
    coefficients: Vec<f64>,
    intercept: f64,
}

impl LogisticScorer {
    pub fn new(preprocessing: Preprocessing, coefficients: Vec<f64>, intercept: f64) -> Result<Self> {
        preprocessing.validate()?;
        ensure!(
            coefficients.len() == preprocessing.width(),
            "logistic model has {} coefficients, encoded width is {}",
            coefficients.len(),
            preprocessing.width()
        );
        ensure!(
            intercept.is_finite() && coefficients.iter().all(|c| c.is_finite()),
            "logistic model has non-finite weights"
        );
        Ok(Self {
            preprocessing,
            coefficients,
            intercept,
        })
    }
}

impl Scorer for LogisticScorer {
    fn score(&self, features: &FeatureVector) -> Result<f64> {
        let encoded = self.preprocessing.encode(features);
        let z = self.intercept
            + encoded
                .iter()
                .zip(&self.coefficients)
                .map(|(x, w)| x * w)
                .sum::<f64>();
        Ok(sigmoid(z))
    }

    fn estimator(&self) -> &'static str {
        "logistic"
    }
}
