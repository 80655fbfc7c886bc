//! One-time initialization run before the listener is bound

use crate::config::ServerConfig;
use anyhow::{Context, Result};
use churn_lib::{InferenceService, ModelKey, ModelRegistry, QuantileStore, ServiceMetrics, StructuredLogger};

/// Compute quantiles and load every scorer artifact.
///
/// Any error here must abort the process before traffic is accepted.
pub fn initialize(
    config: &ServerConfig,
    logger: &StructuredLogger,
    metrics: &ServiceMetrics,
) -> Result<InferenceService> {
    let quantiles = QuantileStore::initialize(&config.dataset_path)
        .context("Failed to compute reference quantiles")?;
    logger.log_quantiles(&config.dataset_path, quantiles.rows(), quantiles.get());

    let registry = ModelRegistry::load_directory(&config.artifacts_dir)
        .context("Failed to load scorer artifacts")?;

    for key in ModelKey::ALL {
        match registry.get(key.as_str()) {
            Some(handle) => {
                let checksum = handle.checksum().unwrap_or_default();
                logger.log_model_loaded(key.as_str(), handle.estimator(), checksum);
                metrics.set_model_info(key.as_str(), handle.estimator(), checksum);
            }
            None => logger.log_model_skipped(key.as_str()),
        }
    }
    metrics.set_models_loaded(registry.len() as i64);

    let service = InferenceService::new(quantiles, registry);
    for skew in service.quantile_skew() {
        logger.log_quantile_skew(skew.key.as_str(), &skew.training, &skew.serving);
    }

    Ok(service)
}
