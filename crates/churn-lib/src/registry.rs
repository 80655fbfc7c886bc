//! Model registry
//!
//! Scorers are loaded once at startup into a map keyed by a closed set of
//! model identifiers. After startup the registry is only read.

use crate::error::{ChurnError, Result};
use crate::models::QuantileSet;
use crate::scorer::{load_artifact, Scorer};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info};

/// Identifier of a servable model
///
/// Ordering follows declaration order, which is also the order keys are
/// reported in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelKey {
    /// Logistic regression
    Lg,
    /// Random forest
    Rf,
    /// Gradient boosting
    Gb,
    /// XGBoost
    Xgb,
}

impl ModelKey {
    pub const ALL: [ModelKey; 4] = [ModelKey::Lg, ModelKey::Rf, ModelKey::Gb, ModelKey::Xgb];

    /// Model served when a request names none
    pub const DEFAULT: ModelKey = ModelKey::Lg;

    pub fn as_str(&self) -> &'static str {
        match self {
            ModelKey::Lg => "lg",
            ModelKey::Rf => "rf",
            ModelKey::Gb => "gb",
            ModelKey::Xgb => "xgb",
        }
    }

    /// Whether startup must fail without this model
    pub fn is_required(&self) -> bool {
        !matches!(self, ModelKey::Xgb)
    }

    /// Standard artifact file name, e.g. `churn_model_LG.json`
    pub fn artifact_file_name(&self) -> String {
        format!("churn_model_{}.json", self.as_str().to_uppercase())
    }
}

impl fmt::Display for ModelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for strings outside the closed key set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownModelKey(pub String);

impl fmt::Display for UnknownModelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown model key '{}'", self.0)
    }
}

impl std::error::Error for UnknownModelKey {}

impl FromStr for ModelKey {
    type Err = UnknownModelKey;

    /// Case-insensitive
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let lower = s.to_ascii_lowercase();
        ModelKey::ALL
            .into_iter()
            .find(|k| k.as_str() == lower)
            .ok_or_else(|| UnknownModelKey(s.to_string()))
    }
}

/// A loaded scorer and its provenance
pub struct ModelHandle {
    key: ModelKey,
    scorer: Box<dyn Scorer>,
    source: Option<PathBuf>,
    checksum: Option<String>,
    quantiles: Option<QuantileSet>,
}

impl ModelHandle {
    pub fn key(&self) -> ModelKey {
        self.key
    }

    pub fn scorer(&self) -> &dyn Scorer {
        self.scorer.as_ref()
    }

    pub fn estimator(&self) -> &'static str {
        self.scorer.estimator()
    }

    /// Artifact the scorer was loaded from
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Hex SHA-256 of the artifact
    pub fn checksum(&self) -> Option<&str> {
        self.checksum.as_deref()
    }

    /// Quantile thresholds persisted by the trainer, if any
    pub fn training_quantiles(&self) -> Option<&QuantileSet> {
        self.quantiles.as_ref()
    }
}

impl fmt::Debug for ModelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelHandle")
            .field("key", &self.key)
            .field("estimator", &self.estimator())
            .field("source", &self.source)
            .field("checksum", &self.checksum)
            .finish()
    }
}

/// Outcome of a single registry load
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded,
    /// Optional artifact absent; key left out of the registry
    Skipped,
}

/// Registry of loaded scorers
#[derive(Debug, Default)]
pub struct ModelRegistry {
    models: BTreeMap<ModelKey, ModelHandle>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the standard layout: `churn_model_<KEY>.json` for every key.
    ///
    /// Required keys must be present; optional keys are skipped when their
    /// artifact does not exist.
    pub fn load_directory(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let mut registry = Self::new();
        for key in ModelKey::ALL {
            let path = dir.join(key.artifact_file_name());
            registry.load(key, &path, key.is_required())?;
        }
        info!(
            dir = ?dir,
            models = ?registry.available_keys(),
            "Model registry initialized"
        );
        Ok(registry)
    }

    /// Load one artifact into the registry.
    ///
    /// A missing artifact is fatal only when `required`; an artifact that
    /// exists but fails to load is always fatal.
    pub fn load(&mut self, key: ModelKey, path: impl AsRef<Path>, required: bool) -> Result<LoadOutcome> {
        let path = path.as_ref();
        let unavailable = |reason: String| ChurnError::ModelUnavailable {
            key: key.to_string(),
            path: path.to_path_buf(),
            reason,
        };

        if !path.exists() {
            if required {
                return Err(unavailable("artifact not found".to_string()));
            }
            debug!(model = %key, path = ?path, "Optional model artifact absent, skipping");
            return Ok(LoadOutcome::Skipped);
        }

        let loaded = load_artifact(path).map_err(|e| unavailable(format!("{:#}", e)))?;
        self.models.insert(
            key,
            ModelHandle {
                key,
                scorer: loaded.scorer,
                source: Some(path.to_path_buf()),
                checksum: Some(loaded.checksum),
                quantiles: loaded.quantiles,
            },
        );
        Ok(LoadOutcome::Loaded)
    }

    /// Register an in-memory scorer under `key`
    pub fn with_scorer(mut self, key: ModelKey, scorer: Box<dyn Scorer>) -> Self {
        self.models.insert(
            key,
            ModelHandle {
                key,
                scorer,
                source: None,
                checksum: None,
                quantiles: None,
            },
        );
        self
    }

    /// Case-insensitive lookup; `None` for unknown or unloaded keys
    pub fn get(&self, name: &str) -> Option<&ModelHandle> {
        let key = name.parse::<ModelKey>().ok()?;
        self.models.get(&key)
    }

    /// Keys of the models that loaded, in canonical order
    pub fn available_keys(&self) -> Vec<&'static str> {
        self.models.keys().map(ModelKey::as_str).collect()
    }

    pub fn handles(&self) -> impl Iterator<Item = &ModelHandle> {
        self.models.values()
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}
