//! Server configuration

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;

/// Optional configuration file looked up in the working directory
pub const CONFIG_FILE: &str = "churn-server";

/// Prefix of configuration environment variables, e.g. `CHURN_PORT`
pub const ENV_PREFIX: &str = "CHURN";

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Instance name attached to structured log events
    #[serde(default = "default_instance_name")]
    pub instance_name: String,

    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Reference dataset the quantile thresholds are computed from
    #[serde(default = "default_dataset_path")]
    pub dataset_path: PathBuf,

    /// Directory holding `churn_model_<KEY>.json` artifacts
    #[serde(default = "default_artifacts_dir")]
    pub artifacts_dir: PathBuf,
}

fn default_instance_name() -> String {
    std::env::var("HOSTNAME").unwrap_or_else(|_| "churn-server".to_string())
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_dataset_path() -> PathBuf {
    PathBuf::from("data/raw/spotify_churn_dataset.csv")
}

fn default_artifacts_dir() -> PathBuf {
    PathBuf::from("artifacts")
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            instance_name: default_instance_name(),
            bind_address: default_bind_address(),
            port: default_port(),
            dataset_path: default_dataset_path(),
            artifacts_dir: default_artifacts_dir(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from `churn-server.toml` (if present) and the environment
    pub fn load() -> Result<Self> {
        Self::load_with(config::File::with_name(CONFIG_FILE).required(false))
    }

    /// Load from the given file source, overridden by the environment
    pub fn load_with<S>(file: S) -> Result<Self>
    where
        S: config::Source + Send + Sync + 'static,
    {
        let config = config::Config::builder()
            .add_source(file)
            .add_source(config::Environment::with_prefix(ENV_PREFIX))
            .build()
            .context("Failed to read configuration")?;

        config.try_deserialize().context("Invalid configuration")
    }

    /// Socket address to listen on
    pub fn addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.port, 8000);
        assert_eq!(config.addr(), "0.0.0.0:8000");
        assert_eq!(config.artifacts_dir, PathBuf::from("artifacts"));
    }

    #[test]
    fn test_file_values_override_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "port = 9100").unwrap();
        writeln!(file, "artifacts_dir = \"/srv/churn/artifacts\"").unwrap();
        file.flush().unwrap();

        let config = ServerConfig::load_with(config::File::from(file.path())).unwrap();
        assert_eq!(config.port, 9100);
        assert_eq!(config.artifacts_dir, PathBuf::from("/srv/churn/artifacts"));
        assert_eq!(config.bind_address, "0.0.0.0");
    }

    #[test]
    fn test_invalid_value_is_an_error() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "port = \"not a port\"").unwrap();
        file.flush().unwrap();

        assert!(ServerConfig::load_with(config::File::from(file.path())).is_err());
    }
}
