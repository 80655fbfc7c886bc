//! Loaded model listing

use anyhow::Result;
use colored::Colorize;
use tabled::Tabled;

use crate::client::{ApiClient, ModelSummary};
use crate::output::{print_json, print_table, OutputFormat};

/// Row for models table
#[derive(Tabled)]
struct ModelRow {
    #[tabled(rename = "Key")]
    key: String,
    #[tabled(rename = "Estimator")]
    estimator: String,
    #[tabled(rename = "Required")]
    required: String,
    #[tabled(rename = "Checksum")]
    checksum: String,
}

impl ModelRow {
    fn new(model: &ModelSummary, default: &str) -> Self {
        let key = if model.key == default {
            format!("{} (default)", model.key).bold().to_string()
        } else {
            model.key.clone()
        };
        Self {
            key,
            estimator: model.estimator.clone(),
            required: if model.required { "yes" } else { "no" }.to_string(),
            checksum: model
                .checksum
                .as_deref()
                .map(short_checksum)
                .unwrap_or_else(|| "-".to_string()),
        }
    }
}

fn short_checksum(checksum: &str) -> String {
    checksum.chars().take(12).collect()
}

/// List models loaded by the server
pub async fn list_models(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let response = client.models().await?;

    match format {
        OutputFormat::Json => print_json(&response)?,
        OutputFormat::Table => {
            let rows: Vec<ModelRow> = response
                .models
                .iter()
                .map(|m| ModelRow::new(m, &response.default))
                .collect();
            print_table(&rows);
        }
    }

    Ok(())
}
