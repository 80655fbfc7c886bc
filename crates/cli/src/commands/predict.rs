//! Churn prediction command

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;

use crate::client::{ApiClient, ApiError, ChurnRequest};
use crate::output::{color_probability, label_text, print_info, print_json, OutputFormat};

const FLAG_FIELDS: [&str; 8] = [
    "age",
    "listening_time",
    "songs_played_per_day",
    "skip_rate",
    "gender",
    "country",
    "subscription_type",
    "device_type",
];

/// Subscriber attributes, given as flags or as a JSON file
#[derive(Debug, Args)]
pub struct PredictArgs {
    /// Model key (lg, rf, gb, xgb)
    #[arg(long, short, default_value = "lg")]
    pub model: String,

    /// Read the request body from a JSON file
    #[arg(long, conflicts_with_all = FLAG_FIELDS)]
    pub from_file: Option<PathBuf>,

    #[arg(long, required_unless_present = "from_file")]
    pub age: Option<u32>,

    /// Minutes of listening
    #[arg(long, required_unless_present = "from_file")]
    pub listening_time: Option<u32>,

    #[arg(long, required_unless_present = "from_file")]
    pub songs_played_per_day: Option<u32>,

    /// Fraction of tracks skipped, between 0 and 1
    #[arg(long, required_unless_present = "from_file")]
    pub skip_rate: Option<f64>,

    #[arg(long, required_unless_present = "from_file", value_parser = ["Male", "Female", "Other"])]
    pub gender: Option<String>,

    #[arg(long, required_unless_present = "from_file")]
    pub country: Option<String>,

    #[arg(
        long,
        required_unless_present = "from_file",
        value_parser = ["Free", "Premium", "Family", "Student"]
    )]
    pub subscription_type: Option<String>,

    #[arg(
        long,
        required_unless_present = "from_file",
        value_parser = ["Mobile", "Desktop", "Web"]
    )]
    pub device_type: Option<String>,
}

impl PredictArgs {
    /// Assemble the request body from the file or the individual flags
    pub fn to_request(&self) -> Result<ChurnRequest> {
        if let Some(path) = &self.from_file {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            return serde_json::from_str(&raw)
                .with_context(|| format!("Invalid request JSON in {}", path.display()));
        }

        Ok(ChurnRequest {
            age: required(self.age, "age")?,
            listening_time: required(self.listening_time, "listening-time")?,
            songs_played_per_day: required(self.songs_played_per_day, "songs-played-per-day")?,
            skip_rate: required(self.skip_rate, "skip-rate")?,
            gender: required(self.gender.clone(), "gender")?,
            country: required(self.country.clone(), "country")?,
            subscription_type: required(self.subscription_type.clone(), "subscription-type")?,
            device_type: required(self.device_type.clone(), "device-type")?,
        })
    }
}

fn required<T>(value: Option<T>, flag: &str) -> Result<T> {
    value.with_context(|| format!("--{} is required without --from-file", flag))
}

/// Request a churn prediction and print the result
pub async fn predict(client: &ApiClient, args: &PredictArgs, format: OutputFormat) -> Result<()> {
    let request = args.to_request()?;

    let result = match client.predict(&request, &args.model).await {
        Ok(result) => result,
        Err(err) => {
            if let Some(ApiError {
                available_models: Some(models),
                ..
            }) = err.downcast_ref::<ApiError>()
            {
                print_info(&format!("Available models: {}", models.join(", ")));
            }
            return Err(err);
        }
    };

    match format {
        OutputFormat::Json => print_json(&result)?,
        OutputFormat::Table => {
            println!("{}", "Churn Prediction".bold());
            println!("{}", "=".repeat(40));
            println!("Model:          {}", args.model.to_lowercase().cyan());
            println!(
                "Probability:    {}",
                color_probability(result.churn_probability)
            );
            println!("Label:          {} ({})", result.churn_label, label_text(result.churn_label));
        }
    }

    Ok(())
}
