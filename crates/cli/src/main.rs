//! Churn prediction CLI
//!
//! A command-line tool for checking the churn server and requesting
//! predictions from it.

mod client;
mod commands;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{health, models, predict};

/// Churn prediction CLI
#[derive(Parser)]
#[command(name = "churnctl")]
#[command(author, version, about = "CLI for the churn prediction server", long_about = None)]
pub struct Cli {
    /// API endpoint URL (can also be set via CHURN_API_URL env var)
    #[arg(long, env = "CHURN_API_URL", default_value = "http://localhost:8000")]
    pub api_url: String,

    /// Output format
    #[arg(long, short, default_value = "table")]
    pub format: output::OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Check server liveness
    Health,

    /// List models loaded by the server
    Models,

    /// Predict churn for a subscriber
    Predict(predict::PredictArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let client = client::ApiClient::new(&cli.api_url)?;

    match cli.command {
        Commands::Health => health::show_health(&client, cli.format).await?,
        Commands::Models => models::list_models(&client, cli.format).await?,
        Commands::Predict(args) => predict::predict(&client, &args, cli.format).await?,
    }

    Ok(())
}
