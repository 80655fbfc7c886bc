//! Server health command

use anyhow::Result;

use crate::client::ApiClient;
use crate::output::{color_status, print_json, print_success, OutputFormat};

/// Show server liveness
pub async fn show_health(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let health = client.health().await?;

    match format {
        OutputFormat::Json => print_json(&health)?,
        OutputFormat::Table if health.status == "ok" => print_success("Server is healthy"),
        OutputFormat::Table => println!("Status: {}", color_status(&health.status)),
    }

    Ok(())
}
