//! Student Outcome Predictor CLI
//!
//! A command-line client for the predictor service: submit a student
//! record for a prediction, print an input template, and check server
//! health.

mod client;
mod commands;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{predict, status};

/// Student Outcome Predictor CLI
#[derive(Parser)]
#[command(name = "sdp")]
#[command(author, version, about = "CLI for the Student Outcome Predictor", long_about = None)]
pub struct Cli {
    /// Server URL (can also be set via SDP_SERVER_URL env var)
    #[arg(long, env = "SDP_SERVER_URL", default_value = "http://localhost:8080")]
    pub server_url: String,

    /// Output format
    #[arg(long, short, default_value = "table")]
    pub format: output::OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Predict the outcome for one student record
    Predict {
        /// Path to a JSON file with the student fields ("-" for stdin)
        #[arg(long, short)]
        input: String,
    },

    /// Print a fillable student record template
    Sample,

    /// Show server component health
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize client
    let client = client::ApiClient::new(&cli.server_url)?;

    // Execute command
    match cli.command {
        Commands::Predict { input } => predict::predict(&client, &input, cli.format).await?,
        Commands::Sample => predict::sample()?,
        Commands::Status => status::status(&client, cli.format).await?,
    }

    Ok(())
}
