//! Flightflow CLI
//!
//! Operator tooling for the flight booking pipeline: preview a run's job
//! specification, check for the day's source file, and inspect batches.

mod commands;
mod config;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, handle_command};
use config::Config;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "flightflow")]
#[command(about = "Flight booking pipeline CLI", long_about = None)]
struct Cli {
    /// Project that owns the batch workloads
    #[arg(long, env = "GCP_PROJECT_ID")]
    project_id: Option<String>,

    /// Region the batches run in
    #[arg(long, env = "GCP_REGION", default_value = "us-central1")]
    region: String,

    /// Object store endpoint
    #[arg(
        long,
        env = "STORAGE_API_URL",
        default_value = flightflow_client::DEFAULT_STORAGE_URL
    )]
    storage_url: String,

    /// Batch API endpoint
    #[arg(
        long,
        env = "BATCH_API_URL",
        default_value = flightflow_client::DEFAULT_BATCH_URL
    )]
    batch_url: String,

    /// Bearer token for both APIs
    #[arg(long, env = "GOOGLE_OAUTH_ACCESS_TOKEN", hide_env_values = true)]
    access_token: Option<String>,

    /// JSON document of pipeline variables (defaults to FLIGHTFLOW_VAR_* environment)
    #[arg(long, env = "VARIABLES_FILE")]
    variables_file: Option<PathBuf>,

    /// Folder holding the source files and the job artifact
    #[arg(long, env = "OBJECT_PREFIX", default_value = "airflow-project")]
    object_prefix: String,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config {
        project_id: cli.project_id,
        region: cli.region,
        storage_url: cli.storage_url,
        batch_url: cli.batch_url,
        access_token: cli.access_token,
        variables_file: cli.variables_file,
        object_prefix: cli.object_prefix,
    };

    handle_command(cli.command, &config).await
}
