//! Batch command handlers
//!
//! Inspects batches submitted by pipeline runs.

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::*;
use flightflow_client::Batch;
use flightflow_core::domain::batch::BatchId;
use flightflow_core::domain::job::BatchState;

use crate::config::Config;

/// Batch subcommands
#[derive(Subcommand)]
pub enum BatchCommands {
    /// Get batch state
    Get {
        /// Batch ID, e.g. flight-booking-batch-dev-1a2b3c4d
        batch_id: String,
    },
}

/// Handle batch commands
///
/// # Arguments
/// * `command` - The batch command to execute
/// * `config` - The CLI configuration
pub async fn handle_batch_command(command: BatchCommands, config: &Config) -> Result<()> {
    match command {
        BatchCommands::Get { batch_id } => get_batch(config, &batch_id).await,
    }
}

async fn get_batch(config: &Config, batch_id: &str) -> Result<()> {
    let batch_id = BatchId::parse(batch_id)?;
    let project_id = config.project_id()?;

    let batch = config
        .client()
        .get_batch(project_id, &config.region, &batch_id)
        .await
        .with_context(|| format!("Failed to get batch {}", batch_id))?;

    print_batch_details(&batch);
    Ok(())
}

/// Print detailed batch information
fn print_batch_details(batch: &Batch) {
    println!("{} {}", "Batch".bold(), batch.batch_id().bold());
    println!("  Name:    {}", batch.name.dimmed());
    println!("  State:   {}", colorize_state(batch.state));
    if let Some(message) = &batch.state_message {
        println!("  Message: {}", message);
    }
    if let Some(uuid) = &batch.uuid {
        println!("  UUID:    {}", uuid.dimmed());
    }
    if let Some(created) = &batch.create_time {
        println!("  Created: {}", created.dimmed());
    }
    if let Some(updated) = &batch.state_time {
        println!("  Updated: {}", updated.dimmed());
    }
}

/// Colorize batch state for display
fn colorize_state(state: BatchState) -> ColoredString {
    let label = state.to_string();
    match state {
        BatchState::Succeeded => label.green(),
        BatchState::Failed => label.red(),
        BatchState::Cancelled | BatchState::Cancelling => label.yellow(),
        BatchState::Pending | BatchState::Running => label.cyan(),
        BatchState::StateUnspecified => label.dimmed(),
    }
}
