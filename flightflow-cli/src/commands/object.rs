//! Object command handlers
//!
//! One-shot existence check of the run's trigger object.

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::*;
use flightflow_core::domain::context::EnvironmentContext;
use flightflow_core::domain::trigger::TriggerCondition;

use crate::config::Config;

/// Object subcommands
#[derive(Subcommand)]
pub enum ObjectCommands {
    /// Check once whether the trigger object exists
    Check,
}

/// Handle object commands
///
/// # Arguments
/// * `command` - The object command to execute
/// * `config` - The CLI configuration
pub async fn handle_object_command(command: ObjectCommands, config: &Config) -> Result<()> {
    match command {
        ObjectCommands::Check => check_object(config).await,
    }
}

async fn check_object(config: &Config) -> Result<()> {
    let variables = config.variables()?;
    let context = EnvironmentContext::resolve(variables.as_ref())
        .context("Failed to resolve pipeline variables")?;
    let trigger = TriggerCondition::for_context(&context, &config.object_prefix);

    let found = config
        .client()
        .object_exists(&trigger.bucket, &trigger.object)
        .await
        .with_context(|| format!("Failed to check {}", trigger))?;

    println!("{}", describe(&trigger, found));

    if !found {
        anyhow::bail!("{} does not exist yet", trigger);
    }

    Ok(())
}

fn describe(trigger: &TriggerCondition, found: bool) -> String {
    if found {
        format!("{} {}", "✓".green(), trigger)
    } else {
        format!("{} {} {}", "✗".red(), trigger, "(not present)".yellow())
    }
}
