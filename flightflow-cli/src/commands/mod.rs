//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod batch;
mod object;
mod render;

pub use batch::BatchCommands;
pub use object::ObjectCommands;
pub use render::RenderArgs;

use anyhow::Result;
use clap::Subcommand;

use crate::config::Config;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Print the batch id, trigger object and job specification for a run
    Render(RenderArgs),
    /// Trigger object inspection
    Object {
        #[command(subcommand)]
        command: ObjectCommands,
    },
    /// Batch inspection
    Batch {
        #[command(subcommand)]
        command: BatchCommands,
    },
}

/// Handle a CLI command
///
/// Routes the command to the appropriate handler module.
///
/// # Arguments
/// * `command` - The command to execute
/// * `config` - The CLI configuration
pub async fn handle_command(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Render(args) => render::handle_render_command(args, config),
        Commands::Object { command } => object::handle_object_command(command, config).await,
        Commands::Batch { command } => batch::handle_batch_command(command, config).await,
    }
}
