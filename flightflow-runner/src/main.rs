//! Flightflow Runner
//!
//! Executes one run of the flight booking pipeline: wait for the day's CSV to
//! land in the object store, then submit the serverless transformation batch
//! and follow it to completion.
//!
//! Architecture:
//! - Configuration: Load settings from environment
//! - Repositories: Object store and batch service access via the cloud client
//! - Services: Arrival Watcher and Job Submitter
//! - Scheduler: Run-scoped state machine with the stage retry budget
//!
//! Ctrl-C cancels the run. A wait in progress aborts immediately and nothing
//! is submitted; after submission the batch is left to finish on its own.

mod config;
mod repository;
mod scheduler;
mod service;

#[cfg(test)]
mod testing;

use anyhow::{Context, Result};
use flightflow_client::CloudClient;
use flightflow_core::domain::context::{EnvVariables, MapVariables, VariableSource};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::repository::{
    BatchRepository, HttpBatchRepository, HttpObjectRepository, ObjectRepository,
};
use crate::scheduler::PipelineRun;
use crate::service::{ArrivalWatcher, JobSubmitter, WorkerSlots};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "flightflow_runner=info,flightflow_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Flightflow Runner");

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    config.validate()?;
    info!(
        "Loaded configuration: project_id={}, region={}, wait_mode={}",
        config.project_id, config.region, config.wait_mode
    );

    let variables = load_variables(&config)?;

    // Initialize cloud client
    let client = Arc::new(build_client(&config)?);
    info!(
        "Cloud client initialized (storage: {}, batches: {})",
        client.storage_url(),
        client.batch_url()
    );

    let objects: Arc<dyn ObjectRepository> = Arc::new(HttpObjectRepository::new(client.clone()));
    let batches: Arc<dyn BatchRepository> = Arc::new(HttpBatchRepository::new(
        client,
        config.project_id.clone(),
        config.region.clone(),
    ));

    let watcher = ArrivalWatcher::new(
        objects,
        WorkerSlots::new(config.worker_slots),
        config.poll_interval,
        config.watch_timeout,
        config.wait_mode,
    );
    let submitter = JobSubmitter::new(batches, config.status_poll_interval);

    // Configuration problems surface here, before any external call
    let run = PipelineRun::prepare(
        variables.as_ref(),
        &config.submission_settings(),
        watcher,
        submitter,
        config.retry_policy(),
    )
    .context("Failed to initialize pipeline run")?;

    info!("Run {} initialized, trigger: {}", run.run_id(), run.trigger());

    let cancel = CancellationToken::new();
    spawn_cancel_on_ctrl_c(cancel.clone());

    let report = run.run(cancel).await;

    match serde_json::to_string(&report) {
        Ok(json) => info!("Run report: {}", json),
        Err(e) => warn!("Failed to serialize run report: {}", e),
    }

    if let Some(finished_at) = report.finished_at {
        let elapsed = finished_at - report.started_at;
        info!("Run finished in {}s", elapsed.num_seconds());
    }

    if let Some(e) = report.error {
        error!("Run {} failed: {}", report.run_id, e);
        return Err(anyhow::Error::new(e).context(format!("Pipeline run {} failed", report.run_id)));
    }

    Ok(())
}

/// Reads pipeline variables from a JSON file, or from the environment
fn load_variables(config: &Config) -> Result<Box<dyn VariableSource>> {
    match &config.variables_file {
        Some(path) => {
            let document = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read variables file {}", path.display()))?;
            let variables = MapVariables::from_json_str(&document)
                .with_context(|| format!("Failed to parse variables file {}", path.display()))?;
            info!("Loaded pipeline variables from {}", path.display());
            Ok(Box::new(variables))
        }
        None => {
            info!("Reading pipeline variables from the environment");
            Ok(Box::new(EnvVariables))
        }
    }
}

fn build_client(config: &Config) -> Result<CloudClient> {
    let http_client = reqwest::Client::builder()
        .timeout(config.request_timeout)
        .build()
        .context("Failed to build HTTP client")?;

    let mut client = CloudClient::with_client(http_client);

    if let Some(url) = &config.storage_url {
        client = client.with_storage_url(url);
    }
    if let Some(url) = &config.batch_url {
        client = client.with_batch_url(url);
    }
    if let Some(token) = &config.access_token {
        client = client.with_access_token(token);
    } else {
        warn!("GOOGLE_OAUTH_ACCESS_TOKEN not set, requests are unauthenticated");
    }

    Ok(client)
}

fn spawn_cancel_on_ctrl_c(cancel: CancellationToken) {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                warn!("Cancellation requested");
                cancel.cancel();
            }
            Err(e) => error!("Failed to listen for Ctrl-C: {}", e),
        }
    });
}
