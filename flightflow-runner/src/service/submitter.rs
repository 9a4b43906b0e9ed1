//! Job submitter
//!
//! Submits one batch per attempt and observes it until the service reports
//! a terminal state. Submission only guarantees acceptance; the outcome
//! belongs to the batch service.

use flightflow_client::{Batch, ClientError};
use flightflow_core::PipelineError;
use flightflow_core::domain::batch::BatchId;
use flightflow_core::domain::job::{BatchState, JobSpecification};
use std::sync::Arc;
use std::time::Duration;
use tokio::time;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::repository::BatchRepository;

/// Consecutive failed state lookups tolerated before giving up
const MAX_STATUS_FAILURES: u32 = 3;

/// Submits batches and waits for their terminal state
#[derive(Clone)]
pub struct JobSubmitter {
    batches: Arc<dyn BatchRepository>,
    status_poll_interval: Duration,
}

impl JobSubmitter {
    /// Creates a new submitter
    ///
    /// # Arguments
    /// * `batches` - Batch service repository
    /// * `status_poll_interval` - Time between state lookups
    pub fn new(batches: Arc<dyn BatchRepository>, status_poll_interval: Duration) -> Self {
        Self {
            batches,
            status_poll_interval,
        }
    }

    /// Submits the specification under `batch_id` and waits for the outcome
    ///
    /// Nothing is submitted when `cancel` has already fired. A cancellation
    /// after acceptance stops observing; the batch itself keeps running.
    pub async fn submit_and_wait(
        &self,
        spec: &JobSpecification,
        batch_id: &BatchId,
        cancel: &CancellationToken,
    ) -> Result<Batch, PipelineError> {
        if cancel.is_cancelled() {
            return Err(PipelineError::Cancelled);
        }

        self.submit(spec, batch_id).await?;
        self.await_terminal(batch_id, cancel).await
    }

    /// Submits the batch
    pub async fn submit(
        &self,
        spec: &JobSpecification,
        batch_id: &BatchId,
    ) -> Result<(), PipelineError> {
        info!(
            "Submitting batch {} ({})",
            batch_id, spec.pyspark_batch.main_python_file_uri
        );

        let operation = self
            .batches
            .create(batch_id, spec)
            .await
            .map_err(|e| rejection(batch_id, e))?;

        if let Some(status) = operation.error {
            return Err(PipelineError::JobExecutionFailed {
                batch_id: batch_id.to_string(),
                state: BatchState::Failed.to_string(),
                message: status.message,
            });
        }

        info!("Batch {} accepted (operation {})", batch_id, operation.name);
        Ok(())
    }

    /// Polls the batch until it reaches a terminal state
    pub async fn await_terminal(
        &self,
        batch_id: &BatchId,
        cancel: &CancellationToken,
    ) -> Result<Batch, PipelineError> {
        let mut failures = 0;

        loop {
            let lookup = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(abandon(batch_id)),
                lookup = self.batches.get(batch_id) => lookup,
            };

            match lookup {
                Ok(batch) => {
                    failures = 0;
                    debug!("Batch {} is {}", batch_id, batch.state);

                    match batch.state {
                        BatchState::Succeeded => {
                            info!("Batch {} succeeded", batch_id);
                            return Ok(batch);
                        }
                        BatchState::Failed | BatchState::Cancelled => {
                            return Err(PipelineError::JobExecutionFailed {
                                batch_id: batch_id.to_string(),
                                state: batch.state.to_string(),
                                message: batch
                                    .state_message
                                    .unwrap_or_else(|| "no state message".to_string()),
                            });
                        }
                        _ => {}
                    }
                }
                Err(e) if e.is_transient() || e.is_not_found() => {
                    failures += 1;
                    if failures >= MAX_STATUS_FAILURES {
                        return Err(PipelineError::ServiceUnavailable(format!(
                            "state of batch {} unavailable after {} attempts: {}",
                            batch_id, failures, e
                        )));
                    }
                    warn!(
                        "Failed to look up batch {} ({}/{}): {}",
                        batch_id, failures, MAX_STATUS_FAILURES, e
                    );
                }
                Err(e) => {
                    return Err(PipelineError::ServiceUnavailable(format!(
                        "state of batch {} unavailable: {}",
                        batch_id, e
                    )));
                }
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(abandon(batch_id)),
                _ = time::sleep(self.status_poll_interval) => {}
            }
        }
    }
}

/// Maps a refused submission onto the error taxonomy
fn rejection(batch_id: &BatchId, error: ClientError) -> PipelineError {
    if error.is_conflict() {
        PipelineError::DuplicateBatchId(batch_id.to_string())
    } else {
        PipelineError::SubmissionRejected(error.to_string())
    }
}

fn abandon(batch_id: &BatchId) -> PipelineError {
    warn!(
        "Run cancelled after batch {} was accepted; the batch is left running",
        batch_id
    );
    PipelineError::Cancelled
}
