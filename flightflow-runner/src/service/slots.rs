//! Worker slots
//!
//! A bounded pool of execution slots shared by every run in the process.
//! A waiting watcher either keeps its slot for the whole wait or gives it
//! back between checks, depending on its wait mode.

use flightflow_core::PipelineError;
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio_util::sync::CancellationToken;

/// Shared pool of worker slots
#[derive(Debug, Clone)]
pub struct WorkerSlots {
    semaphore: Arc<Semaphore>,
}

impl WorkerSlots {
    /// Creates a pool with `slots` permits
    pub fn new(slots: usize) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(slots)),
        }
    }

    /// Waits for a free slot
    ///
    /// The slot is released when the returned permit is dropped.
    pub async fn acquire(
        &self,
        cancel: &CancellationToken,
    ) -> Result<OwnedSemaphorePermit, PipelineError> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(PipelineError::Cancelled),
            permit = self.semaphore.clone().acquire_owned() => {
                permit.map_err(|_| PipelineError::ServiceUnavailable("worker slots closed".to_string()))
            }
        }
    }

    /// Number of slots not currently held
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }
}
