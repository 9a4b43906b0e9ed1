//! Batches repository
//!
//! Handles communication with the batch service:
//! - Submitting a batch under a caller-supplied identifier
//! - Looking up a batch's current state

use async_trait::async_trait;
use flightflow_client::{Batch, CloudClient, Operation, Result};
use flightflow_core::domain::batch::BatchId;
use flightflow_core::domain::job::JobSpecification;
use std::sync::Arc;

/// Repository trait for batch operations in one project and region
#[async_trait]
pub trait BatchRepository: Send + Sync {
    /// Submits a batch
    ///
    /// # Arguments
    /// * `batch_id` - Uniqueness key for the batch
    /// * `spec` - The job specification
    async fn create(&self, batch_id: &BatchId, spec: &JobSpecification) -> Result<Operation>;

    /// Fetches the batch's current state
    ///
    /// # Arguments
    /// * `batch_id` - The batch to look up
    async fn get(&self, batch_id: &BatchId) -> Result<Batch>;
}

/// HTTP implementation of BatchRepository
pub struct HttpBatchRepository {
    client: Arc<CloudClient>,
    project_id: String,
    region: String,
}

impl HttpBatchRepository {
    /// Creates a new HTTP batch repository
    ///
    /// # Arguments
    /// * `client` - Shared cloud client
    /// * `project_id` - Project that owns the batches
    /// * `region` - Region the batches run in
    pub fn new(client: Arc<CloudClient>, project_id: String, region: String) -> Self {
        Self {
            client,
            project_id,
            region,
        }
    }
}

#[async_trait]
impl BatchRepository for HttpBatchRepository {
    async fn create(&self, batch_id: &BatchId, spec: &JobSpecification) -> Result<Operation> {
        self.client
            .create_batch(&self.project_id, &self.region, batch_id, spec)
            .await
    }

    async fn get(&self, batch_id: &BatchId) -> Result<Batch> {
        self.client
            .get_batch(&self.project_id, &self.region, batch_id)
            .await
    }
}
