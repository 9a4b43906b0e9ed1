//! Batch API endpoints

use crate::CloudClient;
use crate::error::Result;
use flightflow_core::domain::batch::BatchId;
use flightflow_core::domain::job::JobSpecification;
use flightflow_core::dto::batch::{Batch, Operation};
use tracing::debug;

impl CloudClient {
    // =============================================================================
    // Batch Lifecycle
    // =============================================================================

    /// URL of the batch collection for a project and region
    pub(crate) fn batches_url(&self, project_id: &str, region: &str) -> String {
        format!(
            "{}/v1/projects/{}/locations/{}/batches",
            self.batch_url, project_id, region
        )
    }

    /// Submit a batch for asynchronous execution
    ///
    /// The batch identifier is the uniqueness key: the service answers 409
    /// when a batch with the same id already exists.
    ///
    /// # Returns
    /// The long-running creation operation. Acceptance only; the job outcome
    /// is observed through [`CloudClient::get_batch`].
    pub async fn create_batch(
        &self,
        project_id: &str,
        region: &str,
        batch_id: &BatchId,
        spec: &JobSpecification,
    ) -> Result<Operation> {
        let url = self.batches_url(project_id, region);
        debug!("Creating batch {} at {}", batch_id, url);

        let response = self
            .authorize(self.client.post(&url))
            .query(&[("batchId", batch_id.as_str())])
            .json(spec)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Get a batch by id
    ///
    /// # Returns
    /// The batch resource including its current state
    pub async fn get_batch(
        &self,
        project_id: &str,
        region: &str,
        batch_id: &BatchId,
    ) -> Result<Batch> {
        let url = format!("{}/{}", self.batches_url(project_id, region), batch_id);
        let response = self.authorize(self.client.get(&url)).send().await?;

        self.handle_response(response).await
    }
}
