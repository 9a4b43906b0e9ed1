//! Objects repository
//!
//! Read-only existence checks against the object store.

use async_trait::async_trait;
use flightflow_client::{CloudClient, Result};
use flightflow_core::domain::trigger::TriggerCondition;
use std::sync::Arc;

/// Repository trait for object store lookups
#[async_trait]
pub trait ObjectRepository: Send + Sync {
    /// Checks whether the trigger object exists
    ///
    /// # Arguments
    /// * `trigger` - Bucket and object key to look up
    async fn exists(&self, trigger: &TriggerCondition) -> Result<bool>;
}

/// HTTP implementation of ObjectRepository
pub struct HttpObjectRepository {
    client: Arc<CloudClient>,
}

impl HttpObjectRepository {
    /// Creates a new HTTP object repository
    pub fn new(client: Arc<CloudClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ObjectRepository for HttpObjectRepository {
    async fn exists(&self, trigger: &TriggerCondition) -> Result<bool> {
        self.client
            .object_exists(&trigger.bucket, &trigger.object)
            .await
    }
}
