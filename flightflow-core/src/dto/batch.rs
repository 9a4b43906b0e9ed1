//! Batch resource DTOs

use serde::{Deserialize, Serialize};

use crate::domain::job::BatchState;

/// A batch as returned by `GET .../batches/<id>`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Batch {
    /// Full resource name: `projects/<p>/locations/<r>/batches/<id>`
    pub name: String,
    #[serde(default)]
    pub uuid: Option<String>,
    pub state: BatchState,
    #[serde(default)]
    pub state_message: Option<String>,
    #[serde(default)]
    pub create_time: Option<String>,
    #[serde(default)]
    pub state_time: Option<String>,
}

impl Batch {
    /// Trailing identifier segment of the resource name
    pub fn batch_id(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or(&self.name)
    }
}

/// Long-running operation returned when a batch is created
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    pub name: String,
    #[serde(default)]
    pub done: bool,
    #[serde(default)]
    pub metadata: Option<BatchOperationMetadata>,
    #[serde(default)]
    pub error: Option<OperationStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchOperationMetadata {
    /// Resource name of the batch being created
    #[serde(default)]
    pub batch: Option<String>,
    #[serde(default)]
    pub batch_uuid: Option<String>,
    #[serde(default)]
    pub create_time: Option<String>,
}

/// Error payload of a finished operation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationStatus {
    #[serde(default)]
    pub code: i32,
    #[serde(default)]
    pub message: String,
}
