//! Batch Identifier

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::error::{PipelineError, Result};

/// Static prefix of every generated batch identifier
pub const BATCH_ID_PREFIX: &str = "flight-booking-batch";

/// Length of the random suffix
pub const SUFFIX_LEN: usize = 8;

const MIN_LEN: usize = 4;
const MAX_LEN: usize = 63;

/// Caller-supplied key under which the batch service records a job
///
/// Unique per submission attempt. Once created it never changes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BatchId(String);

impl BatchId {
    /// Generates `flight-booking-batch-<env>-<8 hex chars>`
    pub fn generate(env: &str) -> Result<Self> {
        let uuid = Uuid::new_v4().simple().to_string();
        let id = format!("{}-{}-{}", BATCH_ID_PREFIX, env, &uuid[..SUFFIX_LEN]);
        Self::parse(id)
    }

    /// Validates an identifier against the service's naming rules
    pub fn parse(id: impl Into<String>) -> Result<Self> {
        let id = id.into();

        if id.len() < MIN_LEN || id.len() > MAX_LEN {
            return Err(PipelineError::invalid(
                "batch_id",
                format!("length must be between {} and {}", MIN_LEN, MAX_LEN),
            ));
        }

        if !id
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        {
            return Err(PipelineError::invalid(
                "batch_id",
                "only lowercase letters, digits and '-' are allowed",
            ));
        }

        if id.starts_with('-') || id.ends_with('-') {
            return Err(PipelineError::invalid(
                "batch_id",
                "must not start or end with '-'",
            ));
        }

        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for BatchId {
    type Error = PipelineError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(value)
    }
}

impl From<BatchId> for String {
    fn from(id: BatchId) -> Self {
        id.0
    }
}
