//! Trigger Condition

use serde::{Deserialize, Serialize};
use std::fmt;

use super::context::EnvironmentContext;

/// Default folder under which source files and the job artifact live
pub const DEFAULT_OBJECT_PREFIX: &str = "airflow-project";

/// Name of the file whose arrival starts the pipeline
pub const SOURCE_FILE_NAME: &str = "flight_booking.csv";

/// Fully-qualified location of the object whose existence gates the run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerCondition {
    pub bucket: String,
    pub object: String,
}

impl TriggerCondition {
    /// `<prefix>/source-<env>/flight_booking.csv` in the context's bucket
    pub fn for_context(context: &EnvironmentContext, prefix: &str) -> Self {
        let prefix = prefix.trim_matches('/');
        Self {
            bucket: context.gcs_bucket.clone(),
            object: format!("{}/source-{}/{}", prefix, context.env, SOURCE_FILE_NAME),
        }
    }
}

impl fmt::Display for TriggerCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "gs://{}/{}", self.bucket, self.object)
    }
}
