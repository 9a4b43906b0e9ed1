//! Job Specification domain types
//!
//! The nested structure submitted to the serverless batch service. It is
//! built fresh for every run and never persisted here; the service keeps it.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::context::EnvironmentContext;
use super::trigger::DEFAULT_OBJECT_PREFIX;

/// Default compute region
pub const DEFAULT_REGION: &str = "us-central1";

/// Default serverless runtime version
pub const DEFAULT_RUNTIME_VERSION: &str = "2.2";

/// Execution-service settings that are passed through unmodified
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionSettings {
    pub project_id: String,
    pub region: String,
    pub runtime_version: String,
    /// Overrides the artifact location derived from the context's bucket
    pub main_python_file_uri: Option<String>,
    pub python_file_uris: Vec<String>,
    pub jar_file_uris: Vec<String>,
    pub service_account: Option<String>,
    pub network_uri: Option<String>,
    pub subnetwork_uri: Option<String>,
    /// Folder holding `spark-job/spark_job.py` when no explicit URI is set
    pub object_prefix: String,
}

impl SubmissionSettings {
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            region: DEFAULT_REGION.to_string(),
            runtime_version: DEFAULT_RUNTIME_VERSION.to_string(),
            main_python_file_uri: None,
            python_file_uris: Vec::new(),
            jar_file_uris: Vec::new(),
            service_account: None,
            network_uri: None,
            subnetwork_uri: None,
            object_prefix: DEFAULT_OBJECT_PREFIX.to_string(),
        }
    }

    /// Location of the executable artifact for a given context
    pub fn artifact_uri(&self, context: &EnvironmentContext) -> String {
        match &self.main_python_file_uri {
            Some(uri) => uri.clone(),
            None => format!(
                "gs://{}/{}/spark-job/spark_job.py",
                context.gcs_bucket,
                self.object_prefix.trim_matches('/')
            ),
        }
    }
}

/// Batch resource body accepted by the service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobSpecification {
    pub pyspark_batch: PySparkBatch,
    pub runtime_config: RuntimeConfig,
    pub environment_config: EnvironmentConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PySparkBatch {
    pub main_python_file_uri: String,
    #[serde(default)]
    pub python_file_uris: Vec<String>,
    #[serde(default)]
    pub jar_file_uris: Vec<String>,
    #[serde(default)]
    pub args: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeConfig {
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentConfig {
    pub execution_config: ExecutionConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_account: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network_uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subnetwork_uri: Option<String>,
}

impl JobSpecification {
    /// Builds the specification for one run
    pub fn build(context: &EnvironmentContext, settings: &SubmissionSettings) -> Self {
        Self {
            pyspark_batch: PySparkBatch {
                main_python_file_uri: settings.artifact_uri(context),
                python_file_uris: settings.python_file_uris.clone(),
                jar_file_uris: settings.jar_file_uris.clone(),
                args: context.job_arguments(),
            },
            runtime_config: RuntimeConfig {
                version: settings.runtime_version.clone(),
            },
            environment_config: EnvironmentConfig {
                execution_config: ExecutionConfig {
                    service_account: non_blank(&settings.service_account),
                    network_uri: non_blank(&settings.network_uri),
                    subnetwork_uri: non_blank(&settings.subnetwork_uri),
                },
            },
        }
    }
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Lifecycle state of a batch as reported by the service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BatchState {
    StateUnspecified,
    Pending,
    Running,
    Cancelling,
    Cancelled,
    Succeeded,
    Failed,
}

impl BatchState {
    /// Whether the batch will not change state again
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Cancelled)
    }
}

impl fmt::Display for BatchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BatchState::StateUnspecified => "STATE_UNSPECIFIED",
            BatchState::Pending => "PENDING",
            BatchState::Running => "RUNNING",
            BatchState::Cancelling => "CANCELLING",
            BatchState::Cancelled => "CANCELLED",
            BatchState::Succeeded => "SUCCEEDED",
            BatchState::Failed => "FAILED",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::context::TableNames;
    use serde_json::json;

    fn context() -> EnvironmentContext {
        EnvironmentContext {
            env: "dev".to_string(),
            gcs_bucket: "b".to_string(),
            bq_project: "p".to_string(),
            bq_dataset: "flight_data_dev".to_string(),
            tables: TableNames {
                transformed_table: "t1".to_string(),
                route_insights_table: "t2".to_string(),
                origin_insights_table: "t3".to_string(),
            },
        }
    }

    #[test]
    fn test_build_specification() {
        let mut settings = SubmissionSettings::new("compute-project");
        settings.service_account = Some(" 1234-compute@developer.gserviceaccount.com".to_string());
        settings.network_uri = Some("projects/p/global/networks/default".to_string());

        let spec = JobSpecification::build(&context(), &settings);

        assert_eq!(
            spec.pyspark_batch.main_python_file_uri,
            "gs://b/airflow-project/spark-job/spark_job.py"
        );
        assert_eq!(spec.pyspark_batch.args.len(), 6);
        assert_eq!(spec.pyspark_batch.args[3], "--transformed_table=t1");
        assert_eq!(spec.runtime_config.version, "2.2");
        assert_eq!(
            spec.environment_config.execution_config.service_account.as_deref(),
            Some("1234-compute@developer.gserviceaccount.com")
        );
        assert_eq!(spec.environment_config.execution_config.subnetwork_uri, None);
    }

    #[test]
    fn test_explicit_artifact_uri() {
        let mut settings = SubmissionSettings::new("compute-project");
        settings.main_python_file_uri = Some("gs://artifacts/job.py".to_string());

        let spec = JobSpecification::build(&context(), &settings);
        assert_eq!(spec.pyspark_batch.main_python_file_uri, "gs://artifacts/job.py");
    }

    #[test]
    fn test_wire_shape() {
        let mut settings = SubmissionSettings::new("compute-project");
        settings.subnetwork_uri = Some("projects/p/regions/us-central1/subnetworks/default".to_string());

        let spec = JobSpecification::build(&context(), &settings);
        let value = serde_json::to_value(&spec).unwrap();

        assert_eq!(
            value,
            json!({
                "pysparkBatch": {
                    "mainPythonFileUri": "gs://b/airflow-project/spark-job/spark_job.py",
                    "pythonFileUris": [],
                    "jarFileUris": [],
                    "args": [
                        "--env=dev",
                        "--bq_project=p",
                        "--bq_dataset=flight_data_dev",
                        "--transformed_table=t1",
                        "--route_insights_table=t2",
                        "--origin_insights_table=t3"
                    ]
                },
                "runtimeConfig": { "version": "2.2" },
                "environmentConfig": {
                    "executionConfig": {
                        "subnetworkUri": "projects/p/regions/us-central1/subnetworks/default"
                    }
                }
            })
        );
    }

    #[test]
    fn test_terminal_states() {
        assert!(BatchState::Succeeded.is_terminal());
        assert!(BatchState::Failed.is_terminal());
        assert!(BatchState::Cancelled.is_terminal());
        assert!(!BatchState::Running.is_terminal());
        assert!(!BatchState::Cancelling.is_terminal());
        assert!(!BatchState::Pending.is_terminal());
    }

    #[test]
    fn test_state_wire_names() {
        let state: BatchState = serde_json::from_str("\"STATE_UNSPECIFIED\"").unwrap();
        assert_eq!(state, BatchState::StateUnspecified);
        assert_eq!(serde_json::to_string(&BatchState::Cancelling).unwrap(), "\"CANCELLING\"");
        assert_eq!(BatchState::Failed.to_string(), "FAILED");
    }
}
