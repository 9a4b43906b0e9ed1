//! Configuration module
//!
//! Connection settings and pipeline variable loading shared by all commands.

use anyhow::{Context, Result};
use flightflow_client::CloudClient;
use flightflow_core::domain::context::{EnvVariables, MapVariables, VariableSource};
use std::path::PathBuf;

/// CLI configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Project that owns the batch workloads
    pub project_id: Option<String>,

    pub region: String,
    pub storage_url: String,
    pub batch_url: String,
    pub access_token: Option<String>,

    /// JSON document of pipeline variables
    pub variables_file: Option<PathBuf>,

    pub object_prefix: String,
}

impl Config {
    /// Project id, required by commands that address the batch service
    pub fn project_id(&self) -> Result<&str> {
        self.project_id
            .as_deref()
            .filter(|p| !p.trim().is_empty())
            .context("--project-id (or GCP_PROJECT_ID) is required for this command")
    }

    pub fn client(&self) -> CloudClient {
        let client = CloudClient::new()
            .with_storage_url(&self.storage_url)
            .with_batch_url(&self.batch_url);

        match &self.access_token {
            Some(token) => client.with_access_token(token),
            None => client,
        }
    }

    /// Pipeline variables from the variables file, or the environment
    pub fn variables(&self) -> Result<Box<dyn VariableSource>> {
        match &self.variables_file {
            Some(path) => {
                let document = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read {}", path.display()))?;
                let variables = MapVariables::from_json_str(&document)
                    .with_context(|| format!("Failed to parse {}", path.display()))?;
                Ok(Box::new(variables))
            }
            None => Ok(Box::new(EnvVariables)),
        }
    }
}
