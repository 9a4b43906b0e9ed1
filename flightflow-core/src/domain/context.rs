//! Environment Context
//!
//! The resolved set of named configuration values for a single pipeline run.
//! Values are read once from a [`VariableSource`] and never mutated afterwards.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::HashMap;

use crate::error::{PipelineError, Result};

/// Default environment tag
pub const DEFAULT_ENV: &str = "dev";

/// Environment variable prefix used by [`EnvVariables`]
pub const ENV_VARIABLE_PREFIX: &str = "FLIGHTFLOW_VAR_";

/// Longest environment tag that still yields a valid batch identifier
pub const MAX_ENV_LEN: usize = 33;

/// Read-only key-value configuration store
pub trait VariableSource: Send + Sync {
    /// Returns the raw value stored under `key`, if any
    fn get(&self, key: &str) -> Option<String>;
}

/// Variables read from the process environment
///
/// Key `tables` is read from `FLIGHTFLOW_VAR_TABLES`.
#[derive(Debug, Clone, Default)]
pub struct EnvVariables;

impl VariableSource for EnvVariables {
    fn get(&self, key: &str) -> Option<String> {
        let name = format!("{}{}", ENV_VARIABLE_PREFIX, key.to_ascii_uppercase());
        std::env::var(name).ok()
    }
}

/// Variables held in memory
#[derive(Debug, Clone, Default)]
pub struct MapVariables {
    values: HashMap<String, String>,
}

impl MapVariables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a variable
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    /// Builds a variable set from a JSON object document
    ///
    /// String values are stored as-is; any other value is stored as its JSON
    /// text so structured variables such as `tables` can be deserialized later.
    pub fn from_json_str(document: &str) -> Result<Self> {
        let parsed: HashMap<String, JsonValue> = serde_json::from_str(document)
            .map_err(|e| PipelineError::invalid("variables", e.to_string()))?;

        let values = parsed
            .into_iter()
            .map(|(key, value)| match value {
                JsonValue::String(s) => (key, s),
                other => (key, other.to_string()),
            })
            .collect();

        Ok(Self { values })
    }
}

impl VariableSource for MapVariables {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }
}

/// Warehouse table names written by the transformation job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableNames {
    pub transformed_table: String,
    pub route_insights_table: String,
    pub origin_insights_table: String,
}

impl TableNames {
    fn from_json(raw: &str) -> Result<Self> {
        let value: JsonValue =
            serde_json::from_str(raw).map_err(|e| PipelineError::invalid("tables", e.to_string()))?;

        let object = value
            .as_object()
            .ok_or_else(|| PipelineError::invalid("tables", "expected a JSON object"))?;

        let field = |name: &str| -> Result<String> {
            match object.get(name) {
                None | Some(JsonValue::Null) => Err(PipelineError::ConfigurationMissing(format!(
                    "tables.{}",
                    name
                ))),
                Some(JsonValue::String(s)) => Ok(s.clone()),
                Some(_) => Err(PipelineError::invalid(
                    format!("tables.{}", name),
                    "expected a string",
                )),
            }
        };

        Ok(Self {
            transformed_table: field("transformed_table")?,
            route_insights_table: field("route_insights_table")?,
            origin_insights_table: field("origin_insights_table")?,
        })
    }
}

/// Resolved configuration for one pipeline run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentContext {
    pub env: String,
    pub gcs_bucket: String,
    pub bq_project: String,
    pub bq_dataset: String,
    pub tables: TableNames,
}

impl EnvironmentContext {
    /// Resolves the context from a variable source, applying defaults
    ///
    /// Fails with `ConfigurationMissing` when a variable without a default is
    /// absent. No external service is contacted.
    pub fn resolve(source: &dyn VariableSource) -> Result<Self> {
        let env = source.get("env").unwrap_or_else(|| DEFAULT_ENV.to_string());
        validate_env(&env)?;

        let gcs_bucket = required(source, "gcs_bucket")?;
        let bq_project = required(source, "bq_project")?;
        let bq_dataset = source
            .get("bq_dataset")
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| format!("flight_data_{}", env));

        let tables = TableNames::from_json(&required(source, "tables")?)?;

        Ok(Self {
            env,
            gcs_bucket,
            bq_project,
            bq_dataset,
            tables,
        })
    }

    /// Positional arguments passed to the transformation job
    pub fn job_arguments(&self) -> Vec<String> {
        vec![
            format!("--env={}", self.env),
            format!("--bq_project={}", self.bq_project),
            format!("--bq_dataset={}", self.bq_dataset),
            format!("--transformed_table={}", self.tables.transformed_table),
            format!("--route_insights_table={}", self.tables.route_insights_table),
            format!("--origin_insights_table={}", self.tables.origin_insights_table),
        ]
    }
}

fn required(source: &dyn VariableSource, key: &str) -> Result<String> {
    match source.get(key) {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(PipelineError::ConfigurationMissing(key.to_string())),
    }
}

/// The tag becomes part of the batch identifier, so it inherits its charset
fn validate_env(env: &str) -> Result<()> {
    if env.is_empty() {
        return Err(PipelineError::invalid("env", "must not be empty"));
    }

    if env.len() > MAX_ENV_LEN {
        return Err(PipelineError::invalid(
            "env",
            format!("must be at most {} characters", MAX_ENV_LEN),
        ));
    }

    if !env
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Err(PipelineError::invalid(
            "env",
            "only lowercase letters, digits and '-' are allowed",
        ));
    }

    Ok(())
}
