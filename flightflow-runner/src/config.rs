//! Runner configuration
//!
//! Defines all configurable parameters for a pipeline run: watch and status
//! polling, retry budget, execution-service settings and endpoint overrides.
//! Pipeline variables (the Environment Context) are read separately.

use anyhow::Context;
use flightflow_core::domain::job::{DEFAULT_REGION, DEFAULT_RUNTIME_VERSION, SubmissionSettings};
use flightflow_core::domain::pipeline::{RetryPolicy, WaitMode};
use flightflow_core::domain::trigger::DEFAULT_OBJECT_PREFIX;
use std::path::PathBuf;
use std::time::Duration;

/// Runner configuration
///
/// All timeouts and intervals are configurable to allow tuning
/// for different deployment scenarios (dev vs prod, emulators vs cloud).
#[derive(Debug, Clone)]
pub struct Config {
    /// Project that owns the batch workloads
    pub project_id: String,

    /// Region the batches run in
    pub region: String,

    /// Time between trigger object checks
    pub poll_interval: Duration,

    /// Total time to wait for the trigger object
    pub watch_timeout: Duration,

    /// Whether the watcher holds its worker slot between checks
    pub wait_mode: WaitMode,

    /// Worker slots shared by concurrent watchers
    pub worker_slots: usize,

    /// Time between batch state lookups after submission
    pub status_poll_interval: Duration,

    /// Retries per stage after the first attempt
    pub stage_retries: u32,

    /// Fixed delay between stage attempts
    pub retry_delay: Duration,

    /// Timeout applied to every HTTP request
    pub request_timeout: Duration,

    pub runtime_version: String,
    pub main_python_file_uri: Option<String>,
    pub python_file_uris: Vec<String>,
    pub jar_file_uris: Vec<String>,
    pub service_account: Option<String>,
    pub network_uri: Option<String>,
    pub subnetwork_uri: Option<String>,

    /// Folder holding the source files and the job artifact
    pub object_prefix: String,

    /// Object store endpoint override
    pub storage_url: Option<String>,

    /// Batch API endpoint override
    pub batch_url: Option<String>,

    /// Bearer token for both APIs
    pub access_token: Option<String>,

    /// JSON document of pipeline variables; the environment is used when unset
    pub variables_file: Option<PathBuf>,
}

impl Config {
    /// Creates a new configuration with defaults
    pub fn new(project_id: String) -> Self {
        Self {
            project_id,
            region: DEFAULT_REGION.to_string(),
            poll_interval: Duration::from_secs(30),
            watch_timeout: Duration::from_secs(300),
            wait_mode: WaitMode::Poke,
            worker_slots: 1,
            status_poll_interval: Duration::from_secs(5),
            stage_retries: 1,
            retry_delay: Duration::from_secs(300), // 5 minutes
            request_timeout: Duration::from_secs(30),
            runtime_version: DEFAULT_RUNTIME_VERSION.to_string(),
            main_python_file_uri: None,
            python_file_uris: Vec::new(),
            jar_file_uris: Vec::new(),
            service_account: None,
            network_uri: None,
            subnetwork_uri: None,
            object_prefix: DEFAULT_OBJECT_PREFIX.to_string(),
            storage_url: None,
            batch_url: None,
            access_token: None,
            variables_file: None,
        }
    }

    /// Creates configuration from environment variables
    ///
    /// Expected environment variables:
    /// - GCP_PROJECT_ID (required)
    /// - GCP_REGION (optional, default: us-central1)
    /// - POLL_INTERVAL (optional, seconds, default: 30)
    /// - WATCH_TIMEOUT (optional, seconds, default: 300)
    /// - WAIT_MODE (optional, poke | reschedule, default: poke)
    /// - WORKER_SLOTS (optional, default: 1)
    /// - STATUS_POLL_INTERVAL (optional, seconds, default: 5)
    /// - STAGE_RETRIES (optional, default: 1)
    /// - RETRY_DELAY (optional, seconds, default: 300)
    /// - REQUEST_TIMEOUT (optional, seconds, default: 30)
    /// - RUNTIME_VERSION, MAIN_PYTHON_FILE_URI, PYTHON_FILE_URIS, JAR_FILE_URIS,
    ///   SERVICE_ACCOUNT, NETWORK_URI, SUBNETWORK_URI, OBJECT_PREFIX (optional)
    /// - STORAGE_API_URL, BATCH_API_URL (optional endpoint overrides)
    /// - GOOGLE_OAUTH_ACCESS_TOKEN (optional)
    /// - VARIABLES_FILE (optional)
    pub fn from_env() -> anyhow::Result<Self> {
        let project_id = std::env::var("GCP_PROJECT_ID")
            .map_err(|_| anyhow::anyhow!("GCP_PROJECT_ID environment variable not set"))?;

        let mut config = Self::new(project_id);

        if let Some(region) = env_string("GCP_REGION") {
            config.region = region;
        }

        config.poll_interval = env_secs("POLL_INTERVAL", config.poll_interval);
        config.watch_timeout = env_secs("WATCH_TIMEOUT", config.watch_timeout);
        config.status_poll_interval = env_secs("STATUS_POLL_INTERVAL", config.status_poll_interval);
        config.retry_delay = env_secs("RETRY_DELAY", config.retry_delay);
        config.request_timeout = env_secs("REQUEST_TIMEOUT", config.request_timeout);

        if let Some(mode) = env_string("WAIT_MODE") {
            config.wait_mode = mode.parse().context("Invalid WAIT_MODE")?;
        }

        config.worker_slots = std::env::var("WORKER_SLOTS")
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
            .unwrap_or(config.worker_slots);

        config.stage_retries = std::env::var("STAGE_RETRIES")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(config.stage_retries);

        if let Some(version) = env_string("RUNTIME_VERSION") {
            config.runtime_version = version;
        }
        if let Some(prefix) = env_string("OBJECT_PREFIX") {
            config.object_prefix = prefix;
        }

        config.main_python_file_uri = env_string("MAIN_PYTHON_FILE_URI");
        config.python_file_uris = env_list("PYTHON_FILE_URIS");
        config.jar_file_uris = env_list("JAR_FILE_URIS");
        config.service_account = env_string("SERVICE_ACCOUNT");
        config.network_uri = env_string("NETWORK_URI");
        config.subnetwork_uri = env_string("SUBNETWORK_URI");
        config.storage_url = env_string("STORAGE_API_URL");
        config.batch_url = env_string("BATCH_API_URL");
        config.access_token = env_string("GOOGLE_OAUTH_ACCESS_TOKEN");
        config.variables_file = env_string("VARIABLES_FILE").map(PathBuf::from);

        Ok(config)
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.project_id.is_empty() {
            anyhow::bail!("project_id cannot be empty");
        }

        if self.region.is_empty() {
            anyhow::bail!("region cannot be empty");
        }

        if self.poll_interval.is_zero() {
            anyhow::bail!("poll_interval must be greater than 0");
        }

        if self.status_poll_interval.is_zero() {
            anyhow::bail!("status_poll_interval must be greater than 0");
        }

        if self.worker_slots == 0 {
            anyhow::bail!("worker_slots must be greater than 0");
        }

        for (name, url) in [("storage_url", &self.storage_url), ("batch_url", &self.batch_url)] {
            if let Some(url) = url {
                if !url.starts_with("http://") && !url.starts_with("https://") {
                    anyhow::bail!("{} must start with http:// or https://", name);
                }
            }
        }

        if let Some(uri) = &self.main_python_file_uri {
            if !uri.starts_with("gs://") {
                anyhow::bail!("main_python_file_uri must be a gs:// URI");
            }
        }

        Ok(())
    }

    /// Execution-service settings passed through to every job specification
    pub fn submission_settings(&self) -> SubmissionSettings {
        SubmissionSettings {
            project_id: self.project_id.clone(),
            region: self.region.clone(),
            runtime_version: self.runtime_version.clone(),
            main_python_file_uri: self.main_python_file_uri.clone(),
            python_file_uris: self.python_file_uris.clone(),
            jar_file_uris: self.jar_file_uris.clone(),
            service_account: self.service_account.clone(),
            network_uri: self.network_uri.clone(),
            subnetwork_uri: self.subnetwork_uri.clone(),
            object_prefix: self.object_prefix.clone(),
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.stage_retries, self.retry_delay)
    }
}

fn env_string(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn env_secs(name: &str, default: Duration) -> Duration {
    std::env::var(name)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or(default)
}

fn env_list(name: &str) -> Vec<String> {
    env_string(name)
        .map(|s| {
            s.split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}
