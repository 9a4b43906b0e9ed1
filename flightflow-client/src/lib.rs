//! Flightflow HTTP Client
//!
//! A simple, type-safe HTTP client for the two external services the
//! pipeline talks to: the object store JSON API and the serverless batch API.
//!
//! Both the runner and the CLI use this crate so requests, authentication
//! and error mapping stay identical between them.
//!
//! # Example
//!
//! ```no_run
//! use flightflow_client::CloudClient;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = CloudClient::new().with_access_token("ya29.token");
//!
//!     let present = client
//!         .object_exists("my-bucket", "airflow-project/source-dev/flight_booking.csv")
//!         .await?;
//!
//!     println!("file present: {}", present);
//!     Ok(())
//! }
//! ```

pub mod error;
mod batches;
mod objects;

// Re-export commonly used types
pub use error::{ClientError, Result};
pub use flightflow_core::dto::batch::{Batch, Operation};

use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;

/// Public endpoint of the object store JSON API
pub const DEFAULT_STORAGE_URL: &str = "https://storage.googleapis.com";

/// Public endpoint of the serverless batch API
pub const DEFAULT_BATCH_URL: &str = "https://dataproc.googleapis.com";

/// HTTP client for the storage and batch APIs
///
/// Methods are organized into logical groups:
/// - Object existence checks
/// - Batch creation and status lookups
#[derive(Debug, Clone)]
pub struct CloudClient {
    /// Base URL of the object store API
    storage_url: String,
    /// Base URL of the batch API
    batch_url: String,
    /// Bearer token attached to every request, if any
    access_token: Option<String>,
    /// HTTP client instance
    client: Client,
}

impl CloudClient {
    /// Create a client pointing at the public endpoints
    pub fn new() -> Self {
        Self::with_client(Client::new())
    }

    /// Create a client with a custom HTTP client
    ///
    /// This allows you to configure timeouts, proxies, TLS settings, etc.
    ///
    /// # Example
    /// ```
    /// use flightflow_client::CloudClient;
    /// use reqwest::Client;
    /// use std::time::Duration;
    ///
    /// let http_client = Client::builder()
    ///     .timeout(Duration::from_secs(30))
    ///     .build()
    ///     .unwrap();
    ///
    /// let client = CloudClient::with_client(http_client);
    /// ```
    pub fn with_client(client: Client) -> Self {
        Self {
            storage_url: DEFAULT_STORAGE_URL.to_string(),
            batch_url: DEFAULT_BATCH_URL.to_string(),
            access_token: None,
            client,
        }
    }

    /// Override the object store endpoint (emulators, private endpoints)
    pub fn with_storage_url(mut self, url: impl Into<String>) -> Self {
        self.storage_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Override the batch API endpoint
    pub fn with_batch_url(mut self, url: impl Into<String>) -> Self {
        self.batch_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Attach a bearer access token to every request
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        let token = token.into();
        self.access_token = if token.trim().is_empty() {
            None
        } else {
            Some(token)
        };
        self
    }

    pub fn storage_url(&self) -> &str {
        &self.storage_url
    }

    pub fn batch_url(&self) -> &str {
        &self.batch_url
    }

    /// Adds authentication to a request
    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.access_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    // =============================================================================
    // Response Handlers
    // =============================================================================

    /// Handle an API response and deserialize JSON
    ///
    /// This method checks the status code and returns an appropriate error if
    /// the request failed, or deserializes the response body if successful.
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::api_error(status.as_u16(), error_text));
        }

        response
            .json()
            .await
            .map_err(|e| ClientError::ParseError(format!("Failed to parse JSON response: {}", e)))
    }
}

impl Default for CloudClient {
    fn default() -> Self {
        Self::new()
    }
}
