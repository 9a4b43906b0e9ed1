//! Object store endpoints

use crate::CloudClient;
use crate::error::{ClientError, Result};
use reqwest::StatusCode;
use tracing::debug;

impl CloudClient {
    // =============================================================================
    // Object Metadata
    // =============================================================================

    /// URL of an object's metadata resource
    pub(crate) fn object_url(&self, bucket: &str, object: &str) -> String {
        format!(
            "{}/storage/v1/b/{}/o/{}",
            self.storage_url,
            urlencoding::encode(bucket),
            urlencoding::encode(object)
        )
    }

    /// Check whether an object exists
    ///
    /// Issues a read-only metadata lookup. A 404 means the object is absent;
    /// any other non-success status is returned as an error.
    ///
    /// # Arguments
    /// * `bucket` - Bucket name
    /// * `object` - Object key, e.g. `airflow-project/source-dev/flight_booking.csv`
    pub async fn object_exists(&self, bucket: &str, object: &str) -> Result<bool> {
        let url = self.object_url(bucket, object);
        debug!("Checking object {}", url);

        let response = self
            .authorize(self.client.get(&url))
            .query(&[("fields", "name")])
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            status => {
                let error_text = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Unknown error".to_string());
                Err(ClientError::api_error(status.as_u16(), error_text))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_url_encodes_path() {
        let client = CloudClient::new().with_storage_url("http://localhost:4443");
        assert_eq!(
            client.object_url("landing", "airflow-project/source-dev/flight_booking.csv"),
            "http://localhost:4443/storage/v1/b/landing/o/airflow-project%2Fsource-dev%2Fflight_booking.csv"
        );
    }
}
