use crate::utils::error::Result;
use reqwest::Client;
use std::time::Duration;

pub const NYC311_ENDPOINT: &str =
    "https://data.cityofnewyork.us/resource/erm2-nwe9.json?$limit=1000000";

/// GETs the dataset endpoint. Non-2xx responses are errors.
#[derive(Debug, Clone)]
pub struct DatasetClient {
    client: Client,
    timeout: Duration,
}

impl DatasetClient {
    pub fn new(timeout_seconds: u64) -> Self {
        Self::with_client(Client::new(), timeout_seconds)
    }

    pub fn with_client(client: Client, timeout_seconds: u64) -> Self {
        Self {
            client,
            timeout: Duration::from_secs(timeout_seconds),
        }
    }

    pub async fn fetch(&self, endpoint: &str) -> Result<Vec<u8>> {
        tracing::debug!("Making API request to: {}", endpoint);
        let response = self
            .client
            .get(endpoint)
            .timeout(self.timeout)
            .send()
            .await?;

        tracing::debug!("API response status: {}", response.status());
        let response = response.error_for_status()?;

        let body = response.bytes().await?;
        tracing::debug!("Received {} bytes", body.len());
        Ok(body.to_vec())
    }
}
