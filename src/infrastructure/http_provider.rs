// HTTP data provider - Posts range requests to a remote bridge
use crate::application::data_provider::{ActivityRequest, DataProvider, DataRequest};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct HttpProvider {
    base_url: String,
    client: reqwest::Client,
}

impl HttpProvider {
    pub fn new(base_url: String, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn post<T: Serialize + Sync>(&self, path: &str, body: &T) -> Result<String> {
        let url = self.endpoint(path);

        let response = self
            .client
            .post(&url)
            .header("Accept", "application/json")
            .json(body)
            .send()
            .await
            .with_context(|| format!("Failed to send request to {}", url))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Request to {} failed with status {}: {}", url, status, body);
        }

        response
            .text()
            .await
            .with_context(|| format!("Failed to read response from {}", url))
    }
}

#[async_trait]
impl DataProvider for HttpProvider {
    async fn load_data(&self, request: &DataRequest) -> Result<String> {
        tracing::debug!(
            "POST data {} - {} ({} points)",
            request.start_date,
            request.end_date,
            request.num_of_points
        );
        self.post("data", request).await
    }

    async fn load_activities(&self, request: &ActivityRequest) -> Result<String> {
        self.post("activities", request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let provider =
            HttpProvider::new("http://localhost:8080/tsdv/".to_string(), Duration::from_secs(5))
                .unwrap();
        assert_eq!(provider.endpoint("data"), "http://localhost:8080/tsdv/data");
    }

    #[test]
    fn test_request_body_uses_bridge_field_names() {
        let request = DataRequest {
            start_date: "2015-03-03 00:00Z".to_string(),
            end_date: "2015-03-04 00:00Z".to_string(),
            metrics: vec!["*".to_string()],
            num_of_points: 100,
        };
        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "startDate": "2015-03-03 00:00Z",
                "endDate": "2015-03-04 00:00Z",
                "metrics": ["*"],
                "numOfPoints": 100,
            })
        );
    }
}
