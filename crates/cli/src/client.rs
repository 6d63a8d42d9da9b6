//! API client for communicating with the predictor service

use anyhow::{Context, Result};
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::collections::HashMap;
use url::Url;

/// API client for the predictor service
pub struct ApiClient {
    client: Client,
    base_url: Url,
}

impl ApiClient {
    /// Create a new API client
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        let base_url = Url::parse(base_url).context("Invalid server URL")?;

        Ok(Self { client, base_url })
    }

    /// Make a GET request
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.base_url.join(path).context("Invalid path")?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("Failed to send request")?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        response.json().await.context("Failed to parse response")
    }

    /// Make a GET request and parse the body regardless of status.
    /// Health endpoints return their JSON body with a 503 as well.
    pub async fn get_any_status<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.base_url.join(path).context("Invalid path")?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("Failed to send request")?;

        response.json().await.context("Failed to parse response")
    }

    /// Make a POST request with JSON body
    pub async fn post<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T> {
        let url = self.base_url.join(path).context("Invalid path")?;

        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .context("Failed to send request")?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        response.json().await.context("Failed to parse response")
    }
}

/// Turn a non-success response into an error, preferring the server's own
/// message when the body is a structured error.
async fn api_error(response: reqwest::Response) -> anyhow::Error {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    match serde_json::from_str::<ErrorResponse>(&body) {
        Ok(err) => anyhow::anyhow!("API error ({}): {}", status, err.error),
        Err(_) => anyhow::anyhow!("API error ({}): {}", status, body),
    }
}

// API response types

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub outcome: String,
    pub label: u8,
    pub confidence: f32,
    pub model_version: String,
    pub generated_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub kind: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub components: HashMap<String, ComponentHealth>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealth {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub last_check_timestamp: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn post_parses_a_prediction() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/api/v1/predict")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"outcome":"graduate","label":1,"confidence":0.7,"model_version":"v1.0.0","generated_at":1730000000}"#,
            )
            .create_async()
            .await;

        let client = ApiClient::new(&server.url()).unwrap();
        let prediction: PredictionResponse = client
            .post("api/v1/predict", &serde_json::json!({}))
            .await
            .unwrap();

        assert_eq!(prediction.outcome, "graduate");
        assert_eq!(prediction.label, 1);
        assert!((prediction.confidence - 0.7).abs() < 1e-6);
    }

    #[tokio::test]
    async fn post_surfaces_server_error_body() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/api/v1/predict")
            .with_status(422)
            .with_header("content-type", "application/json")
            .with_body(r#"{"error":"Could not process the submitted record","kind":"schema"}"#)
            .create_async()
            .await;

        let client = ApiClient::new(&server.url()).unwrap();
        let err = client
            .post::<PredictionResponse, _>("api/v1/predict", &serde_json::json!({}))
            .await
            .unwrap_err();

        let message = err.to_string();
        assert!(message.contains("422"));
        assert!(message.contains("Could not process the submitted record"));
    }

    #[tokio::test]
    async fn health_body_is_parsed_even_on_503() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/healthz")
            .with_status(503)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"status":"unhealthy","components":{"classifier":{"status":"unhealthy","message":"Failed","last_check_timestamp":0}}}"#,
            )
            .create_async()
            .await;

        let client = ApiClient::new(&server.url()).unwrap();
        let health: HealthResponse = client.get_any_status("healthz").await.unwrap();

        assert_eq!(health.status, "unhealthy");
        assert_eq!(health.components["classifier"].status, "unhealthy");
    }

    #[test]
    fn invalid_url_is_rejected() {
        assert!(ApiClient::new("not a url").is_err());
    }
}
