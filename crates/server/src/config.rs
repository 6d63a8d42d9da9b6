//! Server configuration

use anyhow::Result;
use serde::Deserialize;

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// HTTP port for the form, predict, and health/metrics endpoints
    #[serde(default = "default_http_port")]
    pub http_port: u16,

    /// Path to the serialized classifier artifact
    #[serde(default = "default_classifier_path")]
    pub classifier_path: String,

    /// Path to the serialized preprocessor artifact
    #[serde(default = "default_preprocessor_path")]
    pub preprocessor_path: String,

    /// Version stamp reported for the loaded classifier
    #[serde(default = "default_model_version")]
    pub model_version: String,
}

fn default_http_port() -> u16 {
    8080
}

fn default_classifier_path() -> String {
    "model/classifier.onnx".to_string()
}

fn default_preprocessor_path() -> String {
    "model/preprocessor.json".to_string()
}

fn default_model_version() -> String {
    "v1.0.0".to_string()
}

impl ServerConfig {
    /// Load configuration from the environment
    pub fn load() -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::Environment::with_prefix("PREDICTOR"))
            .build()?;

        Ok(config.try_deserialize().unwrap_or_else(|_| ServerConfig {
            http_port: default_http_port(),
            classifier_path: default_classifier_path(),
            preprocessor_path: default_preprocessor_path(),
            model_version: default_model_version(),
        }))
    }
}
