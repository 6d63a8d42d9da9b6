//! Student outcome predictor service
//!
//! Loads the fitted preprocessor and the trained classifier at startup,
//! then serves a one-page form whose submissions run synchronously through
//! transform-then-predict. If either artifact is missing, startup halts
//! before the form is ever served.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use predictor_lib::{
    health::{components, HealthRegistry},
    observability::{PredictorMetrics, StructuredLogger},
    predictor::{FittedPreprocessor, InferenceEngine, OnnxClassifier, Transformer},
};
use dropout_predictor::{api, config};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!("Starting dropout-predictor");

    // Load configuration
    let config = config::ServerConfig::load()?;

    // Both artifacts must load before the form is served; a missing file is
    // a fatal startup diagnostic, not a degraded mode.
    let preprocessor = FittedPreprocessor::from_path(Path::new(&config.preprocessor_path))
        .context("Startup aborted: preprocessor artifact unavailable")?;
    let classifier = OnnxClassifier::from_path(
        Path::new(&config.classifier_path),
        preprocessor.feature_width(),
        &config.model_version,
    )
    .context("Startup aborted: classifier artifact unavailable")?;

    let preprocessor_version = preprocessor.version().to_string();
    info!(
        model_version = %config.model_version,
        preprocessor_version = %preprocessor_version,
        feature_width = preprocessor.feature_width(),
        "Artifacts loaded"
    );

    // Initialize health registry
    let health_registry = HealthRegistry::new();
    health_registry.register(components::PREPROCESSOR).await;
    health_registry.register(components::CLASSIFIER).await;

    // Initialize metrics
    let metrics = PredictorMetrics::new();
    metrics.set_artifact_versions(&config.model_version, &preprocessor_version);

    // Initialize structured logger
    let logger = StructuredLogger::new(&config.model_version);
    logger.log_startup(SERVER_VERSION, &preprocessor_version);

    // Artifacts are immutable for the process lifetime; reload requires a
    // restart.
    let engine = InferenceEngine::new(Arc::new(preprocessor), Arc::new(classifier));

    // Create shared application state
    let app_state = Arc::new(api::AppState::new(
        engine,
        health_registry.clone(),
        metrics.clone(),
        logger.clone(),
    ));

    // Mark service as ready now that both artifacts are loaded
    health_registry.set_ready(true).await;

    // Start the HTTP server
    let _api_handle = tokio::spawn(api::serve(config.http_port, app_state));

    // Wait for shutdown signal
    tokio::signal::ctrl_c().await?;
    logger.log_shutdown("SIGINT received");
    info!("Shutting down");

    Ok(())
}
