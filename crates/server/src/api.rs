//! HTTP API: the form page, the predict endpoint, health checks, and
//! Prometheus metrics

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse},
    routing::{get, post},
    Json, Router,
};
use predictor_lib::{
    health::{ComponentStatus, HealthRegistry},
    observability::{PredictorMetrics, StructuredLogger},
    predictor::InferenceEngine,
    PredictError, StudentForm, StudentRecord,
};
use prometheus::{Encoder, TextEncoder};
use serde::Serialize;
use tracing::info;

/// The one-page form, embedded at build time.
const INDEX_HTML: &str = include_str!("../static/index.html");

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub engine: InferenceEngine,
    pub health_registry: HealthRegistry,
    pub metrics: PredictorMetrics,
    pub logger: StructuredLogger,
}

impl AppState {
    pub fn new(
        engine: InferenceEngine,
        health_registry: HealthRegistry,
        metrics: PredictorMetrics,
        logger: StructuredLogger,
    ) -> Self {
        Self {
            engine,
            health_registry,
            metrics,
            logger,
        }
    }
}

/// Error body returned for failed predictions
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub kind: &'static str,
}

/// The form page
async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// One submission: validate the form, assemble the record with its fixed
/// defaults, run inference. Schema problems come back as 422, anything
/// else as 500; the form stays usable either way.
async fn predict(
    State(state): State<Arc<AppState>>,
    Json(form): Json<StudentForm>,
) -> impl IntoResponse {
    let start = Instant::now();

    let result = form
        .validate()
        .and_then(|_| state.engine.predict(&StudentRecord::from_form(form)));

    state
        .metrics
        .observe_prediction_latency(start.elapsed().as_secs_f64());

    match result {
        Ok(prediction) => {
            let outcome = prediction.outcome.to_string().to_lowercase();
            state.metrics.inc_prediction(&outcome);
            state.logger.log_prediction(
                &outcome,
                prediction.label,
                prediction.confidence,
                start.elapsed().as_micros() as u64,
            );
            (StatusCode::OK, Json(prediction)).into_response()
        }
        Err(err) => {
            let (kind, status) = if err.is_schema_error() {
                ("schema", StatusCode::UNPROCESSABLE_ENTITY)
            } else {
                ("classifier", StatusCode::INTERNAL_SERVER_ERROR)
            };
            state.metrics.inc_prediction_error(kind);
            state.logger.log_prediction_failed(kind, &err.to_string());
            (
                status,
                Json(ErrorResponse {
                    error: user_message(&err),
                    kind,
                }),
            )
                .into_response()
        }
    }
}

/// Human-readable message for the result panel. Schema errors carry the
/// field detail; anything else stays generic.
fn user_message(err: &PredictError) -> String {
    if err.is_schema_error() {
        format!("Could not process the submitted record: {}", err)
    } else {
        "An unexpected error occurred during inference. Please try again.".to_string()
    }
}

/// Health check response - returns 200 if healthy, 503 if degraded/unhealthy
async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let health = state.health_registry.health().await;

    let status_code = match health.status {
        ComponentStatus::Healthy => StatusCode::OK,
        ComponentStatus::Degraded => StatusCode::OK, // Still operational
        ComponentStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(health))
}

/// Readiness check response - returns 200 if ready, 503 if not ready
async fn readyz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let readiness = state.health_registry.readiness().await;

    let status_code = if readiness.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(readiness))
}

/// Prometheus metrics endpoint
async fn metrics() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            [("content-type", "text/plain; charset=utf-8")],
            e.to_string().into_bytes(),
        );
    }

    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        buffer,
    )
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/v1/predict", post(predict))
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .with_state(state)
}

/// Start the API server
pub async fn serve(port: u16, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = create_router(state);

    let addr = format!("0.0.0.0:{}", port);
    info!(addr = %addr, "Starting HTTP server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
