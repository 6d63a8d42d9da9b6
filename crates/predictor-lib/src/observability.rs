//! Observability infrastructure
//!
//! Provides:
//! - Prometheus metrics (prediction latency, predictions by outcome,
//!   errors by kind, artifact version info)
//! - Structured JSON logging with tracing

use std::sync::OnceLock;

use prometheus::{
    register_gauge_vec, register_histogram, register_int_counter_vec, GaugeVec, Histogram,
    IntCounterVec,
};
use tracing::{info, warn};

/// Default histogram buckets for latency measurements (in seconds)
const LATENCY_BUCKETS: &[f64] = &[
    0.0001, 0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0,
];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<PredictorMetricsInner> = OnceLock::new();

/// Inner metrics structure that holds the actual Prometheus metrics
struct PredictorMetricsInner {
    prediction_latency_seconds: Histogram,
    predictions_total: IntCounterVec,
    prediction_errors_total: IntCounterVec,
    artifact_version_info: GaugeVec,
}

impl PredictorMetricsInner {
    fn new() -> Self {
        Self {
            prediction_latency_seconds: register_histogram!(
                "dropout_predictor_prediction_latency_seconds",
                "Time spent transforming a record and running inference",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register prediction_latency_seconds"),

            predictions_total: register_int_counter_vec!(
                "dropout_predictor_predictions_total",
                "Predictions served, labeled by predicted outcome",
                &["outcome"]
            )
            .expect("Failed to register predictions_total"),

            prediction_errors_total: register_int_counter_vec!(
                "dropout_predictor_prediction_errors_total",
                "Failed predictions, labeled by error kind",
                &["kind"]
            )
            .expect("Failed to register prediction_errors_total"),

            artifact_version_info: register_gauge_vec!(
                "dropout_predictor_artifact_version_info",
                "Versions of the loaded classifier and preprocessor artifacts",
                &["model", "preprocessor"]
            )
            .expect("Failed to register artifact_version_info"),
        }
    }
}

/// Predictor metrics for Prometheus exposition
///
/// This is a lightweight handle to the global metrics instance.
/// Multiple clones share the same underlying metrics.
#[derive(Clone)]
pub struct PredictorMetrics {
    _private: (),
}

impl Default for PredictorMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl PredictorMetrics {
    /// Create a new metrics handle (initializes global metrics if needed)
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(PredictorMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &PredictorMetricsInner {
        GLOBAL_METRICS.get().expect("Metrics not initialized")
    }

    /// Record a prediction latency observation
    pub fn observe_prediction_latency(&self, duration_secs: f64) {
        self.inner()
            .prediction_latency_seconds
            .observe(duration_secs);
    }

    /// Count a served prediction by outcome ("dropout" or "graduate")
    pub fn inc_prediction(&self, outcome: &str) {
        self.inner()
            .predictions_total
            .with_label_values(&[outcome])
            .inc();
    }

    /// Count a failed prediction by kind ("schema" or "classifier")
    pub fn inc_prediction_error(&self, kind: &str) {
        self.inner()
            .prediction_errors_total
            .with_label_values(&[kind])
            .inc();
    }

    /// Record the loaded artifact versions
    pub fn set_artifact_versions(&self, model_version: &str, preprocessor_version: &str) {
        self.inner().artifact_version_info.reset();
        self.inner()
            .artifact_version_info
            .with_label_values(&[model_version, preprocessor_version])
            .set(1.0);
    }
}

/// Structured logger for predictor events
///
/// Provides consistent JSON-formatted logging for predictions, failures,
/// and lifecycle events.
#[derive(Clone)]
pub struct StructuredLogger {
    model_version: String,
}

impl StructuredLogger {
    pub fn new(model_version: impl Into<String>) -> Self {
        Self {
            model_version: model_version.into(),
        }
    }

    /// Log a served prediction
    pub fn log_prediction(&self, outcome: &str, label: u8, confidence: f32, duration_us: u64) {
        info!(
            event = "prediction_generated",
            model_version = %self.model_version,
            outcome = %outcome,
            label = label,
            confidence = confidence,
            duration_us = duration_us,
            "Generated outcome prediction"
        );
    }

    /// Log a failed prediction; schema failures are expected operator noise,
    /// classifier failures are not.
    pub fn log_prediction_failed(&self, kind: &str, error: &str) {
        match kind {
            "schema" => {
                info!(
                    event = "prediction_failed",
                    model_version = %self.model_version,
                    kind = %kind,
                    error = %error,
                    "Rejected submission"
                );
            }
            _ => {
                warn!(
                    event = "prediction_failed",
                    model_version = %self.model_version,
                    kind = %kind,
                    error = %error,
                    "Prediction failed"
                );
            }
        }
    }

    /// Log service startup
    pub fn log_startup(&self, version: &str, preprocessor_version: &str) {
        info!(
            event = "predictor_started",
            server_version = %version,
            model_version = %self.model_version,
            preprocessor_version = %preprocessor_version,
            "Student outcome predictor started"
        );
    }

    /// Log service shutdown
    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "predictor_shutdown",
            model_version = %self.model_version,
            reason = %reason,
            "Student outcome predictor shutting down"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metrics_handle_can_record() {
        // Prometheus registration is global; a single handle exercises every
        // instrument once.
        let metrics = PredictorMetrics::new();

        metrics.observe_prediction_latency(0.002);
        metrics.inc_prediction("graduate");
        metrics.inc_prediction("dropout");
        metrics.inc_prediction_error("schema");
        metrics.set_artifact_versions("v1.0.0", "fit-2024-11");
    }

    #[test]
    fn logger_keeps_model_version() {
        let logger = StructuredLogger::new("v1.0.0");
        assert_eq!(logger.model_version, "v1.0.0");
    }
}
