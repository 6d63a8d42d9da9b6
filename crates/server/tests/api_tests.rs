//! Integration tests for the HTTP endpoints

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use dropout_predictor::api::{create_router, AppState};
use predictor_lib::{
    health::{components, HealthRegistry},
    observability::{PredictorMetrics, StructuredLogger},
    predictor::{Classifier, InferenceEngine, Transformer},
    PredictError, StudentForm,
};
use tower::ServiceExt;

/// One feature per field, passed through unchanged.
struct StubTransformer;

impl Transformer for StubTransformer {
    fn transform(&self, values: &[(&'static str, f64)]) -> Result<Vec<f32>, PredictError> {
        Ok(values.iter().map(|(_, v)| *v as f32).collect())
    }

    fn feature_width(&self) -> usize {
        36
    }
}

/// Fixed probability vector; label is its argmax.
struct StubClassifier {
    probabilities: Vec<f32>,
}

impl Classifier for StubClassifier {
    fn predict(&self, _features: &[f32]) -> Result<u8, PredictError> {
        Ok(if self.probabilities[1] >= self.probabilities[0] {
            1
        } else {
            0
        })
    }

    fn predict_proba(&self, _features: &[f32]) -> Result<Vec<f32>, PredictError> {
        Ok(self.probabilities.clone())
    }

    fn model_version(&self) -> &str {
        "stub-v1"
    }
}

/// Always fails as if the model produced garbage.
struct BrokenClassifier;

impl Classifier for BrokenClassifier {
    fn predict(&self, _features: &[f32]) -> Result<u8, PredictError> {
        Err(PredictError::Classifier {
            message: "classifier produced no output".to_string(),
        })
    }

    fn predict_proba(&self, _features: &[f32]) -> Result<Vec<f32>, PredictError> {
        Err(PredictError::Classifier {
            message: "classifier produced no output".to_string(),
        })
    }

    fn model_version(&self) -> &str {
        "stub-v1"
    }
}

async fn setup_app(classifier: Arc<dyn Classifier>) -> (Router, Arc<AppState>) {
    let health_registry = HealthRegistry::new();
    health_registry.register(components::PREPROCESSOR).await;
    health_registry.register(components::CLASSIFIER).await;

    let engine = InferenceEngine::new(Arc::new(StubTransformer), classifier);
    let state = Arc::new(AppState::new(
        engine,
        health_registry,
        PredictorMetrics::new(),
        StructuredLogger::new("stub-v1"),
    ));
    let router = create_router(state.clone());

    (router, state)
}

async fn graduate_app() -> (Router, Arc<AppState>) {
    setup_app(Arc::new(StubClassifier {
        probabilities: vec![0.3, 0.7],
    }))
    .await
}

fn predict_request(body: String) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/v1/predict")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn index_serves_the_form() {
    let (app, _state) = graduate_app().await;

    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let html = String::from_utf8(bytes.to_vec()).unwrap();

    // one control per collected field, by schema name
    assert!(html.contains("Marital_status"));
    assert!(html.contains("Curricular_units_2nd_sem_grade"));
    assert!(html.contains("GDP"));
    // unexposed fields never appear on the form
    assert!(!html.contains("Mothers_occupation"));
    assert!(!html.contains("Admission_grade"));
}

#[tokio::test]
async fn valid_submission_returns_prediction() {
    let (app, _state) = graduate_app().await;
    let body = serde_json::to_string(&StudentForm::sample()).unwrap();

    let response = app.oneshot(predict_request(body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let prediction = json_body(response).await;
    assert_eq!(prediction["outcome"], "graduate");
    assert_eq!(prediction["label"], 1);
    assert!((prediction["confidence"].as_f64().unwrap() - 0.7).abs() < 1e-6);
    assert_eq!(prediction["model_version"], "stub-v1");
}

#[tokio::test]
async fn dropout_submission_reports_mass_at_label_zero() {
    let (app, _state) = setup_app(Arc::new(StubClassifier {
        probabilities: vec![0.8, 0.2],
    }))
    .await;
    let body = serde_json::to_string(&StudentForm::sample()).unwrap();

    let response = app.oneshot(predict_request(body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let prediction = json_body(response).await;
    assert_eq!(prediction["outcome"], "dropout");
    assert_eq!(prediction["label"], 0);
    assert!((prediction["confidence"].as_f64().unwrap() - 0.8).abs() < 1e-6);
}

#[tokio::test]
async fn identical_submissions_get_identical_predictions() {
    let (app, _state) = graduate_app().await;
    let body = serde_json::to_string(&StudentForm::sample()).unwrap();

    let first = json_body(
        app.clone()
            .oneshot(predict_request(body.clone()))
            .await
            .unwrap(),
    )
    .await;
    let second = json_body(app.oneshot(predict_request(body)).await.unwrap()).await;

    assert_eq!(first["outcome"], second["outcome"]);
    assert_eq!(first["label"], second["label"]);
    assert_eq!(first["confidence"], second["confidence"]);
}

#[tokio::test]
async fn out_of_range_grade_is_rejected_as_schema_error() {
    let (app, _state) = graduate_app().await;
    let mut form = StudentForm::sample();
    form.curricular_units_1st_sem_grade = 20.5;
    let body = serde_json::to_string(&form).unwrap();

    let response = app.oneshot(predict_request(body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let error = json_body(response).await;
    assert_eq!(error["kind"], "schema");
    assert!(error["error"]
        .as_str()
        .unwrap()
        .contains("Curricular_units_1st_sem_grade"));
}

#[tokio::test]
async fn boundary_values_are_accepted() {
    let (app, _state) = graduate_app().await;
    let mut form = StudentForm::sample();
    form.curricular_units_1st_sem_grade = 0.0;
    form.curricular_units_2nd_sem_grade = 20.0;
    form.age_at_enrollment = 80;
    let body = serde_json::to_string(&form).unwrap();

    let response = app.oneshot(predict_request(body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn missing_field_in_body_is_a_client_error() {
    let (app, _state) = graduate_app().await;
    let mut body: serde_json::Value =
        serde_json::to_value(StudentForm::sample()).unwrap();
    body.as_object_mut().unwrap().remove("Course");

    let response = app
        .oneshot(predict_request(body.to_string()))
        .await
        .unwrap();

    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn classifier_failure_is_a_generic_500() {
    let (app, _state) = setup_app(Arc::new(BrokenClassifier)).await;
    let body = serde_json::to_string(&StudentForm::sample()).unwrap();

    let response = app.oneshot(predict_request(body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let error = json_body(response).await;
    assert_eq!(error["kind"], "classifier");
    // internal detail stays out of the user-facing message
    assert!(!error["error"].as_str().unwrap().contains("no output"));
}

#[tokio::test]
async fn healthz_returns_ok_when_healthy() {
    let (app, _state) = graduate_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/healthz")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let health = json_body(response).await;
    assert_eq!(health["status"], "healthy");
    assert!(health["components"]["preprocessor"].is_object());
    assert!(health["components"]["classifier"].is_object());
}

#[tokio::test]
async fn healthz_returns_503_when_unhealthy() {
    let (app, state) = graduate_app().await;

    state
        .health_registry
        .set_unhealthy(components::CLASSIFIER, "Artifact unreadable")
        .await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/healthz")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let health = json_body(response).await;
    assert_eq!(health["status"], "unhealthy");
}

#[tokio::test]
async fn readyz_gates_on_initialization() {
    let (app, state) = graduate_app().await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/readyz")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    state.health_registry.set_ready(true).await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/readyz")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn metrics_endpoint_returns_prometheus_format() {
    let (app, state) = graduate_app().await;
    state.metrics.observe_prediction_latency(0.001);
    state.metrics.set_artifact_versions("stub-v1", "fit-test");

    let response = app
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers().get("content-type").unwrap();
    assert!(content_type.to_str().unwrap().contains("text/plain"));

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();

    assert!(text.contains("dropout_predictor_prediction_latency_seconds"));
    assert!(text.contains("dropout_predictor_artifact_version_info"));
}
