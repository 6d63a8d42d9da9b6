//! Core library for the student outcome predictor
//!
//! This crate provides:
//! - The 36-field student record schema, with fixed defaults for the
//!   fields the form does not collect
//! - The fitted preprocessing transform and the ONNX classifier
//! - The inference engine producing (outcome, confidence) pairs
//! - Health checks and observability

pub mod error;
pub mod health;
pub mod observability;
pub mod predictor;
pub mod record;

pub use error::PredictError;
pub use health::{
    ComponentHealth, ComponentStatus, HealthRegistry, HealthResponse, ReadinessResponse,
};
pub use observability::{PredictorMetrics, StructuredLogger};
pub use record::*;
