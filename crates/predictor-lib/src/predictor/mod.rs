//! Inference pipeline
//!
//! The engine depends on the two external collaborators only through the
//! traits below: a fitted transform and a trained classifier. The concrete
//! artifact formats live in the loaders ([`FittedPreprocessor`],
//! [`OnnxClassifier`]) and are invisible to the invocation contract.

mod engine;
mod inference;
mod preprocess;

pub use engine::InferenceEngine;
pub use inference::{InferenceStats, OnnxClassifier, NUM_CLASSES};
pub use preprocess::{ColumnEncoding, ColumnSpec, FittedPreprocessor, PreprocessorSpec};

use crate::error::PredictError;

/// Deterministic mapping from a named-field record to the fixed-width
/// feature vector the classifier was trained on.
pub trait Transformer: Send + Sync {
    /// Transform a record, matching fields by name. Fails on a missing or
    /// unknown field, a non-finite value, or a category code the fitted
    /// encoding has never seen.
    fn transform(&self, values: &[(&'static str, f64)]) -> Result<Vec<f32>, PredictError>;

    /// Width of the produced feature vector.
    fn feature_width(&self) -> usize;
}

/// Trained binary classifier over transformed feature vectors.
pub trait Classifier: Send + Sync {
    /// Predict the discrete class label (0 or 1).
    fn predict(&self, features: &[f32]) -> Result<u8, PredictError>;

    /// Probability distribution over both classes.
    fn predict_proba(&self, features: &[f32]) -> Result<Vec<f32>, PredictError>;

    /// Version of the loaded model artifact.
    fn model_version(&self) -> &str;
}
