//! ONNX classifier inference using tract
//!
//! Loads the trained classifier graph via tract-onnx. The graph's single
//! output is the class probability vector; `predict` is its argmax and
//! `predict_proba` returns it as-is after an arity check.

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use anyhow::{Context, Result};
use tract_onnx::prelude::*;
use tracing::{debug, warn};

use super::Classifier;
use crate::error::PredictError;

/// The classifier distinguishes exactly two classes: Dropout and Graduate.
pub const NUM_CLASSES: usize = 2;

/// Maximum inference latency before a warning is logged (5ms target).
const MAX_INFERENCE_MS: u128 = 5;

type TractModel = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

/// Trained classifier backed by an ONNX graph.
#[derive(Debug)]
pub struct OnnxClassifier {
    model: TractModel,
    model_version: String,
    feature_width: usize,
    inference_count: AtomicU64,
    slow_inference_count: AtomicU64,
}

impl OnnxClassifier {
    /// Load the classifier artifact. The feature width comes from the fitted
    /// preprocessor so both artifacts agree on the vector shape.
    pub fn from_path(path: &Path, feature_width: usize, model_version: &str) -> Result<Self> {
        let bytes = std::fs::read(path).with_context(|| {
            format!("Failed to read classifier artifact at {}", path.display())
        })?;
        Self::from_bytes(&bytes, feature_width, model_version)
    }

    pub fn from_bytes(bytes: &[u8], feature_width: usize, model_version: &str) -> Result<Self> {
        let model = tract_onnx::onnx()
            .model_for_read(&mut std::io::Cursor::new(bytes))
            .context("Failed to parse ONNX classifier")?
            .with_input_fact(0, f32::fact([1, feature_width]).into())
            .context("Failed to set classifier input shape")?
            .into_optimized()
            .context("Failed to optimize classifier")?
            .into_runnable()
            .context("Failed to create runnable classifier")?;

        Ok(Self {
            model,
            model_version: model_version.to_string(),
            feature_width,
            inference_count: AtomicU64::new(0),
            slow_inference_count: AtomicU64::new(0),
        })
    }

    fn run_probabilities(&self, features: &[f32]) -> Result<Vec<f32>, PredictError> {
        if features.len() != self.feature_width {
            return Err(PredictError::Classifier {
                message: format!(
                    "feature vector has {} values, classifier expects {}",
                    features.len(),
                    self.feature_width
                ),
            });
        }

        let input: Tensor =
            tract_ndarray::Array2::from_shape_vec((1, self.feature_width), features.to_vec())
                .map_err(|e| PredictError::Classifier {
                    message: e.to_string(),
                })?
                .into();

        let start = Instant::now();
        let result = self
            .model
            .run(tvec!(input.into()))
            .map_err(|e| PredictError::Classifier {
                message: e.to_string(),
            })?;
        let output = result.first().ok_or_else(|| PredictError::Classifier {
            message: "classifier produced no output".to_string(),
        })?;

        let elapsed = start.elapsed();
        self.inference_count.fetch_add(1, Ordering::Relaxed);
        if elapsed.as_millis() > MAX_INFERENCE_MS {
            self.slow_inference_count.fetch_add(1, Ordering::Relaxed);
            warn!(
                elapsed_ms = elapsed.as_millis() as u64,
                "Inference exceeded {}ms target", MAX_INFERENCE_MS
            );
        } else {
            debug!(elapsed_us = elapsed.as_micros() as u64, "Inference completed");
        }

        let view = output
            .to_array_view::<f32>()
            .map_err(|e| PredictError::Classifier {
                message: e.to_string(),
            })?;
        let probabilities: Vec<f32> = view.iter().copied().collect();
        if probabilities.len() != NUM_CLASSES {
            return Err(PredictError::Classifier {
                message: format!(
                    "probability output has {} values, expected {}",
                    probabilities.len(),
                    NUM_CLASSES
                ),
            });
        }
        Ok(probabilities)
    }

    /// Inference counters for observability.
    pub fn stats(&self) -> InferenceStats {
        InferenceStats {
            total_inferences: self.inference_count.load(Ordering::Relaxed),
            slow_inferences: self.slow_inference_count.load(Ordering::Relaxed),
        }
    }
}

impl Classifier for OnnxClassifier {
    fn predict(&self, features: &[f32]) -> Result<u8, PredictError> {
        let probabilities = self.run_probabilities(features)?;
        Ok(argmax(&probabilities) as u8)
    }

    fn predict_proba(&self, features: &[f32]) -> Result<Vec<f32>, PredictError> {
        self.run_probabilities(features)
    }

    fn model_version(&self) -> &str {
        &self.model_version
    }
}

fn argmax(values: &[f32]) -> usize {
    values
        .iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(i, _)| i)
        .unwrap_or(0)
}

/// Inference statistics
#[derive(Debug, Clone)]
pub struct InferenceStats {
    pub total_inferences: u64,
    pub slow_inferences: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn argmax_picks_largest() {
        assert_eq!(argmax(&[0.3, 0.7]), 1);
        assert_eq!(argmax(&[0.9, 0.1]), 0);
    }

    #[test]
    fn argmax_on_empty_defaults_to_zero() {
        assert_eq!(argmax(&[]), 0);
    }

    #[test]
    fn missing_classifier_artifact_names_the_path() {
        let err =
            OnnxClassifier::from_path(Path::new("/nonexistent/classifier.onnx"), 36, "v1")
                .unwrap_err();
        assert!(err.to_string().contains("/nonexistent/classifier.onnx"));
    }

    #[test]
    fn garbage_bytes_are_rejected() {
        let err = OnnxClassifier::from_bytes(b"not an onnx graph", 36, "v1").unwrap_err();
        assert!(err.to_string().contains("ONNX"));
    }
}
