//! Inference invoker
//!
//! One record in, one (outcome, confidence) pair out: transform, predict,
//! predict_proba, then read the probability mass at the predicted label.
//! Pure with respect to the loaded artifacts; every failure is a typed
//! [`PredictError`] for the boundary to render.

use std::sync::Arc;
use std::time::Instant;

use tracing::debug;

use super::{Classifier, Transformer};
use crate::error::PredictError;
use crate::record::{Outcome, Prediction, StudentRecord};

/// Synchronous invoker over the two loaded artifacts. Cheap to clone and
/// share; holds no per-submission state.
#[derive(Clone)]
pub struct InferenceEngine {
    transformer: Arc<dyn Transformer>,
    classifier: Arc<dyn Classifier>,
}

impl InferenceEngine {
    pub fn new(transformer: Arc<dyn Transformer>, classifier: Arc<dyn Classifier>) -> Self {
        Self {
            transformer,
            classifier,
        }
    }

    /// Run one record through transform, predict, and predict_proba.
    ///
    /// Confidence is the probability mass at the predicted label, indexed by
    /// the label value itself. For a well-formed classifier the label is the
    /// argmax of the distribution, so the two coincide; the indexing is kept
    /// explicit rather than taking the max.
    pub fn predict(&self, record: &StudentRecord) -> Result<Prediction, PredictError> {
        let start = Instant::now();

        let features = self.transformer.transform(&record.values())?;
        let label = self.classifier.predict(&features)?;
        let probabilities = self.classifier.predict_proba(&features)?;

        let confidence = probabilities
            .get(label as usize)
            .copied()
            .ok_or_else(|| PredictError::Classifier {
                message: format!(
                    "probability vector of length {} has no entry for label {}",
                    probabilities.len(),
                    label
                ),
            })?;
        let outcome = Outcome::from_label(label).ok_or_else(|| PredictError::Classifier {
            message: format!("classifier produced label {} outside {{0, 1}}", label),
        })?;

        debug!(
            elapsed_us = start.elapsed().as_micros() as u64,
            label,
            confidence,
            "Prediction completed"
        );

        Ok(Prediction {
            outcome,
            label,
            confidence: confidence.clamp(0.0, 1.0),
            model_version: self.classifier.model_version().to_string(),
            generated_at: chrono::Utc::now().timestamp(),
        })
    }

    pub fn model_version(&self) -> &str {
        self.classifier.model_version()
    }
}
