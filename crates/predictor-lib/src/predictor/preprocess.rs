//! Fitted preprocessing transform
//!
//! The preprocessor artifact is the serialized result of fitting the
//! training pipeline: an ordered column list where each column carries the
//! encoding learned from the training data. Transforming a record walks
//! that list, so the feature layout is exactly the one the classifier was
//! trained against.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::Transformer;
use crate::error::PredictError;

/// Serialized form of the fitted preprocessor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreprocessorSpec {
    /// Version stamp of the fitting run.
    pub version: String,
    /// Columns in training order.
    pub columns: Vec<ColumnSpec>,
}

/// One input column and the encoding fitted for it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub name: String,
    pub encoding: ColumnEncoding,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnEncoding {
    /// z-score scaling with the fitted mean and standard deviation.
    Standard { mean: f64, std: f64 },
    /// One-hot over the category codes seen during fitting.
    OneHot { categories: Vec<i64> },
    /// Raw value, no scaling.
    Passthrough,
}

impl ColumnEncoding {
    fn width(&self) -> usize {
        match self {
            ColumnEncoding::OneHot { categories } => categories.len(),
            _ => 1,
        }
    }
}

/// Fitted transformer loaded from the preprocessor artifact.
#[derive(Debug)]
pub struct FittedPreprocessor {
    spec: PreprocessorSpec,
    width: usize,
}

impl FittedPreprocessor {
    /// Load and validate the artifact. Missing or malformed artifacts are
    /// startup failures; the caller halts before serving.
    pub fn from_path(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).with_context(|| {
            format!("Failed to read preprocessor artifact at {}", path.display())
        })?;
        let spec: PreprocessorSpec = serde_json::from_str(&raw).with_context(|| {
            format!("Malformed preprocessor artifact at {}", path.display())
        })?;
        Self::from_spec(spec)
    }

    pub fn from_spec(spec: PreprocessorSpec) -> Result<Self> {
        if spec.columns.is_empty() {
            anyhow::bail!("Preprocessor artifact has no columns");
        }
        for column in &spec.columns {
            match &column.encoding {
                ColumnEncoding::Standard { mean, std } => {
                    if !mean.is_finite() || !std.is_finite() || *std < 0.0 {
                        anyhow::bail!(
                            "Column `{}` has invalid scaling parameters",
                            column.name
                        );
                    }
                }
                ColumnEncoding::OneHot { categories } => {
                    if categories.is_empty() {
                        anyhow::bail!("Column `{}` has an empty category set", column.name);
                    }
                }
                ColumnEncoding::Passthrough => {}
            }
        }
        let width = spec.columns.iter().map(|c| c.encoding.width()).sum();
        Ok(Self { spec, width })
    }

    pub fn version(&self) -> &str {
        &self.spec.version
    }

    /// Number of input columns the fitted schema expects.
    pub fn column_count(&self) -> usize {
        self.spec.columns.len()
    }

    fn lookup(&self, values: &[(&'static str, f64)], name: &str) -> Option<f64> {
        values.iter().find(|(n, _)| *n == name).map(|(_, v)| *v)
    }
}

impl Transformer for FittedPreprocessor {
    fn transform(&self, values: &[(&'static str, f64)]) -> Result<Vec<f32>, PredictError> {
        // A field the fitted schema does not know is a schema mismatch, same
        // as a missing one.
        for (name, _) in values {
            if !self.spec.columns.iter().any(|c| c.name == *name) {
                return Err(PredictError::UnexpectedField {
                    field: name.to_string(),
                });
            }
        }

        let mut features = Vec::with_capacity(self.width);
        for column in &self.spec.columns {
            let value = self
                .lookup(values, &column.name)
                .ok_or_else(|| PredictError::MissingField {
                    field: column.name.clone(),
                })?;
            if !value.is_finite() {
                return Err(PredictError::NonFiniteValue {
                    field: column.name.clone(),
                });
            }
            match &column.encoding {
                ColumnEncoding::Standard { mean, std } => {
                    let scaled = if *std > 0.0 { (value - mean) / std } else { 0.0 };
                    features.push(scaled as f32);
                }
                ColumnEncoding::OneHot { categories } => {
                    let code = value as i64;
                    if value.fract() != 0.0 || !categories.contains(&code) {
                        return Err(PredictError::UnseenCategory {
                            field: column.name.clone(),
                            code,
                        });
                    }
                    for category in categories {
                        features.push(if *category == code { 1.0 } else { 0.0 });
                    }
                }
                ColumnEncoding::Passthrough => features.push(value as f32),
            }
        }
        Ok(features)
    }

    fn feature_width(&self) -> usize {
        self.width
    }
}
