//! Error taxonomy for the inference path
//!
//! Schema errors cover everything the caller can fix by correcting the
//! submitted record; classifier errors cover everything else. Artifact
//! loading failures are fatal at startup and stay on `anyhow` in the
//! loaders themselves.

use thiserror::Error;

/// Failure during record assembly, transformation, or classification.
#[derive(Debug, Error)]
pub enum PredictError {
    #[error("record is missing required field `{field}`")]
    MissingField { field: String },

    #[error("record contains field `{field}` not known to the fitted preprocessor")]
    UnexpectedField { field: String },

    #[error("value for `{field}` is not a finite number")]
    NonFiniteValue { field: String },

    #[error("category code {code} for `{field}` was not seen when the preprocessor was fitted")]
    UnseenCategory { field: String, code: i64 },

    #[error("`{field}` out of range: {message}")]
    OutOfDomain {
        field: &'static str,
        message: String,
    },

    #[error("classifier failure: {message}")]
    Classifier { message: String },
}

impl PredictError {
    /// True for errors the caller can recover from by correcting the
    /// record and resubmitting.
    pub fn is_schema_error(&self) -> bool {
        !matches!(self, PredictError::Classifier { .. })
    }
}
