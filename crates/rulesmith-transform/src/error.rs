//! Error types for label plans.

use polars::prelude::PolarsError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransformError {
    #[error("label plan is not valid JSON: {message}")]
    PlanParse { message: String },

    #[error("unsupported label plan format '{found}'")]
    UnsupportedFormat { found: String },

    #[error("failed to encode label plan: {source}")]
    Encode {
        #[source]
        source: serde_json::Error,
    },

    #[error("rule '{rule}' references column '{column}' which is not in the input")]
    UnknownColumn { rule: String, column: String },

    #[error("rule '{rule}' compares column '{column}' ({found}) with a {expected}")]
    ClauseType {
        rule: String,
        column: String,
        found: String,
        expected: &'static str,
    },

    #[error("column '{column}' is missing from the labelled frame")]
    MissingStatusColumn { column: String },

    #[error("dataframe evaluation failed: {message}")]
    Evaluate { message: String },
}

impl From<PolarsError> for TransformError {
    fn from(err: PolarsError) -> Self {
        Self::Evaluate {
            message: err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, TransformError>;
