//! Errors raised while loading or writing tables.

use std::path::PathBuf;
use thiserror::Error;

/// A table could not be read or written.
///
/// Every variant is fatal to a compile run: a missing or malformed input
/// cannot be fixed by generating another program.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("input table not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("cannot write {path}: {source}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path} is not a readable CSV table: {message}")]
    CsvParse { path: PathBuf, message: String },

    #[error("failed to encode table as CSV at {path}: {message}")]
    CsvWrite { path: PathBuf, message: String },

    /// Header row missing or empty.
    #[error("table {path} has no columns")]
    NoColumns { path: PathBuf },

    #[error("table operation failed: {message}")]
    DataFrame { message: String },
}

impl From<polars::prelude::PolarsError> for IngestError {
    fn from(err: polars::prelude::PolarsError) -> Self {
        Self::DataFrame {
            message: err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, IngestError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_names_the_path() {
        let err = IngestError::FileNotFound {
            path: PathBuf::from("/data/inventory.csv"),
        };
        assert_eq!(err.to_string(), "input table not found: /data/inventory.csv");
    }

    #[test]
    fn polars_errors_map_to_dataframe() {
        let polars_err = polars::prelude::PolarsError::ColumnNotFound("age".into());
        let ingest_err: IngestError = polars_err.into();
        assert!(matches!(ingest_err, IngestError::DataFrame { .. }));
    }
}
