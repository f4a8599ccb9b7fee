//! Output validation for rulesmith.
//!
//! [`validate`] inspects what a sandboxed program wrote and returns a
//! [`ValidationReport`]. Checks run in order:
//!
//! 1. The output artifact exists and parses as a table.
//! 2. The label column is present with no missing values.
//! 3. Row count matches the input and every input column survives.
//! 4. Every label some record should receive appears, no label outside the
//!    rule vocabulary plus the default appears, and any explicit per-label
//!    counts match.
//!
//! Checks 1 and 2 stop validation on failure. Past them, every failed check
//! is reported so one repair round can address all of them.

mod checks;
mod expectations;

use rulesmith_ingest::value_counts;
use rulesmith_model::{ExecutionResult, FailureReason, ValidationReport};
use tracing::{debug, info, warn};

pub use expectations::Expectations;

/// Validate one execution against `expectations`.
pub fn validate(
    execution: &ExecutionResult,
    expectations: &Expectations,
    original_row_count: usize,
) -> ValidationReport {
    if !execution.succeeded() {
        return ValidationReport::failed(FailureReason::ExecutionNotSuccessful);
    }

    let df = match checks::artifact::check(execution.produced_artifact_path.as_deref()) {
        Ok(df) => df,
        Err(failure) => {
            warn!(%failure, "output artifact rejected");
            return ValidationReport::failed(failure);
        }
    };
    debug!(rows = df.height(), columns = df.width(), "parsed output artifact");

    if let Some(failure) = checks::status::check(&df, &expectations.status_column) {
        warn!(%failure, "label column rejected");
        return ValidationReport {
            observed_row_count: Some(df.height()),
            ..ValidationReport::failed(failure)
        };
    }

    let distribution = df
        .column(&expectations.status_column)
        .map(value_counts)
        .unwrap_or_default();

    let mut failures = checks::shape::check(&df, original_row_count, &expectations.input_columns);
    failures.extend(checks::labels::check(&distribution, expectations));

    let report = ValidationReport {
        passed: failures.is_empty(),
        failures,
        observed_row_count: Some(df.height()),
        observed_label_distribution: distribution,
    };
    if report.passed {
        info!(rows = df.height(), "output passed validation");
    } else {
        warn!(codes = ?report.failure_codes(), "output failed validation");
    }
    report
}
