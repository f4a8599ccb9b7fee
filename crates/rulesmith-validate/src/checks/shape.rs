//! Check 3: no rows dropped or added, no input columns lost.

use polars::prelude::DataFrame;
use rulesmith_model::FailureReason;

pub fn check(
    df: &DataFrame,
    original_row_count: usize,
    input_columns: &[String],
) -> Vec<FailureReason> {
    let mut failures = Vec::new();
    if df.height() != original_row_count {
        failures.push(FailureReason::RowCountMismatch {
            expected: original_row_count,
            observed: df.height(),
        });
    }
    let missing: Vec<String> = input_columns
        .iter()
        .filter(|name| df.column(name.as_str()).is_err())
        .cloned()
        .collect();
    if !missing.is_empty() {
        failures.push(FailureReason::ColumnsMissing { columns: missing });
    }
    failures
}
