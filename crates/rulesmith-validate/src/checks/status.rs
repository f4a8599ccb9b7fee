//! Check 2: the label column is present and fully populated.

use polars::prelude::DataFrame;
use rulesmith_ingest::count_missing;
use rulesmith_model::FailureReason;

pub fn check(df: &DataFrame, status_column: &str) -> Option<FailureReason> {
    let Ok(column) = df.column(status_column) else {
        return Some(FailureReason::StatusColumnMissing {
            column: status_column.to_string(),
        });
    };
    let missing_count = count_missing(column);
    (missing_count > 0).then(|| FailureReason::StatusColumnIncomplete {
        column: status_column.to_string(),
        missing_count,
    })
}
