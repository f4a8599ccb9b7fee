//! Check 1: the output artifact exists and parses as a table.

use std::path::Path;

use polars::prelude::DataFrame;
use rulesmith_ingest::read_table;
use rulesmith_model::FailureReason;

pub fn check(path: Option<&Path>) -> Result<DataFrame, FailureReason> {
    let Some(path) = path else {
        return Err(FailureReason::ArtifactMissing { path: None });
    };
    if !path.is_file() {
        return Err(FailureReason::ArtifactMissing {
            path: Some(path.to_path_buf()),
        });
    }
    read_table(path).map_err(|e| FailureReason::ArtifactUnreadable {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}
