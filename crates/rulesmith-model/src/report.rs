//! Validation report types.
//!
//! Each [`FailureReason`] variant carries only the data it needs; the stable
//! snake_case [`FailureReason::code`] is what operators and tests match on.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// A single failed validation check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum FailureReason {
    /// Validation was requested for a run that did not succeed.
    ExecutionNotSuccessful,
    /// The program reported success but no output file exists.
    ArtifactMissing { path: Option<PathBuf> },
    /// The output file could not be parsed as a table.
    ArtifactUnreadable { path: PathBuf, message: String },
    /// The label column is absent.
    StatusColumnMissing { column: String },
    /// The label column has null or blank cells.
    StatusColumnIncomplete { column: String, missing_count: u64 },
    /// Output row count differs from input row count.
    RowCountMismatch { expected: usize, observed: usize },
    /// Input columns dropped from the output.
    ColumnsMissing { columns: Vec<String> },
    /// A label some input record should receive never appears.
    LabelNeverAssigned { label: String },
    /// Labels outside the rule vocabulary plus the default label.
    UnknownLabels { labels: Vec<String> },
    /// Explicit per-label count expectation not met.
    LabelCountMismatch {
        label: String,
        expected: u64,
        observed: u64,
    },
}

impl FailureReason {
    pub fn code(&self) -> &'static str {
        match self {
            Self::ExecutionNotSuccessful => "execution_not_successful",
            Self::ArtifactMissing { .. } => "artifact_missing",
            Self::ArtifactUnreadable { .. } => "artifact_unreadable",
            Self::StatusColumnMissing { .. } => "status_column_missing",
            Self::StatusColumnIncomplete { .. } => "status_column_incomplete",
            Self::RowCountMismatch { .. } => "row_count_mismatch",
            Self::ColumnsMissing { .. } => "columns_missing",
            Self::LabelNeverAssigned { .. } => "label_never_assigned",
            Self::UnknownLabels { .. } => "unknown_labels",
            Self::LabelCountMismatch { .. } => "label_count_mismatch",
        }
    }

    /// Checks 1 and 2 stop validation on failure.
    pub fn is_hard(&self) -> bool {
        matches!(
            self,
            Self::ExecutionNotSuccessful
                | Self::ArtifactMissing { .. }
                | Self::ArtifactUnreadable { .. }
                | Self::StatusColumnMissing { .. }
                | Self::StatusColumnIncomplete { .. }
        )
    }

    pub fn message(&self) -> String {
        match self {
            Self::ExecutionNotSuccessful => {
                "execution did not succeed; output was not inspected".to_string()
            }
            Self::ArtifactMissing { path: Some(path) } => {
                format!("output file {} was not written", path.display())
            }
            Self::ArtifactMissing { path: None } => "no output file was produced".to_string(),
            Self::ArtifactUnreadable { path, message } => {
                format!("output file {} is not a readable table: {message}", path.display())
            }
            Self::StatusColumnMissing { column } => {
                format!("'{column}' column missing from output")
            }
            Self::StatusColumnIncomplete {
                column,
                missing_count,
            } => format!("{missing_count} rows have an empty '{column}' value"),
            Self::RowCountMismatch { expected, observed } => format!(
                "output has {observed} rows but input has {expected}; \
                 rows must never be dropped or duplicated"
            ),
            Self::ColumnsMissing { columns } => {
                format!("input columns missing from output: {}", columns.join(", "))
            }
            Self::LabelNeverAssigned { label } => format!(
                "label '{label}' never assigned although some input records satisfy its rule"
            ),
            Self::UnknownLabels { labels } => format!(
                "labels not produced by any rule or the default: {}",
                labels.join(", ")
            ),
            Self::LabelCountMismatch {
                label,
                expected,
                observed,
            } => format!("{label}: expected {expected}, got {observed}"),
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code(), self.message())
    }
}

/// Result of validating one execution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub passed: bool,
    pub failures: Vec<FailureReason>,
    pub observed_row_count: Option<usize>,
    pub observed_label_distribution: BTreeMap<String, u64>,
}

impl ValidationReport {
    pub fn failed(failure: FailureReason) -> Self {
        Self {
            passed: false,
            failures: vec![failure],
            ..Self::default()
        }
    }

    pub fn failure_codes(&self) -> Vec<&'static str> {
        self.failures.iter().map(FailureReason::code).collect()
    }

    pub fn has_failure(&self, code: &str) -> bool {
        self.failures.iter().any(|failure| failure.code() == code)
    }

    /// Multi-line report used both for operators and as repair diagnostics.
    pub fn render(&self) -> String {
        let mut lines = Vec::new();
        lines.push(if self.passed {
            "Validation passed.".to_string()
        } else {
            "VALIDATION FAIL:".to_string()
        });
        for failure in &self.failures {
            lines.push(format!("- {failure}"));
        }
        if let Some(rows) = self.observed_row_count {
            lines.push(format!("Total rows: {rows}"));
        }
        if !self.observed_label_distribution.is_empty() {
            lines.push("Label distribution:".to_string());
            for (label, count) in &self.observed_label_distribution {
                lines.push(format!("  {label}: {count}"));
            }
        }
        lines.join("\n")
    }
}
