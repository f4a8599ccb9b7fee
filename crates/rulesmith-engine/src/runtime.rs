//! Re-execution of a verified artifact against full data.

use std::path::{Path, PathBuf};

use tracing::info;

use rulesmith_model::{CandidateProgram, ExecutionResult, ValidationReport, VerifiedArtifact};
use rulesmith_sandbox::Executor;
use rulesmith_validate::{Expectations, validate};

use crate::error::{EngineError, Result};

/// Result of running a verified artifact.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub execution: ExecutionResult,
    pub report: ValidationReport,
    /// Labelled output, inside the sandbox working directory.
    pub output_path: PathBuf,
    /// Rows whose label is not the default.
    pub violations: u64,
}

/// Run `artifact` on `input` through `executor`. No synthesizer is involved.
///
/// The output still goes through structural validation; a verified program
/// that fails here is reported as an error rather than retried.
pub fn run_verified<E: Executor>(
    executor: &mut E,
    artifact: &VerifiedArtifact,
    input: &Path,
    expectations: &Expectations,
    original_row_count: usize,
) -> Result<RunOutcome> {
    let fingerprint = artifact.fingerprint().to_string();
    if !artifact.is_intact() {
        return Err(EngineError::RuntimeFailed {
            fingerprint,
            details: "program text does not match the manifest digest".to_string(),
        });
    }

    let program = CandidateProgram::new(
        artifact.manifest.attempt,
        artifact.manifest.language,
        artifact.source_text.clone(),
    );
    let execution = executor.execute(&program, input)?;
    if !execution.succeeded() {
        return Err(EngineError::RuntimeFailed {
            fingerprint,
            details: execution.failure_diagnostics(),
        });
    }

    let report = validate(&execution, expectations, original_row_count);
    if !report.passed {
        return Err(EngineError::RuntimeFailed {
            fingerprint,
            details: report.render(),
        });
    }
    let output_path = execution
        .produced_artifact_path
        .clone()
        .ok_or_else(|| EngineError::RuntimeFailed {
            fingerprint: fingerprint.clone(),
            details: "no output artifact was produced".to_string(),
        })?;

    let violations: u64 = report
        .observed_label_distribution
        .iter()
        .filter(|(label, _)| **label != expectations.default_label)
        .map(|(_, count)| count)
        .sum();
    info!(
        fingerprint = %artifact.fingerprint().short(),
        rows = report.observed_row_count.unwrap_or_default(),
        violations,
        "verified artifact executed"
    );

    Ok(RunOutcome {
        execution,
        report,
        output_path,
        violations,
    })
}
