//! The attempt controller: generate, execute, validate, retry.

use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::span::EnteredSpan;
use tracing::{info, info_span, warn};

use rulesmith_model::{
    ArtifactManifest, CandidateProgram, ExecutionResult, Fingerprint, RuleSet, SchemaDigest,
    ValidationReport, VerifiedArtifact, sha256_hex,
};
use rulesmith_sandbox::Executor;
use rulesmith_synth::{GenerationError, PriorAttempt, SynthesisRequest, Synthesizer};
use rulesmith_validate::{Expectations, validate};

use crate::config::EngineConfig;
use crate::error::{EngineError, Result, StoreError};
use crate::fsm::{Event, State, transition};
use crate::store::{ArtifactStore, Promotion};

/// Inputs of one compile run.
#[derive(Debug, Clone, Copy)]
pub struct CompileRequest<'a> {
    pub rule_set: &'a RuleSet,
    pub schema: &'a SchemaDigest,
    /// The full input table handed to every candidate.
    pub input: &'a Path,
    pub expectations: &'a Expectations,
    pub original_row_count: usize,
}

/// What happened in one attempt.
#[derive(Debug, Clone)]
pub enum AttemptOutcome {
    GenerationFailed {
        error: GenerationError,
    },
    ExecutionFailed {
        program: CandidateProgram,
        execution: ExecutionResult,
    },
    ValidationFailed {
        program: CandidateProgram,
        execution: ExecutionResult,
        report: ValidationReport,
    },
    Passed {
        program: CandidateProgram,
        execution: ExecutionResult,
        report: ValidationReport,
    },
}

#[derive(Debug, Clone)]
pub struct AttemptRecord {
    pub attempt: u32,
    pub outcome: AttemptOutcome,
}

impl AttemptRecord {
    /// One-line description for the diagnostic trail.
    pub fn summary(&self) -> String {
        match &self.outcome {
            AttemptOutcome::GenerationFailed { error } => format!("generation failed: {error}"),
            AttemptOutcome::ExecutionFailed { execution, .. } if execution.timed_out => {
                "execution timed out".to_string()
            }
            AttemptOutcome::ExecutionFailed { execution, .. } => match execution.exit_code {
                Some(0) => "execution finished without the completion marker".to_string(),
                Some(code) => format!("execution exited with code {code}"),
                None => "execution was terminated".to_string(),
            },
            AttemptOutcome::ValidationFailed { report, .. } => {
                format!("validation failed: {}", report.failure_codes().join(", "))
            }
            AttemptOutcome::Passed { .. } => "passed validation".to_string(),
        }
    }

    pub fn execution(&self) -> Option<&ExecutionResult> {
        match &self.outcome {
            AttemptOutcome::GenerationFailed { .. } => None,
            AttemptOutcome::ExecutionFailed { execution, .. }
            | AttemptOutcome::ValidationFailed { execution, .. }
            | AttemptOutcome::Passed { execution, .. } => Some(execution),
        }
    }

    pub fn report(&self) -> Option<&ValidationReport> {
        match &self.outcome {
            AttemptOutcome::ValidationFailed { report, .. }
            | AttemptOutcome::Passed { report, .. } => Some(report),
            _ => None,
        }
    }
}

/// Terminal status of a compile run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompileStatus {
    /// A new artifact passed validation.
    Promoted,
    /// A stored artifact was reused without synthesis.
    Cached,
    Failed,
}

#[derive(Debug, Clone)]
pub struct CompileOutcome {
    pub fingerprint: Fingerprint,
    pub status: CompileStatus,
    pub attempts: Vec<AttemptRecord>,
    pub artifact: Option<VerifiedArtifact>,
    /// Validated output of the promoting attempt, inside the sandbox.
    pub output_path: Option<PathBuf>,
}

impl CompileOutcome {
    /// Outcome of reusing a stored artifact without synthesis.
    pub fn cached(fingerprint: Fingerprint, artifact: VerifiedArtifact) -> Self {
        Self {
            fingerprint,
            status: CompileStatus::Cached,
            attempts: Vec::new(),
            artifact: Some(artifact),
            output_path: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status != CompileStatus::Failed
    }

    /// `promoted`, `cached`, or `failed-after-N-attempts`.
    pub fn status_label(&self) -> String {
        match self.status {
            CompileStatus::Promoted => "promoted".to_string(),
            CompileStatus::Cached => "cached".to_string(),
            CompileStatus::Failed => format!("failed-after-{}-attempts", self.attempts.len()),
        }
    }

    /// Stderr of the most recent execution.
    pub fn last_stderr(&self) -> Option<&str> {
        self.attempts
            .iter()
            .rev()
            .find_map(AttemptRecord::execution)
            .map(|execution| execution.stderr.as_str())
    }

    /// The most recent validation report.
    pub fn last_report(&self) -> Option<&ValidationReport> {
        self.attempts.iter().rev().find_map(AttemptRecord::report)
    }
}

/// Runs the generate/execute/validate loop for one rule set and schema.
pub struct AttemptController<'a, S: Synthesizer, E: Executor> {
    synthesizer: &'a mut S,
    executor: &'a mut E,
    store: Option<&'a ArtifactStore>,
    config: &'a EngineConfig,
}

impl<'a, S: Synthesizer, E: Executor> AttemptController<'a, S, E> {
    pub fn new(synthesizer: &'a mut S, executor: &'a mut E, config: &'a EngineConfig) -> Self {
        Self {
            synthesizer,
            executor,
            store: None,
            config,
        }
    }

    /// Reuse and persist verified artifacts through `store`.
    pub fn with_store(mut self, store: &'a ArtifactStore) -> Self {
        self.store = Some(store);
        self
    }

    pub fn fingerprint(&self, request: &CompileRequest<'_>) -> Result<Fingerprint> {
        Fingerprint::compute(
            request.rule_set,
            request.schema,
            self.config.tie_break,
            &self.config.labels,
            self.synthesizer.language(),
        )
        .map_err(EngineError::Fingerprint)
    }

    pub fn run(&mut self, request: &CompileRequest<'_>) -> Result<CompileOutcome> {
        request
            .rule_set
            .validate()
            .map_err(EngineError::InvalidRuleSet)?;
        let fingerprint = self.fingerprint(request)?;
        let span = info_span!("compile", fingerprint = %fingerprint.short());
        let _guard = span.enter();

        let mut replace = self.config.force;
        if let Some(store) = self.store.filter(|_| !self.config.force) {
            match store.lookup(&fingerprint) {
                Ok(Some(artifact)) => {
                    info!("verified artifact found; skipping synthesis");
                    return Ok(CompileOutcome::cached(fingerprint, artifact));
                }
                Ok(None) => {}
                Err(StoreError::Corrupt { path, reason }) => {
                    warn!(
                        path = %path.display(),
                        %reason,
                        "stored artifact is corrupt; recompiling"
                    );
                    replace = true;
                }
                Err(error) => return Err(error.into()),
            }
        }

        let max_attempts = self.config.max_attempts.max(1);
        let mut state = State::Generate;
        let mut attempt = 0u32;
        let mut prior: Option<PriorAttempt> = None;
        let mut candidate: Option<CandidateProgram> = None;
        let mut execution: Option<ExecutionResult> = None;
        let mut records: Vec<AttemptRecord> = Vec::new();
        let mut attempt_span: Option<EnteredSpan> = None;

        loop {
            let event = match state {
                State::Generate => {
                    attempt += 1;
                    drop(attempt_span.take());
                    attempt_span = Some(info_span!("attempt", number = attempt).entered());
                    info!(attempt, max_attempts, "generating candidate program");
                    let synthesis = SynthesisRequest {
                        attempt_number: attempt,
                        rule_set: request.rule_set,
                        schema: request.schema,
                        policy: self.config.tie_break,
                        labels: &self.config.labels,
                        completion_marker: &self.config.completion_marker,
                        prior: prior.as_ref(),
                    };
                    match self.synthesizer.synthesize(&synthesis) {
                        Ok(program) => {
                            candidate = Some(program);
                            Event::Generated
                        }
                        Err(error) => {
                            warn!(attempt, %error, "generation failed");
                            records.push(AttemptRecord {
                                attempt,
                                outcome: AttemptOutcome::GenerationFailed { error },
                            });
                            Event::GenerationFailed
                        }
                    }
                }
                State::Execute => {
                    let program = candidate.take().ok_or(EngineError::InvalidTransition {
                        state,
                        event: Event::Generated,
                    })?;
                    let result = self.executor.execute(&program, request.input)?;
                    if result.succeeded() {
                        candidate = Some(program);
                        execution = Some(result);
                        Event::ExecutionSucceeded
                    } else {
                        warn!(
                            attempt,
                            exit_code = ?result.exit_code,
                            timed_out = result.timed_out,
                            "execution failed"
                        );
                        prior = Some(PriorAttempt {
                            source_text: program.source_text.clone(),
                            diagnostics: result.failure_diagnostics(),
                        });
                        records.push(AttemptRecord {
                            attempt,
                            outcome: AttemptOutcome::ExecutionFailed {
                                program,
                                execution: result,
                            },
                        });
                        Event::ExecutionFailed
                    }
                }
                State::Validate => {
                    let (Some(program), Some(result)) = (candidate.take(), execution.take()) else {
                        return Err(EngineError::InvalidTransition {
                            state,
                            event: Event::ExecutionSucceeded,
                        });
                    };
                    let report =
                        validate(&result, request.expectations, request.original_row_count);
                    if report.passed {
                        records.push(AttemptRecord {
                            attempt,
                            outcome: AttemptOutcome::Passed {
                                program,
                                execution: result,
                                report,
                            },
                        });
                        Event::ValidationPassed
                    } else {
                        prior = Some(PriorAttempt {
                            source_text: program.source_text.clone(),
                            diagnostics: report.render(),
                        });
                        records.push(AttemptRecord {
                            attempt,
                            outcome: AttemptOutcome::ValidationFailed {
                                program,
                                execution: result,
                                report,
                            },
                        });
                        Event::ValidationFailed
                    }
                }
                State::Promote => {
                    return self.promote(request, fingerprint, records, replace);
                }
                State::Fail => {
                    warn!(attempts = records.len(), "attempt budget exhausted");
                    return Ok(CompileOutcome {
                        fingerprint,
                        status: CompileStatus::Failed,
                        attempts: records,
                        artifact: None,
                        output_path: None,
                    });
                }
            };
            state = transition(state, event, attempt, max_attempts)
                .ok_or(EngineError::InvalidTransition { state, event })?;
        }
    }

    fn promote(
        &self,
        request: &CompileRequest<'_>,
        fingerprint: Fingerprint,
        records: Vec<AttemptRecord>,
        replace: bool,
    ) -> Result<CompileOutcome> {
        let Some(AttemptRecord {
            attempt,
            outcome:
                AttemptOutcome::Passed {
                    program,
                    execution,
                    report,
                },
        }) = records.last()
        else {
            return Err(EngineError::InvalidTransition {
                state: State::Validate,
                event: Event::ValidationPassed,
            });
        };

        let mut artifact = VerifiedArtifact {
            manifest: ArtifactManifest {
                fingerprint: fingerprint.clone(),
                language: program.language,
                attempt: *attempt,
                source_sha256: sha256_hex(program.source_text.as_bytes()),
                promoted_at: Utc::now(),
                rule_count: request.rule_set.len(),
                observed_row_count: report.observed_row_count.unwrap_or_default(),
                label_distribution: report.observed_label_distribution.clone(),
            },
            source_text: program.source_text.clone(),
        };
        let output_path = execution.produced_artifact_path.clone();

        if let Some(store) = self.store {
            if let Promotion::AlreadyPresent(existing) = store.promote(&artifact, replace)? {
                info!("another run promoted this fingerprint first; keeping its artifact");
                artifact = *existing;
            }
        }
        info!(attempt, "candidate promoted");

        Ok(CompileOutcome {
            fingerprint,
            status: CompileStatus::Promoted,
            attempts: records,
            artifact: Some(artifact),
            output_path,
        })
    }
}
