use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, info, info_span};

use rulesmith_engine::{
    ArtifactStore, AttemptController, AttemptOutcome, CompileOutcome, CompileRequest,
    EngineError, RunOutcome, derive_expectations, run_verified,
};
use rulesmith_ingest::{build_schema_digest, read_table, write_table};
use rulesmith_model::{
    ArtifactManifest, Fingerprint, ProgramLanguage, RuleSet, SchemaDigest, VerifiedArtifact,
};
use rulesmith_sandbox::{ProcessSandbox, SandboxRuntime};
use rulesmith_synth::{ChatSynthesizer, PlanSynthesizer, Synthesizer};
use rulesmith_transform::{LabelPlan, apply_plan};

use rulesmith_cli::config::{FileConfig, Overrides, Settings, SynthesizerKind};

use crate::cli::{ApplyArgs, ArtifactsArgs, CompileArgs, DigestArgs, EngineArgs, RunArgs};

/// Result of `rulesmith compile`.
pub struct CompileReport {
    pub outcome: CompileOutcome,
    /// Label counts of the verified output shown to the operator.
    pub distribution: BTreeMap<String, u64>,
    pub output: Option<PathBuf>,
    pub emitted: Option<PathBuf>,
}

/// Result of `rulesmith run`.
pub struct RunReport {
    pub fingerprint: Fingerprint,
    pub outcome: RunOutcome,
    pub output: Option<PathBuf>,
}

pub fn run_compile(args: &CompileArgs) -> Result<CompileReport> {
    let overrides = Overrides {
        max_attempts: args.max_attempts,
        strict_counts: args.strict,
        force: args.force,
        ..engine_overrides(&args.engine)
    };
    let settings = load_settings(&args.engine, &overrides)?;
    let rule_set = load_rules(&args.engine.rules)?;
    let df = read_table(&args.engine.input)?;
    let schema = build_schema_digest(&df);

    let mut expectations = derive_expectations(&df, &rule_set, &settings.engine)?;
    if let Some(path) = &args.expect {
        expectations = expectations.with_expected_counts(load_expected_counts(path)?);
    }

    let store = ArtifactStore::open(&args.engine.store)?;
    let mut executor = build_sandbox(
        &settings,
        settings.synthesizer.language(),
        args.engine.workdir.as_deref(),
    )?;

    let outcome = match stored_artifact(&store, &rule_set, &schema, &settings)? {
        Some((fingerprint, artifact)) => {
            info!(
                fingerprint = %fingerprint.short(),
                "verified artifact found; skipping synthesis"
            );
            CompileOutcome::cached(fingerprint, artifact)
        }
        None => {
            let mut synthesizer = build_synthesizer(&settings)?;
            let request = CompileRequest {
                rule_set: &rule_set,
                schema: &schema,
                input: &args.engine.input,
                expectations: &expectations,
                original_row_count: df.height(),
            };
            AttemptController::new(&mut synthesizer, &mut executor, &settings.engine)
                .with_store(&store)
                .run(&request)?
        }
    };

    let mut report = CompileReport {
        distribution: BTreeMap::new(),
        output: None,
        emitted: None,
        outcome,
    };
    let Some(artifact) = report.outcome.artifact.clone() else {
        return Ok(report);
    };

    if let Some(path) = &args.emit {
        write_file(path, &artifact.source_text)?;
        info!(path = %path.display(), "verified program written");
        report.emitted = Some(path.clone());
    }

    let passed = report.outcome.attempts.last().and_then(|record| match &record.outcome {
        AttemptOutcome::Passed { report: validation, .. } => {
            Some(validation.observed_label_distribution.clone())
        }
        _ => None,
    });
    report.distribution = passed.unwrap_or_else(|| artifact.manifest.label_distribution.clone());

    if let Some(target) = &args.engine.output {
        let produced = match report.outcome.output_path.clone() {
            Some(path) => path,
            None => {
                // Cache hit: nothing ran yet, so run the stored program now.
                let run = run_verified(
                    &mut executor,
                    &artifact,
                    &args.engine.input,
                    &expectations,
                    df.height(),
                )?;
                report.distribution = run.report.observed_label_distribution.clone();
                run.output_path
            }
        };
        copy_output(&produced, target)?;
        report.output = Some(target.clone());
    }

    Ok(report)
}

pub fn run_run(args: &RunArgs) -> Result<RunReport> {
    let args = &args.engine;
    let settings = load_settings(args, &engine_overrides(args))?;
    let rule_set = load_rules(&args.rules)?;
    let df = read_table(&args.input)?;
    let schema = build_schema_digest(&df);
    let language = settings.synthesizer.language();

    let fingerprint = fingerprint_for(&rule_set, &schema, &settings)?;
    let span = info_span!("run", fingerprint = %fingerprint.short());
    let _guard = span.enter();

    let store = ArtifactStore::open(&args.store)?;
    let artifact = store
        .lookup(&fingerprint)?
        .ok_or_else(|| EngineError::ArtifactNotFound {
            fingerprint: fingerprint.to_string(),
        })?;

    let expectations = derive_expectations(&df, &rule_set, &settings.engine)?;
    let mut executor = build_sandbox(&settings, language, args.workdir.as_deref())?;
    let outcome = run_verified(&mut executor, &artifact, &args.input, &expectations, df.height())?;

    let output = match &args.output {
        Some(target) => {
            copy_output(&outcome.output_path, target)?;
            Some(target.clone())
        }
        None => None,
    };

    Ok(RunReport {
        fingerprint,
        outcome,
        output,
    })
}

/// Evaluate a label plan; this is the program runtime of the plan synthesizer.
pub fn run_apply(args: &ApplyArgs) -> Result<()> {
    let text = fs::read_to_string(&args.plan)
        .with_context(|| format!("failed to read plan {}", args.plan.display()))?;
    let plan = LabelPlan::from_json(&text)
        .with_context(|| format!("invalid plan {}", args.plan.display()))?;
    let df = read_table(&args.input)?;
    let mut labelled = apply_plan(&df, &plan)?;
    write_table(&mut labelled, &args.output)?;
    println!("{}", args.marker);
    Ok(())
}

pub fn run_digest(args: &DigestArgs) -> Result<String> {
    let df = read_table(&args.input)?;
    Ok(build_schema_digest(&df).render())
}

pub fn run_artifacts(args: &ArtifactsArgs) -> Result<Vec<ArtifactManifest>> {
    let store = ArtifactStore::open(&args.store)?;
    Ok(store.list()?)
}

fn engine_overrides(args: &EngineArgs) -> Overrides {
    Overrides {
        synthesizer: args.synthesizer.map(Into::into),
        timeout_secs: args.timeout_secs,
        tie_break: args.tie_break.map(Into::into),
        status_column: args.status_column.clone(),
        default_label: args.default_label.clone(),
        ..Overrides::default()
    }
}

fn fingerprint_for(
    rule_set: &RuleSet,
    schema: &SchemaDigest,
    settings: &Settings,
) -> Result<Fingerprint> {
    let fingerprint = Fingerprint::compute(
        rule_set,
        schema,
        settings.engine.tie_break,
        &settings.engine.labels,
        settings.synthesizer.language(),
    )
    .map_err(EngineError::Fingerprint)?;
    Ok(fingerprint)
}

/// The intact stored artifact for this compile, unless `--force` is set.
///
/// Checked before any synthesizer is built, so a cache hit needs no model
/// credentials. Store errors are left for the attempt controller to report
/// or repair.
fn stored_artifact(
    store: &ArtifactStore,
    rule_set: &RuleSet,
    schema: &SchemaDigest,
    settings: &Settings,
) -> Result<Option<(Fingerprint, VerifiedArtifact)>> {
    if settings.engine.force {
        return Ok(None);
    }
    let fingerprint = fingerprint_for(rule_set, schema, settings)?;
    match store.lookup(&fingerprint) {
        Ok(Some(artifact)) => Ok(Some((fingerprint, artifact))),
        Ok(None) | Err(_) => Ok(None),
    }
}

fn load_settings(args: &EngineArgs, overrides: &Overrides) -> Result<Settings> {
    let settings = FileConfig::load_optional(args.config.as_deref())?.resolve(overrides);
    debug!(
        synthesizer = ?settings.synthesizer,
        max_attempts = settings.engine.max_attempts,
        timeout_secs = settings.engine.timeout.as_secs(),
        tie_break = %settings.engine.tie_break,
        "resolved settings"
    );
    Ok(settings)
}

fn load_rules(path: &Path) -> Result<RuleSet> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read rule set {}", path.display()))?;
    let rule_set = RuleSet::from_json(&text)
        .with_context(|| format!("invalid rule set {}", path.display()))?;
    rule_set.validate().map_err(EngineError::InvalidRuleSet)?;
    Ok(rule_set)
}

fn load_expected_counts(path: &Path) -> Result<BTreeMap<String, u64>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read expected counts {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| {
        format!(
            "expected counts {} must be a JSON object of label counts",
            path.display()
        )
    })
}

fn build_synthesizer(settings: &Settings) -> Result<Box<dyn Synthesizer>> {
    let synthesizer: Box<dyn Synthesizer> = match settings.synthesizer {
        SynthesizerKind::Plan => Box::new(PlanSynthesizer::new()),
        SynthesizerKind::Chat => Box::new(ChatSynthesizer::from_config(settings.chat.clone())?),
    };
    Ok(synthesizer)
}

/// Runtime for `language`, unless the config file names one explicitly.
fn build_sandbox(
    settings: &Settings,
    language: ProgramLanguage,
    workdir: Option<&Path>,
) -> Result<ProcessSandbox> {
    let runtime = match &settings.sandbox {
        Some(runtime) => runtime.clone(),
        None => default_runtime(language, &settings.engine.completion_marker)?,
    };
    debug!(command = ?runtime.command, "sandbox runtime");
    let limits = settings.engine.sandbox_limits();
    let sandbox = match workdir {
        Some(dir) => ProcessSandbox::with_work_root(runtime, limits, dir)?,
        None => ProcessSandbox::new(runtime, limits)?,
    };
    Ok(sandbox)
}

fn default_runtime(language: ProgramLanguage, marker: &str) -> Result<SandboxRuntime> {
    Ok(match language {
        ProgramLanguage::Python => SandboxRuntime::python(),
        ProgramLanguage::LabelPlan => {
            let executable =
                std::env::current_exe().context("cannot locate the rulesmith executable")?;
            let mut runtime = SandboxRuntime::plan(&executable);
            runtime
                .command
                .extend(["--marker".to_string(), marker.to_string()]);
            runtime
        }
    })
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(path, contents).with_context(|| format!("failed to write {}", path.display()))
}

fn copy_output(produced: &Path, target: &Path) -> Result<()> {
    if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::copy(produced, target).with_context(|| {
        format!(
            "failed to copy output {} to {}",
            produced.display(),
            target.display()
        )
    })?;
    info!(path = %target.display(), "labelled output written");
    Ok(())
}
