//! CLI argument definitions for rulesmith.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;
use tracing::level_filters::LevelFilter;

use rulesmith_model::TieBreakPolicy;
use rulesmith_sandbox::DEFAULT_COMPLETION_MARKER;

use rulesmith_cli::config::SynthesizerKind;
use rulesmith_cli::logging::LogFormat;

/// Default location of the verified artifact store.
pub const DEFAULT_STORE: &str = "rulesmith-store";

#[derive(Parser)]
#[command(
    name = "rulesmith",
    version,
    about = "Compile business rules into verified table-labelling programs",
    long_about = "Compile a rule set and a tabular input into a verified labelling program.\n\n\
                  Candidate programs are generated, run in a sandbox, and validated against\n\
                  the input until one passes or the attempt budget is spent. Verified\n\
                  programs are stored by fingerprint and reused on later runs."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Generate, execute, and validate programs until one is verified.
    Compile(CompileArgs),

    /// Re-execute the verified program for a rule set against new data.
    Run(RunArgs),

    /// Apply a label plan to a CSV file (the plan program runtime).
    Apply(ApplyArgs),

    /// Print the schema digest of a CSV file.
    Digest(DigestArgs),

    /// List verified artifacts in a store.
    Artifacts(ArtifactsArgs),
}

/// Options shared by `compile` and `run`.
#[derive(Args)]
pub struct EngineArgs {
    /// Rule set JSON file.
    #[arg(long = "rules", value_name = "FILE")]
    pub rules: PathBuf,

    /// Input CSV file.
    #[arg(long = "input", value_name = "FILE")]
    pub input: PathBuf,

    /// Verified artifact store directory.
    #[arg(long = "store", value_name = "DIR", default_value = DEFAULT_STORE)]
    pub store: PathBuf,

    /// TOML configuration file.
    #[arg(long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Program synthesizer (overrides the config file).
    #[arg(long = "synthesizer", value_enum)]
    pub synthesizer: Option<SynthesizerArg>,

    /// Conflict resolution between overlapping rules.
    #[arg(long = "tie-break", value_enum)]
    pub tie_break: Option<TieBreakArg>,

    /// Name of the label column.
    #[arg(long = "status-column", value_name = "NAME")]
    pub status_column: Option<String>,

    /// Label for records no rule matches.
    #[arg(long = "default-label", value_name = "LABEL")]
    pub default_label: Option<String>,

    /// Wall-clock limit for one program execution.
    #[arg(long = "timeout-secs", value_name = "SECS")]
    pub timeout_secs: Option<u64>,

    /// Keep sandbox working directories under DIR instead of a temp dir.
    #[arg(long = "workdir", value_name = "DIR")]
    pub workdir: Option<PathBuf>,

    /// Write the labelled output CSV to PATH.
    #[arg(long = "output", value_name = "PATH")]
    pub output: Option<PathBuf>,
}

#[derive(Args)]
pub struct CompileArgs {
    #[command(flatten)]
    pub engine: EngineArgs,

    /// Attempt budget.
    #[arg(long = "max-attempts", value_name = "N")]
    pub max_attempts: Option<u32>,

    /// Require the exact label counts of the reference labelling.
    #[arg(long = "strict")]
    pub strict: bool,

    /// JSON object of exact per-label counts the output must match.
    #[arg(long = "expect", value_name = "FILE")]
    pub expect: Option<PathBuf>,

    /// Ignore any stored artifact and replace it on success.
    #[arg(long = "force")]
    pub force: bool,

    /// Copy the verified program to PATH.
    #[arg(long = "emit", value_name = "PATH")]
    pub emit: Option<PathBuf>,
}

#[derive(Args)]
pub struct RunArgs {
    #[command(flatten)]
    pub engine: EngineArgs,
}

#[derive(Args)]
pub struct ApplyArgs {
    /// Label plan JSON file.
    #[arg(value_name = "PLAN")]
    pub plan: PathBuf,

    /// Input CSV file.
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Output CSV file.
    #[arg(value_name = "OUTPUT")]
    pub output: PathBuf,

    /// Line printed on stdout once the output is written.
    #[arg(long = "marker", default_value = DEFAULT_COMPLETION_MARKER)]
    pub marker: String,
}

#[derive(Args)]
pub struct DigestArgs {
    /// Input CSV file.
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,
}

#[derive(Args)]
pub struct ArtifactsArgs {
    /// Verified artifact store directory.
    #[arg(long = "store", value_name = "DIR", default_value = DEFAULT_STORE)]
    pub store: PathBuf,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum SynthesizerArg {
    /// Compile the rules into a label plan; no model call.
    Plan,
    /// Ask a chat model for a Python program.
    Chat,
}

impl From<SynthesizerArg> for SynthesizerKind {
    fn from(arg: SynthesizerArg) -> Self {
        match arg {
            SynthesizerArg::Plan => Self::Plan,
            SynthesizerArg::Chat => Self::Chat,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum TieBreakArg {
    /// Most clauses wins, then lowest priority value.
    SpecificityThenPriority,
    /// Lowest priority value wins, then most clauses.
    PriorityThenSpecificity,
}

impl From<TieBreakArg> for TieBreakPolicy {
    fn from(arg: TieBreakArg) -> Self {
        match arg {
            TieBreakArg::SpecificityThenPriority => Self::SpecificityThenPriority,
            TieBreakArg::PriorityThenSpecificity => Self::PriorityThenSpecificity,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevelArg> for LevelFilter {
    fn from(arg: LogLevelArg) -> Self {
        match arg {
            LogLevelArg::Error => Self::ERROR,
            LogLevelArg::Warn => Self::WARN,
            LogLevelArg::Info => Self::INFO,
            LogLevelArg::Debug => Self::DEBUG,
            LogLevelArg::Trace => Self::TRACE,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}

impl From<LogFormatArg> for LogFormat {
    fn from(arg: LogFormatArg) -> Self {
        match arg {
            LogFormatArg::Pretty => Self::Pretty,
            LogFormatArg::Compact => Self::Compact,
            LogFormatArg::Json => Self::Json,
        }
    }
}
