//! rulesmith command line.

use std::io::{self, IsTerminal};

use clap::{ColorChoice, Parser};
use rulesmith_cli::logging::{LogConfig, init_logging};
use tracing::level_filters::LevelFilter;

mod cli;
mod commands;
mod summary;

use crate::cli::{Cli, Command};
use crate::commands::{run_apply, run_artifacts, run_compile, run_digest, run_run};
use crate::summary::{print_artifacts, print_compile_summary, print_failure, print_run_summary};

fn main() {
    let cli = Cli::parse();
    cli.color.write_global();
    let log_config = log_config_from_cli(&cli);
    if let Err(error) = init_logging(&log_config) {
        eprintln!("error: failed to initialize logging: {error}");
        std::process::exit(1);
    }
    let result = match &cli.command {
        Command::Compile(args) => run_compile(args).map(|report| {
            print_compile_summary(&report);
            if report.outcome.is_success() {
                0
            } else {
                print_failure(&report.outcome);
                1
            }
        }),
        Command::Run(args) => run_run(args).map(|report| {
            print_run_summary(&report);
            0
        }),
        Command::Apply(args) => run_apply(args).map(|()| 0),
        Command::Digest(args) => run_digest(args).map(|digest| {
            print!("{digest}");
            0
        }),
        Command::Artifacts(args) => run_artifacts(args).map(|manifests| {
            print_artifacts(&manifests);
            0
        }),
    };
    let exit_code = result.unwrap_or_else(|error| {
        eprintln!("error: {error:#}");
        1
    });
    std::process::exit(exit_code);
}

/// Build logging configuration from CLI flags.
///
/// `--log-level` beats `-v`/`-q`; either one disables the `RUST_LOG` override.
fn log_config_from_cli(cli: &Cli) -> LogConfig {
    let explicit = cli.log_level.map(LevelFilter::from);
    let with_ansi = match cli.color.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => cli.log_file.is_none() && io::stderr().is_terminal(),
    };
    LogConfig {
        level_filter: explicit.unwrap_or_else(|| cli.verbosity.tracing_level_filter()),
        use_env_filter: explicit.is_none() && !cli.verbosity.is_present(),
        with_timestamps: cli.log_file.is_some(),
        with_ansi,
        format: cli.log_format.into(),
        log_file: cli.log_file.clone(),
        ..LogConfig::default()
    }
}
