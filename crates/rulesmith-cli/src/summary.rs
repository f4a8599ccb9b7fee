use std::collections::BTreeMap;

use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use rulesmith_engine::{AttemptOutcome, AttemptRecord, CompileOutcome, CompileStatus};
use rulesmith_model::ArtifactManifest;

use crate::commands::{CompileReport, RunReport};

pub fn print_compile_summary(report: &CompileReport) {
    let outcome = &report.outcome;
    println!("Fingerprint: {}", outcome.fingerprint);
    println!("Status: {}", outcome.status_label());
    if !outcome.attempts.is_empty() {
        println!("{}", attempts_table(&outcome.attempts));
    }
    if outcome.status == CompileStatus::Failed {
        return;
    }
    if !report.distribution.is_empty() {
        println!("{}", distribution_table(&report.distribution));
    }
    if let Some(path) = &report.emitted {
        println!("Program: {}", path.display());
    }
    if let Some(path) = &report.output {
        println!("Output: {}", path.display());
    }
}

/// Write the diagnostic trail of a failed compile to stderr.
///
/// The last stderr and validation report are printed verbatim.
pub fn print_failure(outcome: &CompileOutcome) {
    eprintln!(
        "error: no verified program after {} attempts",
        outcome.attempts.len()
    );
    for record in &outcome.attempts {
        eprintln!("  attempt {}: {}", record.attempt, record.summary());
    }
    if let Some(stderr) = outcome.last_stderr().filter(|s| !s.trim().is_empty()) {
        eprintln!("--- last stderr ---");
        eprintln!("{stderr}");
    }
    if let Some(report) = outcome.last_report() {
        eprintln!("--- last validation report ---");
        eprintln!("{}", report.render());
    }
}

pub fn print_run_summary(report: &RunReport) {
    let outcome = &report.outcome;
    println!("Fingerprint: {}", report.fingerprint);
    println!(
        "Rows: {}",
        outcome.report.observed_row_count.unwrap_or_default()
    );
    println!(
        "{}",
        distribution_table(&outcome.report.observed_label_distribution)
    );
    println!("Violations: {}", outcome.violations);
    if let Some(path) = &report.output {
        println!("Output: {}", path.display());
    }
}

pub fn print_artifacts(manifests: &[ArtifactManifest]) {
    if manifests.is_empty() {
        println!("No verified artifacts.");
        return;
    }
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Fingerprint"),
        header_cell("Language"),
        header_cell("Attempt"),
        header_cell("Rules"),
        header_cell("Rows"),
        header_cell("Promoted"),
        header_cell("Labels"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 2, CellAlignment::Right);
    align_column(&mut table, 3, CellAlignment::Right);
    align_column(&mut table, 4, CellAlignment::Right);
    for manifest in manifests {
        let labels: Vec<String> = manifest
            .label_distribution
            .iter()
            .map(|(label, count)| format!("{label}={count}"))
            .collect();
        table.add_row(vec![
            Cell::new(manifest.fingerprint.short()).add_attribute(Attribute::Bold),
            Cell::new(manifest.language.label()),
            Cell::new(manifest.attempt),
            Cell::new(manifest.rule_count),
            Cell::new(manifest.observed_row_count),
            dim_cell(manifest.promoted_at.format("%Y-%m-%d %H:%M:%S")),
            Cell::new(labels.join(", ")),
        ]);
    }
    println!("{table}");
}

fn attempts_table(attempts: &[AttemptRecord]) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Attempt"),
        header_cell("Result"),
        header_cell("Exit"),
        header_cell("Time"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 0, CellAlignment::Right);
    align_column(&mut table, 2, CellAlignment::Right);
    align_column(&mut table, 3, CellAlignment::Right);
    for record in attempts {
        let result = match record.outcome {
            AttemptOutcome::Passed { .. } => Cell::new(record.summary()).fg(Color::Green),
            _ => Cell::new(record.summary()).fg(Color::Red),
        };
        let (exit, time) = match record.execution() {
            Some(execution) => (
                execution
                    .exit_code
                    .map_or_else(|| dim_cell("-"), Cell::new),
                Cell::new(format!("{:.2}s", execution.wall_time.as_secs_f64())),
            ),
            None => (dim_cell("-"), dim_cell("-")),
        };
        table.add_row(vec![Cell::new(record.attempt), result, exit, time]);
    }
    table
}

fn distribution_table(distribution: &BTreeMap<String, u64>) -> Table {
    let total: u64 = distribution.values().sum();
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Label"),
        header_cell("Rows"),
        header_cell("Share"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    align_column(&mut table, 2, CellAlignment::Right);
    for (label, count) in distribution {
        let share = if total == 0 {
            0.0
        } else {
            *count as f64 * 100.0 / total as f64
        };
        table.add_row(vec![
            Cell::new(label),
            count_cell(*count),
            Cell::new(format!("{share:.1}%")),
        ]);
    }
    table
}

fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn count_cell(count: u64) -> Cell {
    if count > 0 {
        Cell::new(count).add_attribute(Attribute::Bold)
    } else {
        dim_cell(count)
    }
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
