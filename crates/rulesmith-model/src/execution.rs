//! Outcome of running one candidate program in the sandbox.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Captured result of a single sandboxed execution. Never mutated once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// `None` when the process was killed by a signal or the timeout.
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub wall_time: Duration,
    pub timed_out: bool,
    /// Whether stdout contained the completion marker.
    pub completion_marker_seen: bool,
    /// Output artifact, only reported for a successful run.
    pub produced_artifact_path: Option<PathBuf>,
}

impl ExecutionResult {
    /// Clean exit, no timeout, marker printed.
    pub fn succeeded(&self) -> bool {
        self.exit_code == Some(0) && !self.timed_out && self.completion_marker_seen
    }

    /// Feedback handed to the synthesizer after a failed execution.
    pub fn failure_diagnostics(&self) -> String {
        if self.timed_out {
            return format!(
                "TimeoutError: program execution exceeded {:.1} seconds and was terminated.",
                self.wall_time.as_secs_f64()
            );
        }
        let stderr = self.stderr.trim();
        let mut out = String::new();
        match self.exit_code {
            Some(code) if code != 0 => out.push_str(&format!("Process exited with code {code}.")),
            Some(_) => out.push_str(
                "Process exited with code 0 but did not print the completion marker.",
            ),
            None => out.push_str("Process was terminated by a signal."),
        }
        if stderr.is_empty() {
            let stdout = self.stdout.trim();
            if stdout.is_empty() {
                out.push_str("\nNo stderr and no stdout were produced.");
            } else {
                out.push_str(&format!("\nNo stderr. stdout:\n{stdout}"));
            }
        } else {
            out.push_str(&format!("\nstderr:\n{stderr}"));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(exit_code: Option<i32>, marker: bool) -> ExecutionResult {
        ExecutionResult {
            exit_code,
            stdout: String::new(),
            stderr: String::new(),
            wall_time: Duration::from_millis(5),
            timed_out: false,
            completion_marker_seen: marker,
            produced_artifact_path: None,
        }
    }

    #[test]
    fn success_requires_zero_exit_and_marker() {
        assert!(result(Some(0), true).succeeded());
        assert!(!result(Some(0), false).succeeded());
        assert!(!result(Some(1), true).succeeded());
        assert!(!result(None, true).succeeded());
    }

    #[test]
    fn diagnostics_prefer_stderr_verbatim() {
        let mut failed = result(Some(1), false);
        failed.stderr = "KeyError: 'Profit'\n".to_string();
        let text = failed.failure_diagnostics();
        assert!(text.contains("exited with code 1"));
        assert!(text.ends_with("KeyError: 'Profit'"));
    }

    #[test]
    fn diagnostics_report_timeout() {
        let mut slow = result(None, false);
        slow.timed_out = true;
        slow.wall_time = Duration::from_secs(30);
        assert!(slow.failure_diagnostics().starts_with("TimeoutError"));
    }
}
