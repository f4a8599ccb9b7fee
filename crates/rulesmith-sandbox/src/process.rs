//! Child-process sandbox.

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::mpsc::{self, Receiver};
use std::thread;
use std::time::{Duration, Instant};

use tempfile::TempDir;
use tracing::{debug, info, warn};

use rulesmith_model::{CandidateProgram, ExecutionResult};

use crate::error::{Result, SandboxError};
use crate::runtime::{SandboxLimits, SandboxRuntime};

/// How often a running child is polled for exit.
const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// How long to wait for pipe readers after the child is gone.
const READER_GRACE: Duration = Duration::from_secs(2);

const INPUT_FILE: &str = "input.csv";
const OUTPUT_FILE: &str = "output.csv";

/// Runs one candidate program against one input.
pub trait Executor {
    fn execute(&mut self, program: &CandidateProgram, input: &Path) -> Result<ExecutionResult>;
}

/// Executes programs as child processes, each in a fresh working directory
/// holding only the program and a copy of the input.
///
/// The child starts with an empty environment apart from the runtime's
/// passthrough list, `HOME` pointing at the working directory, and
/// `RULESMITH_INPUT` / `RULESMITH_OUTPUT`.
pub struct ProcessSandbox {
    runtime: SandboxRuntime,
    limits: SandboxLimits,
    work_root: PathBuf,
    runs: u32,
    _scratch: Option<TempDir>,
}

impl ProcessSandbox {
    /// Sandbox whose working directories live in a private temporary directory.
    pub fn new(runtime: SandboxRuntime, limits: SandboxLimits) -> Result<Self> {
        let scratch = tempfile::Builder::new()
            .prefix("rulesmith-sandbox-")
            .tempdir()
            .map_err(|source| SandboxError::Workdir {
                path: std::env::temp_dir(),
                source,
            })?;
        let work_root = scratch.path().to_path_buf();
        Self::build(runtime, limits, work_root, Some(scratch))
    }

    /// Sandbox whose working directories are kept under `work_root`.
    ///
    /// Each sandbox claims its own `session-*` directory there, so several
    /// sandboxes can share one `work_root`.
    pub fn with_work_root(
        runtime: SandboxRuntime,
        limits: SandboxLimits,
        work_root: &Path,
    ) -> Result<Self> {
        let workdir_error = |source| SandboxError::Workdir {
            path: work_root.to_path_buf(),
            source,
        };
        fs::create_dir_all(work_root).map_err(workdir_error)?;
        let session = tempfile::Builder::new()
            .prefix("session-")
            .tempdir_in(work_root)
            .map_err(workdir_error)?
            .keep();
        debug!(session = %session.display(), "sandbox session directory");
        Self::build(runtime, limits, session, None)
    }

    fn build(
        runtime: SandboxRuntime,
        limits: SandboxLimits,
        work_root: PathBuf,
        scratch: Option<TempDir>,
    ) -> Result<Self> {
        if runtime.command.is_empty() {
            return Err(SandboxError::EmptyCommand);
        }
        Ok(Self {
            runtime,
            limits,
            work_root,
            runs: 0,
            _scratch: scratch,
        })
    }

    fn fresh_workdir(&mut self, attempt: u32) -> Result<PathBuf> {
        self.runs += 1;
        let dir = self
            .work_root
            .join(format!("run-{:03}-attempt-{attempt}", self.runs));
        fs::create_dir(&dir).map_err(|source| SandboxError::Workdir {
            path: dir.clone(),
            source,
        })?;
        // Absolute paths survive the child's changed working directory.
        fs::canonicalize(&dir).map_err(|source| SandboxError::Workdir { path: dir, source })
    }
}

impl Executor for ProcessSandbox {
    fn execute(&mut self, program: &CandidateProgram, input: &Path) -> Result<ExecutionResult> {
        let workdir = self.fresh_workdir(program.attempt_number)?;
        let program_path = workdir.join(&self.runtime.program_file);
        let input_path = workdir.join(INPUT_FILE);
        let output_path = workdir.join(OUTPUT_FILE);

        fs::copy(input, &input_path).map_err(|source| SandboxError::StageInput {
            path: input.to_path_buf(),
            source,
        })?;
        fs::write(&program_path, &program.source_text).map_err(|source| {
            SandboxError::WriteProgram {
                path: program_path.clone(),
                source,
            }
        })?;

        let argv = self
            .runtime
            .render(&program_path, &input_path, &output_path, &workdir);
        let (executable, args) = argv.split_first().ok_or(SandboxError::EmptyCommand)?;

        let mut command = Command::new(executable);
        command
            .args(args)
            .current_dir(&workdir)
            .env_clear()
            .env("HOME", &workdir)
            .env("RULESMITH_INPUT", &input_path)
            .env("RULESMITH_OUTPUT", &output_path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        for name in &self.runtime.env_passthrough {
            if let Some(value) = std::env::var_os(name) {
                command.env(name, value);
            }
        }

        debug!(
            attempt = program.attempt_number,
            command = ?argv,
            workdir = %workdir.display(),
            "spawning sandboxed program"
        );

        let started = Instant::now();
        let mut child = command.spawn().map_err(|source| SandboxError::Spawn {
            program: executable.clone(),
            source,
        })?;
        let stdout_rx = capture(child.stdout.take(), self.limits.output_limit_bytes);
        let stderr_rx = capture(child.stderr.take(), self.limits.output_limit_bytes);

        let (exit_code, timed_out) = loop {
            match child.try_wait().map_err(|source| SandboxError::Wait { source })? {
                Some(status) => break (status.code(), false),
                None if started.elapsed() >= self.limits.timeout => {
                    if let Err(error) = child.kill() {
                        warn!(%error, "failed to kill timed out program");
                    }
                    let _ = child.wait();
                    break (None, true);
                }
                None => thread::sleep(POLL_INTERVAL),
            }
        };
        let wall_time = started.elapsed();

        let stdout = stdout_rx.recv_timeout(READER_GRACE).unwrap_or_default();
        let stderr = stderr_rx.recv_timeout(READER_GRACE).unwrap_or_default();
        let completion_marker_seen = stdout
            .lines()
            .any(|line| line.trim() == self.limits.completion_marker);

        let mut result = ExecutionResult {
            exit_code,
            stdout,
            stderr,
            wall_time,
            timed_out,
            completion_marker_seen,
            produced_artifact_path: None,
        };
        if result.succeeded() {
            result.produced_artifact_path = Some(output_path);
        }

        if timed_out {
            warn!(
                attempt = program.attempt_number,
                timeout_secs = self.limits.timeout.as_secs_f64(),
                "program timed out and was killed"
            );
        } else {
            info!(
                attempt = program.attempt_number,
                exit_code = ?result.exit_code,
                marker = result.completion_marker_seen,
                wall_ms = wall_time.as_millis() as u64,
                "program finished"
            );
        }
        Ok(result)
    }
}

/// Drain a child pipe on its own thread.
///
/// Keeps the first and last `limit / 2` bytes so the completion marker on
/// the final line survives a noisy program.
fn capture<R: Read + Send + 'static>(stream: Option<R>, limit: usize) -> Receiver<String> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let Some(mut stream) = stream else {
            let _ = tx.send(String::new());
            return;
        };
        let head_cap = limit / 2;
        let tail_cap = limit - head_cap;
        let mut head = Vec::new();
        let mut tail = Vec::new();
        let mut truncated = false;
        let mut buf = [0u8; 8192];
        loop {
            match stream.read(&mut buf) {
                Ok(0) | Err(_) => break,
                Ok(n) => {
                    let chunk = &buf[..n];
                    let to_head = head_cap.saturating_sub(head.len()).min(n);
                    head.extend_from_slice(&chunk[..to_head]);
                    tail.extend_from_slice(&chunk[to_head..]);
                    if tail.len() > tail_cap {
                        let excess = tail.len() - tail_cap;
                        tail.drain(..excess);
                        truncated = true;
                    }
                }
            }
        }
        let mut text = String::from_utf8_lossy(&head).into_owned();
        if truncated {
            text.push_str("\n[... output truncated ...]\n");
        }
        text.push_str(&String::from_utf8_lossy(&tail));
        let _ = tx.send(text);
    });
    rx
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capture_keeps_head_and_tail() {
        let mut data = "a".repeat(10_000);
        data.push_str("\nPROCESS_COMPLETE\n");
        let rx = capture(Some(std::io::Cursor::new(data.into_bytes())), 256);
        let text = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert!(text.starts_with("aaaa"));
        assert!(text.contains("[... output truncated ...]"));
        assert!(text.lines().any(|line| line == "PROCESS_COMPLETE"));
        assert!(text.len() < 400);
    }

    #[test]
    fn capture_small_output_verbatim() {
        let rx = capture(Some(std::io::Cursor::new(b"hello\n".to_vec())), 256);
        assert_eq!(rx.recv_timeout(Duration::from_secs(5)).unwrap(), "hello\n");
    }
}
