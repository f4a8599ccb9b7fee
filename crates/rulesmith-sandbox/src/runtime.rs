//! How a program file is turned into a process.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default wall-clock limit for one execution.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Line a program prints on stdout once its output is written.
pub const DEFAULT_COMPLETION_MARKER: &str = "PROCESS_COMPLETE";

/// Per-stream capture limit.
pub const DEFAULT_OUTPUT_LIMIT_BYTES: usize = 256 * 1024;

/// Command template plus the file name the program is written to.
///
/// Each `command` element may contain `{program}`, `{input}`, `{output}`,
/// and `{workdir}`, which are replaced with absolute paths inside the
/// attempt's working directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SandboxRuntime {
    pub command: Vec<String>,
    pub program_file: String,
    /// Host environment variables copied into the otherwise empty child environment.
    #[serde(default = "default_passthrough")]
    pub env_passthrough: Vec<String>,
}

fn default_passthrough() -> Vec<String> {
    ["PATH", "LANG", "LC_ALL", "TZ", "SYSTEMROOT"]
        .iter()
        .map(|name| (*name).to_string())
        .collect()
}

impl SandboxRuntime {
    pub fn new(command: Vec<String>, program_file: impl Into<String>) -> Self {
        Self {
            command,
            program_file: program_file.into(),
            env_passthrough: default_passthrough(),
        }
    }

    /// `python3 <program> <input> <output>`.
    pub fn python() -> Self {
        Self::new(
            ["python3", "{program}", "{input}", "{output}"]
                .iter()
                .map(|part| (*part).to_string())
                .collect(),
            "candidate.py",
        )
    }

    /// Label plans run through `<executable> apply`.
    pub fn plan(executable: &Path) -> Self {
        Self::new(
            vec![
                executable.display().to_string(),
                "apply".to_string(),
                "{program}".to_string(),
                "{input}".to_string(),
                "{output}".to_string(),
            ],
            "candidate.plan.json",
        )
    }

    pub(crate) fn render(
        &self,
        program: &Path,
        input: &Path,
        output: &Path,
        workdir: &Path,
    ) -> Vec<String> {
        self.command
            .iter()
            .map(|part| {
                part.replace("{program}", &program.display().to_string())
                    .replace("{input}", &input.display().to_string())
                    .replace("{output}", &output.display().to_string())
                    .replace("{workdir}", &workdir.display().to_string())
            })
            .collect()
    }
}

/// Limits applied to every execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SandboxLimits {
    pub timeout: Duration,
    pub completion_marker: String,
    pub output_limit_bytes: usize,
}

impl Default for SandboxLimits {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            completion_marker: DEFAULT_COMPLETION_MARKER.to_string(),
            output_limit_bytes: DEFAULT_OUTPUT_LIMIT_BYTES,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholders_are_substituted() {
        let runtime = SandboxRuntime::python();
        let argv = runtime.render(
            Path::new("/w/candidate.py"),
            Path::new("/w/input.csv"),
            Path::new("/w/output.csv"),
            Path::new("/w"),
        );
        assert_eq!(argv, vec!["python3", "/w/candidate.py", "/w/input.csv", "/w/output.csv"]);
    }

    #[test]
    fn plan_runtime_calls_apply() {
        let runtime = SandboxRuntime::plan(Path::new("/usr/bin/rulesmith"));
        assert_eq!(runtime.command[0], "/usr/bin/rulesmith");
        assert_eq!(runtime.command[1], "apply");
        assert_eq!(runtime.program_file, "candidate.plan.json");
        assert!(runtime.env_passthrough.contains(&"PATH".to_string()));
    }
}
