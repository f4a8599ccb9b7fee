//! Engine settings.

use std::time::Duration;

use rulesmith_model::{LabelConfig, TieBreakPolicy};
use rulesmith_sandbox::{
    DEFAULT_COMPLETION_MARKER, DEFAULT_OUTPUT_LIMIT_BYTES, DEFAULT_TIMEOUT, SandboxLimits,
};

/// Default attempt budget.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Generation calls allowed before terminal failure.
    pub max_attempts: u32,
    pub timeout: Duration,
    pub labels: LabelConfig,
    pub tie_break: TieBreakPolicy,
    pub completion_marker: String,
    pub output_limit_bytes: usize,
    /// Expect the exact label counts of the reference labelling.
    pub strict_counts: bool,
    /// Skip the cache and replace any stored artifact on success.
    pub force: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            timeout: DEFAULT_TIMEOUT,
            labels: LabelConfig::default(),
            tie_break: TieBreakPolicy::default(),
            completion_marker: DEFAULT_COMPLETION_MARKER.to_string(),
            output_limit_bytes: DEFAULT_OUTPUT_LIMIT_BYTES,
            strict_counts: false,
            force: false,
        }
    }
}

impl EngineConfig {
    pub fn sandbox_limits(&self) -> SandboxLimits {
        SandboxLimits {
            timeout: self.timeout,
            completion_marker: self.completion_marker.clone(),
            output_limit_bytes: self.output_limit_bytes,
        }
    }
}
