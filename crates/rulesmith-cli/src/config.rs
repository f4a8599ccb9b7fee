//! `rulesmith.toml` loading and flag precedence.
//!
//! Command-line flags override file values, which override built-in
//! defaults. Every file table is optional.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use rulesmith_engine::EngineConfig;
use rulesmith_model::{ProgramLanguage, TieBreakPolicy};
use rulesmith_sandbox::SandboxRuntime;
use rulesmith_synth::ChatConfig;

/// Which synthesizer produces candidate programs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SynthesizerKind {
    #[default]
    Plan,
    Chat,
}

impl SynthesizerKind {
    pub fn language(&self) -> ProgramLanguage {
        match self {
            Self::Plan => ProgramLanguage::LabelPlan,
            Self::Chat => ProgramLanguage::Python,
        }
    }
}

/// Contents of a config file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub engine: EngineSection,
    pub synthesizer: SynthesizerSection,
    /// Replaces the runtime chosen for the synthesizer's language.
    pub sandbox: Option<SandboxRuntime>,
}

/// `[engine]` table.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineSection {
    pub max_attempts: Option<u32>,
    pub timeout_secs: Option<u64>,
    pub status_column: Option<String>,
    pub default_label: Option<String>,
    pub tie_break: Option<TieBreakPolicy>,
    pub completion_marker: Option<String>,
    pub output_limit_bytes: Option<usize>,
    pub strict_counts: Option<bool>,
}

/// `[synthesizer]` table: the kind plus the chat settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SynthesizerSection {
    #[serde(default)]
    pub kind: SynthesizerKind,
    #[serde(flatten)]
    pub chat: ChatConfig,
}

/// Values given on the command line.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub synthesizer: Option<SynthesizerKind>,
    pub max_attempts: Option<u32>,
    pub timeout_secs: Option<u64>,
    pub tie_break: Option<TieBreakPolicy>,
    pub status_column: Option<String>,
    pub default_label: Option<String>,
    pub strict_counts: bool,
    pub force: bool,
}

/// Fully resolved settings for one command.
#[derive(Debug, Clone)]
pub struct Settings {
    pub engine: EngineConfig,
    pub synthesizer: SynthesizerKind,
    pub chat: ChatConfig,
    pub sandbox: Option<SandboxRuntime>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("invalid config {}", path.display()))
    }

    pub fn parse(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Load `path` when given, otherwise start from defaults.
    pub fn load_optional(path: Option<&Path>) -> Result<Self> {
        path.map_or_else(|| Ok(Self::default()), Self::load)
    }

    pub fn resolve(self, overrides: &Overrides) -> Settings {
        let file = self.engine;
        let mut engine = EngineConfig::default();

        if let Some(max_attempts) = overrides.max_attempts.or(file.max_attempts) {
            engine.max_attempts = max_attempts;
        }
        if let Some(secs) = overrides.timeout_secs.or(file.timeout_secs) {
            engine.timeout = Duration::from_secs(secs);
        }
        if let Some(policy) = overrides.tie_break.or(file.tie_break) {
            engine.tie_break = policy;
        }
        if let Some(column) = overrides.status_column.clone().or(file.status_column) {
            engine.labels.status_column = column;
        }
        if let Some(label) = overrides.default_label.clone().or(file.default_label) {
            engine.labels.default_label = label;
        }
        if let Some(marker) = file.completion_marker {
            engine.completion_marker = marker;
        }
        if let Some(limit) = file.output_limit_bytes {
            engine.output_limit_bytes = limit;
        }
        engine.strict_counts = overrides.strict_counts || file.strict_counts.unwrap_or(false);
        engine.force = overrides.force;

        Settings {
            engine,
            synthesizer: overrides.synthesizer.unwrap_or(self.synthesizer.kind),
            chat: self.synthesizer.chat,
            sandbox: self.sandbox,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
[engine]
max_attempts = 5
timeout_secs = 10
tie_break = "priority_then_specificity"
default_label = "OK"

[synthesizer]
kind = "chat"
model = "local-coder"
temperature = 0.0

[sandbox]
command = ["python3.12", "{program}", "{input}", "{output}"]
program_file = "candidate.py"
"#;

    #[test]
    fn empty_file_resolves_to_defaults() {
        let settings = FileConfig::parse("").unwrap().resolve(&Overrides::default());
        assert_eq!(settings.engine, EngineConfig::default());
        assert_eq!(settings.synthesizer, SynthesizerKind::Plan);
        assert_eq!(settings.chat, ChatConfig::default());
        assert!(settings.sandbox.is_none());
    }

    #[test]
    fn file_values_override_defaults() {
        let settings = FileConfig::parse(SAMPLE)
            .unwrap()
            .resolve(&Overrides::default());
        assert_eq!(settings.engine.max_attempts, 5);
        assert_eq!(settings.engine.timeout, Duration::from_secs(10));
        assert_eq!(
            settings.engine.tie_break,
            TieBreakPolicy::PriorityThenSpecificity
        );
        assert_eq!(settings.engine.labels.default_label, "OK");
        assert_eq!(settings.engine.labels.status_column, "Status");
        assert_eq!(settings.synthesizer, SynthesizerKind::Chat);
        assert_eq!(settings.chat.model, "local-coder");
        assert_eq!(settings.chat.api_key_env, ChatConfig::default().api_key_env);
        let sandbox = settings.sandbox.unwrap();
        assert_eq!(sandbox.command[0], "python3.12");
        assert!(sandbox.env_passthrough.contains(&"PATH".to_string()));
    }

    #[test]
    fn flags_override_file_values() {
        let overrides = Overrides {
            synthesizer: Some(SynthesizerKind::Plan),
            max_attempts: Some(1),
            default_label: Some("Clear".to_string()),
            force: true,
            ..Overrides::default()
        };
        let settings = FileConfig::parse(SAMPLE).unwrap().resolve(&overrides);
        assert_eq!(settings.engine.max_attempts, 1);
        assert_eq!(settings.engine.timeout, Duration::from_secs(10));
        assert_eq!(settings.engine.labels.default_label, "Clear");
        assert_eq!(settings.synthesizer, SynthesizerKind::Plan);
        assert!(settings.engine.force);
    }

    #[test]
    fn unknown_engine_keys_are_rejected() {
        assert!(FileConfig::parse("[engine]\nmax_attempt = 2\n").is_err());
        assert!(FileConfig::parse("[unknown]\n").is_err());
    }

    #[test]
    fn synthesizer_kind_selects_language() {
        assert_eq!(SynthesizerKind::Plan.language(), ProgramLanguage::LabelPlan);
        assert_eq!(SynthesizerKind::Chat.language(), ProgramLanguage::Python);
    }
}
