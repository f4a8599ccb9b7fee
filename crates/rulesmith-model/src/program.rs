//! Candidate programs produced by a synthesizer.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Source language of a candidate program; selects the sandbox runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgramLanguage {
    /// Python script using pandas, as written by a chat model.
    Python,
    /// Declarative label plan executed by `rulesmith apply`.
    LabelPlan,
}

impl ProgramLanguage {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Python => "python",
            Self::LabelPlan => "label_plan",
        }
    }

    /// File name the program is stored under.
    pub fn file_name(&self) -> &'static str {
        match self {
            Self::Python => "program.py",
            Self::LabelPlan => "program.plan.json",
        }
    }
}

impl fmt::Display for ProgramLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One unverified attempt at a transformation program.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateProgram {
    /// 1-based attempt that produced this program.
    pub attempt_number: u32,
    pub language: ProgramLanguage,
    pub source_text: String,
    /// Diagnostics from the previous attempt that this program was asked to repair.
    pub generation_diagnostics: Option<String>,
}

impl CandidateProgram {
    pub fn new(attempt_number: u32, language: ProgramLanguage, source_text: String) -> Self {
        Self {
            attempt_number,
            language,
            source_text,
            generation_diagnostics: None,
        }
    }

    pub fn with_diagnostics(mut self, diagnostics: Option<String>) -> Self {
        self.generation_diagnostics = diagnostics;
        self
    }
}
