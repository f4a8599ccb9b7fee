//! The synthesizer capability and the context handed to it.

use rulesmith_model::{
    CandidateProgram, LabelConfig, ProgramLanguage, RuleSet, SchemaDigest, TieBreakPolicy,
};

use crate::error::GenerationError;

/// The program a previous attempt produced and why it was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriorAttempt {
    pub source_text: String,
    pub diagnostics: String,
}

/// Everything a synthesizer may look at for one attempt.
#[derive(Debug, Clone, Copy)]
pub struct SynthesisRequest<'a> {
    pub attempt_number: u32,
    pub rule_set: &'a RuleSet,
    pub schema: &'a SchemaDigest,
    pub policy: TieBreakPolicy,
    pub labels: &'a LabelConfig,
    pub completion_marker: &'a str,
    /// Present on every attempt after the first.
    pub prior: Option<&'a PriorAttempt>,
}

/// Produces one candidate program per call.
///
/// Implementations are treated as unreliable: any [`GenerationError`] counts
/// against the attempt budget rather than aborting the run.
pub trait Synthesizer {
    /// Language of the programs this synthesizer writes.
    fn language(&self) -> ProgramLanguage;

    fn synthesize(
        &mut self,
        request: &SynthesisRequest<'_>,
    ) -> std::result::Result<CandidateProgram, GenerationError>;
}

impl<S: Synthesizer + ?Sized> Synthesizer for Box<S> {
    fn language(&self) -> ProgramLanguage {
        (**self).language()
    }

    fn synthesize(
        &mut self,
        request: &SynthesisRequest<'_>,
    ) -> std::result::Result<CandidateProgram, GenerationError> {
        (**self).synthesize(request)
    }
}
