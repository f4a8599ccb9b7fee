//! Deterministic synthesizer that compiles rules straight to a label plan.

use tracing::debug;

use rulesmith_model::{CandidateProgram, ProgramLanguage};
use rulesmith_transform::compile_plan;

use crate::error::GenerationError;
use crate::request::{SynthesisRequest, Synthesizer};

/// Emits a label plan for the request's rules and policy. Needs no network
/// and gives the same program for the same inputs.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlanSynthesizer;

impl PlanSynthesizer {
    pub fn new() -> Self {
        Self
    }
}

impl Synthesizer for PlanSynthesizer {
    fn language(&self) -> ProgramLanguage {
        ProgramLanguage::LabelPlan
    }

    fn synthesize(
        &mut self,
        request: &SynthesisRequest<'_>,
    ) -> Result<CandidateProgram, GenerationError> {
        let plan = compile_plan(request.rule_set, request.policy, request.labels);
        let source = plan
            .to_json()
            .map_err(|e| GenerationError::MalformedResponse {
                message: e.to_string(),
            })?;
        debug!(
            attempt = request.attempt_number,
            rules = plan.rules.len(),
            "compiled label plan"
        );
        Ok(
            CandidateProgram::new(request.attempt_number, ProgramLanguage::LabelPlan, source)
                .with_diagnostics(request.prior.map(|prior| prior.diagnostics.clone())),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rulesmith_model::{
        Clause, Condition, LabelConfig, Literal, Operator, Rule, RuleSet, SchemaDigest,
        TieBreakPolicy,
    };
    use rulesmith_transform::LabelPlan;

    #[test]
    fn plan_is_deterministic_and_parseable() {
        let rules = RuleSet::new(vec![
            Rule::new(
                "R1",
                "old",
                Condition::all(vec![Clause::new("age", Operator::Gt, Literal::Number(180.0))]),
                "liquidate",
                1,
            ),
            Rule::new("R2", "any", Condition::always(), "seen", 3),
        ]);
        let schema = SchemaDigest {
            columns: Vec::new(),
            sample_rows: Vec::new(),
            total_rows: 0,
        };
        let labels = LabelConfig::default();
        let request = SynthesisRequest {
            attempt_number: 1,
            rule_set: &rules,
            schema: &schema,
            policy: TieBreakPolicy::default(),
            labels: &labels,
            completion_marker: "PROCESS_COMPLETE",
            prior: None,
        };
        let mut synth = PlanSynthesizer::new();
        let first = synth.synthesize(&request).unwrap();
        let second = synth.synthesize(&request).unwrap();
        assert_eq!(first.source_text, second.source_text);
        assert_eq!(first.language, ProgramLanguage::LabelPlan);
        let plan = LabelPlan::from_json(&first.source_text).unwrap();
        assert_eq!(plan.rules[0].id, "R1");
    }
}
