//! Prompt assembly for chat-model synthesizers.
//!
//! The prompt carries the rule set and schema as data. Nothing about a
//! particular domain is baked in, so the same text works for any rule set
//! and schema pair.

use crate::error::GenerationError;
use crate::request::SynthesisRequest;

/// Fixed persona sent as the system message.
pub const SYSTEM_PROMPT: &str = "You are a Senior Python Data Engineer. You write clean, \
production-grade Pandas code. You ONLY return raw Python code. No markdown, no ```python \
blocks, no explanations.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

fn contract_section(request: &SynthesisRequest<'_>) -> String {
    let status = &request.labels.status_column;
    let default_label = &request.labels.default_label;
    let marker = request.completion_marker;
    let mut labels: Vec<&str> = request.rule_set.action_vocabulary();
    labels.push(default_label);
    format!(
        "## INSTRUCTIONS
1. Import pandas (and numpy if needed) at the top.
2. Define a function `apply_rules(df)` that:
   - Adds a column named '{status}' with default value '{default_label}'.
   - Translates EACH rule's `condition.all` clauses into a vectorized Pandas mask. \
Every clause of a rule must hold for the rule to match. A clause on a missing value is false. \
A rule with no clauses matches every row.
   - Labels each row with the `action` of the winning matching rule, following CONFLICT RESOLUTION.
   - Only these labels may appear: {allowed}.
   - Never drops, duplicates, or reorders rows, and keeps every input column.
   - Uses only vectorized Pandas operations. No for loops over rows.
   - Returns the modified DataFrame.
3. The `if __name__ == \"__main__\"` block must:
   - Read the input CSV path from sys.argv[1] and the output CSV path from sys.argv[2].
   - Load the input with pandas and call `apply_rules(df)`.
   - Save the result to the output path with index=False.
   - Print \"{marker}\" as the LAST line of stdout.
4. Use ONLY pandas, numpy, and the standard library. No input(). No network access.
5. Return ONLY raw Python code. No markdown fences, no explanations.",
        allowed = labels.join(", "),
    )
}

fn context_sections(request: &SynthesisRequest<'_>) -> Result<String, GenerationError> {
    let rules = request
        .rule_set
        .to_json_pretty()
        .map_err(|error| GenerationError::Prompt {
            message: error.to_string(),
        })?;
    Ok(format!(
        "## DATA SCHEMA\n{schema}\n## BUSINESS RULES (as JSON)\n{rules}\n\n\
## CONFLICT RESOLUTION\n{policy}",
        schema = request.schema.render(),
        policy = request.policy.instruction(),
    ))
}

/// Build the prompt for an attempt. With prior diagnostics the prompt asks
/// for a repair of the previous program rather than a fresh one.
pub fn build_prompt(request: &SynthesisRequest<'_>) -> Result<Prompt, GenerationError> {
    let context = context_sections(request)?;
    let user = match request.prior {
        None => format!(
            "Write a complete Python script that labels every row of a dataset according to \
business rules.\n\n{context}\n\n{contract}",
            contract = contract_section(request),
        ),
        Some(prior) => format!(
            "Your previous code FAILED.\n\n## ERROR\n{error}\n\n## BROKEN CODE\n{code}\n\n\
{context}\n\n{contract}\n\n## TASK\nFix the defect described under ERROR. Return ONLY the \
complete corrected Python code.",
            error = prior.diagnostics.trim(),
            code = prior.source_text.trim(),
            contract = contract_section(request),
        ),
    };
    Ok(Prompt {
        system: SYSTEM_PROMPT.to_string(),
        user,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::PriorAttempt;
    use rulesmith_model::{
        Clause, ColumnType, Condition, LabelConfig, Literal, Operator, Rule, RuleSet,
        SchemaColumn, SchemaDigest, TieBreakPolicy,
    };

    fn fixtures() -> (RuleSet, SchemaDigest, LabelConfig) {
        let rules = RuleSet::new(vec![Rule::new(
            "R1",
            "Liquidation",
            Condition::all(vec![Clause::new(
                "Days_in_Warehouse",
                Operator::Gt,
                Literal::Number(180.0),
            )]),
            "Liquidation",
            1,
        )]);
        let schema = SchemaDigest {
            columns: vec![SchemaColumn {
                name: "Days_in_Warehouse".into(),
                column_type: ColumnType::Integer,
            }],
            sample_rows: vec![vec!["200".into()]],
            total_rows: 1,
        };
        (rules, schema, LabelConfig::default())
    }

    #[test]
    fn first_prompt_carries_rules_schema_and_policy() {
        let (rules, schema, labels) = fixtures();
        let request = SynthesisRequest {
            attempt_number: 1,
            rule_set: &rules,
            schema: &schema,
            policy: TieBreakPolicy::default(),
            labels: &labels,
            completion_marker: "PROCESS_COMPLETE",
            prior: None,
        };
        let prompt = build_prompt(&request).unwrap();
        assert_eq!(prompt.system, SYSTEM_PROMPT);
        assert!(prompt.user.contains("- Columns: [Days_in_Warehouse]"));
        assert!(prompt.user.contains("\"action\": \"Liquidation\""));
        assert!(prompt.user.contains(TieBreakPolicy::default().instruction()));
        assert!(prompt.user.contains("Only these labels may appear: Liquidation, Normal."));
        assert!(prompt.user.contains("Print \"PROCESS_COMPLETE\" as the LAST line"));
        assert!(!prompt.user.contains("BROKEN CODE"));
    }

    #[test]
    fn repair_prompt_includes_previous_source_and_error() {
        let (rules, schema, labels) = fixtures();
        let prior = PriorAttempt {
            source_text: "import pandas as pd\nraise KeyError('Profit')".into(),
            diagnostics: "KeyError: 'Profit'".into(),
        };
        let request = SynthesisRequest {
            attempt_number: 2,
            rule_set: &rules,
            schema: &schema,
            policy: TieBreakPolicy::default(),
            labels: &labels,
            completion_marker: "PROCESS_COMPLETE",
            prior: Some(&prior),
        };
        let prompt = build_prompt(&request).unwrap();
        assert!(prompt.user.starts_with("Your previous code FAILED."));
        assert!(prompt.user.contains("## ERROR\nKeyError: 'Profit'"));
        assert!(prompt.user.contains("raise KeyError('Profit')"));
        assert!(prompt.user.contains("## TASK"));
    }
}
