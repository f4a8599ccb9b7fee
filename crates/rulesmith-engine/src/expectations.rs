//! Validator expectations derived from the input itself.

use polars::prelude::DataFrame;

use rulesmith_model::RuleSet;
use rulesmith_transform::{compile_plan, winning_labels};
use rulesmith_validate::Expectations;

use crate::config::EngineConfig;
use crate::error::Result;

/// Build expectations for `df` by labelling it with the reference evaluator.
///
/// A rule's action is required when it wins at least one input record. A
/// rule that matches records only where a stronger rule also matches is not
/// required, since its label can never legitimately appear.
pub fn derive_expectations(
    df: &DataFrame,
    rule_set: &RuleSet,
    config: &EngineConfig,
) -> Result<Expectations> {
    let plan = compile_plan(rule_set, config.tie_break, &config.labels);
    let winners = winning_labels(df, &plan)?;
    let input_columns = df
        .get_column_names()
        .into_iter()
        .map(|name| name.to_string())
        .collect();

    let required = winners
        .keys()
        .filter(|label| **label != config.labels.default_label)
        .cloned();
    let expectations = Expectations::new(rule_set, &config.labels, input_columns)
        .with_required_labels(required);

    tracing::debug!(
        required = ?expectations.required_labels,
        distribution = ?winners,
        "derived expectations"
    );

    Ok(if config.strict_counts {
        expectations.with_expected_counts(winners)
    } else {
        expectations
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::Column;
    use rulesmith_model::{Clause, Condition, Literal, Operator, Rule};

    fn gt(column: &str, value: f64) -> Clause {
        Clause::new(column, Operator::Gt, Literal::Number(value))
    }

    #[test]
    fn shadowed_rules_are_not_required() {
        let rules = RuleSet::new(vec![
            Rule::new("R1", "old", Condition::all(vec![gt("age", 180.0)]), "liquidate", 1),
            Rule::new(
                "R2",
                "old and rich",
                Condition::all(vec![gt("age", 180.0), gt("profit", 20.0)]),
                "vip_exempt",
                0,
            ),
            Rule::new("R3", "never", Condition::all(vec![gt("age", 1000.0)]), "ancient", 0),
        ]);
        let df = DataFrame::new(vec![
            Column::new("age".into(), [200i64, 10]),
            Column::new("profit".into(), [25.0f64, 1.0]),
        ])
        .unwrap();

        let expectations = derive_expectations(&df, &rules, &EngineConfig::default()).unwrap();
        let required: Vec<&str> = expectations
            .required_labels
            .iter()
            .map(String::as_str)
            .collect();
        assert_eq!(required, vec!["vip_exempt"]);
        assert_eq!(expectations.input_columns, vec!["age", "profit"]);
        assert!(expectations.expected_counts.is_none());

        let strict = EngineConfig {
            strict_counts: true,
            ..EngineConfig::default()
        };
        let expectations = derive_expectations(&df, &rules, &strict).unwrap();
        let counts = expectations.expected_counts.unwrap();
        assert_eq!(counts.get("vip_exempt"), Some(&1));
        assert_eq!(counts.get("Normal"), Some(&1));
    }
}
