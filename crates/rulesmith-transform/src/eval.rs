//! Vectorized evaluation of label plans with Polars expressions.

use std::collections::BTreeMap;

use polars::prelude::{DataFrame, DataType, Expr, IntoLazy, col, lit, when};

use rulesmith_ingest::value_counts;
use rulesmith_model::{Clause, LabelConfig, Literal, Operator, RuleSet, TieBreakPolicy};

use crate::error::{Result, TransformError};
use crate::plan::{LabelPlan, compile_plan};

fn literal_expr(value: &Literal) -> Expr {
    match value {
        Literal::Bool(v) => lit(*v),
        Literal::Number(v) => lit(*v),
        Literal::Text(v) => lit(v.as_str()),
    }
}

/// Boolean expression for one clause. Null cells compare false.
pub fn clause_expr(clause: &Clause) -> Expr {
    let column = col(clause.column.as_str());
    let value = literal_expr(&clause.value);
    let compared = match clause.op {
        Operator::Eq => column.eq(value),
        Operator::Ne => column.neq(value),
        Operator::Gt => column.gt(value),
        Operator::Ge => column.gt_eq(value),
        Operator::Lt => column.lt(value),
        Operator::Le => column.lt_eq(value),
    };
    compared.fill_null(lit(false))
}

/// Conjunction of clauses; the empty conjunction is `true`.
pub fn condition_expr(clauses: &[Clause]) -> Expr {
    clauses
        .iter()
        .map(clause_expr)
        .reduce(|acc, next| acc.and(next))
        .unwrap_or_else(|| lit(true))
}

/// Expression producing the label column.
///
/// Built as nested `when/then/otherwise` folded from the weakest rule
/// outward, so the strongest matching rule is tested first.
pub fn label_expr(plan: &LabelPlan) -> Expr {
    let mut expr = lit(plan.default_label.as_str());
    for rule in plan.rules.iter().rev() {
        expr = when(condition_expr(&rule.clauses))
            .then(lit(rule.action.as_str()))
            .otherwise(expr);
    }
    expr.alias(plan.status_column.as_str())
}

fn literal_fits(dtype: &DataType, value: &Literal) -> bool {
    match value {
        Literal::Number(_) => dtype.is_numeric(),
        Literal::Text(_) => matches!(dtype, DataType::String),
        Literal::Bool(_) => matches!(dtype, DataType::Boolean),
    }
}

fn literal_dtype(value: &Literal) -> DataType {
    match value {
        Literal::Number(_) => DataType::Float64,
        Literal::Text(_) => DataType::String,
        Literal::Bool(_) => DataType::Boolean,
    }
}

/// Checks every clause against the input columns.
///
/// Returns casts for columns that hold no values at all, so a typed clause
/// on them compares false instead of failing.
fn prepare_columns(df: &DataFrame, plan: &LabelPlan) -> Result<Vec<Expr>> {
    let mut casts: BTreeMap<&str, DataType> = BTreeMap::new();
    for rule in &plan.rules {
        for clause in &rule.clauses {
            let column = df
                .column(&clause.column)
                .map_err(|_| TransformError::UnknownColumn {
                    rule: rule.id.clone(),
                    column: clause.column.clone(),
                })?;
            let dtype = column.dtype();
            if matches!(dtype, DataType::Null) || literal_fits(dtype, &clause.value) {
                continue;
            }
            if column.null_count() == column.len() {
                casts
                    .entry(clause.column.as_str())
                    .or_insert_with(|| literal_dtype(&clause.value));
                continue;
            }
            return Err(TransformError::ClauseType {
                rule: rule.id.clone(),
                column: clause.column.clone(),
                found: dtype.to_string(),
                expected: clause.value.kind(),
            });
        }
    }
    Ok(casts
        .into_iter()
        .map(|(name, dtype)| col(name).cast(dtype))
        .collect())
}

/// Returns `df` with the label column added (or replaced). Row order and
/// every existing column are preserved.
pub fn apply_plan(df: &DataFrame, plan: &LabelPlan) -> Result<DataFrame> {
    let casts = prepare_columns(df, plan)?;
    let status = df
        .clone()
        .lazy()
        .with_columns(casts)
        .select([label_expr(plan)])
        .collect()?;
    let mut labelled = df.clone();
    labelled.with_column(status.column(&plan.status_column)?.clone())?;
    tracing::debug!(
        rows = labelled.height(),
        rules = plan.rules.len(),
        status_column = %plan.status_column,
        "applied label plan"
    );
    Ok(labelled)
}

/// Reference labelling of `df` under the given rule set and policy.
pub fn label_frame(
    df: &DataFrame,
    rule_set: &RuleSet,
    policy: TieBreakPolicy,
    labels: &LabelConfig,
) -> Result<DataFrame> {
    apply_plan(df, &compile_plan(rule_set, policy, labels))
}

/// How many rows each label wins under the plan.
pub fn winning_labels(df: &DataFrame, plan: &LabelPlan) -> Result<BTreeMap<String, u64>> {
    let labelled = apply_plan(df, plan)?;
    let column = labelled
        .column(&plan.status_column)
        .map_err(|_| TransformError::MissingStatusColumn {
            column: plan.status_column.clone(),
        })?;
    Ok(value_counts(column))
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::Column;
    use rulesmith_model::{Condition, Rule};

    #[test]
    fn empty_plan_labels_everything_default() {
        let df = DataFrame::new(vec![Column::new("x".into(), [1i64, 2, 3])]).unwrap();
        let plan = compile_plan(
            &RuleSet::new(vec![Rule::new(
                "never",
                "never",
                Condition::all(vec![Clause::new("x", Operator::Gt, Literal::Number(99.0))]),
                "flag",
                0,
            )]),
            TieBreakPolicy::default(),
            &LabelConfig::default(),
        );
        let counts = winning_labels(&df, &plan).unwrap();
        assert_eq!(counts.get("Normal"), Some(&3));
        assert_eq!(counts.len(), 1);
    }

    #[test]
    fn unknown_column_is_reported() {
        let df = DataFrame::new(vec![Column::new("x".into(), [1i64])]).unwrap();
        let plan = compile_plan(
            &RuleSet::new(vec![Rule::new(
                "R9",
                "ghost",
                Condition::all(vec![Clause::new("y", Operator::Eq, Literal::Number(1.0))]),
                "flag",
                0,
            )]),
            TieBreakPolicy::default(),
            &LabelConfig::default(),
        );
        assert!(matches!(
            apply_plan(&df, &plan),
            Err(TransformError::UnknownColumn { rule, column }) if rule == "R9" && column == "y"
        ));
    }

    fn numeric_plan(id: &str, column: &str) -> LabelPlan {
        compile_plan(
            &RuleSet::new(vec![Rule::new(
                id,
                "numeric",
                Condition::all(vec![Clause::new(column, Operator::Gt, Literal::Number(5.0))]),
                "flag",
                0,
            )]),
            TieBreakPolicy::default(),
            &LabelConfig::default(),
        )
    }

    #[test]
    fn numeric_clause_on_text_column_names_the_rule() {
        let df = DataFrame::new(vec![Column::new("age".into(), ["old", "new"])]).unwrap();
        let err = apply_plan(&df, &numeric_plan("R7", "age")).unwrap_err();
        assert!(matches!(
            &err,
            TransformError::ClauseType { rule, column, .. } if rule == "R7" && column == "age"
        ));
        assert!(err.to_string().contains("number"), "{err}");
    }

    #[test]
    fn empty_text_column_compares_false() {
        let df = DataFrame::new(vec![
            Column::new("sku".into(), ["A", "B"]),
            Column::new("age".into(), [None::<&str>, None]),
        ])
        .unwrap();
        let labelled = apply_plan(&df, &numeric_plan("R1", "age")).unwrap();
        assert_eq!(labelled.width(), 3);
        assert_eq!(labelled.column("age").unwrap().dtype(), &DataType::String);
        let counts = winning_labels(&df, &numeric_plan("R1", "age")).unwrap();
        assert_eq!(counts.get("Normal"), Some(&2));
    }
}
