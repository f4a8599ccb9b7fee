//! The label plan program format.
//!
//! A label plan is a rule set flattened into winning order. Evaluating it
//! never needs the conflict policy: the first rule whose clauses all hold
//! labels the record, and records matching nothing get the default label.

use serde::{Deserialize, Serialize};

use rulesmith_model::{Clause, LabelConfig, RuleSet, TieBreakPolicy};

use crate::error::{Result, TransformError};

/// Format tag written into every plan document.
pub const PLAN_FORMAT: &str = "rulesmith-label-plan/v1";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanRule {
    pub id: String,
    pub action: String,
    /// Conjunction; empty matches every record.
    #[serde(default)]
    pub clauses: Vec<Clause>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelPlan {
    pub format: String,
    pub status_column: String,
    pub default_label: String,
    /// Strongest rule first.
    pub rules: Vec<PlanRule>,
}

impl LabelPlan {
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|source| TransformError::Encode { source })
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let plan: Self = serde_json::from_str(text).map_err(|e| TransformError::PlanParse {
            message: e.to_string(),
        })?;
        if plan.format != PLAN_FORMAT {
            return Err(TransformError::UnsupportedFormat { found: plan.format });
        }
        Ok(plan)
    }

    /// Labels this plan can emit, default last.
    pub fn vocabulary(&self) -> Vec<&str> {
        let mut labels: Vec<&str> = Vec::new();
        for rule in &self.rules {
            if !labels.contains(&rule.action.as_str()) {
                labels.push(&rule.action);
            }
        }
        if !labels.contains(&self.default_label.as_str()) {
            labels.push(&self.default_label);
        }
        labels
    }
}

/// Flatten a rule set into a plan ordered by `policy`.
pub fn compile_plan(rule_set: &RuleSet, policy: TieBreakPolicy, labels: &LabelConfig) -> LabelPlan {
    let rules = policy
        .order(rule_set)
        .into_iter()
        .map(|index| {
            let rule = &rule_set.rules[index];
            PlanRule {
                id: rule.id.clone(),
                action: rule.action.clone(),
                clauses: rule.condition.all.clone(),
            }
        })
        .collect();
    LabelPlan {
        format: PLAN_FORMAT.to_string(),
        status_column: labels.status_column.clone(),
        default_label: labels.default_label.clone(),
        rules,
    }
}
