//! Conflict resolution and labelling conventions shared by every stage.

use std::cmp::{Ordering, Reverse};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::rule::{Rule, RuleSet};

/// Default name of the output label column.
pub const DEFAULT_STATUS_COLUMN: &str = "Status";

/// Default label for records no rule matches.
pub const DEFAULT_LABEL: &str = "Normal";

/// How overlapping rules are ranked when a record matches more than one.
///
/// Declaration order is always the final tie-break, so every policy yields a
/// total order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreakPolicy {
    /// Most clauses wins, then the lowest priority value.
    #[default]
    SpecificityThenPriority,
    /// Lowest priority value wins, then most clauses.
    PriorityThenSpecificity,
}

impl TieBreakPolicy {
    pub fn label(&self) -> &'static str {
        match self {
            Self::SpecificityThenPriority => "specificity_then_priority",
            Self::PriorityThenSpecificity => "priority_then_specificity",
        }
    }

    /// Compare two rules; `Less` means `left` wins.
    pub fn compare(&self, left: (usize, &Rule), right: (usize, &Rule)) -> Ordering {
        let (left_index, left) = left;
        let (right_index, right) = right;
        let specificity = Reverse(left.specificity()).cmp(&Reverse(right.specificity()));
        let priority = left.priority.cmp(&right.priority);
        let primary = match self {
            Self::SpecificityThenPriority => specificity.then(priority),
            Self::PriorityThenSpecificity => priority.then(specificity),
        };
        primary.then(left_index.cmp(&right_index))
    }

    /// Rule indices sorted from strongest to weakest.
    pub fn order(&self, rule_set: &RuleSet) -> Vec<usize> {
        let mut indices: Vec<usize> = (0..rule_set.rules.len()).collect();
        indices.sort_by(|&a, &b| {
            self.compare((a, &rule_set.rules[a]), (b, &rule_set.rules[b]))
        });
        indices
    }

    /// Plain-language statement of the policy, used verbatim in prompts.
    pub fn instruction(&self) -> &'static str {
        match self {
            Self::SpecificityThenPriority => {
                "When a record matches more than one rule, the rule whose condition has the \
                 MOST clauses (the most specific rule) wins. If several matching rules have the \
                 same number of clauses, the rule with the LOWEST priority value wins. If they \
                 are still tied, the rule listed first wins."
            }
            Self::PriorityThenSpecificity => {
                "When a record matches more than one rule, the rule with the LOWEST priority \
                 value wins. If several matching rules share that priority, the rule whose \
                 condition has the MOST clauses wins. If they are still tied, the rule listed \
                 first wins."
            }
        }
    }
}

impl fmt::Display for TieBreakPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Output labelling convention.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LabelConfig {
    pub status_column: String,
    pub default_label: String,
}

impl Default for LabelConfig {
    fn default() -> Self {
        Self {
            status_column: DEFAULT_STATUS_COLUMN.to_string(),
            default_label: DEFAULT_LABEL.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::{Clause, Condition, Literal, Operator};

    fn clause(column: &str, op: Operator, value: f64) -> Clause {
        Clause::new(column, op, Literal::Number(value))
    }

    fn scenario() -> RuleSet {
        RuleSet::new(vec![
            Rule::new(
                "liquidate",
                "Liquidation",
                Condition::all(vec![clause("age", Operator::Gt, 180.0)]),
                "liquidate",
                1,
            ),
            Rule::new(
                "review",
                "Low margin",
                Condition::all(vec![clause("profit", Operator::Lt, 5.0)]),
                "review",
                2,
            ),
            Rule::new(
                "vip",
                "VIP exemption",
                Condition::all(vec![
                    clause("age", Operator::Gt, 180.0),
                    clause("profit", Operator::Gt, 20.0),
                ]),
                "vip_exempt",
                0,
            ),
        ])
    }

    #[test]
    fn specificity_first_orders_compound_rule_ahead() {
        let order = TieBreakPolicy::SpecificityThenPriority.order(&scenario());
        assert_eq!(order, vec![2, 0, 1]);
    }

    #[test]
    fn priority_first_uses_priority_value() {
        let mut set = scenario();
        set.rules[2].priority = 5;
        let order = TieBreakPolicy::PriorityThenSpecificity.order(&set);
        assert_eq!(order, vec![0, 1, 2]);
    }

    #[test]
    fn declaration_order_breaks_full_ties() {
        let set = RuleSet::new(vec![
            Rule::new("b", "b", Condition::always(), "b", 0),
            Rule::new("a", "a", Condition::always(), "a", 0),
        ]);
        assert_eq!(TieBreakPolicy::default().order(&set), vec![0, 1]);
    }

    #[test]
    fn policy_round_trips_as_snake_case() {
        let json = serde_json::to_string(&TieBreakPolicy::PriorityThenSpecificity).unwrap();
        assert_eq!(json, "\"priority_then_specificity\"");
    }
}
