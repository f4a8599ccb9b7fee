//! What a correct output must look like.

use std::collections::{BTreeMap, BTreeSet};

use rulesmith_model::{LabelConfig, RuleSet};

/// Expectations a labelled output is checked against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expectations {
    pub status_column: String,
    pub default_label: String,
    /// Input columns the output must keep.
    pub input_columns: Vec<String>,
    /// Action labels of the rule set.
    pub vocabulary: BTreeSet<String>,
    /// Labels at least one input record should receive.
    pub required_labels: BTreeSet<String>,
    /// Exact per-label counts, when known.
    pub expected_counts: Option<BTreeMap<String, u64>>,
}

impl Expectations {
    pub fn new(rule_set: &RuleSet, labels: &LabelConfig, input_columns: Vec<String>) -> Self {
        Self {
            status_column: labels.status_column.clone(),
            default_label: labels.default_label.clone(),
            input_columns: input_columns
                .into_iter()
                .filter(|name| *name != labels.status_column)
                .collect(),
            vocabulary: rule_set
                .action_vocabulary()
                .into_iter()
                .map(str::to_string)
                .collect(),
            required_labels: BTreeSet::new(),
            expected_counts: None,
        }
    }

    pub fn with_required_labels(mut self, labels: impl IntoIterator<Item = String>) -> Self {
        self.required_labels = labels.into_iter().collect();
        self
    }

    pub fn with_expected_counts(mut self, counts: BTreeMap<String, u64>) -> Self {
        self.expected_counts = Some(counts);
        self
    }

    /// Whether `label` may appear in the status column.
    pub fn allows(&self, label: &str) -> bool {
        label == self.default_label || self.vocabulary.contains(label)
    }
}
