//! Check 4: the label distribution is plausible.

use std::collections::BTreeMap;

use rulesmith_model::FailureReason;

use crate::expectations::Expectations;

pub fn check(
    distribution: &BTreeMap<String, u64>,
    expectations: &Expectations,
) -> Vec<FailureReason> {
    let mut failures = Vec::new();

    for label in &expectations.required_labels {
        if !distribution.contains_key(label) {
            failures.push(FailureReason::LabelNeverAssigned {
                label: label.clone(),
            });
        }
    }

    let unknown: Vec<String> = distribution
        .keys()
        .filter(|label| !expectations.allows(label))
        .cloned()
        .collect();
    if !unknown.is_empty() {
        failures.push(FailureReason::UnknownLabels { labels: unknown });
    }

    if let Some(expected) = &expectations.expected_counts {
        for (label, &count) in expected {
            let observed = distribution.get(label).copied().unwrap_or(0);
            if observed != count {
                failures.push(FailureReason::LabelCountMismatch {
                    label: label.clone(),
                    expected: count,
                    observed,
                });
            }
        }
    }

    failures
}
