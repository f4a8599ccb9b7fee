//! Verified artifacts and the fingerprint that addresses them.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::Digest;

use crate::error::{ModelError, Result};
use crate::policy::{LabelConfig, TieBreakPolicy};
use crate::program::ProgramLanguage;
use crate::rule::RuleSet;
use crate::schema::{SchemaColumn, SchemaDigest};

pub fn sha256_hex(bytes: &[u8]) -> String {
    let digest = sha2::Sha256::digest(bytes);
    hex::encode(digest)
}

/// Content address of a verified artifact.
///
/// Covers everything the promoted program depends on: the rule set, the
/// input columns and their types, the conflict policy, the label convention,
/// and the program language. Sample rows and row counts are excluded so the
/// same artifact serves every table with that schema.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn compute(
        rule_set: &RuleSet,
        schema: &SchemaDigest,
        policy: TieBreakPolicy,
        labels: &LabelConfig,
        language: ProgramLanguage,
    ) -> Result<Self> {
        #[derive(Serialize)]
        struct Key<'a> {
            rules: &'a RuleSet,
            columns: &'a [SchemaColumn],
            policy: TieBreakPolicy,
            labels: &'a LabelConfig,
            language: ProgramLanguage,
        }
        let key = Key {
            rules: rule_set,
            columns: &schema.columns,
            policy,
            labels,
            language,
        };
        let bytes = serde_json::to_vec(&key).map_err(|source| ModelError::Encode {
            what: "fingerprint key",
            source,
        })?;
        Ok(Self(sha256_hex(&bytes)))
    }

    /// Wrap an existing hex digest, e.g. a store directory name.
    pub fn parse(value: &str) -> Option<Self> {
        let valid = value.len() == 64 && value.chars().all(|c| c.is_ascii_hexdigit());
        valid.then(|| Self(value.to_ascii_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn short(&self) -> &str {
        self.0.get(..12).unwrap_or(&self.0)
    }
}

impl TryFrom<String> for Fingerprint {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value).ok_or(ModelError::InvalidFingerprint { value })
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Metadata persisted next to a promoted program.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactManifest {
    pub fingerprint: Fingerprint,
    pub language: ProgramLanguage,
    /// Attempt on which the program passed validation.
    pub attempt: u32,
    pub source_sha256: String,
    pub promoted_at: DateTime<Utc>,
    pub rule_count: usize,
    pub observed_row_count: usize,
    pub label_distribution: BTreeMap<String, u64>,
}

/// A candidate program that passed execution and validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifiedArtifact {
    pub manifest: ArtifactManifest,
    pub source_text: String,
}

impl VerifiedArtifact {
    pub fn fingerprint(&self) -> &Fingerprint {
        &self.manifest.fingerprint
    }

    /// True when the stored source still hashes to the recorded digest.
    pub fn is_intact(&self) -> bool {
        sha256_hex(self.source_text.as_bytes()) == self.manifest.source_sha256
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::{Condition, Rule};
    use crate::schema::ColumnType;

    fn schema(sample: &str, rows: usize) -> SchemaDigest {
        SchemaDigest {
            columns: vec![SchemaColumn {
                name: "age".into(),
                column_type: ColumnType::Integer,
            }],
            sample_rows: vec![vec![sample.to_string()]],
            total_rows: rows,
        }
    }

    fn rules(action: &str) -> RuleSet {
        RuleSet::new(vec![Rule::new("R1", "r", Condition::always(), action, 0)])
    }

    fn fingerprint(rules: &RuleSet, schema: &SchemaDigest) -> Fingerprint {
        Fingerprint::compute(
            rules,
            schema,
            TieBreakPolicy::default(),
            &LabelConfig::default(),
            ProgramLanguage::LabelPlan,
        )
        .unwrap()
    }

    #[test]
    fn known_sha256_digest() {
        assert_eq!(
            sha256_hex(b"Hello, World!"),
            "dffd6021bb2bd5b0af676290809ec3a53191dd81c7f70a4b28688a362182986f"
        );
    }

    #[test]
    fn fingerprint_ignores_samples_but_not_rules() {
        let base = fingerprint(&rules("flag"), &schema("1", 10));
        assert_eq!(base, fingerprint(&rules("flag"), &schema("99", 5000)));
        assert_ne!(base, fingerprint(&rules("other"), &schema("1", 10)));
        assert_eq!(base.as_str().len(), 64);
        assert_eq!(Fingerprint::parse(base.as_str()), Some(base.clone()));
        assert_eq!(Fingerprint::parse("not-a-digest"), None);
    }

    #[test]
    fn manifest_fingerprint_must_be_a_digest() {
        let valid = fingerprint(&rules("flag"), &schema("1", 1));
        let json = serde_json::to_string(&valid).unwrap();
        assert_eq!(json, format!("\"{valid}\""));
        assert_eq!(serde_json::from_str::<Fingerprint>(&json).unwrap(), valid);
        assert_eq!(valid.short().len(), 12);

        let err = serde_json::from_str::<Fingerprint>("\"abc\"").unwrap_err();
        assert!(err.to_string().contains("not a sha-256 digest"), "{err}");
    }

    #[test]
    fn fingerprint_depends_on_language_and_policy() {
        let rules = rules("flag");
        let schema = schema("1", 1);
        let plan = fingerprint(&rules, &schema);
        let python = Fingerprint::compute(
            &rules,
            &schema,
            TieBreakPolicy::default(),
            &LabelConfig::default(),
            ProgramLanguage::Python,
        )
        .unwrap();
        let priority_first = Fingerprint::compute(
            &rules,
            &schema,
            TieBreakPolicy::PriorityThenSpecificity,
            &LabelConfig::default(),
            ProgramLanguage::LabelPlan,
        )
        .unwrap();
        assert_ne!(plan, python);
        assert_ne!(plan, priority_first);
    }
}
