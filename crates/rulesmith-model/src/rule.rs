//! Structured business rules.
//!
//! A rule pairs a conjunctive condition with an action label. Conditions are
//! data, not code: every consumer (prompt assembly, the label plan compiler,
//! the validator's expectation builder) reads the same clauses.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};

/// Comparison operator of a single clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    #[serde(rename = "==", alias = "eq")]
    Eq,
    #[serde(rename = "!=", alias = "ne")]
    Ne,
    #[serde(rename = ">", alias = "gt")]
    Gt,
    #[serde(rename = ">=", alias = "ge")]
    Ge,
    #[serde(rename = "<", alias = "lt")]
    Lt,
    #[serde(rename = "<=", alias = "le")]
    Le,
}

impl Operator {
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::Lt => "<",
            Self::Le => "<=",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Right-hand side of a clause.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Literal {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl Literal {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Bool(_) => "boolean",
            Self::Number(_) => "number",
            Self::Text(_) => "text value",
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(value) => write!(f, "{value}"),
            Self::Number(value) => write!(f, "{value}"),
            Self::Text(value) => write!(f, "{value:?}"),
        }
    }
}

/// `column <op> value`. Evaluates to false on a missing cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clause {
    pub column: String,
    pub op: Operator,
    pub value: Literal,
}

impl Clause {
    pub fn new(column: impl Into<String>, op: Operator, value: Literal) -> Self {
        Self {
            column: column.into(),
            op,
            value,
        }
    }
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.column, self.op, self.value)
    }
}

/// Conjunction of clauses. An empty conjunction matches every record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    #[serde(default)]
    pub all: Vec<Clause>,
}

impl Condition {
    pub fn always() -> Self {
        Self::default()
    }

    pub fn all(clauses: Vec<Clause>) -> Self {
        Self { all: clauses }
    }

    pub fn is_always(&self) -> bool {
        self.all.is_empty()
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.all.is_empty() {
            return f.write_str("always");
        }
        let parts: Vec<String> = self.all.iter().map(ToString::to_string).collect();
        f.write_str(&parts.join(" AND "))
    }
}

/// A single business rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub condition: Condition,
    /// Label assigned to records this rule wins.
    pub action: String,
    /// Lower values win ties.
    #[serde(default)]
    pub priority: i64,
    /// Free-text note from the extracted policy; passed to the synthesizer only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Rule {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        condition: Condition,
        action: impl Into<String>,
        priority: i64,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            condition,
            action: action.into(),
            priority,
            description: None,
        }
    }

    /// Number of conjunctive clauses; the primary conflict tie-break.
    pub fn specificity(&self) -> usize {
        self.condition.all.len()
    }
}

/// Ordered, validated collection of rules.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleSet {
    pub rules: Vec<Rule>,
}

impl RuleSet {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    /// Parse a rule set document. Accepts either `{"rules": [...]}` or a bare array.
    pub fn from_json(text: &str) -> std::result::Result<Self, serde_json::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Document {
            Wrapped(RuleSet),
            Bare(Vec<Rule>),
        }
        let document: Document = serde_json::from_str(text)?;
        Ok(match document {
            Document::Wrapped(set) => set,
            Document::Bare(rules) => Self { rules },
        })
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|source| ModelError::Encode {
            what: "rule set",
            source,
        })
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Check the structural invariants: non-empty, unique non-empty ids,
    /// non-empty actions, named clause columns.
    pub fn validate(&self) -> Result<()> {
        if self.rules.is_empty() {
            return Err(ModelError::EmptyRuleSet);
        }
        let mut seen = BTreeSet::new();
        for (index, rule) in self.rules.iter().enumerate() {
            if rule.id.trim().is_empty() {
                return Err(ModelError::EmptyRuleId { index });
            }
            if !seen.insert(rule.id.as_str()) {
                return Err(ModelError::DuplicateRuleId {
                    id: rule.id.clone(),
                });
            }
            if rule.action.trim().is_empty() {
                return Err(ModelError::EmptyAction {
                    id: rule.id.clone(),
                });
            }
            if rule
                .condition
                .all
                .iter()
                .any(|clause| clause.column.trim().is_empty())
            {
                return Err(ModelError::EmptyClauseColumn {
                    id: rule.id.clone(),
                });
            }
        }
        Ok(())
    }

    /// Distinct action labels in declaration order.
    pub fn action_vocabulary(&self) -> Vec<&str> {
        let mut seen = BTreeSet::new();
        self.rules
            .iter()
            .filter(|rule| seen.insert(rule.action.as_str()))
            .map(|rule| rule.action.as_str())
            .collect()
    }
}
