use thiserror::Error;

/// Errors raised while checking or encoding model values.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("rule set is empty")]
    EmptyRuleSet,
    #[error("rule at position {index} has an empty id")]
    EmptyRuleId { index: usize },
    #[error("duplicate rule id: {id}")]
    DuplicateRuleId { id: String },
    #[error("rule {id} has an empty action label")]
    EmptyAction { id: String },
    #[error("rule {id} has a clause with an empty column name")]
    EmptyClauseColumn { id: String },
    #[error("fingerprint '{value}' is not a sha-256 digest")]
    InvalidFingerprint { value: String },
    #[error("failed to encode {what}: {source}")]
    Encode {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

pub type Result<T> = std::result::Result<T, ModelError>;
