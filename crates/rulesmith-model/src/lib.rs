//! Data model shared by every rulesmith stage.

pub mod artifact;
pub mod error;
pub mod execution;
pub mod policy;
pub mod program;
pub mod report;
pub mod rule;
pub mod schema;

pub use artifact::{ArtifactManifest, Fingerprint, VerifiedArtifact, sha256_hex};
pub use error::{ModelError, Result};
pub use execution::ExecutionResult;
pub use policy::{DEFAULT_LABEL, DEFAULT_STATUS_COLUMN, LabelConfig, TieBreakPolicy};
pub use program::{CandidateProgram, ProgramLanguage};
pub use report::{FailureReason, ValidationReport};
pub use rule::{Clause, Condition, Literal, Operator, Rule, RuleSet};
pub use schema::{ColumnType, SAMPLE_ROW_COUNT, SchemaColumn, SchemaDigest};
