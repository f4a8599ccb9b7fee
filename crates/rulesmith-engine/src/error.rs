//! Fatal engine errors.
//!
//! Anything here aborts a run immediately without touching the attempt
//! budget: retrying cannot fix a bad rule set, a missing runtime, or an
//! unwritable store. Recoverable attempt failures never appear here.

use std::path::PathBuf;

use thiserror::Error;

use rulesmith_ingest::IngestError;
use rulesmith_model::ModelError;
use rulesmith_sandbox::SandboxError;
use rulesmith_transform::TransformError;

use crate::fsm::{Event, State};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store {operation} failed for {path}: {source}")]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid manifest {path}: {source}")]
    Manifest {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("store entry {path} is corrupt: {reason}")]
    Corrupt { path: PathBuf, reason: String },
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid rule set: {0}")]
    InvalidRuleSet(#[source] ModelError),

    #[error("failed to compute fingerprint: {0}")]
    Fingerprint(#[source] ModelError),

    #[error(transparent)]
    Input(#[from] IngestError),

    #[error("cannot derive expectations: {0}")]
    Expectations(#[from] TransformError),

    #[error("sandbox unavailable: {0}")]
    Sandbox(#[from] SandboxError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("no verified artifact for fingerprint {fingerprint}")]
    ArtifactNotFound { fingerprint: String },

    #[error("verified artifact {fingerprint} failed at runtime:\n{details}")]
    RuntimeFailed { fingerprint: String, details: String },

    #[error("attempt controller reached an impossible transition: {event:?} in {state:?}")]
    InvalidTransition { state: State, event: Event },
}

pub type Result<T> = std::result::Result<T, EngineError>;
