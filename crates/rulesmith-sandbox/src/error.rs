//! Sandbox errors.
//!
//! These describe a broken execution environment, not a bad program. A
//! program that crashes or times out is reported through
//! [`ExecutionResult`](rulesmith_model::ExecutionResult) instead.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SandboxError {
    #[error("sandbox runtime command is empty")]
    EmptyCommand,

    #[error("failed to prepare sandbox directory {path}: {source}")]
    Workdir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to stage input {path}: {source}")]
    StageInput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write program to {path}: {source}")]
    WriteProgram {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to start runtime '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to wait for sandboxed process: {source}")]
    Wait {
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, SandboxError>;
