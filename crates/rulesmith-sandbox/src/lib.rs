//! Sandboxed execution of candidate programs.
//!
//! A program is written into a fresh working directory together with a copy
//! of the input, then run as a child process under a wall-clock timeout.
//! Crashes, non-zero exits, and timeouts come back as an
//! [`ExecutionResult`](rulesmith_model::ExecutionResult); only an unusable
//! environment (missing runtime, unwritable directory) is an error.

mod error;
mod process;
mod runtime;

pub use error::{Result, SandboxError};
pub use process::{Executor, ProcessSandbox};
pub use runtime::{
    DEFAULT_COMPLETION_MARKER, DEFAULT_OUTPUT_LIMIT_BYTES, DEFAULT_TIMEOUT, SandboxLimits,
    SandboxRuntime,
};
