//! Attempt controller and verified artifact store for rulesmith.
//!
//! [`AttemptController::run`] turns a rule set and schema digest into a
//! [`VerifiedArtifact`](rulesmith_model::VerifiedArtifact) by looping
//! through synthesis, sandboxed execution, and validation under a fixed
//! attempt budget. The loop is the explicit state machine in [`fsm`].
//! Promoted artifacts are kept in an [`ArtifactStore`] keyed by fingerprint,
//! and [`run_verified`] re-executes them without any synthesis.

mod config;
mod controller;
mod error;
mod expectations;
pub mod fsm;
mod runtime;
mod store;

pub use config::{DEFAULT_MAX_ATTEMPTS, EngineConfig};
pub use controller::{
    AttemptController, AttemptOutcome, AttemptRecord, CompileOutcome, CompileRequest,
    CompileStatus,
};
pub use error::{EngineError, Result, StoreError};
pub use expectations::derive_expectations;
pub use fsm::{Event, State, transition};
pub use runtime::{RunOutcome, run_verified};
pub use store::{ArtifactStore, Promotion};
