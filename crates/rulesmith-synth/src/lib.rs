//! Candidate program synthesis for rulesmith.
//!
//! The attempt controller depends only on the [`Synthesizer`] trait. Two
//! implementations ship here:
//!
//! - [`ChatSynthesizer`] prompts an OpenAI-compatible chat model for a
//!   Python program.
//! - [`PlanSynthesizer`] compiles the rule set into a label plan without any
//!   model call.

mod chat;
mod error;
mod fences;
mod plan;
mod prompt;
mod request;

pub use chat::{
    ChatConfig, ChatSynthesizer, DEFAULT_API_KEY_ENV, DEFAULT_ENDPOINT, DEFAULT_MODEL,
    extract_program,
};
pub use error::{GenerationError, Result, SynthError};
pub use fences::strip_markdown_fences;
pub use plan::PlanSynthesizer;
pub use prompt::{Prompt, SYSTEM_PROMPT, build_prompt};
pub use request::{PriorAttempt, SynthesisRequest, Synthesizer};
