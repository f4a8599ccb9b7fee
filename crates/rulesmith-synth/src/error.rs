//! Error types for program synthesis.

use thiserror::Error;

/// A synthesis call that produced no usable program.
///
/// Every variant is recoverable: the attempt controller records it as a
/// failed attempt and retries while budget remains.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    /// The generator could not be reached.
    #[error("generator unavailable: {message}")]
    Unavailable { message: String },

    /// The generator answered with a non-success HTTP status.
    #[error("generator returned HTTP {status}: {message}")]
    HttpStatus { status: u16, message: String },

    /// The response did not have the expected shape.
    #[error("malformed generator response: {message}")]
    MalformedResponse { message: String },

    /// The request could not be turned into a prompt.
    #[error("failed to build prompt: {message}")]
    Prompt { message: String },

    /// The generator returned no program text.
    #[error("generator returned an empty program")]
    EmptyProgram,
}

/// Errors building a synthesizer. These are configuration problems and are
/// never retried.
#[derive(Debug, Error)]
pub enum SynthError {
    #[error("API key environment variable {variable} is not set")]
    MissingApiKey { variable: String },

    #[error("failed to build HTTP client: {message}")]
    Client { message: String },
}

pub type Result<T> = std::result::Result<T, SynthError>;
