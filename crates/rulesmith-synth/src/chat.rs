//! Synthesizer backed by an OpenAI-compatible chat completions endpoint.

use std::time::Duration;

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use rulesmith_model::{CandidateProgram, ProgramLanguage};

use crate::error::{GenerationError, Result, SynthError};
use crate::fences::strip_markdown_fences;
use crate::prompt::build_prompt;
use crate::request::{SynthesisRequest, Synthesizer};

/// Default chat completions endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://api.cerebras.ai/v1/chat/completions";

/// Default model name.
pub const DEFAULT_MODEL: &str = "gpt-oss-120b";

/// Environment variable holding the API key unless configured otherwise.
pub const DEFAULT_API_KEY_ENV: &str = "RULESMITH_API_KEY";

/// Settings for [`ChatSynthesizer`]; the `[synthesizer]` table of the config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    pub endpoint: String,
    pub model: String,
    /// Name of the environment variable holding the bearer token.
    pub api_key_env: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub request_timeout_secs: u64,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
            temperature: 0.1,
            max_tokens: 2048,
            request_timeout_secs: 120,
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

/// Pull the program text out of a chat completions response body.
pub fn extract_program(body: &str) -> std::result::Result<String, GenerationError> {
    let response: ChatResponse =
        serde_json::from_str(body).map_err(|e| GenerationError::MalformedResponse {
            message: e.to_string(),
        })?;
    let content = response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| GenerationError::MalformedResponse {
            message: "response has no choices[0].message.content".to_string(),
        })?;
    let program = strip_markdown_fences(&content);
    if program.is_empty() {
        return Err(GenerationError::EmptyProgram);
    }
    Ok(program)
}

/// Writes Python programs by prompting a chat model.
pub struct ChatSynthesizer {
    client: Client,
    config: ChatConfig,
    api_key: String,
}

impl ChatSynthesizer {
    /// Build from config, reading the API key from the configured variable.
    pub fn from_config(config: ChatConfig) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| SynthError::MissingApiKey {
                variable: config.api_key_env.clone(),
            })?;
        Self::with_api_key(config, api_key)
    }

    pub fn with_api_key(config: ChatConfig, api_key: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| SynthError::Client {
                message: e.to_string(),
            })?;
        Ok(Self {
            client,
            config,
            api_key,
        })
    }
}

impl Synthesizer for ChatSynthesizer {
    fn language(&self) -> ProgramLanguage {
        ProgramLanguage::Python
    }

    fn synthesize(
        &mut self,
        request: &SynthesisRequest<'_>,
    ) -> std::result::Result<CandidateProgram, GenerationError> {
        let prompt = build_prompt(request)?;
        let body = ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &prompt.system,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt.user,
                },
            ],
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };

        debug!(
            endpoint = %self.config.endpoint,
            model = %self.config.model,
            attempt = request.attempt_number,
            prompt_chars = prompt.user.len(),
            repair = request.prior.is_some(),
            "requesting candidate program"
        );

        let response = self
            .client
            .post(&self.config.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .map_err(|e| GenerationError::Unavailable {
                message: e.to_string(),
            })?;

        let status = response.status();
        let text = response.text().map_err(|e| GenerationError::Unavailable {
            message: e.to_string(),
        })?;
        if !status.is_success() {
            warn!(status = status.as_u16(), "generator returned an error status");
            return Err(GenerationError::HttpStatus {
                status: status.as_u16(),
                message: text,
            });
        }

        let program = extract_program(&text)?;
        debug!(program_chars = program.len(), "received candidate program");
        Ok(
            CandidateProgram::new(request.attempt_number, ProgramLanguage::Python, program)
                .with_diagnostics(request.prior.map(|prior| prior.diagnostics.clone())),
        )
    }
}
