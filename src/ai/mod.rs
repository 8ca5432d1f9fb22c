//! LLM-assisted classification
//!
//! Optional second opinion on a repository's category and topics. Supports
//! multiple LLM backends (Anthropic, OpenAI, OpenRouter, Ollama) with a
//! BYOK model: API keys come from the user config or environment variables.
//!
//! # Environment Variables
//!
//! - `ANTHROPIC_API_KEY`: Required for the Anthropic backend
//! - `OPENAI_API_KEY`: Required for the OpenAI backend
//! - `OPENROUTER_API_KEY`: Required for the OpenRouter backend
//! - `OLLAMA_MODEL`: Optional model override for a local Ollama server
//!
//! # Example
//!
//! ```rust,ignore
//! use repolens::ai::{AiClient, AiConfig, LlmClassifier, LlmGateway};
//!
//! let client = AiClient::from_env(AiConfig::default())?;
//! let llm = LlmClassifier::new(Arc::new(LlmGateway::new(client, 10)))
//!     .with_timeout(Duration::from_secs(30));
//! let outcome = llm.classify(&signals, 10);
//! ```

mod adapter;
mod client;
mod gateway;
mod prompts;

pub use adapter::{candidate_from_response, classify_llm, LlmClassifier, LlmOutcome, UnavailableReason};
pub use client::{AiClient, AiConfig, LlmBackend, Message, Role};
pub use gateway::{parse_response, ClassifierGateway, GatewayRequest, GatewayResponse, LlmGateway};
pub use prompts::{ClassifyPromptBuilder, CLASSIFY_SYSTEM_PROMPT};

use std::time::Duration;
use thiserror::Error;

/// Errors raised inside the gateway. The adapter folds all of them into
/// [`LlmOutcome::Unavailable`].
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Missing API key: {env_var} not set. Get your key at {signup_url}")]
    MissingApiKey { env_var: String, signup_url: String },

    #[error("API request failed: {0}")]
    Request(String),

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Failed to parse API response: {0}")]
    Parse(String),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),
}

pub type GatewayResult<T> = Result<T, GatewayError>;
