//! Hosted language-model access.
//!
//! Agents only see the [`LanguageModel`] trait: a prompt goes in, raw text comes out. Turning
//! that text into structured data is the job of `agents::parser`.

mod gemini;

pub use gemini::GeminiClient;

use async_trait::async_trait;
use thiserror::Error;

/// Transport-level failures raised by a language model.
///
/// Malformed output is not an error at this layer; only failures to obtain any text are.
#[derive(Debug, Error)]
pub enum LlmError {
    /// Provider could not be reached.
    #[error("Language model unavailable: {0}")]
    ProviderUnavailable(String),
    /// Provider answered with an error status.
    #[error("Language model request failed: {0}")]
    GenerationFailed(String),
    /// Provider response body could not be decoded.
    #[error("Malformed provider response: {0}")]
    InvalidResponse(String),
    /// Provider returned no candidate text (for example, blocked by safety filters).
    #[error("Language model returned no text: {0}")]
    EmptyResponse(String),
}

/// A text-in, text-out generative model.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Generate a completion for `prompt`.
    async fn generate(&self, prompt: &str) -> Result<String, LlmError>;

    /// Model identifier for logs and health output.
    fn model_name(&self) -> &str;
}
