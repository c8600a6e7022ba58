//! Provider trait: the abstraction over the text-generation backend.
//!
//! A Provider knows how to send an assembled turn sequence to an LLM and
//! return the raw list of completion choices. Interpreting those choices
//! into a reply is [`crate::conversation::interpret_reply`]'s job.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::error::ProviderError;
use crate::message::{Role, Turn};

/// A single text-generation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderRequest {
    /// The model to use (e.g., "gpt-4o-mini")
    pub model: String,

    /// The assembled conversation turns
    pub messages: Vec<Turn>,

    /// Maximum tokens to generate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Temperature (0.0 = deterministic, 1.0 = creative)
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

fn default_temperature() -> f32 {
    0.7
}

/// The provider's answer, as close to the wire shape as is useful.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderResponse {
    /// Which model actually responded (may differ from requested)
    #[serde(default)]
    pub model: String,

    /// Completion choices, in provider order. May be empty.
    #[serde(default)]
    pub choices: Vec<Choice>,

    /// Token usage statistics
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

impl ProviderResponse {
    /// Convenience constructor for a single-choice text response.
    pub fn text(model: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            choices: vec![Choice {
                message: ChoiceMessage {
                    role: Role::Assistant,
                    content: Some(content.into()),
                },
            }],
            usage: None,
        }
    }
}

/// One completion choice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Choice {
    pub message: ChoiceMessage,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChoiceMessage {
    #[serde(default = "assistant_role")]
    pub role: Role,

    /// Generated text; providers send `null` when the model produced none.
    #[serde(default)]
    pub content: Option<String>,
}

fn assistant_role() -> Role {
    Role::Assistant
}

/// Token usage information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// The core Provider trait.
///
/// The chat endpoint calls `complete()` without knowing which backend is
/// configured. Implementations must not retry; a failure is surfaced as-is.
#[async_trait]
pub trait Provider: Send + Sync {
    /// A human-readable name for this provider (e.g., "openai").
    fn name(&self) -> &str;

    /// Send a request and get the complete response.
    async fn complete(&self, request: ProviderRequest) -> std::result::Result<ProviderResponse, ProviderError>;

    /// Health check: can we reach the provider?
    async fn health_check(&self) -> std::result::Result<bool, ProviderError> {
        Ok(true)
    }
}
