//! Conversation turn assembly and reply interpretation.
//!
//! The service keeps no conversation memory: every request carries the
//! history the widget has accumulated so far, and the full turn sequence is
//! rebuilt from it on each call.

use serde::{Deserialize, Serialize};

use crate::error::ChatError;
use crate::message::Turn;
use crate::persona::PersonaConfig;
use crate::provider::{ProviderRequest, ProviderResponse};

/// Returned when the provider produced no usable completion.
pub const FALLBACK_REPLY: &str =
    "I'm here to help! Could you tell me more about what you're looking for?";

/// An inbound chat request as posted by the widget.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationRequest {
    /// The visitor's new message. Absent and empty are both rejected.
    #[serde(default)]
    pub message: Option<String>,

    /// Opaque widget session identifier, echoed back unchanged.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,

    /// Prior turns, oldest first.
    #[serde(default)]
    pub history: Vec<Turn>,
}

impl ConversationRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::default()
        }
    }

    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn with_history(mut self, history: Vec<Turn>) -> Self {
        self.history = history;
        self
    }

    /// The message, if present and non-empty.
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref().filter(|m| !m.is_empty())
    }

    /// Reject requests that must never reach assembly.
    pub fn validate(&self) -> Result<&str, ChatError> {
        self.message().ok_or(ChatError::MissingMessage)
    }

    /// Build the generation request for this conversation.
    pub fn to_provider_request(&self, persona: &PersonaConfig) -> ProviderRequest {
        ProviderRequest {
            model: persona.model.clone(),
            messages: assemble(self, persona),
            max_tokens: Some(persona.max_tokens),
            temperature: persona.temperature,
        }
    }
}

/// The chat endpoint's success body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationReply {
    pub reply: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

/// Build the exact turn sequence to submit for generation.
///
/// The result is the persona's system turn, then the history verbatim, then
/// the current message as a user turn unless the history already ends with
/// a turn whose content equals it. Equality is on content alone, so a
/// visitor repeating their previous message verbatim is also collapsed.
///
/// Callers must validate the request first; an absent message is treated as
/// empty here.
pub fn assemble(request: &ConversationRequest, persona: &PersonaConfig) -> Vec<Turn> {
    let message = request.message.as_deref().unwrap_or_default();

    let mut turns = Vec::with_capacity(request.history.len() + 2);
    turns.push(Turn::system(persona.system_prompt.as_str()));
    turns.extend(request.history.iter().cloned());

    let already_present = request
        .history
        .last()
        .is_some_and(|last| last.content == message);
    if !already_present {
        turns.push(Turn::user(message));
    }

    turns
}

/// Extract the reply text from a generation result.
///
/// Takes the first choice's content; an empty choice list, a `null`
/// content, or an empty string all yield [`FALLBACK_REPLY`].
pub fn interpret_reply(result: &ProviderResponse) -> String {
    result
        .choices
        .first()
        .and_then(|choice| choice.message.content.as_deref())
        .filter(|content| !content.is_empty())
        .unwrap_or(FALLBACK_REPLY)
        .to_string()
}
