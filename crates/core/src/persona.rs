//! The fixed persona: system prompt plus generation parameters.
//!
//! Built once at startup from configuration and shared behind an `Arc`.
//! Requests never override it.

use serde::{Deserialize, Serialize};

/// Default lead-capture system prompt.
pub const DEFAULT_SYSTEM_PROMPT: &str = "\
You are a friendly and helpful AI assistant for a business website. Your goals are:

1. Greet visitors warmly and understand their needs
2. Answer questions about products/services helpfully
3. Guide conversations toward capturing their interest
4. Be conversational but professional
5. After 2-3 exchanges, naturally suggest they share contact info to get personalized help

Keep responses concise (2-3 sentences max). Be helpful, not pushy. If they seem interested or ask about pricing, availability, or specific services, that's a good time to mention that someone from the team could help them directly.

Never mention that you're trying to capture leads. Just be genuinely helpful.";

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_MAX_TOKENS: u32 = 150;
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonaConfig {
    /// Content of the single system turn that opens every conversation
    pub system_prompt: String,

    /// Model identifier sent to the provider
    pub model: String,

    /// Maximum output length
    pub max_tokens: u32,

    /// Sampling temperature
    pub temperature: f32,
}

impl Default for PersonaConfig {
    fn default() -> Self {
        Self {
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
        }
    }
}
