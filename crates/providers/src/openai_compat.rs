//! OpenAI-compatible provider implementation.
//!
//! Works with OpenAI itself and any endpoint exposing the
//! `/v1/chat/completions` shape (OpenRouter, Ollama, vLLM, ...).
//! Only non-streaming completions are needed by the widget.

use async_trait::async_trait;
use leadchat_core::error::ProviderError;
use leadchat_core::message::{Role, Turn};
use leadchat_core::provider::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Error code OpenAI uses when the account has no credit left.
const INSUFFICIENT_QUOTA: &str = "insufficient_quota";

/// An OpenAI-compatible LLM provider.
pub struct OpenAiCompatProvider {
    name: String,
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl OpenAiCompatProvider {
    /// Create a new OpenAI-compatible provider.
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .unwrap_or_else(|e| {
                warn!(error = %e, "Falling back to default HTTP client");
                reqwest::Client::new()
            });

        Self {
            name: name.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            client,
        }
    }

    /// Create an OpenAI provider (convenience constructor).
    pub fn openai(api_key: impl Into<String>) -> Self {
        Self::new("openai", "https://api.openai.com/v1", api_key)
    }

    /// Build the JSON body for `/chat/completions`.
    fn request_body(request: &ProviderRequest) -> serde_json::Value {
        let mut body = serde_json::json!({
            "model": request.model,
            "messages": Self::to_api_messages(&request.messages),
            "temperature": request.temperature,
        });

        if let Some(max_tokens) = request.max_tokens {
            body["max_tokens"] = serde_json::json!(max_tokens);
        }

        body
    }

    /// Convert our turns to OpenAI API format.
    fn to_api_messages(turns: &[Turn]) -> Vec<ApiMessage> {
        turns
            .iter()
            .map(|t| ApiMessage {
                role: t.role.as_str().to_string(),
                content: Some(t.content.clone()),
            })
            .collect()
    }

    /// Map a non-200 response to a provider error.
    fn classify_error(status: u16, body: &str) -> ProviderError {
        let api_error = serde_json::from_str::<ApiErrorEnvelope>(body)
            .ok()
            .map(|envelope| envelope.error);

        if status == 429 {
            let quota = api_error
                .as_ref()
                .is_some_and(|e| e.code.as_deref() == Some(INSUFFICIENT_QUOTA)
                    || e.r#type.as_deref() == Some(INSUFFICIENT_QUOTA));
            if quota {
                let message = api_error
                    .and_then(|e| e.message)
                    .unwrap_or_else(|| INSUFFICIENT_QUOTA.into());
                return ProviderError::QuotaExceeded(message);
            }
            return ProviderError::RateLimited {
                retry_after_secs: 5,
            };
        }

        if status == 401 || status == 403 {
            return ProviderError::AuthenticationFailed(
                "Invalid API key or insufficient permissions".into(),
            );
        }

        ProviderError::ApiError {
            status_code: status,
            message: api_error
                .and_then(|e| e.message)
                .unwrap_or_else(|| body.to_string()),
        }
    }

    /// Convert the wire response into the domain response.
    fn from_api_response(api_response: ApiResponse) -> ProviderResponse {
        let choices = api_response
            .choices
            .into_iter()
            .map(|choice| Choice {
                message: match choice.message {
                    Some(message) => ChoiceMessage {
                        role: message.role.into(),
                        content: message.content,
                    },
                    None => ChoiceMessage {
                        role: Role::Assistant,
                        content: None,
                    },
                },
            })
            .collect();

        let usage = api_response.usage.map(|u| Usage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        });

        ProviderResponse {
            model: api_response.model.unwrap_or_default(),
            choices,
            usage,
        }
    }
}

#[async_trait]
impl leadchat_core::Provider for OpenAiCompatProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(
        &self,
        request: ProviderRequest,
    ) -> std::result::Result<ProviderResponse, ProviderError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = Self::request_body(&request);

        debug!(
            provider = %self.name,
            model = %request.model,
            turns = request.messages.len(),
            "Sending completion request"
        );

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let status = response.status().as_u16();

        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "Provider returned error");
            return Err(Self::classify_error(status, &error_body));
        }

        let api_response: ApiResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(format!("Failed to parse response: {e}")))?;

        Ok(Self::from_api_response(api_response))
    }

    async fn health_check(&self) -> std::result::Result<bool, ProviderError> {
        let url = format!("{}/models", self.base_url);
        let response = self
            .client
            .get(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        Ok(response.status().is_success())
    }
}

// --- OpenAI API types ---

#[derive(Debug, Serialize, Deserialize)]
struct ApiMessage {
    #[serde(default = "default_api_role")]
    role: String,
    #[serde(default)]
    content: Option<String>,
}

fn default_api_role() -> String {
    "assistant".into()
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    choices: Vec<ApiChoice>,
    #[serde(default)]
    usage: Option<ApiUsage>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    /// Absent or null when the choice was cut off, e.g. by a content filter.
    #[serde(default)]
    message: Option<ApiMessage>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ApiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    r#type: Option<String>,
    #[serde(default)]
    code: Option<String>,
}
