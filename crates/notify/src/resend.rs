//! Resend email API client.
//!
//! Sends a single `POST {api_url}/emails` with bearer auth per message.

use async_trait::async_trait;
use leadchat_core::error::NotifyError;
use leadchat_core::notify::{Email, Mailer};
use serde::Deserialize;
use tracing::{debug, warn};

/// Delivers [`Email`]s through the Resend HTTP API.
pub struct ResendMailer {
    api_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl ResendMailer {
    pub fn new(api_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .unwrap_or_else(|e| {
                warn!(error = %e, "Falling back to default HTTP client");
                reqwest::Client::new()
            });

        Self {
            api_url: api_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            client,
        }
    }

    fn classify_error(status: u16, body: &str) -> NotifyError {
        let message = serde_json::from_str::<ApiError>(body)
            .ok()
            .and_then(|e| e.message)
            .unwrap_or_else(|| body.to_string());
        NotifyError::DeliveryFailed {
            status_code: status,
            message,
        }
    }
}

#[async_trait]
impl Mailer for ResendMailer {
    fn name(&self) -> &str {
        "resend"
    }

    async fn send(&self, email: Email) -> Result<(), NotifyError> {
        let url = format!("{}/emails", self.api_url);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&email)
            .send()
            .await
            .map_err(|e| NotifyError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Self::classify_error(status.as_u16(), &body));
        }

        debug!(to = %email.to, "Email accepted by Resend");
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    message: Option<String>,
}
