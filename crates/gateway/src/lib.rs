//! HTTP gateway for the LeadChat widget.
//!
//! Serves the two widget endpoints, `/chat` and `/save-lead`, under both
//! `/api` and `/.netlify/functions`, plus a `/health` check.
//!
//! Built on Axum.

mod chat;
mod save_lead;

use axum::extract::DefaultBodyLimit;
use axum::{
    Router,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use leadchat_core::lead::LeadStore;
use leadchat_core::notify::Mailer;
use leadchat_core::persona::PersonaConfig;
use leadchat_core::provider::Provider;

/// Shared application state for the gateway. Immutable after startup.
pub struct GatewayState {
    pub provider: Arc<dyn Provider>,
    pub persona: Arc<PersonaConfig>,
    pub leads: Arc<dyn LeadStore>,
    /// Thank-you emails are skipped when `None`.
    pub mailer: Option<Arc<dyn Mailer>>,
    /// Sender address for thank-you emails.
    pub email_from: String,
}

pub type SharedState = Arc<GatewayState>;

/// Body of every error response: `{"error": "..."}`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

pub(crate) fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
        .into_response()
}

pub(crate) async fn method_not_allowed() -> Response {
    error_response(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed")
}

/// The widget endpoints, without a mount prefix.
fn functions_router(state: SharedState) -> Router {
    Router::new()
        .merge(chat::router())
        .merge(save_lead::router())
        .with_state(state)
}

/// Build the Axum router with all gateway routes.
///
/// Layers applied:
/// - CORS per endpoint (any origin)
/// - Request body size limit (1 MB)
/// - HTTP trace logging
pub fn build_router(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .nest("/api", functions_router(state.clone()))
        .nest("/.netlify/functions", functions_router(state))
        .layer(DefaultBodyLimit::max(1024 * 1024)) // 1 MB body limit
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

/// Start the gateway HTTP server.
///
/// Provider, lead store and mailer are built once and shared by every
/// request.
pub async fn start(config: leadchat_config::AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);

    let provider = leadchat_providers::build_from_config(&config)?;
    let leads = leadchat_leads::open_store(&config.leads).await?;
    let mailer = leadchat_notify::build_from_config(&config.email);

    info!(
        provider = %provider.name(),
        store = %leads.name(),
        email = mailer.is_some(),
        model = %config.persona.model,
        "Gateway subsystems ready"
    );

    let state = Arc::new(GatewayState {
        provider,
        persona: Arc::new(config.persona.to_persona()),
        leads,
        mailer,
        email_from: config.email.from.clone(),
    });

    let app = build_router(state);

    info!(addr = %addr, "Gateway starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// --- Handlers ---

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use leadchat_core::error::{NotifyError, ProviderError};
    use leadchat_core::notify::Email;
    use leadchat_core::provider::{ProviderRequest, ProviderResponse};
    use leadchat_leads::InMemoryLeadStore;
    use std::sync::Mutex;
    use tokio::sync::mpsc;
    use tower::ServiceExt;

    /// Replies with a fixed outcome and records every request it sees.
    pub struct ScriptedProvider {
        outcome: Result<ProviderResponse, ProviderError>,
        pub requests: Mutex<Vec<ProviderRequest>>,
    }

    impl ScriptedProvider {
        pub fn replying(text: &str) -> Self {
            Self::with_outcome(Ok(ProviderResponse::text("mock-model", text)))
        }

        pub fn with_outcome(outcome: Result<ProviderResponse, ProviderError>) -> Self {
            Self {
                outcome,
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Provider for ScriptedProvider {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
            self.requests.lock().unwrap().push(request);
            self.outcome.clone()
        }
    }

    /// Forwards every email it is asked to send to a channel.
    pub struct RecordingMailer {
        pub sent: mpsc::UnboundedSender<Email>,
        pub fail: bool,
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        fn name(&self) -> &str {
            "recording"
        }

        async fn send(&self, email: Email) -> Result<(), NotifyError> {
            let _ = self.sent.send(email);
            if self.fail {
                return Err(NotifyError::Network("connection reset".into()));
            }
            Ok(())
        }
    }

    pub fn state_with(
        provider: Arc<dyn Provider>,
        leads: Arc<dyn LeadStore>,
        mailer: Option<Arc<dyn Mailer>>,
    ) -> SharedState {
        Arc::new(GatewayState {
            provider,
            persona: Arc::new(PersonaConfig::default()),
            leads,
            mailer,
            email_from: "noreply@yourdomain.com".into(),
        })
    }

    pub fn test_state() -> SharedState {
        state_with(
            Arc::new(ScriptedProvider::replying("Happy to help!")),
            Arc::new(InMemoryLeadStore::new()),
            None,
        )
    }

    pub async fn send(app: Router, req: Request<Body>) -> (StatusCode, axum::http::HeaderMap, serde_json::Value) {
        let response = app.oneshot(req).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, headers, json)
    }

    pub fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    pub fn request(method: &str, uri: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    #[tokio::test]
    async fn health_endpoint() {
        let app = build_router(test_state());

        let (status, _, body) = send(app, request("GET", "/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test]
    async fn endpoints_are_mounted_under_both_prefixes() {
        for prefix in ["/api", "/.netlify/functions"] {
            let app = build_router(test_state());
            let (status, _, body) = send(
                app,
                post_json(&format!("{prefix}/chat"), r#"{"message":"hi"}"#),
            )
            .await;
            assert_eq!(status, StatusCode::OK, "prefix {prefix}");
            assert_eq!(body["reply"], "Happy to help!");
        }
    }

    #[tokio::test]
    async fn oversized_body_is_rejected() {
        let app = build_router(test_state());
        let huge = format!(r#"{{"message":"{}"}}"#, "a".repeat(2 * 1024 * 1024));

        let (status, _, _) = send(app, post_json("/api/chat", &huge)).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn unknown_route_is_not_found() {
        let app = build_router(test_state());
        let (status, _, _) = send(app, request("GET", "/api/nope")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
