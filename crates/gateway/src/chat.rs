//! `/chat`: one widget message in, one assistant reply out.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{Method, StatusCode, header};
use axum::response::{IntoResponse, Json, Response};
use axum::{Router, routing::post};
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info, warn};

use leadchat_core::conversation::{ConversationReply, ConversationRequest, interpret_reply};
use leadchat_core::error::{ChatError, ProviderError};

use crate::{SharedState, error_response, method_not_allowed};

/// Characters of the visitor's message included in the request log line.
const LOG_PREVIEW_CHARS: usize = 50;

pub(crate) fn router() -> Router<SharedState> {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/chat", post(chat_handler).fallback(method_not_allowed))
        .layer(cors)
}

/// Ways a chat request can fail, each with its HTTP status.
#[derive(Debug)]
enum ChatFailure {
    Invalid(ChatError),
    Unavailable,
    Failed,
}

impl From<ProviderError> for ChatFailure {
    fn from(e: ProviderError) -> Self {
        if e.is_capacity() {
            warn!(error = %e, "Provider out of capacity");
            Self::Unavailable
        } else {
            error!(error = %e, "Chat completion failed");
            Self::Failed
        }
    }
}

impl IntoResponse for ChatFailure {
    fn into_response(self) -> Response {
        match self {
            Self::Invalid(ChatError::MissingMessage) => {
                error_response(StatusCode::BAD_REQUEST, ChatError::MissingMessage.to_string())
            }
            Self::Invalid(ChatError::Malformed(_)) | Self::Failed => {
                error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to process message")
            }
            Self::Unavailable => {
                error_response(StatusCode::SERVICE_UNAVAILABLE, "Service temporarily unavailable")
            }
        }
    }
}

async fn chat_handler(
    State(state): State<SharedState>,
    body: Bytes,
) -> Result<Json<ConversationReply>, ChatFailure> {
    let request: ConversationRequest = serde_json::from_slice(&body).map_err(|e| {
        error!(error = %e, "Unreadable chat request body");
        ChatFailure::Invalid(ChatError::Malformed(e.to_string()))
    })?;

    let message = request.validate().map_err(ChatFailure::Invalid)?;

    info!(
        session = request.session_id.as_deref().unwrap_or("-"),
        preview = %message.chars().take(LOG_PREVIEW_CHARS).collect::<String>(),
        "Chat message received"
    );

    let provider_request = request.to_provider_request(&state.persona);
    let response = state.provider.complete(provider_request).await?;

    Ok(Json(ConversationReply {
        reply: interpret_reply(&response),
        session_id: request.session_id.clone(),
    }))
}
