//! `/save-lead`: capture a visitor's contact details and serve dashboard
//! statistics.

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::{Method, StatusCode, header};
use axum::response::{IntoResponse, Json, Response};
use axum::{Router, routing::get};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

use leadchat_core::error::LeadError;
use leadchat_core::lead::{LeadStats, NewLead, collect_stats};
use leadchat_notify::thank_you_email;

use crate::{SharedState, error_response, method_not_allowed};

pub(crate) fn router() -> Router<SharedState> {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    Router::new()
        .route(
            "/save-lead",
            get(stats_handler)
                .post(save_handler)
                .fallback(method_not_allowed),
        )
        .layer(cors)
}

#[derive(Debug)]
enum LeadFailure {
    MissingFields,
    InvalidAction,
    Stats,
    Save,
}

impl IntoResponse for LeadFailure {
    fn into_response(self) -> Response {
        match self {
            Self::MissingFields => {
                error_response(StatusCode::BAD_REQUEST, LeadError::MissingFields.to_string())
            }
            Self::InvalidAction => error_response(StatusCode::BAD_REQUEST, "Invalid action"),
            Self::Stats => {
                error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to fetch stats")
            }
            Self::Save => error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to save lead"),
        }
    }
}

#[derive(Deserialize)]
struct StatsQuery {
    action: Option<String>,
}

async fn stats_handler(
    State(state): State<SharedState>,
    Query(query): Query<StatsQuery>,
) -> Result<Json<LeadStats>, LeadFailure> {
    if query.action.as_deref() != Some("stats") {
        return Err(LeadFailure::InvalidAction);
    }

    let stats = collect_stats(state.leads.as_ref(), chrono::Utc::now())
        .await
        .map_err(|e| {
            error!(error = %e, store = %state.leads.name(), "Stats query failed");
            LeadFailure::Stats
        })?;

    Ok(Json(stats))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SaveLeadResponse {
    success: bool,
    lead_id: String,
}

async fn save_handler(
    State(state): State<SharedState>,
    body: Bytes,
) -> Result<Json<SaveLeadResponse>, LeadFailure> {
    let new_lead: NewLead = serde_json::from_slice(&body).map_err(|e| {
        error!(error = %e, "Unreadable lead body");
        LeadFailure::Save
    })?;

    new_lead.validate().map_err(|_| LeadFailure::MissingFields)?;

    let lead = state.leads.insert(new_lead).await.map_err(|e| {
        error!(error = %e, store = %state.leads.name(), "Lead insert failed");
        LeadFailure::Save
    })?;

    info!(
        lead_id = %lead.id,
        name = %lead.name,
        email = %lead.email,
        session = lead.session_id.as_deref().unwrap_or("-"),
        "Lead captured"
    );

    if let Some(mailer) = state.mailer.clone() {
        let email = thank_you_email(&state.email_from, &lead.name, &lead.email);
        tokio::spawn(async move {
            let to = email.to.clone();
            match mailer.send(email).await {
                Ok(()) => info!(to = %to, mailer = %mailer.name(), "Thank-you email sent"),
                Err(e) => error!(error = %e, to = %to, "Thank-you email failed"),
            }
        });
    }

    Ok(Json(SaveLeadResponse {
        success: true,
        lead_id: lead.id,
    }))
}

#[cfg(test)]
mod tests {
    use crate::build_router;
    use crate::test_support::*;
    use async_trait::async_trait;
    use axum::http::StatusCode;
    use chrono::{DateTime, Duration, Utc};
    use leadchat_core::error::LeadError;
    use leadchat_core::lead::{Lead, LeadStore, NewLead};
    use leadchat_core::notify::Mailer;
    use leadchat_leads::InMemoryLeadStore;
    use std::sync::Arc;
    use tokio::sync::mpsc;

    /// A store whose every operation fails.
    struct BrokenStore;

    #[async_trait]
    impl LeadStore for BrokenStore {
        fn name(&self) -> &str {
            "broken"
        }
        async fn insert(&self, _lead: NewLead) -> Result<Lead, LeadError> {
            Err(LeadError::Storage("disk full".into()))
        }
        async fn count(&self) -> Result<u64, LeadError> {
            Err(LeadError::QueryFailed("offline".into()))
        }
        async fn count_since(&self, _since: DateTime<Utc>) -> Result<u64, LeadError> {
            Err(LeadError::QueryFailed("offline".into()))
        }
        async fn session_ids(&self) -> Result<Vec<Option<String>>, LeadError> {
            Err(LeadError::QueryFailed("offline".into()))
        }
        async fn recent(&self, _limit: usize) -> Result<Vec<Lead>, LeadError> {
            Err(LeadError::QueryFailed("offline".into()))
        }
    }

    fn app_with_store(store: Arc<dyn LeadStore>) -> axum::Router {
        build_router(state_with(
            Arc::new(ScriptedProvider::replying("unused")),
            store,
            None,
        ))
    }

    const FULL_LEAD: &str = r#"{
        "name": "Ada",
        "email": "ada@example.com",
        "phone": "555-0100",
        "sessionId": "s-1",
        "messageCount": 4,
        "conversationSummary": "Asked about pricing"
    }"#;

    #[tokio::test]
    async fn save_returns_lead_id_and_persists() {
        let store = Arc::new(InMemoryLeadStore::new());
        let app = app_with_store(store.clone());

        let (status, headers, body) = send(app, post_json("/api/save-lead", FULL_LEAD)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(headers["access-control-allow-origin"], "*");

        let saved = store.all().await;
        assert_eq!(saved.len(), 1);
        assert_eq!(body["leadId"], saved[0].id.as_str());
        assert_eq!(saved[0].session_id.as_deref(), Some("s-1"));
        assert_eq!(saved[0].message_count, Some(4));
        assert_eq!(saved[0].conversation_summary.as_deref(), Some("Asked about pricing"));
    }

    #[tokio::test]
    async fn missing_phone_is_bad_request() {
        let store = Arc::new(InMemoryLeadStore::new());
        let app = app_with_store(store.clone());

        let (status, _, body) = send(
            app,
            post_json("/api/save-lead", r#"{"name":"Ada","email":"ada@example.com"}"#),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Name, email, and phone are required");
        assert!(store.all().await.is_empty());
    }

    #[tokio::test]
    async fn malformed_lead_body_is_server_error() {
        let app = app_with_store(Arc::new(InMemoryLeadStore::new()));
        let (status, _, body) = send(app, post_json("/api/save-lead", "nope")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Failed to save lead");
    }

    #[tokio::test]
    async fn store_failure_is_server_error() {
        let app = app_with_store(Arc::new(BrokenStore));
        let (status, _, body) = send(app, post_json("/api/save-lead", FULL_LEAD)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Failed to save lead");
    }

    #[tokio::test]
    async fn stats_shape() {
        let now = Utc::now();
        let mut yesterday_lead = NewLead::new("Old", "old@example.com", "1");
        yesterday_lead.session_id = Some("s-1".into());
        let mut today_lead = NewLead::new("New", "new@example.com", "2");
        today_lead.session_id = Some("s-2".into());
        let store = Arc::new(InMemoryLeadStore::with_leads(vec![
            Lead::from_new("old", yesterday_lead, now - Duration::days(2)),
            Lead::from_new("new", today_lead, now),
        ]));

        let (status, _, body) =
            send(app_with_store(store), request("GET", "/api/save-lead?action=stats")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["totalLeads"], 2);
        assert_eq!(body["totalSessions"], 2);
        assert_eq!(body["todayLeads"], 1);
        let recent = body["recentLeads"].as_array().unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0]["id"], "new");
        assert_eq!(recent[0]["session_id"], "s-2");
        assert!(recent[0]["created_at"].is_string());
    }

    #[tokio::test]
    async fn unknown_action_is_bad_request() {
        for uri in ["/api/save-lead", "/api/save-lead?action=export"] {
            let app = app_with_store(Arc::new(InMemoryLeadStore::new()));
            let (status, _, body) = send(app, request("GET", uri)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
            assert_eq!(body["error"], "Invalid action");
        }
    }

    #[tokio::test]
    async fn stats_failure_is_server_error() {
        let app = app_with_store(Arc::new(BrokenStore));
        let (status, _, body) = send(app, request("GET", "/api/save-lead?action=stats")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Failed to fetch stats");
    }

    #[tokio::test]
    async fn wrong_method_is_not_allowed() {
        let app = app_with_store(Arc::new(InMemoryLeadStore::new()));
        let (status, _, body) = send(app, request("DELETE", "/api/save-lead")).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(body["error"], "Method not allowed");
    }

    #[tokio::test]
    async fn options_allows_authorization_header() {
        let app = app_with_store(Arc::new(InMemoryLeadStore::new()));
        let (status, headers, _) = send(app, request("OPTIONS", "/api/save-lead")).await;

        assert_eq!(status, StatusCode::OK);
        let methods = headers["access-control-allow-methods"].to_str().unwrap();
        assert!(methods.contains("GET"));
        assert!(methods.contains("POST"));
        let allowed = headers["access-control-allow-headers"].to_str().unwrap().to_ascii_lowercase();
        assert!(allowed.contains("content-type"));
        assert!(allowed.contains("authorization"));
    }

    #[tokio::test]
    async fn thank_you_email_is_sent_in_background() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mailer: Arc<dyn Mailer> = Arc::new(RecordingMailer { sent: tx, fail: false });
        let app = build_router(state_with(
            Arc::new(ScriptedProvider::replying("unused")),
            Arc::new(InMemoryLeadStore::new()),
            Some(mailer),
        ));

        let (status, _, _) = send(app, post_json("/api/save-lead", FULL_LEAD)).await;
        assert_eq!(status, StatusCode::OK);

        let email = tokio::time::timeout(std::time::Duration::from_secs(5), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(email.to, "ada@example.com");
        assert_eq!(email.from, "noreply@yourdomain.com");
        assert_eq!(email.subject, "Thanks for reaching out!");
        assert!(email.html.contains("Thanks for connecting, Ada!"));
    }

    #[tokio::test]
    async fn email_failure_does_not_affect_save() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mailer: Arc<dyn Mailer> = Arc::new(RecordingMailer { sent: tx, fail: true });
        let store = Arc::new(InMemoryLeadStore::new());
        let app = build_router(state_with(
            Arc::new(ScriptedProvider::replying("unused")),
            store.clone(),
            Some(mailer),
        ));

        let (status, _, body) = send(app, post_json("/api/save-lead", FULL_LEAD)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert!(rx.recv().await.is_some());
        assert_eq!(store.all().await.len(), 1);
    }
}
