//! Lead capture: the contact record a visitor leaves through the widget,
//! the storage trait, and dashboard statistics.

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::LeadError;

/// How many leads the dashboard lists.
pub const RECENT_LEADS_LIMIT: usize = 20;

/// A lead as submitted by the widget.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewLead {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub email: Option<String>,

    #[serde(default)]
    pub phone: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_count: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_summary: Option<String>,
}

impl NewLead {
    pub fn new(name: impl Into<String>, email: impl Into<String>, phone: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            email: Some(email.into()),
            phone: Some(phone.into()),
            ..Self::default()
        }
    }

    /// Name, email and phone must all be present and non-empty.
    pub fn validate(&self) -> Result<(), LeadError> {
        let filled = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.is_empty());
        if filled(&self.name) && filled(&self.email) && filled(&self.phone) {
            Ok(())
        } else {
            Err(LeadError::MissingFields)
        }
    }
}

/// A stored lead row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lead {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub session_id: Option<String>,
    pub message_count: Option<i64>,
    pub conversation_summary: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Lead {
    /// Materialize a validated submission into a row.
    pub fn from_new(id: impl Into<String>, new: NewLead, created_at: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            name: new.name.unwrap_or_default(),
            email: new.email.unwrap_or_default(),
            phone: new.phone.unwrap_or_default(),
            session_id: new.session_id,
            message_count: new.message_count,
            conversation_summary: new.conversation_summary,
            created_at,
        }
    }
}

/// Aggregate numbers for the admin dashboard.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadStats {
    pub total_leads: u64,
    pub total_sessions: u64,
    pub today_leads: u64,
    pub recent_leads: Vec<Lead>,
}

/// Persistent lead storage.
#[async_trait]
pub trait LeadStore: Send + Sync {
    /// A human-readable name for this backend (e.g., "sqlite").
    fn name(&self) -> &str;

    /// Persist a lead. The store assigns `id` and `created_at`.
    async fn insert(&self, lead: NewLead) -> Result<Lead, LeadError>;

    /// Total number of leads.
    async fn count(&self) -> Result<u64, LeadError>;

    /// Number of leads created at or after `since`.
    async fn count_since(&self, since: DateTime<Utc>) -> Result<u64, LeadError>;

    /// The session id of every lead, one entry per lead.
    async fn session_ids(&self) -> Result<Vec<Option<String>>, LeadError>;

    /// The newest leads, newest first.
    async fn recent(&self, limit: usize) -> Result<Vec<Lead>, LeadError>;

    /// Health check: can we reach the database?
    async fn health_check(&self) -> Result<bool, LeadError> {
        Ok(true)
    }
}

/// Gather dashboard statistics as of `now`.
///
/// "Today" starts at UTC midnight. Leads without a session id count as one
/// shared session; when no sessions are found at all the lead total is used.
pub async fn collect_stats(store: &dyn LeadStore, now: DateTime<Utc>) -> Result<LeadStats, LeadError> {
    let total_leads = store.count().await?;

    let session_ids = store.session_ids().await?;
    let distinct: HashSet<Option<String>> = session_ids.into_iter().collect();
    let total_sessions = match distinct.len() as u64 {
        0 => total_leads,
        n => n,
    };

    let today_leads = store.count_since(start_of_day(now)).await?;
    let recent_leads = store.recent(RECENT_LEADS_LIMIT).await?;

    tracing::debug!(
        store = store.name(),
        total_leads,
        total_sessions,
        today_leads,
        "Collected lead stats"
    );

    Ok(LeadStats {
        total_leads,
        total_sessions,
        today_leads,
        recent_leads,
    })
}

/// Midnight UTC of the day containing `now`.
pub fn start_of_day(now: DateTime<Utc>) -> DateTime<Utc> {
    now.date_naive()
        .and_hms_opt(0, 0, 0)
        .map(|midnight| midnight.and_utc())
        .unwrap_or(now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn validate_requires_all_contact_fields() {
        assert!(NewLead::new("Ada", "ada@example.com", "555-0100").validate().is_ok());

        let mut lead = NewLead::new("Ada", "ada@example.com", "555-0100");
        lead.phone = None;
        assert!(matches!(lead.validate(), Err(LeadError::MissingFields)));

        let lead = NewLead::new("", "ada@example.com", "555-0100");
        assert!(matches!(lead.validate(), Err(LeadError::MissingFields)));
    }

    #[test]
    fn new_lead_parses_widget_payload() {
        let lead: NewLead = serde_json::from_str(
            r#"{"name":"Ada","email":"a@b.c","phone":"1","sessionId":"s1","messageCount":4,"conversationSummary":"pricing"}"#,
        )
        .unwrap();
        assert_eq!(lead.session_id.as_deref(), Some("s1"));
        assert_eq!(lead.message_count, Some(4));
        assert_eq!(lead.conversation_summary.as_deref(), Some("pricing"));
    }

    #[test]
    fn stats_serialize_camel_case_with_snake_case_rows() {
        let created = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();
        let stats = LeadStats {
            total_leads: 1,
            total_sessions: 1,
            today_leads: 0,
            recent_leads: vec![Lead::from_new("id-1", NewLead::new("Ada", "a@b.c", "1"), created)],
        };
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["totalLeads"], 1);
        assert_eq!(json["todayLeads"], 0);
        assert_eq!(json["recentLeads"][0]["session_id"], serde_json::Value::Null);
        assert_eq!(json["recentLeads"][0]["created_at"], "2026-01-02T03:04:05Z");
    }

    #[test]
    fn start_of_day_truncates_to_midnight() {
        let now = Utc.with_ymd_and_hms(2026, 3, 14, 15, 9, 26).unwrap();
        assert_eq!(start_of_day(now), Utc.with_ymd_and_hms(2026, 3, 14, 0, 0, 0).unwrap());
    }

    /// Fixed-data store for exercising the aggregation rules.
    struct FixedStore {
        leads: Vec<Lead>,
    }

    #[async_trait]
    impl LeadStore for FixedStore {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn insert(&self, _lead: NewLead) -> Result<Lead, LeadError> {
            Err(LeadError::Storage("read-only".into()))
        }

        async fn count(&self) -> Result<u64, LeadError> {
            Ok(self.leads.len() as u64)
        }

        async fn count_since(&self, since: DateTime<Utc>) -> Result<u64, LeadError> {
            Ok(self.leads.iter().filter(|l| l.created_at >= since).count() as u64)
        }

        async fn session_ids(&self) -> Result<Vec<Option<String>>, LeadError> {
            Ok(self.leads.iter().map(|l| l.session_id.clone()).collect())
        }

        async fn recent(&self, limit: usize) -> Result<Vec<Lead>, LeadError> {
            let mut leads = self.leads.clone();
            leads.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            leads.truncate(limit);
            Ok(leads)
        }
    }

    fn lead_at(session: Option<&str>, created_at: DateTime<Utc>) -> Lead {
        let mut new = NewLead::new("Ada", "a@b.c", "1");
        new.session_id = session.map(String::from);
        Lead::from_new(format!("{created_at}"), new, created_at)
    }

    #[tokio::test]
    async fn stats_count_distinct_sessions_and_today() {
        let now = Utc.with_ymd_and_hms(2026, 5, 1, 12, 0, 0).unwrap();
        let yesterday = Utc.with_ymd_and_hms(2026, 4, 30, 23, 59, 0).unwrap();
        let store = FixedStore {
            leads: vec![
                lead_at(Some("a"), yesterday),
                lead_at(Some("a"), Utc.with_ymd_and_hms(2026, 5, 1, 0, 0, 0).unwrap()),
                lead_at(Some("b"), Utc.with_ymd_and_hms(2026, 5, 1, 9, 0, 0).unwrap()),
                lead_at(None, Utc.with_ymd_and_hms(2026, 5, 1, 10, 0, 0).unwrap()),
                lead_at(None, Utc.with_ymd_and_hms(2026, 5, 1, 11, 0, 0).unwrap()),
            ],
        };

        let stats = collect_stats(&store, now).await.unwrap();
        assert_eq!(stats.total_leads, 5);
        // "a", "b", and the shared missing id
        assert_eq!(stats.total_sessions, 3);
        assert_eq!(stats.today_leads, 4);
        assert_eq!(stats.recent_leads.len(), 5);
        assert!(stats.recent_leads[0].created_at >= stats.recent_leads[1].created_at);
    }

    #[tokio::test]
    async fn stats_on_empty_store_are_zero() {
        let store = FixedStore { leads: vec![] };
        let stats = collect_stats(&store, Utc::now()).await.unwrap();
        assert_eq!(stats, LeadStats::default());
    }
}
