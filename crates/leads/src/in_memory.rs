//! In-memory lead store: useful for testing and local demos.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use leadchat_core::error::LeadError;
use leadchat_core::lead::{Lead, LeadStore, NewLead};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Stores leads in a Vec, in insertion order. Nothing survives a restart.
pub struct InMemoryLeadStore {
    leads: Arc<RwLock<Vec<Lead>>>,
}

impl InMemoryLeadStore {
    pub fn new() -> Self {
        Self {
            leads: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Pre-populate with existing rows (e.g. fixtures with chosen timestamps).
    pub fn with_leads(leads: Vec<Lead>) -> Self {
        Self {
            leads: Arc::new(RwLock::new(leads)),
        }
    }

    /// Snapshot of everything stored.
    pub async fn all(&self) -> Vec<Lead> {
        self.leads.read().await.clone()
    }
}

impl Default for InMemoryLeadStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LeadStore for InMemoryLeadStore {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn insert(&self, lead: NewLead) -> Result<Lead, LeadError> {
        let lead = Lead::from_new(Uuid::new_v4().to_string(), lead, Utc::now());
        self.leads.write().await.push(lead.clone());
        Ok(lead)
    }

    async fn count(&self) -> Result<u64, LeadError> {
        Ok(self.leads.read().await.len() as u64)
    }

    async fn count_since(&self, since: DateTime<Utc>) -> Result<u64, LeadError> {
        let leads = self.leads.read().await;
        Ok(leads.iter().filter(|l| l.created_at >= since).count() as u64)
    }

    async fn session_ids(&self) -> Result<Vec<Option<String>>, LeadError> {
        let leads = self.leads.read().await;
        Ok(leads.iter().map(|l| l.session_id.clone()).collect())
    }

    async fn recent(&self, limit: usize) -> Result<Vec<Lead>, LeadError> {
        let leads = self.leads.read().await;
        // Stable sort over insertion order, reversed, keeps later inserts
        // first when timestamps tie.
        let mut newest: Vec<Lead> = leads.iter().rev().cloned().collect();
        newest.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        newest.truncate(limit);
        Ok(newest)
    }
}
