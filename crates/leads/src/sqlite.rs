//! SQLite lead store.
//!
//! A single `leads` table. Timestamps are stored as fixed-width RFC 3339
//! UTC strings so lexicographic comparison matches chronological order.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use leadchat_core::error::LeadError;
use leadchat_core::lead::{Lead, LeadStore, NewLead};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use tracing::{debug, info};
use uuid::Uuid;

/// A SQLite-backed [`LeadStore`].
pub struct SqliteLeadStore {
    pool: SqlitePool,
}

impl SqliteLeadStore {
    /// Open (or create) a SQLite database.
    ///
    /// The schema is created automatically. Pass `"sqlite::memory:"` for an
    /// in-process ephemeral database (useful for tests).
    pub async fn new(url: &str) -> Result<Self, LeadError> {
        let in_memory = url.contains(":memory:");

        let mut options = SqliteConnectOptions::from_str(url)
            .map_err(|e| LeadError::Storage(format!("Invalid SQLite URL: {e}")))?
            .create_if_missing(true)
            .synchronous(SqliteSynchronous::Normal);
        if !in_memory {
            options = options.journal_mode(SqliteJournalMode::Wal);
        }

        // Every connection to ":memory:" is a separate database, so pin the
        // pool to one connection that never expires.
        let pool_options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(4)
        };

        let pool = pool_options
            .connect_with(options)
            .await
            .map_err(|e| LeadError::Storage(format!("Failed to open SQLite: {e}")))?;

        let store = Self { pool };
        store.run_migrations().await?;
        info!("SQLite lead store initialized at {url}");
        Ok(store)
    }

    async fn run_migrations(&self) -> Result<(), LeadError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS leads (
                iid                  INTEGER PRIMARY KEY AUTOINCREMENT,
                id                   TEXT UNIQUE NOT NULL,
                name                 TEXT NOT NULL,
                email                TEXT NOT NULL,
                phone                TEXT NOT NULL,
                session_id           TEXT,
                message_count        INTEGER,
                conversation_summary TEXT,
                created_at           TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| LeadError::MigrationFailed(format!("leads table: {e}")))?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_leads_created_at ON leads(created_at DESC)")
            .execute(&self.pool)
            .await
            .map_err(|e| LeadError::MigrationFailed(format!("created_at index: {e}")))?;

        debug!("SQLite migrations complete");
        Ok(())
    }

    fn timestamp(at: DateTime<Utc>) -> String {
        at.to_rfc3339_opts(SecondsFormat::Micros, true)
    }

    /// Parse a [`Lead`] from a SQLite row.
    fn row_to_lead(row: &sqlx::sqlite::SqliteRow) -> Result<Lead, LeadError> {
        let column = |name: &str, e: sqlx::Error| LeadError::QueryFailed(format!("{name} column: {e}"));

        let created_at: String = row.try_get("created_at").map_err(|e| column("created_at", e))?;
        let created_at = DateTime::parse_from_rfc3339(&created_at)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| LeadError::QueryFailed(format!("created_at value: {e}")))?;

        Ok(Lead {
            id: row.try_get("id").map_err(|e| column("id", e))?,
            name: row.try_get("name").map_err(|e| column("name", e))?,
            email: row.try_get("email").map_err(|e| column("email", e))?,
            phone: row.try_get("phone").map_err(|e| column("phone", e))?,
            session_id: row.try_get("session_id").map_err(|e| column("session_id", e))?,
            message_count: row
                .try_get("message_count")
                .map_err(|e| column("message_count", e))?,
            conversation_summary: row
                .try_get("conversation_summary")
                .map_err(|e| column("conversation_summary", e))?,
            created_at,
        })
    }
}

#[async_trait]
impl LeadStore for SqliteLeadStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn insert(&self, lead: NewLead) -> Result<Lead, LeadError> {
        let lead = Lead::from_new(Uuid::new_v4().to_string(), lead, Utc::now());

        sqlx::query(
            r#"
            INSERT INTO leads (id, name, email, phone, session_id, message_count, conversation_summary, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&lead.id)
        .bind(&lead.name)
        .bind(&lead.email)
        .bind(&lead.phone)
        .bind(&lead.session_id)
        .bind(lead.message_count)
        .bind(&lead.conversation_summary)
        .bind(Self::timestamp(lead.created_at))
        .execute(&self.pool)
        .await
        .map_err(|e| LeadError::Storage(format!("INSERT failed: {e}")))?;

        debug!(id = %lead.id, "Stored lead");
        Ok(lead)
    }

    async fn count(&self) -> Result<u64, LeadError> {
        let row = sqlx::query("SELECT COUNT(*) AS cnt FROM leads")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| LeadError::QueryFailed(format!("COUNT: {e}")))?;

        let cnt: i64 = row
            .try_get("cnt")
            .map_err(|e| LeadError::QueryFailed(format!("cnt column: {e}")))?;

        Ok(cnt as u64)
    }

    async fn count_since(&self, since: DateTime<Utc>) -> Result<u64, LeadError> {
        let row = sqlx::query("SELECT COUNT(*) AS cnt FROM leads WHERE created_at >= ?1")
            .bind(Self::timestamp(since))
            .fetch_one(&self.pool)
            .await
            .map_err(|e| LeadError::QueryFailed(format!("COUNT since: {e}")))?;

        let cnt: i64 = row
            .try_get("cnt")
            .map_err(|e| LeadError::QueryFailed(format!("cnt column: {e}")))?;

        Ok(cnt as u64)
    }

    async fn session_ids(&self) -> Result<Vec<Option<String>>, LeadError> {
        let rows = sqlx::query("SELECT session_id FROM leads")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| LeadError::QueryFailed(format!("session ids: {e}")))?;

        rows.iter()
            .map(|row| {
                row.try_get("session_id")
                    .map_err(|e| LeadError::QueryFailed(format!("session_id column: {e}")))
            })
            .collect()
    }

    async fn recent(&self, limit: usize) -> Result<Vec<Lead>, LeadError> {
        let rows = sqlx::query("SELECT * FROM leads ORDER BY created_at DESC, iid DESC LIMIT ?1")
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| LeadError::QueryFailed(format!("recent leads: {e}")))?;

        rows.iter().map(Self::row_to_lead).collect()
    }

    async fn health_check(&self) -> Result<bool, LeadError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map(|_| true)
            .map_err(|e| LeadError::Storage(format!("health check: {e}")))
    }
}
